//! Visited-link match decisions.
//!
//! A link counts as visited when its canonical key is an exact member of
//! the persisted link set, when any persisted title occurs inside the
//! live title (the stored title is the needle, so decoration a site
//! appends across views still matches), or when its alt text is an exact
//! member of the persisted alt set. Only flushed state is consulted.

use crate::canonical::canonicalize;
use crate::events::LinkCandidate;
use crate::store::VisitedStore;

/// Highlight style handed to the out-of-scope styling collaborator.
pub const HIGHLIGHT_CSS: &str = r#"a.similar-visited {
    color: red !important;
    font-weight: bold !important;
    text-decoration: underline !important;
    text-decoration-color: yellow !important;
}
a.similar-visited * {
    color: red !important;
    font-weight: bold !important;
    text-decoration: underline !important;
    text-decoration-color: yellow !important;
}
"#;

/// Pure decision for one link. Unparseable hrefs are never visited.
pub fn is_visited(store: &VisitedStore, candidate: &LinkCandidate) -> bool {
    let Some(key) = canonicalize(&candidate.href, store.fold_policy()) else {
        return false;
    };
    if store.links().contains(&key) {
        return true;
    }
    if let Some(live_title) = candidate.title.as_deref() {
        if store.titles().iter().any(|stored| live_title.contains(stored)) {
            return true;
        }
    }
    if let Some(alt) = candidate.alt.as_deref() {
        if store.alts().contains(alt) {
            return true;
        }
    }
    false
}

/// Batch decision over a page's visible links. With highlighting disabled
/// every link reports unvisited so the collaborator removes its styling.
pub fn render_pass(
    store: &VisitedStore,
    links: &[LinkCandidate],
    highlight_enabled: bool,
) -> Vec<bool> {
    if !highlight_enabled {
        return vec![false; links.len()];
    }
    links.iter().map(|link| is_visited(store, link)).collect()
}
