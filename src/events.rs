//! Event adapter types: the boundary with the page-side collaborators.
//!
//! The watch session consumes one JSON object per line on stdin and emits
//! render decisions as JSON lines on stdout. DOM walking, styling and menu
//! plumbing live on the collaborator side of this boundary.

use serde::{Deserialize, Serialize};

/// One anchor as the render pass sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkCandidate {
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// One line of the watch session's input stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PageEvent {
    /// A link was activated (click or page load).
    Activate {
        url: String,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        alt: Option<String>,
    },
    /// The page asks which of its visible links count as visited.
    Render {
        links: Vec<LinkCandidate>,
    },
    /// The page was foregrounded; persisted state may have moved under us,
    /// so the store is re-read before deciding.
    Visible {
        #[serde(default)]
        links: Vec<LinkCandidate>,
    },
}

/// One decision per candidate, in input order.
#[derive(Debug, Serialize, Deserialize)]
pub struct RenderDecisions {
    pub decisions: Vec<bool>,
}
