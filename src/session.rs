//! Long-running page session.
//!
//! Reads page events as JSON lines from stdin, buffers activations through
//! the store, and lets the debounce deadline coalesce bursts into single
//! flushes. Ctrl-C flushes whatever is still pending before exit.

use anyhow::Result;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::config::TrackerConfig;
use crate::debounce::Debouncer;
use crate::events::{PageEvent, RenderDecisions};
use crate::matcher::render_pass;
use crate::storage::{JsonFileStorage, StorageBackend, KEY_HIGHLIGHT_ENABLED};
use crate::store::VisitedStore;
use crate::validity::ValidityFilter;

pub async fn run(config: &TrackerConfig, page_url: Option<&str>) -> Result<()> {
    let backend = JsonFileStorage::new(config.storage_path()?);

    // Page-level gate: on excluded hosts the tracker stays idle entirely.
    if let Some(url) = page_url {
        let validity = ValidityFilter::new(&config.excluded_hosts);
        if validity.is_excluded_host(url) {
            info!("🚫 host of {} is excluded, tracker idle", url);
            return Ok(());
        }
    }

    let mut store = VisitedStore::load(&backend, config)?;
    let highlight_enabled = backend.load_flag(KEY_HIGHLIGHT_ENABLED, true)?;

    // Startup maintenance: drop entries stored under an earlier, laxer
    // blacklist.
    let report = store.clean(&backend)?;
    if report.total_removed() > 0 {
        info!("🧹 startup clean removed {} entries", report.total_removed());
    }

    let mut debouncer = Debouncer::new(config.quiet_period());

    // The page load itself counts as an activation.
    if let Some(url) = page_url {
        if store.record(url, None, None) {
            debouncer.arm(Instant::now());
        }
    }

    info!(
        "👀 watching for events ({} links, {} titles, {} alts known)",
        store.links().len(),
        store.titles().len(),
        store.alts().len()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let deadline = debouncer
            .deadline()
            .map(tokio::time::Instant::from_std)
            .unwrap_or_else(|| tokio::time::Instant::now() + std::time::Duration::from_secs(3600));

        tokio::select! {
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<PageEvent>(&line) {
                            Ok(event) => handle_event(event, &mut store, &backend, &mut debouncer, highlight_enabled)?,
                            Err(e) => warn!("⚠️  skipping malformed event line: {}", e),
                        }
                    }
                    Ok(None) => {
                        debug!("event stream closed");
                        break;
                    }
                    Err(e) => {
                        warn!("⚠️  event stream read error: {}", e);
                        break;
                    }
                }
            }
            _ = tokio::time::sleep_until(deadline), if debouncer.is_armed() => {
                if debouncer.fire_if_due(Instant::now()) {
                    flush_with_retry(&mut store, &backend, &mut debouncer);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("🛑 shutting down session...");
                break;
            }
        }
    }

    // Final flush so a pending burst is not lost with the session.
    if store.has_pending() {
        if let Err(e) = store.flush(&backend) {
            warn!("⚠️  final flush failed, pending entries lost with session: {}", e);
        }
    }

    Ok(())
}

fn handle_event(
    event: PageEvent,
    store: &mut VisitedStore,
    backend: &dyn StorageBackend,
    debouncer: &mut Debouncer,
    highlight_enabled: bool,
) -> Result<()> {
    match event {
        PageEvent::Activate { url, title, alt } => {
            if store.record(&url, title.as_deref(), alt.as_deref()) {
                debouncer.arm(Instant::now());
            }
        }
        PageEvent::Render { links } => {
            emit_decisions(render_pass(store, &links, highlight_enabled))?;
        }
        PageEvent::Visible { links } => {
            // another tab may have flushed while this page was backgrounded
            if let Err(e) = store.reload(backend) {
                warn!("⚠️  could not re-read persisted state: {}", e);
            }
            emit_decisions(render_pass(store, &links, highlight_enabled))?;
        }
    }
    Ok(())
}

fn emit_decisions(decisions: Vec<bool>) -> Result<()> {
    let line = serde_json::to_string(&RenderDecisions { decisions })?;
    println!("{}", line);
    Ok(())
}

/// A failed flush keeps the buffers; re-arm so the write is retried after
/// another quiet period even without further activations.
fn flush_with_retry(
    store: &mut VisitedStore,
    backend: &dyn StorageBackend,
    debouncer: &mut Debouncer,
) {
    if let Err(e) = store.flush(backend) {
        let (links, titles, alts) = store.pending_counts();
        warn!(
            "⚠️  flush failed, keeping {} pending entries for retry: {:?}",
            links + titles + alts,
            e
        );
        debouncer.arm(Instant::now());
    }
}
