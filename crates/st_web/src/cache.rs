//! Rendered pages kept for a revalidation window, then regenerated in the
//! background while the stale copy keeps being served.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::debug;

/// Redirects kept before the oldest ones are dropped. Unknown slugs resolve
/// to redirects, so without a bound anyone can grow the cache at will.
pub const MAX_REDIRECTS: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Html(String),
    Redirect(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Fresh(Rendered),
    Stale(Rendered),
    /// Someone is materializing this page right now.
    Pending,
    Miss,
}

#[derive(Debug)]
struct Entry {
    rendered: Option<Rendered>,
    rendered_at: Instant,
    refreshing: bool,
}

#[derive(Debug)]
pub struct RenderCache {
    entries: RwLock<HashMap<String, Entry>>,
    redirect_limit: usize,
}

impl Default for RenderCache {
    fn default() -> Self {
        Self::with_redirect_limit(MAX_REDIRECTS)
    }
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_redirect_limit(redirect_limit: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            redirect_limit,
        }
    }

    pub async fn lookup(&self, key: &str, window: Duration) -> Lookup {
        let entries = self.entries.read().await;
        match entries.get(key) {
            None => Lookup::Miss,
            Some(Entry { rendered: None, .. }) => Lookup::Pending,
            Some(Entry {
                rendered: Some(rendered),
                rendered_at,
                ..
            }) => {
                if rendered_at.elapsed() < window {
                    Lookup::Fresh(rendered.clone())
                } else {
                    Lookup::Stale(rendered.clone())
                }
            }
        }
    }

    pub async fn insert(&self, key: &str, rendered: Rendered) {
        let is_redirect = matches!(rendered, Rendered::Redirect(_));
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            Entry {
                rendered: Some(rendered),
                rendered_at: Instant::now(),
                refreshing: false,
            },
        );
        if is_redirect {
            evict_redirects(&mut entries, self.redirect_limit);
        }
    }

    /// Claim an empty slot for lazy materialization. False if the key exists.
    pub async fn mark_pending(&self, key: &str) -> bool {
        let mut entries = self.entries.write().await;
        if entries.contains_key(key) {
            return false;
        }
        entries.insert(
            key.to_string(),
            Entry {
                rendered: None,
                rendered_at: Instant::now(),
                refreshing: true,
            },
        );
        true
    }

    /// Claim the right to regenerate a stale entry. Only one caller wins.
    pub async fn begin_refresh(&self, key: &str) -> bool {
        let mut entries = self.entries.write().await;
        match entries.get_mut(key) {
            Some(entry) if !entry.refreshing => {
                entry.refreshing = true;
                true
            }
            _ => false,
        }
    }

    /// A regeneration failed: drop pending slots, keep serving stale pages.
    pub async fn abandon(&self, key: &str) {
        let mut entries = self.entries.write().await;
        let pending = match entries.get_mut(key) {
            Some(entry) if entry.rendered.is_some() => {
                entry.refreshing = false;
                false
            }
            Some(_) => true,
            None => false,
        };
        if pending {
            entries.remove(key);
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Drop the oldest redirects until at most `limit` remain.
fn evict_redirects(entries: &mut HashMap<String, Entry>, limit: usize) {
    let mut redirects: Vec<(Instant, String)> = entries
        .iter()
        .filter(|(_, entry)| matches!(entry.rendered, Some(Rendered::Redirect(_))))
        .map(|(key, entry)| (entry.rendered_at, key.clone()))
        .collect();
    if redirects.len() <= limit {
        return;
    }
    redirects.sort();
    let excess = redirects.len() - limit;
    for (_, key) in redirects.into_iter().take(excess) {
        debug!("Evicting cached redirect {}", key);
        entries.remove(&key);
    }
}
