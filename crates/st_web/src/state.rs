use std::collections::HashSet;
use std::sync::Arc;

use st_core::{ContentClient, SiteSettings};
use tokio::sync::RwLock;

use crate::cache::RenderCache;

/// utterances-style comment widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentsConfig {
    pub repo: String,
    pub issue_term: String,
    pub theme: String,
}

impl CommentsConfig {
    pub fn new(repo: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            issue_term: "pathname".to_string(),
            theme: "github-dark".to_string(),
        }
    }
}

pub struct AppState {
    pub client: Arc<dyn ContentClient>,
    pub settings: SiteSettings,
    pub comments: Option<CommentsConfig>,
    pub cache: RenderCache,
    /// Slugs rendered ahead of time; any other slug is materialized lazily.
    pub prebuilt: RwLock<HashSet<String>>,
}

impl AppState {
    pub fn new(client: Arc<dyn ContentClient>, settings: SiteSettings) -> Self {
        Self {
            client,
            settings,
            comments: None,
            cache: RenderCache::new(),
            prebuilt: RwLock::new(HashSet::new()),
        }
    }

    pub fn with_comments(mut self, comments: Option<CommentsConfig>) -> Self {
        self.comments = comments;
        self
    }

    pub fn with_cache(mut self, cache: RenderCache) -> Self {
        self.cache = cache;
        self
    }

    pub async fn is_prebuilt(&self, slug: &str) -> bool {
        self.prebuilt.read().await.contains(slug)
    }
}
