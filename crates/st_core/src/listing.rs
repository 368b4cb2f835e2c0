//! The article listing: first page, incremental pages and their merge.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::client::{ContentClient, Predicate, QueryOptions};
use crate::config::SiteSettings;
use crate::preview::Preview;
use crate::types::{ArticlePage, ArticleSummary, Cursor};
use crate::{Error, Result};

/// Fetch the first listing page.
pub async fn first_page(
    client: &dyn ContentClient,
    settings: &SiteSettings,
    preview: &Preview,
) -> Result<ArticlePage> {
    fetch_page(client, settings, preview, None).await
}

/// Fetch the listing page `cursor` points at.
pub async fn next_page(
    client: &dyn ContentClient,
    settings: &SiteSettings,
    preview: &Preview,
    cursor: &Cursor,
) -> Result<ArticlePage> {
    fetch_page(client, settings, preview, Some(cursor.clone())).await
}

async fn fetch_page(
    client: &dyn ContentClient,
    settings: &SiteSettings,
    preview: &Preview,
    cursor: Option<Cursor>,
) -> Result<ArticlePage> {
    let options = QueryOptions {
        fetch: settings.summary_fields(),
        page_size: Some(settings.page_size),
        page: cursor,
        reference: preview.content_ref().map(str::to_string),
        ..Default::default()
    };
    let predicates = [Predicate::document_type(&settings.document_type)];
    let response = client.query(&predicates, &options).await?;
    debug!(
        "Fetched {} documents from {} (page {:?}, next {:?})",
        response.results.len(),
        client.name(),
        options.page,
        response.next_page
    );
    ArticlePage::try_from(response)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Loaded,
    Failed { message: String, retryable: bool },
}

/// Ticket for an in-flight incremental load.
#[derive(Debug)]
pub struct PendingLoad {
    cursor: Cursor,
    generation: u64,
}

impl PendingLoad {
    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }
}

/// Articles shown so far plus the cursor to the next page.
///
/// Pages are appended in the order they arrive and a uid is never shown
/// twice. Only one load can be in flight; a second `begin_load` is rejected.
#[derive(Debug, Clone)]
pub struct Listing {
    results: Vec<ArticleSummary>,
    seen: HashSet<String>,
    next_page: Option<Cursor>,
    state: LoadState,
    generation: u64,
}

impl Listing {
    pub fn new(initial: ArticlePage) -> Self {
        let mut listing = Self {
            results: Vec::new(),
            seen: HashSet::new(),
            next_page: None,
            state: LoadState::Idle,
            generation: 0,
        };
        listing.append(initial.results);
        listing.next_page = initial.next_page;
        listing
    }

    /// Build a listing from the first page.
    pub async fn load(
        client: &dyn ContentClient,
        settings: &SiteSettings,
        preview: &Preview,
    ) -> Result<Self> {
        Ok(Self::new(first_page(client, settings, preview).await?))
    }

    pub fn results(&self) -> &[ArticleSummary] {
        &self.results
    }

    pub fn next_page(&self) -> Option<&Cursor> {
        self.next_page.as_ref()
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Whether the load-more affordance should be offered.
    pub fn can_load_more(&self) -> bool {
        self.next_page.is_some() && self.state != LoadState::Loading
    }

    /// Start over from a new first page. Loads still in flight become stale.
    pub fn reset(&mut self, initial: ArticlePage) {
        let generation = self.generation + 1;
        *self = Self::new(initial);
        self.generation = generation;
    }

    pub fn begin_load(&mut self) -> Result<PendingLoad> {
        if self.state == LoadState::Loading {
            return Err(Error::LoadInProgress);
        }
        let cursor = self.next_page.clone().ok_or(Error::NothingToLoad)?;
        self.state = LoadState::Loading;
        Ok(PendingLoad {
            cursor,
            generation: self.generation,
        })
    }

    /// Apply the outcome of a load started with [`Listing::begin_load`].
    ///
    /// Returns how many articles were appended. Stale tickets are dropped.
    pub fn complete(&mut self, pending: PendingLoad, outcome: Result<ArticlePage>) -> Result<usize> {
        if pending.generation != self.generation || self.state != LoadState::Loading {
            warn!("Discarding stale page load for cursor {}", pending.cursor);
            return Ok(0);
        }

        match outcome {
            Ok(page) => {
                let added = self.append(page.results);
                self.next_page = page.next_page;
                self.state = LoadState::Loaded;
                Ok(added)
            }
            Err(e) => {
                self.state = LoadState::Failed {
                    message: e.to_string(),
                    retryable: e.is_retryable(),
                };
                Err(e)
            }
        }
    }

    /// Fetch and merge the next page.
    pub async fn load_more(
        &mut self,
        client: &dyn ContentClient,
        settings: &SiteSettings,
        preview: &Preview,
    ) -> Result<usize> {
        let pending = self.begin_load()?;
        let outcome = next_page(client, settings, preview, pending.cursor()).await;
        self.complete(pending, outcome)
    }

    /// Keep loading until the backend is exhausted.
    pub async fn load_all(
        &mut self,
        client: &dyn ContentClient,
        settings: &SiteSettings,
        preview: &Preview,
    ) -> Result<()> {
        while self.can_load_more() {
            self.load_more(client, settings, preview).await?;
        }
        info!("📚 Listing drained: {} articles", self.results.len());
        Ok(())
    }

    pub fn into_page(self) -> ArticlePage {
        ArticlePage {
            results: self.results,
            next_page: self.next_page,
        }
    }

    fn append(&mut self, incoming: Vec<ArticleSummary>) -> usize {
        let mut added = 0;
        for summary in incoming {
            if self.seen.insert(summary.uid.clone()) {
                self.results.push(summary);
                added += 1;
            } else {
                warn!("Skipping article {} already in the listing", summary.uid);
            }
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Document, QueryResponse};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Serves fixed pages of uids; the cursor is the 1-based page number.
    struct PagedClient {
        pages: Vec<Vec<&'static str>>,
        fail_next: Mutex<bool>,
        seen_refs: Mutex<Vec<Option<String>>>,
    }

    impl PagedClient {
        fn new(pages: Vec<Vec<&'static str>>) -> Self {
            Self {
                pages,
                fail_next: Mutex::new(false),
                seen_refs: Mutex::new(Vec::new()),
            }
        }
    }

    fn doc(uid: &str) -> Document {
        Document {
            id: format!("id-{}", uid),
            uid: Some(uid.to_string()),
            doc_type: "post".to_string(),
            first_publication_date: None,
            last_publication_date: None,
            data: serde_json::json!({ "title": uid.to_uppercase() }),
        }
    }

    #[async_trait]
    impl ContentClient for PagedClient {
        fn name(&self) -> &str {
            "paged"
        }

        async fn query(&self, _predicates: &[Predicate], options: &QueryOptions) -> Result<QueryResponse> {
            self.seen_refs.lock().unwrap().push(options.reference.clone());
            if std::mem::take(&mut *self.fail_next.lock().unwrap()) {
                return Err(Error::Content("backend unavailable".to_string()));
            }
            let page = match &options.page {
                Some(cursor) => cursor.page_number()?,
                None => 1,
            };
            let results = self.pages[(page - 1) as usize].iter().map(|uid| doc(uid)).collect();
            let next_page = ((page as usize) < self.pages.len()).then(|| Cursor::from_page(page + 1));
            Ok(QueryResponse { results, next_page })
        }

        async fn get_by_uid(&self, _doc_type: &str, _uid: &str, _reference: Option<&str>) -> Result<Option<Document>> {
            Ok(None)
        }
    }

    fn uids(listing: &Listing) -> Vec<&str> {
        listing.results().iter().map(|a| a.uid.as_str()).collect()
    }

    #[tokio::test]
    async fn test_incremental_loads_until_exhausted() {
        let client = PagedClient::new(vec![vec!["a"], vec!["b"], vec!["c"]]);
        let settings = SiteSettings::default().with_page_size(1);
        let preview = Preview::off();

        let mut listing = Listing::load(&client, &settings, &preview).await.unwrap();
        assert_eq!(uids(&listing), vec!["a"]);
        assert!(listing.can_load_more());

        listing.load_more(&client, &settings, &preview).await.unwrap();
        assert_eq!(uids(&listing), vec!["a", "b"]);
        assert!(listing.next_page().is_some());

        listing.load_more(&client, &settings, &preview).await.unwrap();
        assert_eq!(uids(&listing), vec!["a", "b", "c"]);
        assert!(listing.next_page().is_none());
        assert!(!listing.can_load_more());
        assert!(matches!(
            listing.load_more(&client, &settings, &preview).await,
            Err(Error::NothingToLoad)
        ));
    }

    #[test]
    fn test_overlapping_load_is_rejected() {
        let mut listing = Listing::new(ArticlePage {
            results: vec![],
            next_page: Some(Cursor::from_page(2)),
        });
        let pending = listing.begin_load().unwrap();
        assert_eq!(pending.cursor(), &Cursor::from_page(2));
        assert_eq!(listing.state(), &LoadState::Loading);
        assert!(!listing.can_load_more());
        assert!(matches!(listing.begin_load(), Err(Error::LoadInProgress)));
    }

    #[test]
    fn test_merge_skips_duplicate_uids() {
        let summary = |uid: &str| ArticleSummary {
            uid: uid.to_string(),
            first_publication_date: None,
            title: String::new(),
            subtitle: String::new(),
            author: String::new(),
        };
        let mut listing = Listing::new(ArticlePage {
            results: vec![summary("a"), summary("b")],
            next_page: Some(Cursor::from_page(2)),
        });
        let pending = listing.begin_load().unwrap();
        let added = listing
            .complete(
                pending,
                Ok(ArticlePage {
                    results: vec![summary("b"), summary("c")],
                    next_page: None,
                }),
            )
            .unwrap();
        assert_eq!(added, 1);
        assert_eq!(uids(&listing), vec!["a", "b", "c"]);
        assert_eq!(listing.state(), &LoadState::Loaded);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_results_and_can_retry() {
        let client = PagedClient::new(vec![vec!["a"], vec!["b"]]);
        let settings = SiteSettings::default().with_page_size(1);
        let preview = Preview::off();
        let mut listing = Listing::load(&client, &settings, &preview).await.unwrap();

        *client.fail_next.lock().unwrap() = true;
        assert!(listing.load_more(&client, &settings, &preview).await.is_err());
        assert!(matches!(listing.state(), LoadState::Failed { retryable: false, .. }));
        assert_eq!(uids(&listing), vec!["a"]);
        assert_eq!(listing.next_page(), Some(&Cursor::from_page(2)));
        assert!(listing.can_load_more());

        listing.load_more(&client, &settings, &preview).await.unwrap();
        assert_eq!(uids(&listing), vec!["a", "b"]);
    }

    #[test]
    fn test_stale_completion_after_reset_is_ignored() {
        let mut listing = Listing::new(ArticlePage {
            results: vec![],
            next_page: Some(Cursor::from_page(2)),
        });
        let pending = listing.begin_load().unwrap();
        listing.reset(ArticlePage::default());

        let added = listing.complete(pending, Ok(ArticlePage::default())).unwrap();
        assert_eq!(added, 0);
        assert_eq!(listing.state(), &LoadState::Idle);
    }

    #[tokio::test]
    async fn test_preview_reference_is_forwarded() {
        let client = PagedClient::new(vec![vec!["a"], vec!["b"]]);
        let settings = SiteSettings::default();

        let mut listing = Listing::load(&client, &settings, &Preview::on(Some("draft".into())))
            .await
            .unwrap();
        listing.load_all(&client, &settings, &Preview::off()).await.unwrap();

        let refs = client.seen_refs.lock().unwrap().clone();
        assert_eq!(refs, vec![Some("draft".to_string()), None]);
    }
}
