//! Single article resolution: the document, its reading time and its siblings.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::client::{ContentClient, Direction, Ordering, Predicate, QueryOptions};
use crate::config::SiteSettings;
use crate::preview::Preview;
use crate::reading;
use crate::types::{Article, SiblingRef};
use crate::Result;

pub const LISTING_ROOT: &str = "/";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleView {
    pub article: Article,
    pub reading_time: usize,
    /// Next-older article
    pub previous: Option<SiblingRef>,
    /// Next-newer article
    pub next: Option<SiblingRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found(Box<ArticleView>),
    /// The article is gone. Send the reader to this path instead.
    Redirect(String),
}

/// A page whose data may not have arrived yet.
#[derive(Debug, Clone, PartialEq)]
pub enum PageState<T> {
    Pending,
    Ready(T),
}

impl<T> PageState<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, PageState::Pending)
    }
}

/// Resolve the article behind `slug`.
pub async fn resolve(
    client: &dyn ContentClient,
    settings: &SiteSettings,
    preview: &Preview,
    slug: &str,
) -> Result<Resolution> {
    let Some(document) = client
        .get_by_uid(&settings.document_type, slug, preview.content_ref())
        .await?
    else {
        debug!("Article {} not found, redirecting to {}", slug, LISTING_ROOT);
        return Ok(Resolution::Redirect(LISTING_ROOT.to_string()));
    };

    let article = Article::try_from(document)?;
    let (previous, next) = futures::join!(
        sibling(client, settings, preview, slug, Direction::Desc),
        sibling(client, settings, preview, slug, Direction::Asc),
    );

    Ok(Resolution::Found(Box::new(ArticleView {
        reading_time: reading::reading_time(&article.content),
        article,
        previous,
        next,
    })))
}

/// The first article after `slug` in publication order `direction`.
///
/// Anything other than a distinct, well-formed document means no sibling.
pub async fn sibling(
    client: &dyn ContentClient,
    settings: &SiteSettings,
    preview: &Preview,
    slug: &str,
    direction: Direction,
) -> Option<SiblingRef> {
    let options = QueryOptions {
        page_size: Some(1),
        after: Some(slug.to_string()),
        orderings: vec![Ordering::first_publication_date(direction)],
        reference: preview.content_ref().map(str::to_string),
        ..Default::default()
    };
    let predicates = [Predicate::document_type(&settings.document_type)];

    let response = match client.query(&predicates, &options).await {
        Ok(response) => response,
        Err(e) => {
            warn!("Sibling lookup ({:?}) for {} failed: {}", direction, slug, e);
            return None;
        }
    };

    let document = response.results.into_iter().next()?;
    match document.uid.as_deref() {
        Some(uid) if uid != slug => Some(SiblingRef {
            uid: uid.to_string(),
            title: document.text_field("title"),
        }),
        Some(_) => None,
        None => {
            debug!("Sibling document {} has no uid", document.id);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richtext::Block;
    use crate::types::{Document, QueryResponse};
    use crate::Error;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    /// Documents in ascending publication order.
    struct Chronological {
        docs: Vec<Document>,
        echo_self: bool,
    }

    fn doc(uid: &str, day: u32, words: usize) -> Document {
        Document {
            id: format!("id-{}", uid),
            uid: Some(uid.to_string()),
            doc_type: "post".to_string(),
            first_publication_date: Some(Utc.with_ymd_and_hms(2021, 3, day, 12, 0, 0).unwrap()),
            last_publication_date: None,
            data: serde_json::json!({
                "title": format!("Post {}", uid),
                "content": [{
                    "heading": "h",
                    "body": [Block::paragraph(vec!["w"; words].join(" "))]
                }]
            }),
        }
    }

    #[async_trait]
    impl ContentClient for Chronological {
        fn name(&self) -> &str {
            "chronological"
        }

        async fn query(&self, _predicates: &[Predicate], options: &QueryOptions) -> Result<QueryResponse> {
            let mut docs = self.docs.clone();
            if options.orderings[0].direction == Direction::Desc {
                docs.reverse();
            }
            let anchor = options.after.as_deref().unwrap_or_default();
            let position = docs.iter().position(|d| d.uid.as_deref() == Some(anchor));
            let results: Vec<Document> = match position {
                Some(i) => docs.into_iter().skip(i + 1).take(1).collect(),
                None => Vec::new(),
            };
            let results = if self.echo_self && results.is_empty() {
                self.docs.iter().filter(|d| d.uid.as_deref() == Some(anchor)).cloned().collect()
            } else {
                results
            };
            Ok(QueryResponse { results, next_page: None })
        }

        async fn get_by_uid(&self, _doc_type: &str, uid: &str, _reference: Option<&str>) -> Result<Option<Document>> {
            Ok(self.docs.iter().find(|d| d.uid.as_deref() == Some(uid)).cloned())
        }
    }

    fn client(echo_self: bool) -> Chronological {
        Chronological {
            docs: vec![doc("a", 1, 10), doc("b", 2, 201), doc("c", 3, 0)],
            echo_self,
        }
    }

    async fn view(client: &Chronological, slug: &str) -> ArticleView {
        match resolve(client, &SiteSettings::default(), &Preview::off(), slug).await.unwrap() {
            Resolution::Found(view) => *view,
            other => panic!("expected article, got {:?}", other),
        }
    }

    fn uid(sibling: &Option<SiblingRef>) -> Option<&str> {
        sibling.as_ref().map(|s| s.uid.as_str())
    }

    #[tokio::test]
    async fn test_siblings_follow_publication_order() {
        let client = client(false);

        let middle = view(&client, "b").await;
        assert_eq!(uid(&middle.previous), Some("a"));
        assert_eq!(uid(&middle.next), Some("c"));
        assert_eq!(middle.next.as_ref().unwrap().title, "Post c");

        let oldest = view(&client, "a").await;
        assert_eq!(uid(&oldest.previous), None);
        assert_eq!(uid(&oldest.next), Some("b"));

        let newest = view(&client, "c").await;
        assert_eq!(uid(&newest.previous), Some("b"));
        assert_eq!(uid(&newest.next), None);
    }

    #[tokio::test]
    async fn test_self_reference_is_not_a_sibling() {
        let client = client(true);
        let oldest = view(&client, "a").await;
        assert_eq!(oldest.previous, None);
        assert_eq!(uid(&oldest.next), Some("b"));
    }

    #[tokio::test]
    async fn test_reading_time_is_computed() {
        let client = client(false);
        assert_eq!(view(&client, "a").await.reading_time, 1);
        assert_eq!(view(&client, "b").await.reading_time, 2);
        assert_eq!(view(&client, "c").await.reading_time, 0);
    }

    #[tokio::test]
    async fn test_missing_article_redirects_to_listing() {
        let client = client(false);
        let resolution = resolve(&client, &SiteSettings::default(), &Preview::off(), "nope")
            .await
            .unwrap();
        assert_eq!(resolution, Resolution::Redirect("/".to_string()));
    }

    struct Failing;

    #[async_trait]
    impl ContentClient for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn query(&self, _predicates: &[Predicate], _options: &QueryOptions) -> Result<QueryResponse> {
            Err(Error::Content("down".to_string()))
        }

        async fn get_by_uid(&self, _doc_type: &str, _uid: &str, _reference: Option<&str>) -> Result<Option<Document>> {
            Ok(Some(doc("solo", 1, 5)))
        }
    }

    #[tokio::test]
    async fn test_failed_sibling_query_degrades() {
        let resolution = resolve(&Failing, &SiteSettings::default(), &Preview::off(), "solo")
            .await
            .unwrap();
        let Resolution::Found(view) = resolution else {
            panic!("expected article");
        };
        assert_eq!(view.previous, None);
        assert_eq!(view.next, None);
    }

    #[test]
    fn test_page_state() {
        assert!(PageState::<()>::Pending.is_pending());
        assert!(!PageState::Ready(1).is_pending());
    }
}
