use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use st_core::{
    ContentClient, Cursor, Direction, Document, Error, Ordering, Predicate, QueryOptions,
    QueryResponse, Result,
};
use tokio::sync::RwLock;
use tracing::debug;

use crate::DEFAULT_PAGE_SIZE;

/// Fixture file layout: a bare list of published documents, or published
/// documents plus draft releases keyed by preview reference.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Fixtures {
    Documents(Vec<Document>),
    Full {
        documents: Vec<Document>,
        #[serde(default)]
        releases: HashMap<String, Vec<Document>>,
    },
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Vec<Document>,
    releases: HashMap<String, Vec<Document>>,
}

impl MemoryStore {
    pub fn upsert(&mut self, document: Document) {
        upsert_into(&mut self.documents, document);
    }

    pub fn stage(&mut self, reference: &str, document: Document) {
        upsert_into(self.releases.entry(reference.to_string()).or_default(), document);
    }

    /// Published documents with the release for `reference` laid over them.
    fn view(&self, reference: Option<&str>) -> Vec<Document> {
        let mut documents = self.documents.clone();
        if let Some(drafts) = reference.and_then(|r| self.releases.get(r)) {
            for draft in drafts {
                upsert_into(&mut documents, draft.clone());
            }
        }
        documents
    }

    fn query(&self, predicates: &[Predicate], options: &QueryOptions) -> Result<QueryResponse> {
        let page = match &options.page {
            Some(cursor) => cursor.page_number()?,
            None => 1,
        };
        let page_size = options.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1) as usize;

        let mut matching: Vec<Document> = self
            .view(options.reference.as_deref())
            .into_iter()
            .filter(|doc| predicates.iter().all(|p| matches(doc, p)))
            .collect();

        if !options.orderings.is_empty() {
            matching.sort_by(|a, b| compare(a, b, &options.orderings));
        }

        // An unknown anchor leaves the result set untouched.
        if let Some(anchor) = &options.after {
            if let Some(position) = matching.iter().position(|d| d.uid.as_deref() == Some(anchor.as_str())) {
                matching.drain(..=position);
            }
        }

        let start = (page as usize - 1) * page_size;
        let has_more = matching.len() > start + page_size;
        let results = matching
            .into_iter()
            .skip(start)
            .take(page_size)
            .map(|doc| project(doc, &options.fetch))
            .collect();

        Ok(QueryResponse {
            results,
            next_page: has_more.then(|| Cursor::from_page(page + 1)),
        })
    }
}

fn upsert_into(documents: &mut Vec<Document>, document: Document) {
    match documents.iter_mut().find(|d| d.id == document.id) {
        Some(existing) => *existing = document,
        None => documents.push(document),
    }
}

/// Resolves a predicate path such as `document.type` or `my.post.uid`.
fn field(doc: &Document, path: &str) -> Option<String> {
    match path {
        "document.type" => Some(doc.doc_type.clone()),
        "document.id" => Some(doc.id.clone()),
        _ => {
            let rest = path.strip_prefix("my.")?;
            let (doc_type, name) = rest.split_once('.')?;
            if doc_type != doc.doc_type {
                return None;
            }
            if name == "uid" {
                return doc.uid.clone();
            }
            doc.data.get(name).and_then(|v| v.as_str()).map(str::to_string)
        }
    }
}

fn matches(doc: &Document, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::At { path, value } => field(doc, path).as_deref() == Some(value.as_str()),
        Predicate::Any { path, values } => field(doc, path).map_or(false, |v| values.contains(&v)),
    }
}

fn compare(a: &Document, b: &Document, orderings: &[Ordering]) -> CmpOrdering {
    for ordering in orderings {
        let order = match ordering.field.as_str() {
            "document.first_publication_date" => a.first_publication_date.cmp(&b.first_publication_date),
            "document.last_publication_date" => a.last_publication_date.cmp(&b.last_publication_date),
            path => field(a, path).cmp(&field(b, path)),
        };
        let order = match ordering.direction {
            Direction::Asc => order,
            Direction::Desc => order.reverse(),
        };
        if order != CmpOrdering::Equal {
            return order;
        }
    }
    CmpOrdering::Equal
}

/// Keeps only the `type.field` entries listed in `fetch`.
fn project(mut doc: Document, fetch: &[String]) -> Document {
    if fetch.is_empty() {
        return doc;
    }
    if let Some(data) = doc.data.as_object_mut() {
        let prefix = format!("{}.", doc.doc_type);
        data.retain(|key, _| fetch.iter().any(|f| f.strip_prefix(&prefix) == Some(key.as_str())));
    }
    doc
}

/// In-process content backend, used for fixtures, demos and tests.
#[derive(Clone, Default)]
pub struct MemoryContentClient {
    store: Arc<RwLock<MemoryStore>>,
}

impl MemoryContentClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(documents: Vec<Document>) -> Self {
        let store = MemoryStore {
            documents,
            releases: HashMap::new(),
        };
        Self {
            store: Arc::new(RwLock::new(store)),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let store = match serde_json::from_str::<Fixtures>(json)? {
            Fixtures::Documents(documents) => MemoryStore {
                documents,
                releases: HashMap::new(),
            },
            Fixtures::Full { documents, releases } => MemoryStore { documents, releases },
        };
        Ok(Self {
            store: Arc::new(RwLock::new(store)),
        })
    }

    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await?;
        let client = Self::from_json(&json)
            .map_err(|e| Error::Config(format!("Invalid fixtures in {}: {}", path.display(), e)))?;
        debug!("Loaded fixtures from {}", path.display());
        Ok(client)
    }

    pub async fn upsert(&self, document: Document) {
        self.store.write().await.upsert(document);
    }

    /// Stage a draft that is only visible through `reference`.
    pub async fn stage(&self, reference: &str, document: Document) {
        self.store.write().await.stage(reference, document);
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.documents.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ContentClient for MemoryContentClient {
    fn name(&self) -> &str {
        "memory"
    }

    async fn query(&self, predicates: &[Predicate], options: &QueryOptions) -> Result<QueryResponse> {
        let store = self.store.read().await;
        store.query(predicates, options)
    }

    async fn get_by_uid(&self, doc_type: &str, uid: &str, reference: Option<&str>) -> Result<Option<Document>> {
        let store = self.store.read().await;
        Ok(store
            .view(reference)
            .into_iter()
            .find(|d| d.doc_type == doc_type && d.uid.as_deref() == Some(uid)))
    }
}
