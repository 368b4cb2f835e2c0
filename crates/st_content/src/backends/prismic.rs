use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use st_core::{ContentClient, Cursor, Document, Error, Predicate, QueryOptions, QueryResponse, Result};
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

/// How long the master ref is reused before asking the API root again.
const MASTER_REF_TTL: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct PrismicConfig {
    /// API root, e.g. `https://my-repo.cdn.prismic.io/api/v2`
    pub endpoint: Url,
    pub access_token: Option<String>,
    pub timeout: Duration,
}

impl PrismicConfig {
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| Error::Config(format!("Invalid content endpoint {}: {}", endpoint, e)))?;
        if endpoint.cannot_be_a_base() {
            return Err(Error::Config(format!("Content endpoint {} cannot be a base URL", endpoint)));
        }
        Ok(Self {
            endpoint,
            access_token: None,
            timeout: Duration::from_secs(10),
        })
    }

    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Debug for PrismicConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrismicConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("access_token", &self.access_token.as_deref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master: bool,
}

#[derive(Debug, Deserialize)]
struct ApiInfo {
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    page: u32,
    next_page: Option<String>,
    results: Vec<Document>,
}

impl From<SearchResponse> for QueryResponse {
    fn from(response: SearchResponse) -> Self {
        Self {
            next_page: response
                .next_page
                .map(|_| Cursor::from_page(response.page + 1)),
            results: response.results,
        }
    }
}

/// Content backend speaking the Prismic v2 REST API.
pub struct PrismicClient {
    client: Arc<Client>,
    config: PrismicConfig,
    master_ref: RwLock<Option<(String, Instant)>>,
}

impl fmt::Debug for PrismicClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrismicClient")
            .field("client", &"<reqwest::Client>")
            .field("endpoint", &self.config.endpoint.as_str())
            .field("access_token", &self.config.access_token.as_deref().map(|_| "<redacted>"))
            .finish()
    }
}

impl PrismicClient {
    pub fn new(config: PrismicConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client: Arc::new(client),
            config,
            master_ref: RwLock::new(None),
        })
    }

    fn api_url(&self) -> Url {
        let mut url = self.config.endpoint.clone();
        if let Some(token) = &self.config.access_token {
            url.query_pairs_mut().append_pair("access_token", token);
        }
        url
    }

    /// Builds `{endpoint}/documents/search` for a query against `reference`.
    fn search_url(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
        reference: &str,
        after_id: Option<&str>,
    ) -> Result<Url> {
        let mut url = self.config.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config("Content endpoint cannot be a base URL".to_string()))?
            .pop_if_empty()
            .push("documents")
            .push("search");

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("ref", reference);
            if !predicates.is_empty() {
                let q = predicates.iter().map(ToString::to_string).collect::<String>();
                query.append_pair("q", &format!("[{}]", q));
            }
            if let Some(page_size) = options.page_size {
                query.append_pair("pageSize", &page_size.to_string());
            }
            if let Some(cursor) = &options.page {
                query.append_pair("page", &cursor.page_number()?.to_string());
            }
            if !options.orderings.is_empty() {
                let orderings = options
                    .orderings
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                query.append_pair("orderings", &format!("[{}]", orderings));
            }
            if let Some(id) = after_id {
                query.append_pair("after", id);
            }
            if !options.fetch.is_empty() {
                query.append_pair("fetch", &options.fetch.join(","));
            }
            if let Some(token) = &self.config.access_token {
                query.append_pair("access_token", token);
            }
        }
        Ok(url)
    }

    async fn master_ref(&self) -> Result<String> {
        if let Some((reference, fetched_at)) = self.master_ref.read().await.as_ref() {
            if fetched_at.elapsed() < MASTER_REF_TTL {
                return Ok(reference.clone());
            }
        }

        let info = self
            .client
            .get(self.api_url())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(http)?
            .json::<ApiInfo>()
            .await
            .map_err(http)?;
        let reference = master_ref_of(info)?;
        *self.master_ref.write().await = Some((reference.clone(), Instant::now()));
        debug!("Using master ref {}", reference);
        Ok(reference)
    }

    async fn search(&self, url: Url) -> Result<QueryResponse> {
        debug!("GET {}", redacted(&url));
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(http)?
            .json::<SearchResponse>()
            .await
            .map_err(http)?;
        Ok(response.into())
    }

    /// The API positions `after` by document id, so the uid is looked up first.
    async fn resolve_after(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
        reference: &str,
    ) -> Result<Option<String>> {
        let Some(uid) = &options.after else {
            return Ok(None);
        };
        let doc_type = document_type_of(predicates).ok_or_else(|| {
            Error::Content("Queries using `after` must filter on document.type".to_string())
        })?;
        let lookup = QueryOptions {
            page_size: Some(1),
            ..Default::default()
        };
        let by_uid = [Predicate::at(format!("my.{}.uid", doc_type), uid.as_str())];
        let url = self.search_url(&by_uid, &lookup, reference, None)?;
        let found = self.search(url).await?;
        Ok(found.results.into_iter().next().map(|doc| doc.id))
    }
}

/// Request URLs carry the access token, so errors drop them.
fn http(e: reqwest::Error) -> Error {
    Error::Http(e.without_url())
}

/// `url` with the access token masked, for logging.
fn redacted(url: &Url) -> Url {
    let mut masked = url.clone();
    if url.query_pairs().any(|(k, _)| k == "access_token") {
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let mut query = masked.query_pairs_mut();
        query.clear();
        for (key, value) in &pairs {
            let value = if key == "access_token" { "<redacted>" } else { value.as_str() };
            query.append_pair(key, value);
        }
    }
    masked
}

fn document_type_of(predicates: &[Predicate]) -> Option<&str> {
    predicates.iter().find_map(|p| match p {
        Predicate::At { path, value } if path == "document.type" => Some(value.as_str()),
        _ => None,
    })
}

fn master_ref_of(info: ApiInfo) -> Result<String> {
    info.refs
        .into_iter()
        .find(|r| r.is_master)
        .map(|r| r.reference)
        .ok_or_else(|| Error::Content("API root lists no master ref".to_string()))
}

#[async_trait]
impl ContentClient for PrismicClient {
    fn name(&self) -> &str {
        "prismic"
    }

    async fn query(&self, predicates: &[Predicate], options: &QueryOptions) -> Result<QueryResponse> {
        let reference = match &options.reference {
            Some(reference) => reference.clone(),
            None => self.master_ref().await?,
        };
        let after_id = self.resolve_after(predicates, options, &reference).await?;
        let url = self.search_url(predicates, options, &reference, after_id.as_deref())?;
        self.search(url).await
    }

    async fn get_by_uid(&self, doc_type: &str, uid: &str, reference: Option<&str>) -> Result<Option<Document>> {
        let options = QueryOptions {
            page_size: Some(1),
            reference: reference.map(str::to_string),
            ..Default::default()
        };
        let predicates = [Predicate::at(format!("my.{}.uid", doc_type), uid)];
        let response = self.query(&predicates, &options).await?;
        Ok(response.results.into_iter().next())
    }
}
