use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::richtext::Block;
use crate::{Error, Result};

/// A document as returned by the content backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: String,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub first_publication_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub last_publication_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Backends emit both RFC 3339 and `+0000` style offsets.
mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        DateTime::parse_from_rfc3339(&raw)
            .or_else(|_| DateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%z"))
            .map(|date| Some(date.with_timezone(&Utc)))
            .map_err(de::Error::custom)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Document {
    /// Reads a string field from `data`, empty when absent.
    pub fn text_field(&self, name: &str) -> String {
        self.data
            .get(name)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }
}

/// Opaque pagination token handed out by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn from_page(page: u32) -> Self {
        Self(page.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interprets the token as a 1-based page number.
    pub fn page_number(&self) -> Result<u32> {
        match self.0.parse::<u32>() {
            Ok(page) if page >= 1 => Ok(page),
            _ => Err(Error::InvalidCursor(self.0.clone())),
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw response of a content query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResponse {
    pub results: Vec<Document>,
    pub next_page: Option<Cursor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub uid: String,
    pub first_publication_date: Option<DateTime<Utc>>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

impl TryFrom<&Document> for ArticleSummary {
    type Error = Error;

    fn try_from(doc: &Document) -> Result<Self> {
        let uid = doc
            .uid
            .clone()
            .ok_or_else(|| Error::Content(format!("Document {} has no uid", doc.id)))?;
        Ok(Self {
            uid,
            first_publication_date: doc.first_publication_date,
            title: doc.text_field("title"),
            subtitle: doc.text_field("subtitle"),
            author: doc.text_field("author"),
        })
    }
}

/// One slice of the listing. `next_page` is `None` once the backend is exhausted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticlePage {
    pub results: Vec<ArticleSummary>,
    pub next_page: Option<Cursor>,
}

impl TryFrom<QueryResponse> for ArticlePage {
    type Error = Error;

    fn try_from(response: QueryResponse) -> Result<Self> {
        let results = response
            .results
            .iter()
            .map(ArticleSummary::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            results,
            next_page: response.next_page,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentSection {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub heading: String,
    #[serde(default)]
    pub body: Vec<Block>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Banner {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ArticleData {
    #[serde(default, deserialize_with = "null_as_empty")]
    title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    subtitle: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    author: String,
    #[serde(default)]
    banner: Option<Banner>,
    #[serde(default)]
    content: Vec<ContentSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub uid: String,
    pub first_publication_date: Option<DateTime<Utc>>,
    pub last_publication_date: Option<DateTime<Utc>>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub banner_url: String,
    pub content: Vec<ContentSection>,
}

impl TryFrom<Document> for Article {
    type Error = Error;

    fn try_from(doc: Document) -> Result<Self> {
        let uid = doc
            .uid
            .ok_or_else(|| Error::Content(format!("Document {} has no uid", doc.id)))?;
        let data: ArticleData = if doc.data.is_null() {
            ArticleData::default()
        } else {
            serde_json::from_value(doc.data)?
        };
        Ok(Self {
            uid,
            first_publication_date: doc.first_publication_date,
            last_publication_date: doc.last_publication_date,
            title: data.title,
            subtitle: data.subtitle,
            author: data.author,
            banner_url: data.banner.and_then(|b| b.url).unwrap_or_default(),
            content: data.content,
        })
    }
}

/// Link to a chronologically adjacent article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiblingRef {
    pub uid: String,
    pub title: String,
}
