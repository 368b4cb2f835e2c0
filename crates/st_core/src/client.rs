use std::fmt;

use async_trait::async_trait;

use crate::types::{Cursor, Document, QueryResponse};
use crate::Result;

/// Filter expression understood by every content backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    At { path: String, value: String },
    Any { path: String, values: Vec<String> },
}

impl Predicate {
    pub fn at(path: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::At {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn any(path: impl Into<String>, values: Vec<String>) -> Self {
        Predicate::Any {
            path: path.into(),
            values,
        }
    }

    pub fn document_type(doc_type: &str) -> Self {
        Self::at("document.type", doc_type)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::At { path, value } => write!(f, "[at({}, {})]", path, quoted(value)?),
            Predicate::Any { path, values } => {
                let values = values
                    .iter()
                    .map(|v| quoted(v))
                    .collect::<std::result::Result<Vec<_>, _>>()?
                    .join(", ");
                write!(f, "[any({}, [{}])]", path, values)
            }
        }
    }
}

/// String literal as the query language expects it, JSON escaping included.
fn quoted(value: &str) -> std::result::Result<String, fmt::Error> {
    serde_json::to_string(value).map_err(|_| fmt::Error)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordering {
    pub field: String,
    pub direction: Direction,
}

impl Ordering {
    pub fn new(field: impl Into<String>, direction: Direction) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn first_publication_date(direction: Direction) -> Self {
        Self::new("document.first_publication_date", direction)
    }
}

impl fmt::Display for Ordering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Direction::Asc => write!(f, "{}", self.field),
            Direction::Desc => write!(f, "{} desc", self.field),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Restricts `data` to these `type.field` paths. Empty means everything.
    pub fetch: Vec<String>,
    pub page_size: Option<u32>,
    pub page: Option<Cursor>,
    /// Only return documents positioned after the document with this uid.
    pub after: Option<String>,
    pub orderings: Vec<Ordering>,
    /// Content release to read from. `None` reads published content.
    pub reference: Option<String>,
}

/// A remote document store.
#[async_trait]
pub trait ContentClient: Send + Sync {
    /// Human readable backend name
    fn name(&self) -> &str;

    /// Query documents matching every predicate.
    async fn query(&self, predicates: &[Predicate], options: &QueryOptions) -> Result<QueryResponse>;

    /// Fetch a single document by its uid, `None` when it does not exist.
    async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
        reference: Option<&str>,
    ) -> Result<Option<Document>>;
}
