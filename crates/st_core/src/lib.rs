pub mod article;
pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod listing;
pub mod preview;
pub mod reading;
pub mod richtext;
pub mod types;

pub use article::{ArticleView, PageState, Resolution};
pub use client::{ContentClient, Direction, Ordering, Predicate, QueryOptions};
pub use config::SiteSettings;
pub use error::{Error, Result};
pub use listing::{Listing, LoadState, PendingLoad};
pub use preview::{Preview, PreviewAction};
pub use types::{Article, ArticlePage, ArticleSummary, ContentSection, Cursor, Document, QueryResponse, SiblingRef};
