use std::time::Duration;

use crate::{Error, Result};

pub const DEFAULT_DOCUMENT_TYPE: &str = "post";
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const LISTING_REVALIDATE: Duration = Duration::from_secs(60);
pub const ARTICLE_REVALIDATE: Duration = Duration::from_secs(30 * 60);

/// Settings shared by every page resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteSettings {
    pub site_name: String,
    pub document_type: String,
    pub page_size: u32,
    pub listing_revalidate: Duration,
    pub article_revalidate: Duration,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            site_name: "spacetraveling".to_string(),
            document_type: DEFAULT_DOCUMENT_TYPE.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            listing_revalidate: LISTING_REVALIDATE,
            article_revalidate: ARTICLE_REVALIDATE,
        }
    }
}

impl SiteSettings {
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_document_type(mut self, document_type: impl Into<String>) -> Self {
        self.document_type = document_type.into();
        self
    }

    /// Fields requested for the listing projection.
    pub fn summary_fields(&self) -> Vec<String> {
        ["title", "subtitle", "author"]
            .iter()
            .map(|field| format!("{}.{}", self.document_type, field))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::Config("page size must be at least 1".to_string()));
        }
        if self.document_type.trim().is_empty() {
            return Err(Error::Config("document type must not be empty".to_string()));
        }
        Ok(())
    }
}
