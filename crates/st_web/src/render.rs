use st_core::{ContentClient, Listing, PageState, Preview, Resolution, Result, SiteSettings};
use tracing::warn;

use crate::cache::Rendered;
use crate::pages;
use crate::state::CommentsConfig;

/// Upper bound for `/?pages=N`.
pub const MAX_LISTING_PAGES: u32 = 50;

/// How "load more" links are spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoreLink {
    /// `/?pages=N`, served dynamically
    Query,
    /// `/pages/N/`, written by the static export
    Static,
}

impl MoreLink {
    pub fn href(self, pages: u32) -> String {
        match self {
            MoreLink::Query => format!("/?pages={}", pages),
            MoreLink::Static => format!("/pages/{}/", pages),
        }
    }
}

/// The first `pages` listing pages merged.
///
/// Only a failing first page is an error. A later failure stops the merge and
/// stays visible in the listing state. Returns how many pages were merged.
pub async fn merged_listing(
    client: &dyn ContentClient,
    settings: &SiteSettings,
    preview: &Preview,
    pages: u32,
) -> Result<(Listing, u32)> {
    let mut listing = Listing::load(client, settings, preview).await?;
    let mut loaded = 1;
    while loaded < pages.min(MAX_LISTING_PAGES) && listing.can_load_more() {
        if let Err(e) = listing.load_more(client, settings, preview).await {
            warn!("Stopped merging listing at page {}: {}", loaded + 1, e);
            break;
        }
        loaded += 1;
    }
    Ok((listing, loaded))
}

pub fn listing_html(settings: &SiteSettings, listing: &Listing, loaded: u32, preview: &Preview, link: MoreLink) -> String {
    let more = link.href(loaded + 1);
    pages::listing_page(&settings.site_name, listing, preview, Some(&more)).into_string()
}

pub async fn listing(
    client: &dyn ContentClient,
    settings: &SiteSettings,
    preview: &Preview,
    pages: u32,
) -> Result<Rendered> {
    let (listing, loaded) = merged_listing(client, settings, preview, pages).await?;
    Ok(Rendered::Html(listing_html(settings, &listing, loaded, preview, MoreLink::Query)))
}

pub async fn article(
    client: &dyn ContentClient,
    settings: &SiteSettings,
    comments: Option<&CommentsConfig>,
    preview: &Preview,
    slug: &str,
) -> Result<Rendered> {
    Ok(match st_core::article::resolve(client, settings, preview, slug).await? {
        Resolution::Found(view) => Rendered::Html(
            pages::article_gate(&settings.site_name, &PageState::Ready(*view), preview, comments).into_string(),
        ),
        Resolution::Redirect(to) => Rendered::Redirect(to),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_more_link_spelling() {
        assert_eq!(MoreLink::Query.href(3), "/?pages=3");
        assert_eq!(MoreLink::Static.href(3), "/pages/3/");
    }
}
