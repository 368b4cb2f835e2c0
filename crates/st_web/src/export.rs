//! Static export of the whole site.

use std::path::Path;

use st_core::{ContentClient, Listing, Preview, Result, SiteSettings};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::cache::Rendered;
use crate::render::{self, MoreLink};
use crate::state::CommentsConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub listing_pages: usize,
    pub articles: usize,
    pub skipped: usize,
}

/// Write `index.html`, `pages/<n>/index.html` and `post/<uid>/index.html`
/// under `out_dir`. Preview is never on during export.
pub async fn export(
    client: &dyn ContentClient,
    settings: &SiteSettings,
    comments: Option<&CommentsConfig>,
    out_dir: &Path,
) -> Result<ExportSummary> {
    let preview = Preview::off();
    let mut summary = ExportSummary::default();
    fs::create_dir_all(out_dir).await?;

    let mut listing = Listing::load(client, settings, &preview).await?;
    let mut loaded = 1;
    loop {
        let html = render::listing_html(settings, &listing, loaded, &preview, MoreLink::Static);
        let path = if loaded == 1 {
            out_dir.join("index.html")
        } else {
            out_dir.join("pages").join(loaded.to_string()).join("index.html")
        };
        write_page(&path, &html).await?;
        summary.listing_pages += 1;

        if !listing.can_load_more() {
            break;
        }
        listing.load_more(client, settings, &preview).await?;
        loaded += 1;
    }

    for article in listing.results() {
        if !is_path_segment(&article.uid) {
            warn!("Skipping article with unsafe uid {:?}", article.uid);
            summary.skipped += 1;
            continue;
        }
        match render::article(client, settings, comments, &preview, &article.uid).await? {
            Rendered::Html(html) => {
                let path = out_dir.join("post").join(&article.uid).join("index.html");
                write_page(&path, &html).await?;
                summary.articles += 1;
            }
            Rendered::Redirect(_) => {
                debug!("{} vanished during export", article.uid);
                summary.skipped += 1;
            }
        }
    }

    info!(
        "📦 Exported {} listing pages and {} articles to {}",
        summary.listing_pages,
        summary.articles,
        out_dir.display()
    );
    Ok(summary)
}

fn is_path_segment(uid: &str) -> bool {
    !uid.is_empty()
        && uid != "."
        && uid != ".."
        && !uid.contains(['/', '\\'])
}

async fn write_page(path: &Path, html: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, html).await?;
    Ok(())
}
