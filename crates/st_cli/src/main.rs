use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use st_content::{create_client, BackendKind, BackendOptions};
use st_core::config::{DEFAULT_DOCUMENT_TYPE, DEFAULT_PAGE_SIZE};
use st_core::format::{edited_stamp, publication_date};
use st_core::{article, ArticleSummary, ContentClient, Listing, Preview, Resolution, SiteSettings};
use st_web::{create_app, export, handlers, AppState, CommentsConfig};
use tracing::info;

mod logging;

#[derive(Debug, Clone, PartialEq, Eq)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    /// `90`, `45s`, `30m`, `1h15m`. A bare number is seconds.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total_seconds = 0u64;
        let mut current_number = String::new();

        for c in s.trim().chars() {
            if c.is_ascii_digit() {
                current_number.push(c);
                continue;
            }
            let num: u64 = current_number
                .parse()
                .map_err(|_| format!("Expected a number before '{}' in {:?}", c, s))?;
            let unit = match c {
                's' => 1,
                'm' => 60,
                'h' => 3600,
                'd' => 86400,
                _ => return Err(format!("Invalid duration unit: {}", c)),
            };
            total_seconds = num
                .checked_mul(unit)
                .and_then(|secs| total_seconds.checked_add(secs))
                .ok_or_else(|| format!("Duration too large: {}", s))?;
            current_number.clear();
        }

        if !current_number.is_empty() {
            let secs = current_number
                .parse::<u64>()
                .map_err(|_| "Invalid number in duration".to_string())?;
            total_seconds = total_seconds
                .checked_add(secs)
                .ok_or_else(|| format!("Duration too large: {}", s))?;
        } else if total_seconds == 0 && s.trim().is_empty() {
            return Err("Duration must include a number".to_string());
        }

        Ok(HumanDuration(Duration::from_secs(total_seconds)))
    }
}

#[derive(Parser, Debug)]
#[command(name = "spacetraveling", author, version, about = "Blog frontend for a headless CMS", long_about = None)]
pub struct Cli {
    /// Content backend: memory or prismic
    #[arg(long, env = "ST_BACKEND", default_value = "memory")]
    backend: String,
    /// Repository API endpoint, e.g. https://my-repo.cdn.prismic.io/api/v2
    #[arg(long, env = "ST_ENDPOINT")]
    endpoint: Option<String>,
    #[arg(long, env = "ST_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,
    /// JSON documents seeding the memory backend
    #[arg(long, env = "ST_FIXTURES")]
    fixtures: Option<PathBuf>,
    #[arg(long, env = "ST_DOCUMENT_TYPE", default_value = DEFAULT_DOCUMENT_TYPE)]
    document_type: String,
    #[arg(long, env = "ST_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: u32,
    /// Backend request timeout (e.g. 10s)
    #[arg(long, env = "ST_TIMEOUT", default_value = "10s")]
    timeout: HumanDuration,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug, Clone)]
struct CommentsArgs {
    /// GitHub repository backing the comment widget (owner/name)
    #[arg(long, env = "ST_COMMENTS_REPO")]
    comments_repo: Option<String>,
    #[arg(long, default_value = "pathname")]
    comments_issue_term: String,
    #[arg(long, default_value = "github-dark")]
    comments_theme: String,
}

impl CommentsArgs {
    fn config(&self) -> Option<CommentsConfig> {
        self.comments_repo.as_ref().map(|repo| CommentsConfig {
            repo: repo.clone(),
            issue_term: self.comments_issue_term.clone(),
            theme: self.comments_theme.clone(),
        })
    }
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Serve the site over HTTP
    Serve {
        #[arg(long, env = "ST_ADDR", default_value = "127.0.0.1:3000")]
        addr: SocketAddr,
        /// Render the home page and its articles before accepting requests
        #[arg(long)]
        prebuild: bool,
        #[arg(long, default_value = "60s")]
        listing_revalidate: HumanDuration,
        #[arg(long, default_value = "30m")]
        article_revalidate: HumanDuration,
        #[command(flatten)]
        comments: CommentsArgs,
    },
    /// Write the whole site as static HTML
    Build {
        #[arg(long, default_value = "dist")]
        out: PathBuf,
        #[command(flatten)]
        comments: CommentsArgs,
    },
    /// Print every article, page by page
    Posts {
        /// Preview reference; shows drafts staged under it
        #[arg(long)]
        preview: Option<String>,
    },
    /// Print one article with its reading time and siblings
    Post {
        slug: String,
        #[arg(long)]
        preview: Option<String>,
    },
}

fn preview_for(reference: Option<String>) -> Preview {
    match reference {
        Some(reference) => Preview::on(Some(reference)),
        None => Preview::off(),
    }
}

fn print_summary(summary: &ArticleSummary) {
    let date = summary
        .first_publication_date
        .as_ref()
        .map(publication_date)
        .unwrap_or_else(|| "rascunho".to_string());
    println!("  {:<12} {:<32} {} ({})", date, summary.uid, summary.title, summary.author);
}

async fn list_posts(client: &dyn ContentClient, settings: &SiteSettings, preview: &Preview) -> anyhow::Result<()> {
    let mut listing = Listing::load(client, settings, preview).await?;
    let mut page = 1;
    let mut printed = 0;

    loop {
        println!("Page {}", page);
        for summary in &listing.results()[printed..] {
            print_summary(summary);
        }
        printed = listing.results().len();

        if !listing.can_load_more() {
            break;
        }
        listing.load_more(client, settings, preview).await?;
        page += 1;
    }

    info!("📚 {} articles in {} pages", printed, page);
    Ok(())
}

async fn show_post(
    client: &dyn ContentClient,
    settings: &SiteSettings,
    preview: &Preview,
    slug: &str,
) -> anyhow::Result<()> {
    let view = match article::resolve(client, settings, preview, slug).await? {
        Resolution::Found(view) => view,
        Resolution::Redirect(_) => bail!("No article with slug {:?}", slug),
    };
    let article = &view.article;

    println!("{}", article.title);
    if !article.subtitle.is_empty() {
        println!("{}", article.subtitle);
    }
    let date = article
        .first_publication_date
        .as_ref()
        .map(publication_date)
        .unwrap_or_else(|| "rascunho".to_string());
    println!("{} · {} · {} min", date, article.author, view.reading_time);
    if let Some(edited) = &article.last_publication_date {
        println!("{}", edited_stamp(edited));
    }
    if let Some(previous) = &view.previous {
        println!("Post anterior: {} ({})", previous.title, previous.uid);
    }
    if let Some(next) = &view.next {
        println!("Próximo post: {} ({})", next.title, next.uid);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let kind: BackendKind = cli.backend.parse()?;
    let options = BackendOptions {
        endpoint: cli.endpoint.clone(),
        access_token: cli.access_token.clone(),
        fixtures: cli.fixtures.clone(),
        timeout: cli.timeout.0,
    };
    let client = create_client(kind, &options)
        .await
        .with_context(|| format!("Failed to create the {} content backend", cli.backend))?;

    let mut settings = SiteSettings::default()
        .with_document_type(cli.document_type.clone())
        .with_page_size(cli.page_size);
    settings.validate()?;
    info!("⚙️ Serving {:?} documents, {} per page, from {}", settings.document_type, settings.page_size, client.name());

    match cli.command {
        Commands::Serve {
            addr,
            prebuild,
            listing_revalidate,
            article_revalidate,
            comments,
        } => {
            settings.listing_revalidate = listing_revalidate.0;
            settings.article_revalidate = article_revalidate.0;
            let state = Arc::new(AppState::new(client, settings).with_comments(comments.config()));
            if prebuild {
                handlers::prebuild(&state).await?;
            }

            let app = create_app(state);
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("Failed to bind to {}", addr))?;
            info!("🚀 Listening on http://{}", addr);
            axum::serve(listener, app).await.context("Server error")?;
        }
        Commands::Build { out, comments } => {
            let summary = export(client.as_ref(), &settings, comments.config().as_ref(), &out).await?;
            println!(
                "Wrote {} listing pages and {} articles to {} ({} skipped)",
                summary.listing_pages,
                summary.articles,
                out.display(),
                summary.skipped
            );
        }
        Commands::Posts { preview } => {
            list_posts(client.as_ref(), &settings, &preview_for(preview)).await?;
        }
        Commands::Post { slug, preview } => {
            show_post(client.as_ref(), &settings, &preview_for(preview), &slug).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_human_duration() {
        assert_eq!("45".parse::<HumanDuration>().unwrap().0, Duration::from_secs(45));
        assert_eq!("30m".parse::<HumanDuration>().unwrap().0, Duration::from_secs(1800));
        assert_eq!("1h15m30s".parse::<HumanDuration>().unwrap().0, Duration::from_secs(4530));
        assert!("10x".parse::<HumanDuration>().is_err());
        assert!("m".parse::<HumanDuration>().is_err());
        assert!("".parse::<HumanDuration>().is_err());
    }

    #[test]
    fn test_human_duration_overflow() {
        assert!("999999999999999d".parse::<HumanDuration>().is_err());
        assert!("18446744073709551615s1s".parse::<HumanDuration>().is_err());
        assert!("1d18446744073709551615".parse::<HumanDuration>().is_err());
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve_with_comments() {
        let cli = Cli::try_parse_from([
            "spacetraveling",
            "--page-size",
            "5",
            "serve",
            "--prebuild",
            "--comments-repo",
            "owner/blog",
        ])
        .unwrap();
        assert_eq!(cli.page_size, 5);
        let Commands::Serve { prebuild, comments, .. } = cli.command else {
            panic!("expected serve");
        };
        assert!(prebuild);
        assert_eq!(comments.config().unwrap().issue_term, "pathname");
    }
}
