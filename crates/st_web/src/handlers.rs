use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use st_core::{listing, ArticlePage, Cursor, PageState, Preview, Result};
use tracing::{debug, info, warn};

use crate::cache::{Lookup, Rendered};
use crate::error::WebError;
use crate::render::{self, MAX_LISTING_PAGES};
use crate::session;
use crate::{pages, AppState};

/// A page the site can render.
#[derive(Debug, Clone)]
enum Target {
    Listing { pages: u32 },
    Article { slug: String },
}

impl Target {
    fn key(&self) -> String {
        match self {
            Target::Listing { pages: 1 } => "/".to_string(),
            Target::Listing { pages } => format!("/?pages={}", pages),
            Target::Article { slug } => format!("/post/{}", slug),
        }
    }

    fn window(&self, state: &AppState) -> Duration {
        match self {
            Target::Listing { .. } => state.settings.listing_revalidate,
            Target::Article { .. } => state.settings.article_revalidate,
        }
    }

    async fn render(&self, state: &AppState, preview: &Preview) -> Result<Rendered> {
        let client = state.client.as_ref();
        match self {
            Target::Listing { pages } => render::listing(client, &state.settings, preview, *pages).await,
            Target::Article { slug } => {
                render::article(client, &state.settings, state.comments.as_ref(), preview, slug).await
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HomeQuery {
    pages: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct PostsQuery {
    page: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    token: Option<String>,
    redirect: Option<String>,
}

pub async fn home(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<HomeQuery>,
) -> std::result::Result<Response, WebError> {
    let pages = query.pages.unwrap_or(1).clamp(1, MAX_LISTING_PAGES);
    serve(state, Target::Listing { pages }, session::preview_from(&jar)).await
}

pub async fn post(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(slug): Path<String>,
) -> std::result::Result<Response, WebError> {
    serve(state, Target::Article { slug }, session::preview_from(&jar)).await
}

/// One listing page as JSON, for client-side "load more".
pub async fn api_posts(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<PostsQuery>,
) -> std::result::Result<Json<ArticlePage>, WebError> {
    let preview = session::preview_from(&jar);
    let client = state.client.as_ref();
    let page = match query.page {
        Some(token) => listing::next_page(client, &state.settings, &preview, &Cursor::new(token)).await?,
        None => listing::first_page(client, &state.settings, &preview).await?,
    };
    Ok(Json(page))
}

pub async fn enter_preview(jar: CookieJar, Query(query): Query<PreviewQuery>) -> impl IntoResponse {
    let mut preview = Preview::off();
    preview.enter(query.token);
    let target = session::safe_redirect(query.redirect.as_deref());
    info!("👀 Entering preview (ref {:?}), redirecting to {}", preview.reference, target);
    (session::remember(jar, &preview), Redirect::temporary(&target))
}

pub async fn exit_preview(jar: CookieJar) -> impl IntoResponse {
    info!("👋 Leaving preview");
    (session::forget(jar), Redirect::temporary("/"))
}

pub async fn health() -> &'static str {
    "ok"
}

async fn serve(state: Arc<AppState>, target: Target, preview: Preview) -> std::result::Result<Response, WebError> {
    if preview.enabled {
        let rendered = target.render(&state, &preview).await?;
        return Ok(respond(rendered, no_store()));
    }

    let key = target.key();
    let window = target.window(&state);
    match state.cache.lookup(&key, window).await {
        Lookup::Fresh(rendered) => Ok(respond(rendered, cached_for(window))),
        Lookup::Stale(rendered) => {
            if state.cache.begin_refresh(&key).await {
                debug!("Serving stale {} while it regenerates", key);
                regenerate(state.clone(), target, key);
            }
            Ok(respond(rendered, cached_for(window)))
        }
        Lookup::Pending => Ok(placeholder(&state)),
        Lookup::Miss => {
            if let Target::Article { slug } = &target {
                if !state.is_prebuilt(slug).await {
                    if state.cache.mark_pending(&key).await {
                        debug!("Materializing {} in the background", key);
                        regenerate(state.clone(), target, key);
                    }
                    return Ok(placeholder(&state));
                }
            }
            let rendered = target.render(&state, &preview).await?;
            state.cache.insert(&key, rendered.clone()).await;
            Ok(respond(rendered, cached_for(window)))
        }
    }
}

fn regenerate(state: Arc<AppState>, target: Target, key: String) {
    tokio::spawn(async move {
        match target.render(&state, &Preview::off()).await {
            Ok(rendered) => {
                state.cache.insert(&key, rendered).await;
                debug!("♻️ Regenerated {}", key);
            }
            Err(e) => {
                warn!("Regenerating {} failed: {}", key, e);
                state.cache.abandon(&key).await;
            }
        }
    });
}

/// Render the pages known ahead of time: the home listing and its articles.
pub async fn prebuild(state: &AppState) -> Result<usize> {
    let preview = Preview::off();
    let client = state.client.as_ref();

    let (listing, loaded) = render::merged_listing(client, &state.settings, &preview, 1).await?;
    let home = render::listing_html(&state.settings, &listing, loaded, &preview, render::MoreLink::Query);
    state.cache.insert("/", Rendered::Html(home)).await;

    let mut built = 1;
    for summary in listing.results() {
        let target = Target::Article {
            slug: summary.uid.clone(),
        };
        match target.render(state, &preview).await {
            Ok(rendered) => {
                state.cache.insert(&target.key(), rendered).await;
                state.prebuilt.write().await.insert(summary.uid.clone());
                built += 1;
            }
            Err(e) => warn!("Skipping prebuild of {}: {}", summary.uid, e),
        }
    }
    info!("🏗️ Prebuilt {} pages", built);
    Ok(built)
}

fn respond(rendered: Rendered, cache_control: HeaderValue) -> Response {
    let mut response = match rendered {
        Rendered::Html(body) => Html(body).into_response(),
        Rendered::Redirect(to) => Redirect::temporary(&to).into_response(),
    };
    response.headers_mut().insert(header::CACHE_CONTROL, cache_control);
    response
}

fn placeholder(state: &AppState) -> Response {
    let pending = pages::article_gate(&state.settings.site_name, &PageState::Pending, &Preview::off(), None);
    let mut response = Html(pending.into_string()).into_response();
    response.headers_mut().insert(header::CACHE_CONTROL, no_store());
    response
}

fn no_store() -> HeaderValue {
    HeaderValue::from_static("no-store")
}

fn cached_for(window: Duration) -> HeaderValue {
    HeaderValue::from_str(&format!("public, s-maxage={}, stale-while-revalidate", window.as_secs()))
        .unwrap_or_else(|_| no_store())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_keys() {
        assert_eq!(Target::Listing { pages: 1 }.key(), "/");
        assert_eq!(Target::Listing { pages: 3 }.key(), "/?pages=3");
        assert_eq!(
            Target::Article {
                slug: "hello".to_string()
            }
            .key(),
            "/post/hello"
        );
    }

    #[test]
    fn test_cache_control_header() {
        assert_eq!(
            cached_for(Duration::from_secs(60)),
            "public, s-maxage=60, stale-while-revalidate"
        );
    }
}
