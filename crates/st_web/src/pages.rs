//! HTML views.

use axum::http::StatusCode;
use maud::{html, Markup, DOCTYPE};
use st_core::format::{edited_stamp, publication_date};
use st_core::richtext;
use st_core::{ArticleSummary, ArticleView, Listing, LoadState, PageState, Preview, SiblingRef};

use crate::state::CommentsConfig;

fn base_document(title: &str, head_extra: Markup, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="pt-BR" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                (head_extra)
                title { (title) }
            }
            body {
                (content)
            }
        }
    }
}

fn site_header() -> Markup {
    html! {
        header.site-header.container {
            a href="/" { "spacetraveling" span { "." } }
        }
    }
}

pub fn preview_button(preview: &Preview) -> Markup {
    let action = preview.toggle();
    html! {
        aside {
            a.preview-button href=(action.path()) { (action.label()) }
        }
    }
}

fn summary_item(post: &ArticleSummary) -> Markup {
    html! {
        a.post href={ "/post/" (post.uid) } {
            h2 { (post.title) }
            p { (post.subtitle) }
            div.info {
                @if let Some(date) = &post.first_publication_date {
                    time datetime=(date.to_rfc3339()) { (publication_date(date)) }
                }
                span { (post.author) }
            }
        }
    }
}

fn load_failed(listing: &Listing) -> bool {
    matches!(listing.state(), LoadState::Failed { .. })
}

/// Home page. `more_href` is where "load more" leads, if anywhere.
pub fn listing_page(site_name: &str, listing: &Listing, preview: &Preview, more_href: Option<&str>) -> Markup {
    let content = html! {
        (site_header())
        main.container {
            @for post in listing.results() {
                (summary_item(post))
            }
            @if load_failed(listing) {
                p.load-error { "Não foi possível carregar mais posts. Tente novamente." }
            }
            @if listing.can_load_more() {
                @if let Some(href) = more_href {
                    a.load-more href=(href) data-next-page=[listing.next_page().map(|c| c.as_str())] {
                        "Carregar mais posts"
                    }
                }
            }
            (preview_button(preview))
        }
    };
    base_document(&format!("Home | {}", site_name), html! {}, content)
}

fn sibling_link(sibling: &SiblingRef, class: &str, label: &str) -> Markup {
    html! {
        a class=(class) href={ "/post/" (sibling.uid) } {
            h2 { (sibling.title) }
            strong { (label) }
        }
    }
}

fn comments_widget(comments: &CommentsConfig) -> Markup {
    html! {
        section.comments {
            script
                src="https://utteranc.es/client.js"
                repo=(comments.repo)
                issue-term=(comments.issue_term)
                theme=(comments.theme)
                crossorigin="anonymous" {}
        }
    }
}

pub fn article_page(site_name: &str, view: &ArticleView, preview: &Preview, comments: Option<&CommentsConfig>) -> Markup {
    let article = &view.article;
    let content = html! {
        (site_header())
        main {
            @if !article.banner_url.is_empty() {
                img.banner src=(article.banner_url) alt=(article.title);
            }
            article.container {
                header {
                    h1 { (article.title) }
                    div.info {
                        @if let Some(date) = &article.first_publication_date {
                            time datetime=(date.to_rfc3339()) { (publication_date(date)) }
                        }
                        span { (article.author) }
                        span { (view.reading_time) " min" }
                    }
                    @if let Some(edited) = &article.last_publication_date {
                        p.edited { time { (edited_stamp(edited)) } }
                    }
                }
                @for section in &article.content {
                    div.post-content {
                        @if !section.heading.is_empty() {
                            h2 { (section.heading) }
                        }
                        (richtext::as_html(&section.body))
                    }
                }
                footer {
                    @if view.previous.is_some() || view.next.is_some() {
                        div.siblings {
                            @if let Some(previous) = &view.previous {
                                (sibling_link(previous, "previous-post", "Post anterior"))
                            }
                            @if let Some(next) = &view.next {
                                (sibling_link(next, "next-post", "Próximo post"))
                            }
                        }
                    }
                    @if let Some(comments) = comments {
                        (comments_widget(comments))
                    }
                    (preview_button(preview))
                }
            }
        }
    };
    base_document(&format!("{} | {}", article.title, site_name), html! {}, content)
}

/// The article once its view is ready, the loading placeholder until then.
pub fn article_gate(
    site_name: &str,
    view: &PageState<ArticleView>,
    preview: &Preview,
    comments: Option<&CommentsConfig>,
) -> Markup {
    match view {
        PageState::Pending => loading_page(site_name),
        PageState::Ready(view) => article_page(site_name, view, preview, comments),
    }
}

/// Shown while an article is materialized in the background.
pub fn loading_page(site_name: &str) -> Markup {
    let refresh = html! { meta http-equiv="refresh" content="1"; };
    let content = html! {
        (site_header())
        main.container { p { "Carregando..." } }
    };
    base_document(&format!("Carregando... | {}", site_name), refresh, content)
}

pub fn error_page(status: StatusCode, message: &str) -> Markup {
    let content = html! {
        (site_header())
        main.container {
            h1 { (status.as_u16()) }
            p { (message) }
            a href="/" { "Voltar para a home" }
        }
    };
    base_document(status.canonical_reason().unwrap_or("Erro"), html! {}, content)
}
