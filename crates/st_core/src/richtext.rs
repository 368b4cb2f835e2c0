//! Structured rich text as stored by the content backend.
//!
//! Blocks are a flat list of tagged variants. Two projections exist: [`as_text`]
//! for word counting and [`as_html`] for display. Both are pure.

use maud::{html, Markup, PreEscaped};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanData {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
}

/// Formatting applied to the character range `start..end` of a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: SpanKind,
    #[serde(default)]
    pub data: Option<SpanData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub spans: Vec<Span>,
}

impl TextBlock {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            spans: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageBlock {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub alt: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Oembed {
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub embed_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbedBlock {
    #[serde(default)]
    pub oembed: Oembed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Block {
    #[serde(rename = "heading1")]
    Heading1(TextBlock),
    #[serde(rename = "heading2")]
    Heading2(TextBlock),
    #[serde(rename = "heading3")]
    Heading3(TextBlock),
    #[serde(rename = "heading4")]
    Heading4(TextBlock),
    #[serde(rename = "heading5")]
    Heading5(TextBlock),
    #[serde(rename = "heading6")]
    Heading6(TextBlock),
    #[serde(rename = "paragraph")]
    Paragraph(TextBlock),
    #[serde(rename = "preformatted")]
    Preformatted(TextBlock),
    #[serde(rename = "list-item")]
    ListItem(TextBlock),
    #[serde(rename = "o-list-item")]
    OListItem(TextBlock),
    #[serde(rename = "image")]
    Image(ImageBlock),
    #[serde(rename = "embed")]
    Embed(EmbedBlock),
    #[serde(other)]
    Unknown,
}

impl Block {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Block::Paragraph(TextBlock::plain(text))
    }

    /// The textual payload, if this block carries one.
    pub fn text_block(&self) -> Option<&TextBlock> {
        match self {
            Block::Heading1(t)
            | Block::Heading2(t)
            | Block::Heading3(t)
            | Block::Heading4(t)
            | Block::Heading5(t)
            | Block::Heading6(t)
            | Block::Paragraph(t)
            | Block::Preformatted(t)
            | Block::ListItem(t)
            | Block::OListItem(t) => Some(t),
            Block::Image(_) | Block::Embed(_) | Block::Unknown => None,
        }
    }
}

/// Plain text of every text-bearing block, joined by a single space.
pub fn as_text<'a, I>(blocks: I) -> String
where
    I: IntoIterator<Item = &'a Block>,
{
    blocks
        .into_iter()
        .filter_map(Block::text_block)
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(PartialEq)]
enum ListKind {
    Unordered,
    Ordered,
}

/// Renders blocks to escaped markup. Consecutive list items share one list.
pub fn as_html(blocks: &[Block]) -> Markup {
    let mut out = String::new();
    let mut open_list: Option<ListKind> = None;

    for block in blocks {
        let wanted = match block {
            Block::ListItem(_) => Some(ListKind::Unordered),
            Block::OListItem(_) => Some(ListKind::Ordered),
            _ => None,
        };
        if open_list != wanted {
            match open_list {
                Some(ListKind::Unordered) => out.push_str("</ul>"),
                Some(ListKind::Ordered) => out.push_str("</ol>"),
                None => {}
            }
            match wanted {
                Some(ListKind::Unordered) => out.push_str("<ul>"),
                Some(ListKind::Ordered) => out.push_str("<ol>"),
                None => {}
            }
            open_list = wanted;
        }
        out.push_str(&render_block(block).into_string());
    }

    match open_list {
        Some(ListKind::Unordered) => out.push_str("</ul>"),
        Some(ListKind::Ordered) => out.push_str("</ol>"),
        None => {}
    }
    PreEscaped(out)
}

fn render_block(block: &Block) -> Markup {
    match block {
        Block::Heading1(t) => html! { h1 { (render_spans(t)) } },
        Block::Heading2(t) => html! { h2 { (render_spans(t)) } },
        Block::Heading3(t) => html! { h3 { (render_spans(t)) } },
        Block::Heading4(t) => html! { h4 { (render_spans(t)) } },
        Block::Heading5(t) => html! { h5 { (render_spans(t)) } },
        Block::Heading6(t) => html! { h6 { (render_spans(t)) } },
        Block::Paragraph(t) => html! { p { (render_spans(t)) } },
        Block::Preformatted(t) => html! { pre { (t.text) } },
        Block::ListItem(t) | Block::OListItem(t) => html! { li { (render_spans(t)) } },
        Block::Image(img) => html! {
            p.block-img {
                img src=(img.url) alt=(img.alt.as_deref().unwrap_or_default());
            }
        },
        Block::Embed(embed) => html! {
            div data-oembed=[embed.oembed.embed_url.as_deref()] {
                // oEmbed payloads are markup produced by the provider
                @if let Some(markup) = &embed.oembed.html {
                    (PreEscaped(markup))
                }
            }
        },
        Block::Unknown => html! {},
    }
}

/// Splits the text at every span boundary and wraps each segment in the
/// spans covering it, so overlapping spans still produce well-formed markup.
fn render_spans(block: &TextBlock) -> Markup {
    let chars: Vec<char> = block.text.chars().collect();
    let len = chars.len();

    let spans: Vec<&Span> = block
        .spans
        .iter()
        .filter(|s| s.start < s.end && s.start < len)
        .collect();

    let mut bounds: Vec<usize> = vec![0, len];
    for span in &spans {
        bounds.push(span.start);
        bounds.push(span.end.min(len));
    }
    bounds.sort_unstable();
    bounds.dedup();

    let mut out = String::new();
    for pair in bounds.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        let segment: String = chars[from..to].iter().collect();
        let mut markup = text_with_breaks(&segment);
        for span in spans.iter().rev().filter(|s| s.start <= from && s.end >= to) {
            markup = wrap_span(span, markup);
        }
        out.push_str(&markup.into_string());
    }
    PreEscaped(out)
}

fn text_with_breaks(text: &str) -> Markup {
    html! {
        @for (i, line) in text.split('\n').enumerate() {
            @if i > 0 {
                br;
            }
            (line)
        }
    }
}

fn wrap_span(span: &Span, inner: Markup) -> Markup {
    match span.kind {
        SpanKind::Strong => html! { strong { (inner) } },
        SpanKind::Em => html! { em { (inner) } },
        SpanKind::Hyperlink => {
            let data = span.data.clone().unwrap_or_default();
            match data.url {
                Some(url) => html! {
                    a href=(url) target=[data.target.as_deref()] rel=[data.target.as_ref().map(|_| "noopener")] {
                        (inner)
                    }
                },
                None => inner,
            }
        }
        SpanKind::Other => inner,
    }
}
