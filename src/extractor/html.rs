//! Readability-style main content extraction for HTML pages

use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, instrument};

use super::error::ExtractionError;
use super::normalize::normalize_text;

/// Elements whose text never belongs to the main content
pub const EXCLUDED_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "template", "svg", "nav", "header", "footer", "aside", "form",
    "iframe", "button",
];

/// Class/id fragments that mark navigation and other page chrome
const BOILERPLATE_MARKERS: &[&str] = &[
    "nav",
    "menu",
    "sidebar",
    "footer",
    "header",
    "banner",
    "cookie",
    "consent",
    "advert",
    "promo",
    "subscribe",
    "newsletter",
    "comments",
];

/// Elements after which a line break is inserted
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "section", "article", "main", "h1", "h2", "h3", "h4", "h5", "h6", "li", "br",
    "tr", "blockquote", "pre", "table", "ul", "ol", "dd", "dt", "figcaption",
];

/// Candidates shorter than this are never picked as main content
const MIN_CANDIDATE_CHARS: usize = 20;

/// Extract the readable main text of an HTML page
///
/// # Arguments
///
/// * `html` - The page source
/// * `url` - The page URL, used for logging only
/// * `max_len` - Maximum number of characters to return
///
/// # Returns
///
/// Normalized text, or `NoExtractableContent` when nothing readable remains
#[instrument(skip(html), fields(html_len = html.len()))]
pub fn extract_html(html: &str, url: &str, max_len: usize) -> Result<String, ExtractionError> {
    let document = Html::parse_document(html);

    let text = pick_main_content(&document)
        .or_else(|| body_text(&document))
        .unwrap_or_default();

    let text = normalize_text(&text, max_len);
    if text.is_empty() {
        debug!("No readable content in {}", url);
        return Err(ExtractionError::NoExtractableContent);
    }
    Ok(text)
}

/// Class names that modify a layout rather than name a region, e.g. `has-sidebar`
const STATE_PREFIXES: &[&str] = &["has", "is", "with", "no", "show", "hide"];

/// True when a single class or id names a chrome region
///
/// The name is split on `-` and `_`; it matches when its last token is a
/// marker, so `site-footer` and `cookie-banner` match while
/// `site-header-wrapper` and `menu-open` do not.
fn names_boilerplate(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    let tokens = name
        .split(['-', '_'])
        .filter(|token| !token.is_empty())
        .collect::<Vec<_>>();
    match (tokens.first(), tokens.last()) {
        (Some(first), _) if STATE_PREFIXES.contains(first) => false,
        (_, Some(last)) => BOILERPLATE_MARKERS.contains(last),
        _ => false,
    }
}

fn has_boilerplate_marker(element: &ElementRef) -> bool {
    let value = element.value();
    value.classes().any(names_boilerplate) || value.id().is_some_and(names_boilerplate)
}

/// `<main>`, `<article>` and `role="main"` elements
fn is_content_landmark(element: &ElementRef) -> bool {
    matches!(element.value().name(), "main" | "article")
        || element.value().attr("role") == Some("main")
}

fn is_boilerplate(element: &ElementRef) -> bool {
    if EXCLUDED_ELEMENTS.contains(&element.value().name()) {
        return true;
    }
    if is_content_landmark(element) {
        return false;
    }
    if matches!(element.value().attr("role"), Some("navigation" | "banner" | "contentinfo")) {
        return true;
    }
    has_boilerplate_marker(element)
}

fn inside_boilerplate(element: &ElementRef) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| is_boilerplate(&ancestor))
}

/// Never-rendered elements, skipped even by the body fallback
fn is_hidden(element: &ElementRef) -> bool {
    matches!(
        element.value().name(),
        "script" | "style" | "noscript" | "template" | "svg"
    )
}

/// Visible text below `root`, skipping excluded subtrees and separating blocks
fn visible_text(root: ElementRef) -> String {
    let mut out = String::new();
    collect_text(root, &mut out, &is_boilerplate);
    out
}

fn collect_text(element: ElementRef, out: &mut String, skip: &dyn Fn(&ElementRef) -> bool) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let Some(child_ref) = ElementRef::wrap(child) else {
                    continue;
                };
                if skip(&child_ref) {
                    continue;
                }
                collect_text(child_ref, out, skip);
                if BLOCK_ELEMENTS.contains(&el.name()) {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

fn link_text_chars(element: &ElementRef, links: &Selector) -> usize {
    element
        .select(links)
        .map(|a| a.text().map(|t| t.chars().count()).sum::<usize>())
        .sum()
}

/// Score block candidates by dense non-link text and keep the best one
fn pick_main_content(document: &Html) -> Option<String> {
    let candidates = Selector::parse("article, main, [role=main], section, div").ok()?;
    let links = Selector::parse("a").ok()?;

    let mut best: Option<(i64, String)> = None;
    for element in document.select(&candidates) {
        if is_boilerplate(&element)
            || (!is_content_landmark(&element) && inside_boilerplate(&element))
        {
            continue;
        }

        let text = visible_text(element);
        let text_chars = text.chars().filter(|c| !c.is_whitespace()).count();
        if text_chars < MIN_CANDIDATE_CHARS {
            continue;
        }

        let link_chars = link_text_chars(&element, &links);
        let mut score = text_chars as i64 - 2 * link_chars as i64;
        match element.value().name() {
            "article" => score += 500,
            "main" => score += 300,
            _ => {}
        }
        if element.value().attr("role") == Some("main") {
            score += 300;
        }
        if link_chars > text_chars / 2 {
            score -= 500;
        }

        if best.as_ref().is_none_or(|(best_score, _)| score > *best_score) {
            best = Some((score, text));
        }
    }

    best.filter(|(score, _)| *score > 0).map(|(_, text)| text)
}

/// Fallback: everything visible in `<body>`
///
/// When chrome filtering leaves nothing, only never-rendered elements are
/// dropped.
fn body_text(document: &Html) -> Option<String> {
    let selector = Selector::parse("body").ok()?;
    let body = document.select(&selector).next()?;
    let text = visible_text(body);
    if !text.trim().is_empty() {
        return Some(text);
    }
    let mut out = String::new();
    collect_text(body, &mut out, &is_hidden);
    Some(out)
}
