//! HTML extraction for rendered pages
//!
//! This module turns a serialized DOM into:
//! - Outbound links to follow (from `<a href>` and `data-href`/`data-url`)
//! - The primary title, meta description, h1/h2 headings
//! - Visible paragraphs from the main content region
//! - Image references, including lazy-loaded and CSS background images
//!
//! Link extraction runs on the full DOM. Content extraction runs on the DOM
//! after boilerplate regions have been suppressed.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

static BACKGROUND_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*['"]?([^'")]+?)['"]?\s*\)"#).expect("hardcoded regex pattern is valid")
});

static WHITESPACE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("hardcoded regex pattern is valid"));

/// Attributes that lazy-loading libraries use in place of `src`
const LAZY_SRC_ATTRIBUTES: &[&str] = &["data-src", "data-lazy-src", "data-original", "data-lazy"];

/// Regions tried, in order, as the main content container
const MAIN_REGION_SELECTORS: &[&str] = &["main", "article", "[role=\"main\"]", "body"];

/// A heading inside the main content region
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    /// 1 for h1, 2 for h2
    pub level: u8,
    pub text: String,
}

/// Where an image reference was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageKind {
    /// Plain `src` attribute
    Src,
    /// A lazy-loading `data-*` attribute
    LazyLoad,
    /// A `srcset` candidate
    Srcset,
    /// A CSS `background-image` in an inline style
    Background,
}

/// An image referenced by the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRef {
    /// Absolute image URL
    pub src: String,
    /// Alternative text, empty when absent
    pub alt: String,
    pub kind: ImageKind,
}

/// Content extracted from a page's visible DOM
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedContent {
    /// First h1-h3 heading, falling back to `<title>`
    pub title: Option<String>,
    pub description: Option<String>,
    pub headings: Vec<Heading>,
    pub paragraphs: Vec<String>,
    pub images: Vec<ImageRef>,
}

/// Extracts every outbound link of the page as an absolute URL
///
/// Links are returned in document order without duplicates. Scope and
/// path rules are not applied here.
///
/// # Example
///
/// ```
/// use sitewalk::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<html><body><a href="/page">Link</a><div data-href="/card"></div></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let links = extract_links(html, &base_url);
/// assert_eq!(links, vec!["https://example.com/page", "https://example.com/card"]);
/// ```
pub fn extract_links(html: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    let mut push = |href: &str| {
        if let Some(absolute_url) = resolve_link(href, base_url) {
            if seen.insert(absolute_url.clone()) {
                links.push(absolute_url);
            }
        }
    };

    if let Ok(selector) = Selector::parse("a[href], [data-href], [data-url]") {
        for element in document.select(&selector) {
            let attrs = element.value();

            // Download links point at files, not pages
            if attrs.name() == "a" && attrs.attr("download").is_some() {
                continue;
            }

            for name in ["href", "data-href", "data-url"] {
                if let Some(value) = attrs.attr(name) {
                    push(value);
                }
            }
        }
    }

    links
}

/// Extracts the record content from a (suppressed) DOM
///
/// # Arguments
///
/// * `html` - Serialized DOM
/// * `base_url` - Page URL, used to resolve image sources
/// * `min_paragraph_length` - Paragraphs shorter than this (in characters) are dropped
pub fn extract_content(html: &str, base_url: &Url, min_paragraph_length: usize) -> ExtractedContent {
    let document = Html::parse_document(html);
    let region = main_region(&document);

    ExtractedContent {
        title: extract_title(&document),
        description: extract_description(&document),
        headings: region.map(extract_headings).unwrap_or_default(),
        paragraphs: region
            .map(|r| extract_paragraphs(r, min_paragraph_length))
            .unwrap_or_default(),
        images: extract_images(&document, base_url),
    }
}

/// Resolves a link href to an absolute URL
///
/// Returns None for special schemes, same-page anchors and anything that
/// does not resolve to HTTP(S).
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    matches!(absolute_url.scheme(), "http" | "https").then(|| absolute_url.to_string())
}

fn main_region(document: &Html) -> Option<ElementRef<'_>> {
    MAIN_REGION_SELECTORS.iter().find_map(|raw| {
        let selector = Selector::parse(raw).ok()?;
        document.select(&selector).next()
    })
}

fn extract_title(document: &Html) -> Option<String> {
    let heading = Selector::parse("h1, h2, h3")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .map(element_text)
                .find(|text| !text.is_empty())
        });

    heading.or_else(|| {
        let selector = Selector::parse("title").ok()?;
        document
            .select(&selector)
            .next()
            .map(element_text)
            .filter(|text| !text.is_empty())
    })
}

fn extract_description(document: &Html) -> Option<String> {
    ["meta[name=\"description\"]", "meta[property=\"og:description\"]"]
        .iter()
        .find_map(|raw| {
            let selector = Selector::parse(raw).ok()?;
            document
                .select(&selector)
                .filter_map(|meta| meta.value().attr("content"))
                .map(collapse_whitespace)
                .find(|content| !content.is_empty())
        })
}

fn extract_headings(region: ElementRef<'_>) -> Vec<Heading> {
    let Ok(selector) = Selector::parse("h1, h2") else {
        return Vec::new();
    };

    region
        .select(&selector)
        .filter_map(|element| {
            let level = if element.value().name() == "h1" { 1 } else { 2 };
            let text = element_text(element);
            (!text.is_empty()).then_some(Heading { level, text })
        })
        .collect()
}

fn extract_paragraphs(region: ElementRef<'_>, min_length: usize) -> Vec<String> {
    let Ok(selector) = Selector::parse("p") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    region
        .select(&selector)
        .map(element_text)
        .filter(|text| text.chars().count() >= min_length)
        .filter(|text| seen.insert(text.clone()))
        .collect()
}

fn extract_images(document: &Html, base_url: &Url) -> Vec<ImageRef> {
    let mut seen = HashSet::new();
    let mut images = Vec::new();

    let mut push = |raw: &str, alt: &str, kind: ImageKind| {
        let raw = raw.trim();
        if raw.is_empty() || raw.to_ascii_lowercase().starts_with("data:") {
            return;
        }
        if let Ok(src) = base_url.join(raw) {
            if seen.insert(src.to_string()) {
                images.push(ImageRef {
                    src: src.to_string(),
                    alt: alt.to_string(),
                    kind,
                });
            }
        }
    };

    if let Ok(selector) = Selector::parse("img, picture source") {
        for element in document.select(&selector) {
            let attrs = element.value();
            let alt = collapse_whitespace(attrs.attr("alt").unwrap_or_default());

            if let Some(src) = attrs.attr("src") {
                push(src, &alt, ImageKind::Src);
            }
            for name in LAZY_SRC_ATTRIBUTES {
                if let Some(src) = attrs.attr(name) {
                    push(src, &alt, ImageKind::LazyLoad);
                }
            }
            for name in ["srcset", "data-srcset"] {
                if let Some(srcset) = attrs.attr(name) {
                    for candidate in srcset_candidates(srcset) {
                        push(candidate, &alt, ImageKind::Srcset);
                    }
                }
            }
        }
    }

    if let Ok(selector) = Selector::parse("[style]") {
        for element in document.select(&selector) {
            let attrs = element.value();
            let Some(style) = attrs.attr("style") else {
                continue;
            };
            if !style.to_ascii_lowercase().contains("background") {
                continue;
            }
            let alt = collapse_whitespace(attrs.attr("aria-label").unwrap_or_default());
            for capture in BACKGROUND_URL_REGEX.captures_iter(style) {
                if let Some(src) = capture.get(1) {
                    push(src.as_str(), &alt, ImageKind::Background);
                }
            }
        }
    }

    images
}

/// Splits a `srcset` value into its URL candidates
fn srcset_candidates(srcset: &str) -> impl Iterator<Item = &str> {
    srcset
        .split(',')
        .filter_map(|candidate| candidate.split_whitespace().next())
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_REGEX.replace_all(text, " ").trim().to_string()
}
