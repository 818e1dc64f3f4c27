use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

use crate::types::ContactRecord;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
}

const PHONE: &str = r"\(?\d{2}\)?\s?\d{4,5}[-\s]?\d{4}";

static RE_PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("({PHONE})")).expect("invalid regex: phone"));
static RE_WHATSAPP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)(?:WhatsApp|WhatsApp:|WhatsApp[\s\-]*)\s*[:\-]?\s*({PHONE})"
    ))
    .expect("invalid regex: whatsapp")
});
static RE_MOBILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{5}[-\s]?\d{4}").expect("invalid regex: mobile"));
static RE_EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w\.-]+@[\w\.-]+\.\w+").expect("invalid regex: email"));
static RE_ADDRESS_HINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)CEP|Endereço|Rua|Av\.|Avenida").expect("invalid regex: address hint")
});
static RE_CITY_FROM_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)OAB\s+(.+?)(?:\s+-|\s+\d+ª|\s+Subseção|$)")
        .expect("invalid regex: city from name")
});
static RE_CITY_FROM_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-zÀ-ú \-]+)\(SP\)").expect("invalid regex: city from text")
});

static SEL_ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("invalid selector: anchor"));
static SEL_H1: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1").expect("invalid selector: h1"));
static SEL_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("invalid selector: title"));
static SEL_ADDRESS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("address").expect("invalid selector: address"));

/// Text inside these elements is never page content.
const SKIPPED_TAGS: [&str; 3] = ["script", "style", "template"];

/// Every visible text node under `element`, in document order, paired with
/// the element that directly contains it.
fn text_nodes<'a>(
    element: ElementRef<'a>,
) -> impl Iterator<Item = (&'a str, Option<ElementRef<'a>>)> {
    element.descendants().filter_map(|node| {
        let text = node.value().as_text()?;
        let parent = node.parent().and_then(ElementRef::wrap);
        if parent.is_some_and(|p| SKIPPED_TAGS.contains(&p.value().name())) {
            return None;
        }
        Some((&**text, parent))
    })
}

/// Text nodes glued together as-is, the haystack for the contact patterns.
fn raw_text(element: ElementRef) -> String {
    text_nodes(element).map(|(text, _)| text).collect()
}

/// Trimmed, non-empty text nodes joined by a single space.
fn elem_text(element: ElementRef) -> String {
    text_nodes(element)
        .map(|(text, _)| text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn dedup_in_order<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .filter(|item| seen.insert(*item))
        .map(str::to_string)
        .collect()
}

/// Collects chapter page URLs from the directory index.
///
/// Anchors whose `href` starts with `prefix` win; only when there are none
/// does any anchor mentioning `prefix` anywhere in its `href` count. The
/// result is absolute, deduplicated and sorted.
pub fn parse_chapter_links(
    html: &str,
    base_url: &str,
    prefix: &str,
) -> Result<Vec<String>, ParseError> {
    let document = Html::parse_document(html);
    let base = Url::parse(base_url)?;

    let hrefs = || {
        document
            .select(&SEL_ANCHOR)
            .filter_map(|a| a.value().attr("href"))
    };

    // Joined URLs come back normalised, so non-ASCII paths are percent-encoded.
    let resolve = |href: &str| match base.join(href) {
        Ok(url) => Some(url.to_string()),
        Err(e) => {
            log::warn!("Skipping unresolvable link '{}': {}", href, e);
            None
        }
    };

    let mut links: BTreeSet<String> = hrefs()
        .filter(|href| href.starts_with(prefix))
        .filter_map(|href| resolve(href.trim()))
        .collect();

    if links.is_empty() {
        log::debug!("No anchor starts with '{}', scanning all anchors", prefix);
        links = hrefs()
            .filter(|href| href.contains(prefix))
            .filter_map(resolve)
            .collect();
    }

    Ok(links.into_iter().collect())
}

/// Pulls whatever contact details the heuristics can find out of one
/// chapter page.
pub fn parse_contact(html: &str, url: &str) -> ContactRecord {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let raw = raw_text(root);

    let chapter_name = document
        .select(&SEL_H1)
        .next()
        .or_else(|| document.select(&SEL_TITLE).next())
        .map(elem_text)
        .unwrap_or_default();

    let emails: Vec<String> = RE_EMAIL
        .find_iter(&raw)
        .map(|m| m.as_str().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let phones = dedup_in_order(RE_PHONE.find_iter(&raw).map(|m| m.as_str()));

    let mut whatsapp = dedup_in_order(
        RE_WHATSAPP
            .captures_iter(&raw)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str()),
    );
    if whatsapp.is_empty()
        && let Some(mobile) = phones.iter().find(|p| RE_MOBILE.is_match(p))
    {
        log::debug!("No WhatsApp label on {}, using mobile {}", url, mobile);
        whatsapp.push(mobile.clone());
    }

    let address = parse_address(&document);
    let city = infer_city(&chapter_name, || elem_text(root));

    ContactRecord {
        chapter_name,
        city,
        phones,
        whatsapp,
        emails,
        address,
        url: url.to_string(),
        error: None,
    }
}

fn parse_address(document: &Html) -> String {
    if let Some(address) = document.select(&SEL_ADDRESS).next() {
        return elem_text(address);
    }

    text_nodes(document.root_element())
        .filter(|(text, _)| RE_ADDRESS_HINT.is_match(text))
        .filter_map(|(_, parent)| parent)
        .map(elem_text)
        .find(|text| text.chars().count() > 10)
        .unwrap_or_default()
}

/// City from "OAB <city> - ..." style names, otherwise from a "<city>(SP)"
/// mention anywhere on the page.
fn infer_city(name: &str, page_text: impl FnOnce() -> String) -> String {
    if let Some(m) = RE_CITY_FROM_NAME.captures(name).and_then(|c| c.get(1)) {
        return m.as_str().trim().to_string();
    }
    RE_CITY_FROM_TEXT
        .captures(&page_text())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}
