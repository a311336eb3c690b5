//! Finds character page slugs on the game's index page.
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::{
    codec::table::{element_text, selector},
    config::ExtractSettings,
};

static HEADINGS: Lazy<Selector> = Lazy::new(|| selector("h2, h3"));
static LINKS: Lazy<Selector> = Lazy::new(|| selector("a[href]"));
static CHARACTERS_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)characters").expect("static regex parses"));
static NOT_A_CHARACTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)game_mechanics|system|eternal_fighter_zero").expect("static regex parses")
});

fn slug_of(href: &str, settings: &ExtractSettings) -> Option<String> {
    let prefix = &settings.character_link_prefix;
    let base = settings.base_url.trim_end_matches('/');
    let path = href
        .strip_prefix(base)
        .filter(|rest| rest.starts_with('/'))
        .unwrap_or(href);
    if !path.starts_with(prefix.as_str()) || path.contains('#') {
        return None;
    }
    path.rsplit('/')
        .next()
        .filter(|slug| !slug.is_empty())
        .map(str::to_string)
}

fn collect_slugs<'a, I>(links: I, settings: &ExtractSettings, filter_pages: bool) -> Vec<String>
where
    I: Iterator<Item = ElementRef<'a>>,
{
    let mut slugs: Vec<String> = Vec::new();
    for link in links {
        let Some(slug) = link
            .value()
            .attr("href")
            .and_then(|href| slug_of(href, settings))
        else {
            continue;
        };
        if filter_pages && NOT_A_CHARACTER.is_match(&slug) {
            continue;
        }
        if !slugs.contains(&slug) {
            slugs.push(slug);
        }
    }
    slugs
}

/// Character slugs, in page order and without duplicates. Links in the element right after the
/// first "Characters" heading are preferred; if that yields nothing, every character-prefixed
/// link on the page that is not a known non-character page is used.
pub fn discover_characters(html: &str, settings: &ExtractSettings) -> Vec<String> {
    let doc = Html::parse_document(html);
    let section = doc
        .select(&HEADINGS)
        .find(|h| CHARACTERS_HEADING.is_match(&element_text(*h)))
        .and_then(|heading| heading.next_siblings().find_map(ElementRef::wrap));
    if let Some(section) = section {
        let slugs = collect_slugs(section.select(&LINKS), settings, false);
        if !slugs.is_empty() {
            tracing::debug!("found {} characters under the characters heading", slugs.len());
            return slugs;
        }
    }
    let slugs = collect_slugs(doc.select(&LINKS), settings, true);
    tracing::debug!("found {} characters by scanning all links", slugs.len());
    slugs
}
