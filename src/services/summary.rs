use std::time::Duration;

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::debug;

/// Hard cap on the summary length, in characters.
const SUMMARY_MAX_CHARS: usize = 300;

pub const FALLBACK_UNREACHABLE: &str = "The article page could not be fetched.";
pub const FALLBACK_EMPTY: &str = "No summary could be extracted from the article page.";

/// Summary fetches are the only bounded-time calls of the fetch path: a
/// hanging article page must not stall the interaction for long.
static CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .user_agent("newswatch-api summary")
        .build()
        .expect("Could not build summary CLIENT")
});

static META_DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="description"]"#).unwrap());

/// Known article body containers, most specific first.
static BODY_CONTAINERS: Lazy<Vec<Selector>> = Lazy::new(|| {
    ["#newsct_article", "#dic_area", "#articleBodyContents", "article"]
        .iter()
        .map(|selector| Selector::parse(selector).unwrap())
        .collect()
});

/// Best-effort summary of an article page. Never fails outward: any
/// fetch or extraction problem degrades to a fixed fallback string.
#[tracing::instrument]
pub async fn summarize(url: &str) -> String {
    match fetch_page(url).await {
        Ok(html) => extract_summary(&html).unwrap_or_else(|| FALLBACK_EMPTY.to_string()),
        Err(error) => {
            debug!("Summary fetch for {url} failed: {error:#}");
            FALLBACK_UNREACHABLE.to_string()
        }
    }
}

async fn fetch_page(url: &str) -> anyhow::Result<String> {
    let response = CLIENT.get(url).send().await?;

    if !response.status().is_success() {
        return Err(anyhow::Error::msg(format!(
            "Couldn't fetch {}: HTTP status {}",
            url,
            response.status().as_u16()
        )));
    }

    Ok(response.text().await?)
}

/// Preference chain: meta description, then a known body container, then
/// the whole page text.
fn extract_summary(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    if let Some(meta) = document.select(&META_DESCRIPTION).next() {
        if let Some(content) = meta.value().attr("content") {
            let cleaned = collapse_whitespace(content);
            if !cleaned.is_empty() {
                return Some(truncate(cleaned));
            }
        }
    }

    for selector in BODY_CONTAINERS.iter() {
        if let Some(element) = document.select(selector).next() {
            let text = collapse_whitespace(&element.text().collect::<String>());
            if !text.is_empty() {
                return Some(truncate(text));
            }
        }
    }

    let text = collapse_whitespace(&document.root_element().text().collect::<String>());
    if text.is_empty() {
        None
    } else {
        Some(truncate(text))
    }
}

fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate(text: String) -> String {
    if text.chars().count() <= SUMMARY_MAX_CHARS {
        return text;
    }

    let mut truncated: String = text.chars().take(SUMMARY_MAX_CHARS).collect();
    truncated.push('…');
    truncated
}
