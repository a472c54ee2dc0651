use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use reqwest_middleware::ClientWithMiddleware;
use reqwest_tracing::TracingMiddleware;
use scraper::Html;
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::warn;

use crate::model::configuration::SearchConfiguration;
use crate::model::Article;

static CLIENT: Lazy<ClientWithMiddleware> = Lazy::new(|| {
    let client = reqwest::Client::builder()
        .user_agent("newswatch-api fetcher")
        .build()
        .expect("Could not build CLIENT");

    reqwest_middleware::ClientBuilder::new(client)
        .with(TracingMiddleware::default())
        .build()
});

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("Could not reach the search endpoint: {0}")]
    HttpError(#[from] reqwest_middleware::Error),
    #[error("Could not read the search response: {0}")]
    BodyError(#[from] reqwest::Error),
    #[error("Non OK HTTP status returned: {0}")]
    NonOkStatus(u16),
}

/// The outcome of a full fetch cycle: all surviving articles plus one
/// notice per keyword whose request failed.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub articles: Vec<Article>,
    pub notices: Vec<String>,
}

/// Wire format of the news search endpoint.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(rename = "pubDate", default)]
    pub_date: String,
}

/// Queries the news search endpoint, one keyword at a time.
pub struct NewsFetcher {
    configuration: SearchConfiguration,
    aliases: BTreeMap<String, String>,
}

impl NewsFetcher {
    pub fn new(configuration: SearchConfiguration, aliases: BTreeMap<String, String>) -> Self {
        Self {
            configuration,
            aliases,
        }
    }

    /// Fetch the news for a single keyword.
    ///
    /// The endpoint matches loosely, so results are post-filtered: an item
    /// survives only when the keyword appears in its cleaned title. Items
    /// without a parseable publication date are kept with none.
    #[tracing::instrument(skip(self))]
    pub async fn search(&self, keyword: &str) -> Result<Vec<Article>, FetchError> {
        let response = CLIENT
            .get(&self.configuration.endpoint)
            .query(&[
                ("query", keyword),
                ("sort", self.configuration.sort.as_str()),
            ])
            .query(&[("display", self.configuration.display)])
            .header("X-Naver-Client-Id", &self.configuration.client_id)
            .header(
                "X-Naver-Client-Secret",
                self.configuration.client_secret.expose_secret(),
            )
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::NonOkStatus(response.status().as_u16()));
        }

        let body: SearchResponse = response.json().await?;

        let needle = keyword.to_lowercase();
        let articles = body
            .items
            .into_iter()
            .filter_map(|item| {
                let title = strip_markup(&item.title);
                if !title.to_lowercase().contains(&needle) {
                    return None;
                }

                Some(Article {
                    keyword: self.canonical(keyword).to_string(),
                    title,
                    link: item.link,
                    published: parse_pub_date(&item.pub_date),
                })
            })
            .collect();

        Ok(articles)
    }

    /// Fetch every term of the search list, sequentially.
    ///
    /// A failing keyword never aborts the cycle: it contributes zero rows
    /// and one notice.
    #[tracing::instrument(skip_all)]
    pub async fn fetch_all(&self, terms: &[String]) -> FetchOutcome {
        let mut outcome = FetchOutcome::default();

        for term in terms {
            match self.search(term).await {
                Ok(batch) => outcome.articles.extend(batch),
                Err(error) => {
                    warn!("News request for {term} failed: {error}");
                    outcome
                        .notices
                        .push(format!("News request for \"{term}\" failed: {error}"));
                }
            }
        }

        outcome
    }

    /// Collapse an alias term onto its canonical display keyword.
    fn canonical<'a>(&'a self, keyword: &'a str) -> &'a str {
        self.aliases
            .get(keyword)
            .map(String::as_str)
            .unwrap_or(keyword)
    }
}

/// True when a fetch cycle is due: never updated yet, or the last one is
/// older than the refresh interval.
pub fn refresh_due(
    now: DateTime<Utc>,
    last_update: Option<DateTime<Utc>>,
    interval: Duration,
) -> bool {
    match last_update {
        None => true,
        Some(last) => now.signed_duration_since(last) > interval,
    }
}

/// Strip markup from a title the tolerant way, through an HTML parser.
/// Also decodes entities, which the endpoint is fond of.
fn strip_markup(raw: &str) -> String {
    Html::parse_fragment(raw).root_element().text().collect()
}

fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }

    DateTime::parse_from_rfc2822(raw)
        .ok()
        .map(|date| date.with_timezone(&Utc))
}
