use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod configuration;

/// A single monitored news article.
///
/// `link` is the identity of a record: two articles with the same link are
/// the same article, whatever keyword surfaced them. `keyword` is already
/// alias-normalized when a record is built.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Article {
    pub keyword: String,
    pub title: String,
    pub link: String,
    pub published: Option<DateTime<Utc>>,
}

/// The current view over a session's accumulated articles.
#[derive(Debug, Serialize)]
pub struct ArticlesView {
    /// Label of the filter condition ("all trends" or a group label).
    pub label: String,
    pub last_update: Option<DateTime<Utc>>,
    /// Whether this interaction triggered a fetch cycle.
    pub refreshed: bool,
    /// Non-fatal per-keyword fetch notices from the last cycle.
    pub notices: Vec<String>,
    pub groups: Vec<GroupBlock>,
}

/// One keyword group's slice of the view.
#[derive(Debug, Serialize)]
pub struct GroupBlock {
    pub label: String,
    pub articles: Vec<Article>,
}

/// A flat, spreadsheet friendly projection of an article.
#[derive(Debug, Serialize)]
pub struct ExportRow {
    pub keyword: String,
    pub published: String,
    pub title: String,
    pub link: String,
}

impl From<&Article> for ExportRow {
    fn from(article: &Article) -> Self {
        ExportRow {
            keyword: article.keyword.clone(),
            published: article
                .published
                .map(|p| p.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
            title: article.title.clone(),
            link: article.link.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ViewQuery {
    pub group: Option<String>,
}

/// List of article links, as posted by select/deselect/delete actions.
#[derive(Debug, Deserialize)]
pub struct LinkList {
    pub links: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct DigestRequest {
    pub recipient: String,
    pub group: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub link: String,
}
