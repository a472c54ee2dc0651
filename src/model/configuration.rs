use std::collections::{BTreeMap, HashSet};
use std::env;
use std::path::Path;

use anyhow::Context;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

/// # Application configuration
///
/// One engine, many deployments: the keyword groups, the alias table, the
/// search credentials, the SMTP settings and the feature flags all live
/// here instead of being forked per installation.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfiguration {
    /// Business categories to monitor, in display order.
    pub groups: Vec<KeywordGroup>,
    /// Raw search term -> canonical display keyword.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    pub search: SearchConfiguration,
    pub smtp: Option<SmtpConfiguration>,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_minutes: i64,
    /// Expose the article summary endpoint.
    #[serde(default)]
    pub summary_panel: bool,
}

/// A named, ordered set of search terms for one business category.
#[derive(Debug, Deserialize, Clone)]
pub struct KeywordGroup {
    pub label: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfiguration {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default = "empty_secret")]
    pub client_secret: Secret<String>,
    #[serde(default = "default_display")]
    pub display: u32,
    #[serde(default = "default_sort")]
    pub sort: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmtpConfiguration {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: String,
    #[serde(default = "empty_secret")]
    pub password: Secret<String>,
    pub from: String,
}

impl AppConfiguration {
    /// Load the configuration file pointed at by `NEWSWATCH_CONFIG`,
    /// then apply the secret overrides from the environment.
    pub fn load() -> anyhow::Result<Self> {
        let path = env::var("NEWSWATCH_CONFIG").unwrap_or_else(|_| String::from("newswatch.json"));
        Self::from_file(Path::new(&path))
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read configuration file {}", path.display()))?;
        let mut configuration: AppConfiguration =
            serde_json::from_str(&raw).context("Could not parse the configuration file")?;

        if let Ok(client_id) = env::var("SEARCH_CLIENT_ID") {
            configuration.search.client_id = client_id;
        }
        if let Ok(client_secret) = env::var("SEARCH_CLIENT_SECRET") {
            configuration.search.client_secret = Secret::new(client_secret);
        }
        if let Ok(password) = env::var("SMTP_PASSWORD") {
            if let Some(smtp) = configuration.smtp.as_mut() {
                smtp.password = Secret::new(password);
            }
        }

        Ok(configuration)
    }

    /// The full search list: every group keyword plus every alias term,
    /// deduplicated, group order first.
    pub fn search_terms(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.groups
            .iter()
            .flat_map(|group| group.keywords.iter())
            .chain(self.aliases.keys())
            .filter(|term| seen.insert(term.as_str()))
            .cloned()
            .collect()
    }

    pub fn group(&self, label: &str) -> Option<&KeywordGroup> {
        self.groups.iter().find(|group| group.label == label)
    }

    pub fn has_search_credentials(&self) -> bool {
        !self.search.client_id.is_empty() && !self.search.client_secret.expose_secret().is_empty()
    }
}

fn default_refresh_interval() -> i64 {
    60
}

fn default_endpoint() -> String {
    String::from("https://openapi.naver.com/v1/search/news.json")
}

fn default_display() -> u32 {
    30
}

fn default_sort() -> String {
    String::from("date")
}

fn default_smtp_port() -> u16 {
    587
}

fn empty_secret() -> Secret<String> {
    Secret::new(String::new())
}
