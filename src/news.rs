//! Trending legal-news client.
//!
//! Thin wrapper over a NewsAPI-style `everything` endpoint: one GET for the
//! trailing seven days of legal-topic articles, deserialized into [`Article`]
//! values with a human-readable publication timestamp. The base URL is
//! injectable so tests can point the client at a local mock server.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::types::RagError;

const NEWSAPI_ENDPOINT: &str = "https://newsapi.org/v2/everything";

/// Topic filter tuned for court and legislation coverage; entertainment
/// reporting about legal dramas is excluded.
const LEGAL_QUERY: &str = "(\"court ruling\" OR \"supreme court\" OR \"high court\" OR lawsuit OR \
\"legal battle\" OR \"constitutional law\" OR \"judicial decision\" OR \
\"human rights law\" OR \"legal reform\" OR \"legislation passed\") \
AND NOT entertainment AND NOT cinema AND NOT film AND NOT tv AND NOT drama";

const LOOKBACK_DAYS: i64 = 7;

/// A single news article, ready for display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub url: String,
    pub source: String,
    pub published_at: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

impl Article {
    /// Publication time as `13 Mar 2025, 14:07`, or `Unknown` when the feed
    /// carried no parseable timestamp.
    pub fn published_display(&self) -> String {
        match self.published_at {
            Some(when) => when.format("%d %b %Y, %H:%M").to_string(),
            None => "Unknown".to_string(),
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Deserialize)]
struct RawArticle {
    title: Option<String>,
    url: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    source: RawSource,
    description: Option<String>,
}

#[derive(Default, Deserialize)]
struct RawSource {
    name: Option<String>,
}

/// Client for the legal-news feed.
pub struct NewsClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl NewsClient {
    /// Client against the public NewsAPI endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        let base_url = Url::parse(NEWSAPI_ENDPOINT).expect("static endpoint URL is valid");
        Self::with_base_url(base_url, api_key)
    }

    /// Client against an arbitrary endpoint (mock servers in tests).
    pub fn with_base_url(base_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key: api_key.into(),
        }
    }

    /// Fetches up to `page_size` articles from the trailing seven days,
    /// sorted by popularity.
    ///
    /// Transport failures and non-2xx responses surface as
    /// [`RagError::Http`].
    pub async fn latest(&self, page_size: usize) -> Result<Vec<Article>, RagError> {
        let today = Utc::now();
        let last_week = today - Duration::days(LOOKBACK_DAYS);

        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("q", LEGAL_QUERY)
            .append_pair("from", &last_week.format("%Y-%m-%d").to_string())
            .append_pair("to", &today.format("%Y-%m-%d").to_string())
            .append_pair("language", "en")
            .append_pair("sortBy", "popularity")
            .append_pair("pageSize", &page_size.to_string())
            .append_pair("apiKey", &self.api_key);

        let envelope: Envelope = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let articles: Vec<Article> = envelope
            .articles
            .into_iter()
            .map(|raw| Article {
                title: raw.title.unwrap_or_default(),
                url: raw.url.unwrap_or_default(),
                source: raw.source.name.unwrap_or_default(),
                published_at: raw.published_at,
                description: raw.description,
            })
            .collect();
        debug!(count = articles.len(), page_size, "fetched news articles");
        Ok(articles)
    }
}
