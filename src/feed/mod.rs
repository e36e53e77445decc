use std::sync::OnceLock;
use std::time::Duration;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::PagerConfig;
use crate::cursor::encode_component;
use crate::store::{KeyValueStore, PostCache, PostDateLedger, StoreError};

/// Posts requested per feed call when building the ledger.
pub const BATCH_SIZE: usize = 150;

static FRACTIONAL_SECONDS: OnceLock<Regex> = OnceLock::new();

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("feed request failed: {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("feed returned HTTP {status}: {url}")]
    Status { url: String, status: u16 },

    #[error("malformed feed response: {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("feed response is missing {field}: {url}")]
    MissingField { url: String, field: &'static str },

    #[error("feed reported a non-numeric total '{value}': {url}")]
    InvalidTotal { url: String, value: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Post count and last-modified marker of the feed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedSnapshot {
    pub total_posts: usize,
    pub blog_updated: String,
}

#[derive(Debug, Deserialize)]
struct FeedResponse {
    feed: FeedBody,
}

#[derive(Debug, Deserialize)]
struct FeedBody {
    #[serde(rename = "openSearch$totalResults")]
    total_results: Option<TextNode>,
    updated: Option<TextNode>,
    #[serde(default)]
    entry: Vec<FeedEntry>,
}

#[derive(Debug, Deserialize)]
struct TextNode {
    #[serde(rename = "$t")]
    text: String,
}

#[derive(Debug, Deserialize)]
struct FeedEntry {
    published: TextNode,
}

impl FeedBody {
    fn total(&self, url: &str) -> Result<usize, FeedError> {
        let raw = self
            .total_results
            .as_ref()
            .ok_or_else(|| FeedError::MissingField {
                url: url.to_string(),
                field: "feed.openSearch$totalResults",
            })?;
        raw.text
            .trim()
            .parse::<usize>()
            .map_err(|_| FeedError::InvalidTotal {
                url: url.to_string(),
                value: raw.text.clone(),
            })
    }
}

/// Drops the sub-second part of a feed timestamp so cursors built from it
/// match what the feed accepts back.
pub fn strip_fractional_seconds(timestamp: &str) -> String {
    let re = FRACTIONAL_SECONDS.get_or_init(|| Regex::new(r"\.\d+").expect("valid regex"));
    re.replace(timestamp, "").into_owned()
}

fn label_scope(label: Option<&str>) -> String {
    match label {
        Some(label) => format!("-/{label}?"),
        None => "?".to_string(),
    }
}

/// Search ordering. The string `"false"` deliberately maps to relevance;
/// every other value orders by publish date.
fn search_order(by_date: &str) -> &'static str {
    if by_date.trim() == "false" {
        "relevance"
    } else {
        "published"
    }
}

#[derive(Clone, Debug)]
pub struct FeedClient {
    client: reqwest::Client,
    home_url: String,
}

impl FeedClient {
    pub fn new(home_url: &str, timeout_seconds: u64) -> Result<Self, FeedError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("numeric-pager/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeout_seconds.max(1)))
            .build()
            .map_err(|e| FeedError::HttpClientBuild { source: e })?;

        Ok(Self::with_client(client, home_url))
    }

    pub fn with_client(client: reqwest::Client, home_url: &str) -> Self {
        Self {
            client,
            home_url: home_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn snapshot_url(&self, label: Option<&str>) -> String {
        format!(
            "{}/feeds/posts/summary/{}alt=json&max-results=0",
            self.home_url,
            label_scope(label)
        )
    }

    /// URL of ledger batch `batch` (0-based).
    pub fn batch_url(&self, config: &PagerConfig, batch: usize) -> String {
        let scope = match config.query() {
            Some(query) => format!(
                "?q={}&orderby={}&",
                encode_component(query),
                search_order(&config.by_date)
            ),
            None => label_scope(config.label()),
        };
        format!(
            "{}/feeds/posts/summary/{}alt=json&max-results={}&start-index={}",
            self.home_url,
            scope,
            BATCH_SIZE,
            batch * BATCH_SIZE + 1
        )
    }

    async fn get_feed(&self, url: &str) -> Result<FeedBody, FeedError> {
        debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FeedError::Request {
                url: url.to_string(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body: FeedResponse = response.json().await.map_err(|e| FeedError::Decode {
            url: url.to_string(),
            source: e,
        })?;
        Ok(body.feed)
    }

    /// Fetches the post count and last-modified marker with a `max-results=0`
    /// request and records them in the cache. Search queries share the
    /// label/default endpoint here, and their cached count is left alone.
    pub async fn fetch_snapshot<S: KeyValueStore>(
        &self,
        query: Option<&str>,
        label: Option<&str>,
        cache: &mut PostCache<S>,
    ) -> Result<FeedSnapshot, FeedError> {
        let url = self.snapshot_url(label);
        let feed = self.get_feed(&url).await?;

        let total_posts = feed.total(&url)?;
        let blog_updated = feed
            .updated
            .map(|u| u.text)
            .ok_or(FeedError::MissingField {
                url: url.clone(),
                field: "feed.updated",
            })?;

        cache.update(query, label, |ledger| {
            ledger.blog_updated = Some(blog_updated.clone());
            if query.is_none() {
                ledger.total_posts = total_posts;
            }
        })?;

        info!("feed snapshot: {total_posts} posts, updated {blog_updated}");
        Ok(FeedSnapshot {
            total_posts,
            blog_updated,
        })
    }

    /// Fetches every post timestamp in batches of [`BATCH_SIZE`], all in
    /// flight at once. Batches are reassembled by index so the ledger keeps
    /// feed order whatever order the responses arrive in.
    pub async fn fetch_post_dates<S: KeyValueStore>(
        &self,
        config: &PagerConfig,
        total_posts: usize,
        cache: &mut PostCache<S>,
    ) -> Result<PostDateLedger, FeedError> {
        if total_posts == 0 {
            return Ok(PostDateLedger::default());
        }

        let query = config.query();
        let label = config.label();
        let batches = total_posts.div_ceil(BATCH_SIZE);

        let requests = FuturesUnordered::new();
        for batch in 0..batches {
            let url = self.batch_url(config, batch);
            requests.push(async move {
                let result = self.get_feed(&url).await;
                (batch, url, result)
            });
        }
        let mut responses: Vec<_> = requests.collect().await;
        responses.sort_by_key(|(batch, _, _)| *batch);

        let mut post_dates: Vec<String> = Vec::with_capacity(total_posts);
        let mut search_total = 0usize;
        for (_, url, result) in responses {
            let feed = result?;
            if query.is_some() {
                search_total += feed.total(&url)?;
            }
            post_dates.extend(
                feed.entry
                    .iter()
                    .map(|e| strip_fractional_seconds(&e.published.text)),
            );
        }

        let total = if query.is_some() {
            if search_total != total_posts {
                debug!("search total {search_total} differs from snapshot total {total_posts}");
            }
            search_total
        } else {
            total_posts
        };

        let ledger = cache.update(query, label, |ledger| {
            ledger.post_dates = post_dates;
            if query.is_some() {
                ledger.total_posts = total;
            }
        })?;

        info!("fetched {} post dates in {batches} batches", ledger.post_dates.len());
        Ok(PostDateLedger {
            total_posts: total,
            ..ledger
        })
    }
}
