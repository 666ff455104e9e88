use crate::config::RssFeedConfig;
use crate::sources::Collector;
use crate::types::{RawItem, SourceType};
use crate::utils::strip_html;
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use futures::future::join_all;
use std::time::Duration;
use tracing::{error, info, warn};

/// Entries older than this are discarded, but only when they carry a publish
/// timestamp. Undated entries are always kept.
const MAX_AGE_HOURS: i64 = 48;

/// Body snippets are capped at this many characters after HTML stripping.
const CONTENT_MAX_CHARS: usize = 500;

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Collector fetching configured syndication feeds (RSS/Atom via feed-rs).
pub struct RssCollector {
    client: reqwest::Client,
    feeds: Vec<RssFeedConfig>,
}

impl RssCollector {
    pub fn new(feeds: Vec<RssFeedConfig>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("InsightHub/1.0")
            .timeout(FETCH_TIMEOUT)
            .gzip(true)
            .build()
            .unwrap_or_default();

        Self { client, feeds }
    }

    async fn fetch_feed(&self, feed: &RssFeedConfig) -> Vec<RawItem> {
        let response = match self.client.get(feed.url).send().await {
            Ok(res) => res,
            Err(e) => {
                error!("rss feed {} request error: {}", feed.name, e);
                return Vec::new();
            }
        };

        if !response.status().is_success() {
            warn!("rss feed {} request failed: {}", feed.name, response.status());
            return Vec::new();
        }

        let body = match response.bytes().await {
            Ok(b) => b,
            Err(e) => {
                error!("rss feed {} body error: {}", feed.name, e);
                return Vec::new();
            }
        };

        let parsed = match feed_rs::parser::parse(body.as_ref()) {
            Ok(p) => p,
            Err(e) => {
                error!("rss feed {} parse error: {}", feed.name, e);
                return Vec::new();
            }
        };

        parsed
            .entries
            .into_iter()
            .filter_map(|entry| {
                let title = entry.title.as_ref().map(|t| t.content.trim().to_string())?;
                let link = entry
                    .links
                    .iter()
                    .find(|l| l.rel.as_deref() == Some("alternate"))
                    .or_else(|| entry.links.first())
                    .map(|l| l.href.clone())?;
                if title.is_empty() || link.is_empty() {
                    return None;
                }

                let body_text = entry
                    .content
                    .as_ref()
                    .and_then(|c| c.body.clone())
                    .or_else(|| entry.summary.as_ref().map(|s| s.content.clone()))
                    .unwrap_or_default();
                let snippet = strip_html(&body_text, CONTENT_MAX_CHARS);

                let mut raw = RawItem::new(title, link, SourceType::Rss, feed.name);
                raw.published_at = entry.published.or(entry.updated);
                raw.author = entry.authors.first().map(|a| a.name.clone());
                raw.content = (!snippet.is_empty()).then_some(snippet);
                raw.language = Some(feed.language.to_string());
                raw.default_category = Some(feed.default_category);
                Some(raw)
            })
            .collect()
    }
}

#[async_trait]
impl Collector for RssCollector {
    fn name(&self) -> &str {
        "rss"
    }

    async fn collect(&self) -> Vec<RawItem> {
        let fetches = self.feeds.iter().map(|feed| self.fetch_feed(feed));
        let fetched: Vec<RawItem> = join_all(fetches).await.into_iter().flatten().collect();

        let cutoff = Utc::now() - ChronoDuration::hours(MAX_AGE_HOURS);
        let total = fetched.len();
        let items: Vec<RawItem> = fetched
            .into_iter()
            .filter(|item| match item.published_at {
                Some(published) => published >= cutoff,
                None => true,
            })
            .collect();

        info!(
            "rss: fetched {} items, dropped {} older than {}h, kept {}",
            total,
            total - items.len(),
            MAX_AGE_HOURS,
            items.len()
        );
        items
    }
}
