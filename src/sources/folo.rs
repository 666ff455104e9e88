use crate::sources::Collector;
use crate::types::{Category, RawItem, SourceType};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{error, info, warn};

/// Per-view cap on pulled entries.
const MAX_ENTRIES_PER_VIEW: usize = 50;

/// Social entries with titles shorter than this carry no real information
/// ("Exactly", "Awesome", ...) and are dropped.
const SOCIAL_MIN_TITLE_LENGTH: usize = 20;

/// Social entry prefixes to skip (retweets, bare replies).
const SOCIAL_SKIP_PREFIXES: [&str; 2] = ["RT ", "rt "];

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// View identifiers in the subscription API: 0 = articles, 1 = social posts.
const VIEW_ARTICLES: u32 = 0;
const VIEW_SOCIAL: u32 = 1;

/// Feed-title keyword hints used to guess a default category.
const FEED_CATEGORY_HINTS: [(&str, Category); 12] = [
    ("openai", Category::Ai),
    ("hugging face", Category::Ai),
    ("deepmind", Category::Ai),
    ("anthropic", Category::Ai),
    ("machine learning", Category::Ai),
    ("github", Category::Programming),
    ("hacker news", Category::Programming),
    ("techcrunch", Category::Business),
    ("the verge", Category::Product),
    ("macrumors", Category::Product),
    ("ars technica", Category::Programming),
    ("producthunt", Category::Product),
];

fn guess_category_from_feed(feed_title: &str) -> Category {
    let lower = feed_title.to_lowercase();
    FEED_CATEGORY_HINTS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, category)| *category)
        .unwrap_or(Category::News)
}

#[derive(Debug, Deserialize)]
struct FoloResponse {
    #[serde(default)]
    data: Vec<FoloEntry>,
}

#[derive(Debug, Deserialize)]
struct FoloEntry {
    #[serde(default)]
    entries: Option<FoloEntryInner>,
    #[serde(default)]
    feeds: Option<FoloFeed>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FoloEntryInner {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    summary: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FoloFeed {
    #[serde(default)]
    title: Option<String>,
}

/// Collector for an authenticated subscription feed (Folo). Requires a
/// per-account cookie credential; when it is absent the whole collection is
/// skipped, logged, never fatal.
pub struct FoloCollector {
    client: reqwest::Client,
    api_base: String,
    cookie: Option<String>,
}

impl FoloCollector {
    pub fn new(api_base: String, cookie: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .gzip(true)
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_base,
            cookie,
        }
    }

    async fn fetch_view(&self, cookie: &str, view: u32, published_after: &str) -> Vec<FoloEntry> {
        let body = json!({ "view": view, "publishedAfter": published_after });

        let response = match self
            .client
            .post(format!("{}/entries", self.api_base))
            .header("Cookie", cookie)
            .header("X-App-Name", "Folo Web")
            .header("X-App-Platform", "desktop/web")
            .header("Origin", "https://app.folo.is")
            .json(&body)
            .send()
            .await
        {
            Ok(res) => res,
            Err(e) => {
                error!("folo view={} fetch failed: {}", view, e);
                return Vec::new();
            }
        };

        if !response.status().is_success() {
            warn!("folo view={} HTTP {}", view, response.status());
            return Vec::new();
        }

        let parsed = match response.json::<FoloResponse>().await {
            Ok(p) => p,
            Err(e) => {
                warn!("folo view={} returned bad payload: {}", view, e);
                return Vec::new();
            }
        };

        // Deduplicate by entry id within the view and cap the count.
        let mut seen_ids: HashSet<String> = HashSet::new();
        let mut entries = Vec::new();
        for entry in parsed.data {
            let Some(id) = entry.entries.as_ref().map(|e| e.id.clone()) else {
                continue;
            };
            if !seen_ids.insert(id) {
                continue;
            }
            entries.push(entry);
            if entries.len() >= MAX_ENTRIES_PER_VIEW {
                break;
            }
        }
        entries
    }

    fn is_social_entry_worth_keeping(title: &str) -> bool {
        if title.chars().count() < SOCIAL_MIN_TITLE_LENGTH {
            return false;
        }
        !SOCIAL_SKIP_PREFIXES
            .iter()
            .any(|prefix| title.starts_with(prefix))
    }

    fn entry_to_raw_item(entry: FoloEntry, is_social: bool) -> Option<RawItem> {
        let inner = entry.entries?;
        let title = inner.title.as_deref().map(str::trim).unwrap_or_default();
        let url = inner.url.as_deref().map(str::trim).unwrap_or_default();
        if title.is_empty() || url.is_empty() {
            return None;
        }
        if is_social && !Self::is_social_entry_worth_keeping(title) {
            return None;
        }

        let feed_name = entry
            .feeds
            .and_then(|f| f.title)
            .unwrap_or_else(|| "Unknown Feed".to_string());
        let category = guess_category_from_feed(&feed_name);

        let mut raw = RawItem::new(
            title,
            url,
            SourceType::Folo,
            format!("Folo/{feed_name}"),
        );
        raw.published_at = inner
            .published_at
            .as_deref()
            .and_then(|p| DateTime::parse_from_rfc3339(p).ok())
            .map(|dt| dt.with_timezone(&Utc));
        raw.author = inner.author;
        raw.content = inner.description.or(inner.summary).filter(|c| !c.is_empty());
        raw.language = inner.language;
        raw.default_category = Some(category);
        Some(raw)
    }
}

#[async_trait]
impl Collector for FoloCollector {
    fn name(&self) -> &str {
        "folo"
    }

    async fn collect(&self) -> Vec<RawItem> {
        let Some(cookie) = self.cookie.as_deref() else {
            info!("folo: FOLO_COOKIE not configured, skipping");
            return Vec::new();
        };

        // Entries published since today 00:00 UTC.
        let published_after = Utc::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().to_rfc3339())
            .unwrap_or_default();

        let (articles, socials) = tokio::join!(
            self.fetch_view(cookie, VIEW_ARTICLES, &published_after),
            self.fetch_view(cookie, VIEW_SOCIAL, &published_after),
        );
        let (article_count, social_count) = (articles.len(), socials.len());

        // Views overlap; deduplicate by URL within this collector's output.
        let mut seen_urls: HashSet<String> = HashSet::new();
        let mut items: Vec<RawItem> = Vec::new();

        for entry in articles {
            if let Some(item) = Self::entry_to_raw_item(entry, false) {
                if seen_urls.insert(item.url.clone()) {
                    items.push(item);
                }
            }
        }
        for entry in socials {
            if let Some(item) = Self::entry_to_raw_item(entry, true) {
                if seen_urls.insert(item.url.clone()) {
                    items.push(item);
                }
            }
        }

        info!(
            "folo: kept {} items (articles={}, social={})",
            items.len(),
            article_count,
            social_count
        );
        items
    }
}
