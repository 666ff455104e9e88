use crate::config::PlatformConfig;
use crate::sources::Collector;
use crate::types::{RawItem, SourceType};
use crate::utils::parse_heat_value;
use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info, warn};

/// Top-N cap per platform so one noisy hotlist cannot dominate the digest.
const MAX_ITEMS_PER_PLATFORM: usize = 15;

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Deserialize)]
struct NewsNowResponse {
    #[serde(default)]
    items: Vec<NewsNowItem>,
}

#[derive(Debug, Deserialize)]
struct NewsNowItem {
    title: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(rename = "mobileUrl", default)]
    mobile_url: Option<String>,
    #[serde(default)]
    extra: Option<NewsNowExtra>,
}

#[derive(Debug, Deserialize)]
struct NewsNowExtra {
    /// Free-text heat descriptor, e.g. "1029 万热度" or "✰ 3,058".
    #[serde(default)]
    info: Option<String>,
    /// Item blurb (GitHub repo about, Product Hunt tagline, ...).
    #[serde(default)]
    hover: Option<String>,
}

/// Collector polling a NewsNow-compatible hotlist API, one request per
/// enabled platform.
pub struct HotlistCollector {
    client: reqwest::Client,
    api_base: String,
    platforms: Vec<PlatformConfig>,
}

impl HotlistCollector {
    pub fn new(api_base: String, platforms: Vec<PlatformConfig>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .gzip(true)
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_base,
            platforms,
        }
    }

    async fn fetch_platform(&self, platform_id: &str) -> Vec<NewsNowItem> {
        let url = format!("{}/api/s?id={}&latest", self.api_base, platform_id);

        let response = match self.client.get(&url).send().await {
            Ok(res) => res,
            Err(e) => {
                error!("hotlist platform {} request error: {}", platform_id, e);
                return Vec::new();
            }
        };

        if !response.status().is_success() {
            warn!(
                "hotlist platform {} request failed: {}",
                platform_id,
                response.status()
            );
            return Vec::new();
        }

        match response.json::<NewsNowResponse>().await {
            Ok(parsed) => parsed.items,
            Err(e) => {
                warn!("hotlist platform {} returned bad payload: {}", platform_id, e);
                Vec::new()
            }
        }
    }

    fn to_raw_items(&self, platform: &PlatformConfig, items: Vec<NewsNowItem>) -> Vec<RawItem> {
        items
            .into_iter()
            .take(MAX_ITEMS_PER_PLATFORM)
            .enumerate()
            .filter_map(|(index, item)| {
                let url = item.url.or(item.mobile_url).unwrap_or_default();
                if item.title.is_empty() || url.is_empty() {
                    return None;
                }
                let extra = item.extra;
                let mut raw = RawItem::new(item.title, url, SourceType::Hotlist, platform.name);
                raw.rank = Some(index as i32 + 1);
                raw.heat_value =
                    parse_heat_value(extra.as_ref().and_then(|e| e.info.as_deref()));
                raw.content = extra.and_then(|e| e.hover).filter(|h| !h.is_empty());
                raw.language = Some(platform.language.to_string());
                raw.default_category = platform.default_category;
                Some(raw)
            })
            .collect()
    }
}

#[async_trait]
impl Collector for HotlistCollector {
    fn name(&self) -> &str {
        "hotlist"
    }

    async fn collect(&self) -> Vec<RawItem> {
        let fetches = self.platforms.iter().map(|platform| async {
            let items = self.fetch_platform(platform.id).await;
            self.to_raw_items(platform, items)
        });

        let all_items: Vec<RawItem> = join_all(fetches).await.into_iter().flatten().collect();
        info!("hotlist: fetched {} items total", all_items.len());
        all_items
    }
}
