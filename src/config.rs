use crate::types::{Category, Result};
use std::env;

/// Hotlist platform polled through the NewsNow-compatible API.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub id: &'static str,
    pub name: &'static str,
    pub default_category: Option<Category>,
    pub language: &'static str,
}

/// Syndication feed subscription.
#[derive(Debug, Clone)]
pub struct RssFeedConfig {
    pub url: &'static str,
    pub name: &'static str,
    pub default_category: Category,
    pub language: &'static str,
}

/// Hotlist platforms enabled by default. Enabling too many makes the daily
/// report unreasonably long.
const DEFAULT_PLATFORMS: &[PlatformConfig] = &[
    PlatformConfig { id: "zhihu", name: "Zhihu", default_category: Some(Category::News), language: "zh" },
    PlatformConfig { id: "weibo", name: "Weibo", default_category: Some(Category::News), language: "zh" },
    PlatformConfig { id: "ithome", name: "IT Home", default_category: Some(Category::Programming), language: "zh" },
    PlatformConfig { id: "v2ex", name: "V2EX", default_category: Some(Category::Programming), language: "zh" },
    PlatformConfig { id: "sspai", name: "SSPAI", default_category: Some(Category::Growth), language: "zh" },
    PlatformConfig { id: "juejin", name: "Juejin", default_category: Some(Category::Programming), language: "zh" },
    PlatformConfig { id: "hackernews", name: "Hacker News", default_category: Some(Category::Programming), language: "en" },
    PlatformConfig { id: "producthunt", name: "Product Hunt", default_category: Some(Category::Product), language: "en" },
    PlatformConfig { id: "github", name: "GitHub", default_category: Some(Category::Programming), language: "en" },
];

const DEFAULT_RSS_FEEDS: &[RssFeedConfig] = &[
    RssFeedConfig { url: "https://36kr.com/feed", name: "36Kr", default_category: Category::Business, language: "zh" },
    RssFeedConfig { url: "https://www.infoq.cn/feed", name: "InfoQ CN", default_category: Category::Programming, language: "zh" },
    RssFeedConfig { url: "https://www.jiqizhixin.com/rss", name: "Synced", default_category: Category::Ai, language: "zh" },
    RssFeedConfig { url: "https://dev.to/feed", name: "DEV Community", default_category: Category::Programming, language: "en" },
    RssFeedConfig { url: "https://openai.com/blog/rss.xml", name: "OpenAI Blog", default_category: Category::Ai, language: "en" },
    RssFeedConfig { url: "https://huggingface.co/blog/feed.xml", name: "Hugging Face Blog", default_category: Category::Ai, language: "en" },
    RssFeedConfig { url: "https://techcrunch.com/feed/", name: "TechCrunch", default_category: Category::Business, language: "en" },
    RssFeedConfig { url: "https://feeds.arstechnica.com/arstechnica/index", name: "Ars Technica", default_category: Category::Programming, language: "en" },
    RssFeedConfig { url: "https://www.technologyreview.com/feed/", name: "MIT Tech Review", default_category: Category::Ai, language: "en" },
];

/// AI service connection settings (OpenAI-compatible endpoint).
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
}

impl AiConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: env::var("AI_API_KEY").unwrap_or_default(),
            model: env::var("AI_MODEL").unwrap_or_else(|_| "deepseek/deepseek-chat".to_string()),
            api_base: env::var("AI_API_BASE")
                .unwrap_or_else(|_| "https://api.deepseek.com".to_string()),
        }
    }
}

/// Daily schedule, parsed from a fixed-time cron expression "m h * * *".
#[derive(Debug, Clone, Copy)]
pub struct ScheduleConfig {
    pub hour: u32,
    pub minute: u32,
}

impl ScheduleConfig {
    /// Only fixed minute/hour fields are honored; everything else in the
    /// expression is ignored.
    pub fn parse(expr: &str) -> Self {
        let mut parts = expr.split_whitespace();
        let minute = parts
            .next()
            .and_then(|p| p.parse().ok())
            .unwrap_or(0)
            .min(59);
        let hour = parts
            .next()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8)
            .min(23);
        Self { hour, minute }
    }
}

/// Process-wide configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub ai: AiConfig,
    pub hotlist_api_base: String,
    pub platforms: Vec<PlatformConfig>,
    pub rss_feeds: Vec<RssFeedConfig>,
    pub folo_api_base: String,
    pub folo_cookie: Option<String>,
    pub schedule: ScheduleConfig,
    pub cron_secret: Option<String>,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL").map_err(|_| {
            crate::types::InsightError::Config("DATABASE_URL is not set".to_string())
        })?;

        // Optional comma-separated subset of platform ids to enable.
        let platforms = match env::var("HOTLIST_PLATFORMS") {
            Ok(list) => {
                let wanted: Vec<&str> = list.split(',').map(str::trim).collect();
                DEFAULT_PLATFORMS
                    .iter()
                    .filter(|p| wanted.contains(&p.id))
                    .cloned()
                    .collect()
            }
            Err(_) => DEFAULT_PLATFORMS.to_vec(),
        };

        let schedule = ScheduleConfig::parse(
            &env::var("CRON_SCHEDULE").unwrap_or_else(|_| "0 8 * * *".to_string()),
        );

        Ok(Self {
            database_url,
            ai: AiConfig::from_env(),
            hotlist_api_base: env::var("HOTLIST_API_BASE")
                .unwrap_or_else(|_| "https://newsnow.busiyi.world".to_string()),
            platforms,
            rss_feeds: DEFAULT_RSS_FEEDS.to_vec(),
            folo_api_base: env::var("FOLO_API_BASE")
                .unwrap_or_else(|_| "https://api.folo.is".to_string()),
            folo_cookie: env::var("FOLO_COOKIE").ok().filter(|c| !c.is_empty()),
            schedule,
            cron_secret: env::var("CRON_SECRET").ok().filter(|s| !s.is_empty()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
        })
    }
}
