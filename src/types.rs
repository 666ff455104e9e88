use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Kind of content source an item was collected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Hotlist,
    Rss,
    Folo,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Hotlist => "hotlist",
            SourceType::Rss => "rss",
            SourceType::Folo => "folo",
        }
    }
}

impl std::str::FromStr for SourceType {
    type Err = InsightError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "hotlist" => Ok(SourceType::Hotlist),
            "rss" => Ok(SourceType::Rss),
            "folo" => Ok(SourceType::Folo),
            other => Err(InsightError::General(format!(
                "unknown source type: {other}"
            ))),
        }
    }
}

/// Closed set of content categories. `News` is the catch-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Ai,
    Programming,
    Frontend,
    Backend,
    Product,
    Business,
    Growth,
    News,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Ai,
        Category::Programming,
        Category::Frontend,
        Category::Backend,
        Category::Product,
        Category::Business,
        Category::Growth,
        Category::News,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Ai => "ai",
            Category::Programming => "programming",
            Category::Frontend => "frontend",
            Category::Backend => "backend",
            Category::Product => "product",
            Category::Business => "business",
            Category::Growth => "growth",
            Category::News => "news",
        }
    }

    /// Parse a category slug, rejecting anything outside the closed set.
    pub fn parse_slug(slug: &str) -> Option<Category> {
        Category::ALL.iter().copied().find(|c| c.as_str() == slug)
    }

    /// Display name used in digest headings.
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Ai => "AI",
            Category::Programming => "Programming",
            Category::Frontend => "Frontend",
            Category::Backend => "Backend",
            Category::Product => "Product",
            Category::Business => "Business",
            Category::Growth => "Growth",
            Category::News => "News",
        }
    }
}

/// Raw item produced by a collector, consumed within one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawItem {
    pub title: String,
    pub url: String,
    pub source_type: SourceType,
    pub source_name: String,
    pub rank: Option<i32>,
    pub heat_value: Option<i64>,
    pub published_at: Option<DateTime<Utc>>,
    pub author: Option<String>,
    pub content: Option<String>,
    pub language: Option<String>,
    pub default_category: Option<Category>,
}

impl RawItem {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        source_type: SourceType,
        source_name: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            source_type,
            source_name: source_name.into(),
            rank: None,
            heat_value: None,
            published_at: None,
            author: None,
            content: None,
            language: None,
            default_category: None,
        }
    }
}

/// Article record as written to the store; unique on (url, fetched_date).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewArticle {
    pub title: String,
    pub title_zh: Option<String>,
    pub url: String,
    pub summary: Option<String>,
    pub category: Category,
    pub source_type: SourceType,
    pub source_name: String,
    pub rank: Option<i32>,
    pub heat_value: Option<i64>,
    pub published_at: Option<DateTime<Utc>>,
    pub fetched_date: NaiveDate,
    pub language: String,
}

/// Article record as read back from the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub id: Uuid,
    pub title: String,
    pub title_zh: Option<String>,
    pub url: String,
    pub summary: Option<String>,
    pub category: Category,
    pub source_type: SourceType,
    pub source_name: String,
    pub rank: Option<i32>,
    pub heat_value: Option<i64>,
    pub published_at: Option<DateTime<Utc>>,
    pub fetched_date: NaiveDate,
    pub language: String,
    pub created_at: DateTime<Utc>,
}

/// Structured highlight block attached to a daily report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportHighlights {
    #[serde(default)]
    pub hot_topics: Vec<String>,
    #[serde(default)]
    pub trend_insights: Vec<String>,
    #[serde(default)]
    pub cross_domain_links: Vec<String>,
    #[serde(default)]
    pub signals_to_watch: Vec<String>,
}

/// Aggregate statistics stored alongside a daily report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStats {
    pub total_articles: usize,
    pub by_category: HashMap<String, usize>,
    pub by_source: HashMap<String, usize>,
}

/// Daily digest report, one per fetched_date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyReport {
    pub id: Uuid,
    pub report_date: NaiveDate,
    pub content: String,
    pub highlights: Option<ReportHighlights>,
    pub stats: Option<ReportStats>,
    pub created_at: DateTime<Utc>,
}

/// Title + summary translation produced by the translate stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub title_zh: String,
    pub summary_zh: Option<String>,
}

/// Result of one orchestrator run.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PipelineOutcome {
    pub articles_count: usize,
    pub report_generated: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum InsightError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("AI call failed after {attempts} attempts: {last_error}")]
    AiExhausted { attempts: u32, last_error: String },

    #[error("AI returned an empty completion")]
    EmptyCompletion,

    #[error("Could not parse structured AI response: {0}")]
    JsonParse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, InsightError>;
