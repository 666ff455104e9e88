use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use insight_hub::ai::{ChatCompletion, ChatMessage, CompletionOptions};
use insight_hub::types::{ArticleRecord, Category, InsightError, RawItem, Result, SourceType};
use std::collections::VecDeque;
use std::sync::Mutex;
use uuid::Uuid;

/// AI client that fails every call, for exercising fallback paths.
pub struct FailingAi;

#[async_trait]
impl ChatCompletion for FailingAi {
    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _options: &CompletionOptions,
    ) -> Result<String> {
        Err(InsightError::AiExhausted {
            attempts: 3,
            last_error: "connection refused".to_string(),
        })
    }
}

/// AI client that replays a fixed script of responses, one per call.
/// Calls beyond the script fail.
pub struct ScriptedAi {
    responses: Mutex<VecDeque<String>>,
}

impl ScriptedAi {
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(String::from).collect()),
        }
    }
}

#[async_trait]
impl ChatCompletion for ScriptedAi {
    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _options: &CompletionOptions,
    ) -> Result<String> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(InsightError::EmptyCompletion)
    }
}

pub fn raw_item(title: &str, url: &str) -> RawItem {
    RawItem::new(title, url, SourceType::Hotlist, "Test Source")
}

pub fn raw_item_with_heat(title: &str, url: &str, heat: i64) -> RawItem {
    let mut item = raw_item(title, url);
    item.heat_value = Some(heat);
    item
}

pub fn article(title: &str, heat: Option<i64>) -> ArticleRecord {
    ArticleRecord {
        id: Uuid::new_v4(),
        title: title.to_string(),
        title_zh: None,
        url: format!("https://example.com/{}", Uuid::new_v4()),
        summary: None,
        category: Category::News,
        source_type: SourceType::Rss,
        source_name: "Test Source".to_string(),
        rank: None,
        heat_value: heat,
        published_at: None,
        fetched_date: NaiveDate::from_ymd_opt(2025, 2, 9).unwrap(),
        language: "en".to_string(),
        created_at: Utc::now(),
    }
}
