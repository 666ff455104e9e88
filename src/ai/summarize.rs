use crate::ai::client::{ChatCompletion, ChatMessage, CompletionOptions};
use crate::types::RawItem;
use crate::utils::truncate_chars;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::{error, info};

const SUMMARIZE_BATCH_SIZE: usize = 15;

/// Items with inline content longer than this skip the AI entirely.
const INLINE_CONTENT_MIN_CHARS: usize = 10;
const INLINE_SUMMARY_MAX_CHARS: usize = 150;

/// Ceiling on AI-generated summaries per run, bounding API spend.
const MAX_AI_SUMMARIES: usize = 100;

/// Titles at or below this length are not worth a model call.
const MIN_TITLE_CHARS: usize = 5;

const SUMMARIZE_SYSTEM_PROMPT: &str = "You are a content summarizer. \
Write one short summary sentence (at most 50 characters) for each article title.\n\
Output format: one line per article, \"index|summary\", for example:\n\
0|summary of the first article\n\
1|summary of the second article\n\
Output nothing else.";

static SUMMARY_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\s*[|｜]\s*(.+)").unwrap());

/// Produce a summary per item index. Items carrying inline body text are
/// summarized by truncation without an AI call; the rest are batched through
/// a line-oriented "index|summary" response format, which tolerates more
/// formatting drift than structured parsing. Items still unsummarized after
/// the AI pass fall back to a source-keyed template where one exists.
pub async fn summarize_items(
    items: &[RawItem],
    ai: &dyn ChatCompletion,
) -> HashMap<usize, String> {
    let mut summaries: HashMap<usize, String> = HashMap::new();

    for (index, item) in items.iter().enumerate() {
        if let Some(content) = &item.content {
            if content.chars().count() > INLINE_CONTENT_MIN_CHARS {
                summaries.insert(index, truncate_chars(content, INLINE_SUMMARY_MAX_CHARS));
            }
        }
    }

    let need_summary: Vec<usize> = items
        .iter()
        .enumerate()
        .filter(|(index, item)| {
            !summaries.contains_key(index) && item.title.chars().count() > MIN_TITLE_CHARS
        })
        .map(|(index, _)| index)
        .take(MAX_AI_SUMMARIES)
        .collect();

    if need_summary.is_empty() {
        info!("summarize: all {} summaries taken from inline content", summaries.len());
        return summaries;
    }

    info!("summarize: {} items need AI summaries", need_summary.len());

    for batch in need_summary.chunks(SUMMARIZE_BATCH_SIZE) {
        let article_list = batch
            .iter()
            .enumerate()
            .map(|(i, &index)| format!("{i}. {}", items[index].title))
            .collect::<Vec<_>>()
            .join("\n");

        let messages = [
            ChatMessage::system(SUMMARIZE_SYSTEM_PROMPT),
            ChatMessage::user(article_list),
        ];
        let options = CompletionOptions {
            max_tokens: 2048,
            ..Default::default()
        };

        match ai.complete(&messages, &options).await {
            Ok(response) => {
                for line in response.lines() {
                    let Some(caps) = SUMMARY_LINE.captures(line) else {
                        continue;
                    };
                    let Ok(local_index) = caps[1].parse::<usize>() else {
                        continue;
                    };
                    let summary = caps[2].trim();
                    if let Some(&original_index) = batch.get(local_index) {
                        if summary.chars().count() > 2 {
                            summaries.insert(original_index, summary.to_string());
                        }
                    }
                }
            }
            Err(e) => {
                // Failed batches are skipped; later batches still run.
                error!("summarize: batch failed: {}", e);
            }
        }
    }

    for (index, item) in items.iter().enumerate() {
        if summaries.contains_key(&index) {
            continue;
        }
        if let Some(fallback) = fallback_summary(item) {
            summaries.insert(index, fallback);
        }
    }

    info!("summarize: produced {}/{} summaries", summaries.len(), items.len());
    summaries
}

/// Templated fallback for known high-value sources; other items remain
/// unsummarized, which is a valid end state.
fn fallback_summary(item: &RawItem) -> Option<String> {
    let title = item.title.trim();
    if title.is_empty() {
        return None;
    }

    match item.source_name.as_str() {
        "GitHub" => Some(format!(
            "Trending open source project on GitHub: {}",
            title.split_whitespace().collect::<String>()
        )),
        "Product Hunt" => Some(format!("Trending launch on Product Hunt: {title}")),
        "Hacker News" => Some(format!("Popular Hacker News discussion: {title}")),
        _ => None,
    }
}
