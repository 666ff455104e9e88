use crate::ai::client::{parse_json_response, ChatCompletion, ChatMessage, CompletionOptions};
use crate::types::{Category, RawItem};
use serde::Deserialize;
use tracing::{error, info};

const CLASSIFY_BATCH_SIZE: usize = 20;

const CLASSIFY_SYSTEM_PROMPT: &str = "You are a content classifier. \
Available categories: ai, programming, frontend, backend, product, business, growth, news. \
Return a JSON array: [{\"index\": 0, \"category\": \"slug\"}, ...]";

#[derive(Debug, Deserialize)]
struct ClassifyResult {
    index: usize,
    category: String,
}

/// Assign a category to every item that does not already carry one.
///
/// Items are batched and classified through an indexed prompt; a failed
/// batch degrades to the `news` catch-all for its still-unclassified items
/// instead of dropping anything.
pub async fn classify_items(items: Vec<RawItem>, ai: &dyn ChatCompletion) -> Vec<RawItem> {
    let mut classified = items;

    // (original position, title) pairs still needing a category.
    let need_classify: Vec<(usize, String)> = classified
        .iter()
        .enumerate()
        .filter(|(_, item)| item.default_category.is_none())
        .map(|(i, item)| (i, item.title.clone()))
        .collect();

    if need_classify.is_empty() {
        info!("classify: all items carry preset categories, skipping AI");
        return classified;
    }

    info!("classify: {} items need AI classification", need_classify.len());

    for batch in need_classify.chunks(CLASSIFY_BATCH_SIZE) {
        let article_list = batch
            .iter()
            .enumerate()
            .map(|(i, (_, title))| format!("{i}. {title}"))
            .collect::<Vec<_>>()
            .join("\n");

        let messages = [
            ChatMessage::system(CLASSIFY_SYSTEM_PROMPT),
            ChatMessage::user(format!("Classify the following articles:\n{article_list}")),
        ];
        let options = CompletionOptions {
            temperature: 0.1,
            json_mode: true,
            ..Default::default()
        };

        let outcome = match ai.complete(&messages, &options).await {
            Ok(response) => parse_json_response::<Vec<ClassifyResult>>(&response),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(results) => {
                for result in results {
                    let Some(&(original_index, _)) = batch.get(result.index) else {
                        continue;
                    };
                    if let Some(category) = Category::parse_slug(&result.category) {
                        classified[original_index].default_category = Some(category);
                    }
                }
            }
            Err(e) => {
                error!("classify: batch failed: {}", e);
                // Graceful degradation: everything in the batch lands in the
                // catch-all rather than being dropped.
                for &(original_index, _) in batch {
                    if classified[original_index].default_category.is_none() {
                        classified[original_index].default_category = Some(Category::News);
                    }
                }
            }
        }
    }

    classified
}
