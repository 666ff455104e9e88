use crate::ai::client::{ChatCompletion, ChatMessage, CompletionOptions};
use crate::types::{RawItem, Translation};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::{error, info};

const TRANSLATE_BATCH_SIZE: usize = 10;

const TRANSLATE_SYSTEM_PROMPT: &str = "You are a professional translator. \
Translate English content into Simplified Chinese; proper nouns may stay in \
English (e.g. React, Docker, GitHub).\n\n\
Input format: one line per article, \"index|english title|english summary\"\n\
Output format: one line per article, \"index|chinese title|chinese summary\"\n\n\
Rules:\n\
- If the summary is empty, leave it empty in the output too: \"0|chinese title|\"\n\
- Keep summary translations concise, at most 80 characters\n\
- Output nothing else";

static TRANSLATION_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\s*[|｜]\s*([^|｜]+)\s*[|｜]?\s*(.*)").unwrap());

/// Translate titles and summaries of non-target-language items, batched in
/// the same "index|title|summary" line format in both directions. A line
/// that fails to parse is skipped; a failed batch never aborts the stage.
pub async fn translate_items(
    items: &[RawItem],
    summaries: &HashMap<usize, String>,
    ai: &dyn ChatCompletion,
) -> HashMap<usize, Translation> {
    let mut translations: HashMap<usize, Translation> = HashMap::new();

    let non_target: Vec<usize> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.language.as_deref() == Some("en"))
        .map(|(index, _)| index)
        .collect();

    if non_target.is_empty() {
        info!("translate: nothing to translate");
        return translations;
    }

    info!("translate: {} items need translation (title + summary)", non_target.len());

    for batch in non_target.chunks(TRANSLATE_BATCH_SIZE) {
        let article_list = batch
            .iter()
            .enumerate()
            .map(|(i, &index)| {
                let summary = summaries.get(&index).map(String::as_str).unwrap_or("");
                format!("{i}|{}|{summary}", items[index].title)
            })
            .collect::<Vec<_>>()
            .join("\n");

        let messages = [
            ChatMessage::system(TRANSLATE_SYSTEM_PROMPT),
            ChatMessage::user(article_list),
        ];
        let options = CompletionOptions {
            temperature: 0.2,
            ..Default::default()
        };

        match ai.complete(&messages, &options).await {
            Ok(response) => {
                for line in response.lines() {
                    let Some(caps) = TRANSLATION_LINE.captures(line) else {
                        continue;
                    };
                    let Ok(local_index) = caps[1].parse::<usize>() else {
                        continue;
                    };
                    let title_zh = caps[2].trim().to_string();
                    let summary_zh = caps[3].trim().to_string();

                    let Some(&original_index) = batch.get(local_index) else {
                        continue;
                    };
                    if title_zh.chars().count() > 1 {
                        translations.insert(
                            original_index,
                            Translation {
                                title_zh,
                                summary_zh: (summary_zh.chars().count() > 2)
                                    .then_some(summary_zh),
                            },
                        );
                    }
                }
            }
            Err(e) => {
                error!("translate: batch failed: {}", e);
            }
        }
    }

    info!("translate: translated {} items", translations.len());
    translations
}
