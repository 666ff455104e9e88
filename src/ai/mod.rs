pub mod analyze;
pub mod classify;
pub mod client;
pub mod summarize;
pub mod translate;

pub use analyze::{generate_daily_analysis, DailyAnalysis};
pub use classify::classify_items;
pub use client::{parse_json_response, AiClient, ChatCompletion, ChatMessage, CompletionOptions};
pub use summarize::summarize_items;
pub use translate::translate_items;
