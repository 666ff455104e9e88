pub mod ai;
pub mod api;
pub mod config;
pub mod dedup;
pub mod pipeline;
pub mod scheduler;
pub mod sources;
pub mod store;
pub mod types;
pub mod utils;

pub use ai::{AiClient, ChatCompletion};
pub use config::AppConfig;
pub use pipeline::run_daily_pipeline;
pub use scheduler::Scheduler;
pub use store::Store;
pub use types::*;
