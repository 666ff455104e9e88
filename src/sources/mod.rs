pub mod folo;
pub mod hotlist;
pub mod rss;

pub use folo::FoloCollector;
pub use hotlist::HotlistCollector;
pub use rss::RssCollector;

use crate::types::RawItem;
use async_trait::async_trait;
use futures::future::join_all;
use tracing::info;

/// Trait for pulling raw items from a content source.
///
/// `collect` must never surface a fatal error: network, parse, and upstream
/// API failures are logged inside the collector and yield an empty or
/// partial result for that source only.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Human-readable name for logs.
    fn name(&self) -> &str;

    /// Fetch items from the source.
    async fn collect(&self) -> Vec<RawItem>;
}

/// Run every collector concurrently and join their outputs. A failed or slow
/// collector never blocks or poisons the others.
pub async fn collect_all(collectors: &[Box<dyn Collector>]) -> Vec<RawItem> {
    let results = join_all(collectors.iter().map(|collector| async move {
        let items = collector.collect().await;
        info!("collected {} items from {}", items.len(), collector.name());
        items
    }))
    .await;

    results.into_iter().flatten().collect()
}
