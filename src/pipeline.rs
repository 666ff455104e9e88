use crate::ai::{
    classify_items, generate_daily_analysis, summarize_items, translate_items, ChatCompletion,
};
use crate::dedup::{deduplicate_items, DEDUP_SIMILARITY_THRESHOLD};
use crate::sources::{collect_all, Collector};
use crate::store::Store;
use crate::types::{
    Category, NewArticle, PipelineOutcome, RawItem, ReportStats, Result, Translation,
};
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{error, info, warn};

/// Digest generation re-reads at most this many persisted articles, most
/// popular first.
const DIGEST_READBACK_LIMIT: i64 = 500;

fn build_article(
    item: &RawItem,
    day: NaiveDate,
    summary: Option<&String>,
    translation: Option<&Translation>,
) -> NewArticle {
    NewArticle {
        title: item.title.clone(),
        title_zh: translation.map(|t| t.title_zh.clone()),
        url: item.url.clone(),
        summary: translation
            .and_then(|t| t.summary_zh.clone())
            .or_else(|| summary.cloned()),
        category: item.default_category.unwrap_or(Category::News),
        source_type: item.source_type,
        source_name: item.source_name.clone(),
        rank: item.rank,
        heat_value: item.heat_value,
        published_at: item.published_at,
        fetched_date: day,
        language: item.language.clone().unwrap_or_else(|| "zh".to_string()),
    }
}

/// One batch run for a target fetch day, strictly sequential stages:
/// collect -> dedup -> cross-day filter -> classify -> persist baseline ->
/// summarize -> translate -> persist enriched -> read back -> digest ->
/// persist digest.
///
/// Baseline persistence happens before the slower, failure-prone AI stages
/// so a total AI outage still leaves usable records for the day. The digest
/// is built from what is durably stored, not from in-memory state.
pub async fn run_daily_pipeline(
    store: &Store,
    ai: &dyn ChatCompletion,
    collectors: &[Box<dyn Collector>],
    day: NaiveDate,
) -> Result<PipelineOutcome> {
    info!("========== daily pipeline start: {} ==========", day);

    // Phase one: collect -> dedup -> classify -> baseline persist.

    info!("pipeline step 1: collecting sources");
    let raw_items = collect_all(collectors).await;
    info!("pipeline: {} raw items collected", raw_items.len());

    if raw_items.is_empty() {
        // Nothing to report is distinct from an empty report.
        warn!("pipeline: no items collected, aborting run");
        return Ok(PipelineOutcome {
            articles_count: 0,
            report_generated: false,
        });
    }

    info!("pipeline step 2: in-run dedup");
    let dedup_items = deduplicate_items(raw_items, DEDUP_SIMILARITY_THRESHOLD);

    info!("pipeline step 2.5: cross-day dedup");
    let urls: Vec<String> = dedup_items.iter().map(|item| item.url.clone()).collect();
    let existing_urls = match store.urls_on_other_days(&urls, day).await {
        Ok(existing) => existing,
        Err(e) => {
            warn!("pipeline: cross-day lookup failed, keeping all items: {}", e);
            Default::default()
        }
    };
    let before = dedup_items.len();
    let fresh_items: Vec<RawItem> = dedup_items
        .into_iter()
        .filter(|item| !existing_urls.contains(&item.url))
        .collect();
    info!(
        "pipeline: cross-day dedup excluded {} already-seen articles, kept {}",
        before - fresh_items.len(),
        fresh_items.len()
    );

    info!("pipeline step 3: AI classification");
    let classified_items = classify_items(fresh_items, ai).await;

    info!("pipeline step 4: baseline persist");
    let base_articles: Vec<NewArticle> = classified_items
        .iter()
        .map(|item| build_article(item, day, None, None))
        .collect();
    store.upsert_articles(&base_articles, "baseline persist").await;

    // Phase two: summarize -> translate -> enriched persist.

    info!("pipeline step 5: AI summaries");
    let summaries = summarize_items(&classified_items, ai).await;

    info!("pipeline step 6: AI translation");
    let translations = translate_items(&classified_items, &summaries, ai).await;

    if summaries.is_empty() && translations.is_empty() {
        info!("pipeline step 7: no enrichments, skipping second persist");
    } else {
        info!("pipeline step 7: enriched persist (summaries + translations)");
        let enriched_articles: Vec<NewArticle> = classified_items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                build_article(item, day, summaries.get(&index), translations.get(&index))
            })
            .collect();
        store
            .upsert_articles(&enriched_articles, "enriched persist")
            .await;
    }

    // Phase three: digest, built from the persisted rows so it reflects
    // whatever actually landed even if this run's writes partially failed.

    info!("pipeline step 8: daily report generation");
    let report_generated =
        generate_and_store_report(store, ai, day).await.unwrap_or_else(|e| {
            error!("pipeline: report generation failed: {}", e);
            false
        });

    info!("========== daily pipeline done: {} ==========", day);
    Ok(PipelineOutcome {
        articles_count: classified_items.len(),
        report_generated,
    })
}

async fn generate_and_store_report(
    store: &Store,
    ai: &dyn ChatCompletion,
    day: NaiveDate,
) -> Result<bool> {
    let today_articles = store.articles_for_day(day, DIGEST_READBACK_LIMIT).await?;
    if today_articles.is_empty() {
        return Ok(false);
    }

    let analysis = generate_daily_analysis(&today_articles, ai).await;

    let mut by_category: HashMap<String, usize> = HashMap::new();
    let mut by_source: HashMap<String, usize> = HashMap::new();
    for article in &today_articles {
        *by_category
            .entry(article.category.as_str().to_string())
            .or_default() += 1;
        *by_source.entry(article.source_name.clone()).or_default() += 1;
    }
    let stats = ReportStats {
        total_articles: today_articles.len(),
        by_category,
        by_source,
    };

    store
        .upsert_report(day, &analysis.content, &analysis.highlights, &stats)
        .await?;
    info!("pipeline: daily report stored");
    Ok(true)
}
