// Store tests run against a real PostgreSQL instance. Set TEST_DATABASE_URL
// to enable them; without it every test here is a silent skip so the rest of
// the suite stays runnable offline.

use chrono::NaiveDate;
use insight_hub::store::Store;
use insight_hub::types::{Category, NewArticle, ReportHighlights, ReportStats, SourceType};
use sqlx::PgPool;
use std::env;

const TEST_SOURCE: &str = "Store Test";

async fn test_store() -> Option<(Store, PgPool)> {
    let Ok(database_url) = env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set, skipping store test");
        return None;
    };
    let store = Store::connect(&database_url)
        .await
        .expect("connect test database");
    let pool = PgPool::connect(&database_url)
        .await
        .expect("connect cleanup pool");
    Some((store, pool))
}

async fn clear_day(pool: &PgPool, day: NaiveDate) {
    sqlx::query("DELETE FROM articles WHERE fetched_date = $1")
        .bind(day)
        .execute(pool)
        .await
        .expect("clear articles");
    sqlx::query("DELETE FROM daily_reports WHERE report_date = $1")
        .bind(day)
        .execute(pool)
        .await
        .expect("clear reports");
}

fn test_article(title: &str, url: &str, day: NaiveDate) -> NewArticle {
    NewArticle {
        title: title.to_string(),
        title_zh: None,
        url: url.to_string(),
        summary: None,
        category: Category::News,
        source_type: SourceType::Rss,
        source_name: TEST_SOURCE.to_string(),
        rank: None,
        heat_value: None,
        published_at: None,
        fetched_date: day,
        language: "en".to_string(),
    }
}

#[tokio::test]
async fn rerunning_a_day_updates_rows_instead_of_duplicating() {
    let Some((store, pool)) = test_store().await else {
        return;
    };
    let day = NaiveDate::from_ymd_opt(2031, 3, 1).unwrap();
    clear_day(&pool, day).await;

    let baseline = vec![
        test_article("First story", "https://store-test.example/1", day),
        test_article("Second story", "https://store-test.example/2", day),
    ];
    assert!(store.upsert_articles(&baseline, "baseline persist").await);

    // Second phase for the same (url, day) pairs carries enrichments.
    let mut enriched = baseline.clone();
    enriched[0].summary = Some("A short recap of the first story".to_string());
    enriched[0].title_zh = Some("第一条新闻".to_string());
    assert!(store.upsert_articles(&enriched, "enriched persist").await);

    let rows = store.articles_for_day(day, 10).await.unwrap();
    assert_eq!(rows.len(), 2);
    let first = rows
        .iter()
        .find(|a| a.url == "https://store-test.example/1")
        .unwrap();
    assert_eq!(
        first.summary.as_deref(),
        Some("A short recap of the first story")
    );
    assert_eq!(first.title_zh.as_deref(), Some("第一条新闻"));
}

#[tokio::test]
async fn urls_from_other_days_are_reported_for_the_cross_day_filter() {
    let Some((store, pool)) = test_store().await else {
        return;
    };
    let d1 = NaiveDate::from_ymd_opt(2031, 3, 10).unwrap();
    let d2 = NaiveDate::from_ymd_opt(2031, 3, 11).unwrap();
    clear_day(&pool, d1).await;
    clear_day(&pool, d2).await;

    let url = "https://store-test.example/cross-day";
    let articles = vec![test_article("Recurring story", url, d1)];
    assert!(store.upsert_articles(&articles, "baseline persist").await);

    let urls = vec![url.to_string()];
    let seen_elsewhere = store.urls_on_other_days(&urls, d2).await.unwrap();
    assert!(seen_elsewhere.contains(url));

    // The same day does not count as "another day".
    let seen_same_day = store.urls_on_other_days(&urls, d1).await.unwrap();
    assert!(seen_same_day.is_empty());
}

#[tokio::test]
async fn one_bad_row_does_not_discard_the_rest_of_the_batch() {
    let Some((store, pool)) = test_store().await else {
        return;
    };
    let day = NaiveDate::from_ymd_opt(2031, 3, 20).unwrap();
    clear_day(&pool, day).await;

    // PostgreSQL rejects NUL bytes in text columns, making this row fail.
    let bad = test_article("Bad \u{0000} title", "https://store-test.example/bad", day);
    let good = test_article("Good story", "https://store-test.example/good", day);

    let ok = store.upsert_articles(&[bad, good], "baseline persist").await;
    assert!(!ok);

    let rows = store.articles_for_day(day, 10).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].url, "https://store-test.example/good");
}

#[tokio::test]
async fn report_upsert_is_keyed_by_day() {
    let Some((store, pool)) = test_store().await else {
        return;
    };
    let day = NaiveDate::from_ymd_opt(2031, 3, 30).unwrap();
    clear_day(&pool, day).await;

    let highlights = ReportHighlights {
        hot_topics: vec!["first".to_string()],
        ..Default::default()
    };
    let stats = ReportStats {
        total_articles: 1,
        ..Default::default()
    };
    store
        .upsert_report(day, "# First draft", &highlights, &stats)
        .await
        .unwrap();
    store
        .upsert_report(day, "# Final report", &highlights, &stats)
        .await
        .unwrap();

    let report = store.get_report(day).await.unwrap().unwrap();
    assert_eq!(report.content, "# Final report");
    assert_eq!(
        report.highlights.unwrap().hot_topics,
        vec!["first".to_string()]
    );

    let dates = store.report_dates().await.unwrap();
    assert_eq!(dates.iter().filter(|d| **d == day).count(), 1);
}
