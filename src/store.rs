use crate::types::{
    ArticleRecord, Category, DailyReport, InsightError, NewArticle, ReportHighlights, ReportStats,
    Result, SourceType,
};
use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use std::collections::HashSet;
use std::str::FromStr;
use tracing::{error, info};
use uuid::Uuid;

/// Cross-day URL lookups are chunked to bound query parameter sizes.
const URL_QUERY_CHUNK: usize = 100;

/// Durable store for articles and daily reports. All writes are idempotent
/// upserts keyed by (url, fetched_date) or (report_date).
pub struct Store {
    db: PgPool,
}

impl Store {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let db = PgPool::connect(database_url).await?;
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .map_err(|e| InsightError::General(format!("migration failed: {e}")))?;
        Ok(Self { db })
    }

    pub fn from_pool(db: PgPool) -> Self {
        Self { db }
    }

    /// Upsert a batch of articles. Re-running the same day updates records
    /// in place instead of duplicating them. A failed row is logged and
    /// skipped; the rest of the batch still lands. Returns whether every
    /// row succeeded.
    pub async fn upsert_articles(&self, articles: &[NewArticle], label: &str) -> bool {
        if articles.is_empty() {
            return true;
        }

        let mut all_ok = true;
        for article in articles {
            let result = sqlx::query(
                r#"
                INSERT INTO articles
                    (id, title, title_zh, url, summary, category, source_type, source_name,
                     rank, heat_value, published_at, fetched_date, language)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                ON CONFLICT (url, fetched_date) DO UPDATE SET
                    title = EXCLUDED.title,
                    title_zh = EXCLUDED.title_zh,
                    summary = EXCLUDED.summary,
                    category = EXCLUDED.category,
                    source_type = EXCLUDED.source_type,
                    source_name = EXCLUDED.source_name,
                    rank = EXCLUDED.rank,
                    heat_value = EXCLUDED.heat_value,
                    published_at = EXCLUDED.published_at,
                    language = EXCLUDED.language
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(&article.title)
            .bind(&article.title_zh)
            .bind(&article.url)
            .bind(&article.summary)
            .bind(article.category.as_str())
            .bind(article.source_type.as_str())
            .bind(&article.source_name)
            .bind(article.rank)
            .bind(article.heat_value)
            .bind(article.published_at)
            .bind(article.fetched_date)
            .bind(&article.language)
            .execute(&self.db)
            .await;

            if let Err(e) = result {
                error!("{} failed for {}: {}", label, article.url, e);
                all_ok = false;
            }
        }

        if all_ok {
            info!("{} succeeded: {} articles", label, articles.len());
        }
        all_ok
    }

    /// URLs from `urls` that are already recorded under a fetched_date other
    /// than `day`. Used by the cross-day filter: the same story must not
    /// reappear on a second day.
    pub async fn urls_on_other_days(
        &self,
        urls: &[String],
        day: NaiveDate,
    ) -> Result<HashSet<String>> {
        let mut existing: HashSet<String> = HashSet::new();

        for chunk in urls.chunks(URL_QUERY_CHUNK) {
            let rows = sqlx::query(
                "SELECT url FROM articles WHERE url = ANY($1) AND fetched_date <> $2",
            )
            .bind(chunk)
            .bind(day)
            .fetch_all(&self.db)
            .await?;

            for row in rows {
                existing.insert(row.try_get("url")?);
            }
        }

        Ok(existing)
    }

    /// Persisted articles for one day, most popular first.
    pub async fn articles_for_day(
        &self,
        day: NaiveDate,
        limit: i64,
    ) -> Result<Vec<ArticleRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM articles
            WHERE fetched_date = $1
            ORDER BY heat_value DESC NULLS LAST, created_at ASC
            LIMIT $2
            "#,
        )
        .bind(day)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        rows.iter().map(row_to_article).collect()
    }

    /// Filtered, paginated listing for the read-side API.
    pub async fn list_articles(
        &self,
        date: Option<NaiveDate>,
        category: Option<Category>,
        page: i64,
        page_size: i64,
    ) -> Result<Vec<ArticleRecord>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM articles WHERE true");
        if let Some(date) = date {
            builder.push(" AND fetched_date = ").push_bind(date);
        }
        if let Some(category) = category {
            builder
                .push(" AND category = ")
                .push_bind(category.as_str());
        }
        builder
            .push(" ORDER BY heat_value DESC NULLS LAST, created_at ASC LIMIT ")
            .push_bind(page_size)
            .push(" OFFSET ")
            .push_bind(page.max(0) * page_size);

        let rows = builder.build().fetch_all(&self.db).await?;
        rows.iter().map(row_to_article).collect()
    }

    /// Upsert the daily report, keyed by report_date.
    pub async fn upsert_report(
        &self,
        day: NaiveDate,
        content: &str,
        highlights: &ReportHighlights,
        stats: &ReportStats,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO daily_reports (id, report_date, content, highlights, stats)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (report_date) DO UPDATE SET
                content = EXCLUDED.content,
                highlights = EXCLUDED.highlights,
                stats = EXCLUDED.stats
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(day)
        .bind(content)
        .bind(serde_json::to_value(highlights)?)
        .bind(serde_json::to_value(stats)?)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    pub async fn get_report(&self, day: NaiveDate) -> Result<Option<DailyReport>> {
        let row = sqlx::query("SELECT * FROM daily_reports WHERE report_date = $1")
            .bind(day)
            .fetch_optional(&self.db)
            .await?;

        match row {
            Some(row) => Ok(Some(DailyReport {
                id: row.try_get("id")?,
                report_date: row.try_get("report_date")?,
                content: row.try_get("content")?,
                highlights: row
                    .try_get::<Option<serde_json::Value>, _>("highlights")?
                    .and_then(|v| serde_json::from_value(v).ok()),
                stats: row
                    .try_get::<Option<serde_json::Value>, _>("stats")?
                    .and_then(|v| serde_json::from_value(v).ok()),
                created_at: row.try_get("created_at")?,
            })),
            None => Ok(None),
        }
    }

    /// Dates with a stored report, newest first.
    pub async fn report_dates(&self) -> Result<Vec<NaiveDate>> {
        let rows =
            sqlx::query("SELECT report_date FROM daily_reports ORDER BY report_date DESC")
                .fetch_all(&self.db)
                .await?;

        rows.iter()
            .map(|row| row.try_get("report_date").map_err(InsightError::from))
            .collect()
    }
}

fn row_to_article(row: &PgRow) -> Result<ArticleRecord> {
    let category: String = row.try_get("category")?;
    let source_type: String = row.try_get("source_type")?;

    Ok(ArticleRecord {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        title_zh: row.try_get("title_zh")?,
        url: row.try_get("url")?,
        summary: row.try_get("summary")?,
        category: Category::parse_slug(&category).unwrap_or(Category::News),
        source_type: SourceType::from_str(&source_type)?,
        source_name: row.try_get("source_name")?,
        rank: row.try_get("rank")?,
        heat_value: row.try_get("heat_value")?,
        published_at: row.try_get("published_at")?,
        fetched_date: row.try_get("fetched_date")?,
        language: row.try_get("language")?,
        created_at: row.try_get("created_at")?,
    })
}
