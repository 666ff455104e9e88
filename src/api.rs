use crate::scheduler::Scheduler;
use crate::store::Store;
use crate::types::{Category, PipelineOutcome};
use crate::utils::today_date;
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, warn};

const CRON_SECRET_HEADER: &str = "x-cron-secret";

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub scheduler: Arc<Scheduler>,
    pub cron_secret: Option<String>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/articles", get(list_articles))
        .route("/api/report", get(get_report))
        .route("/api/report-dates", get(report_dates))
        .route("/api/cron", post(trigger_run))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ArticlesQuery {
    date: Option<NaiveDate>,
    category: Option<String>,
    page: Option<i64>,
    page_size: Option<i64>,
}

async fn list_articles(
    State(state): State<AppState>,
    Query(query): Query<ArticlesQuery>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let category = match query.category.as_deref() {
        Some(slug) => Some(Category::parse_slug(slug).ok_or(StatusCode::BAD_REQUEST)?),
        None => None,
    };
    let page = query.page.unwrap_or(0).max(0);
    let page_size = query
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let articles = state
        .store
        .list_articles(query.date, category, page, page_size)
        .await
        .map_err(|e| {
            error!("api: article listing failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(serde_json::json!({
        "articles": articles,
        "page": page,
        "pageSize": page_size,
    })))
}

#[derive(Debug, Deserialize)]
struct ReportQuery {
    date: Option<NaiveDate>,
}

async fn get_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let day = query.date.unwrap_or_else(today_date);
    let report = state.store.get_report(day).await.map_err(|e| {
        error!("api: report lookup failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    // A day without a report renders as "not yet available", not an error.
    match report {
        Some(report) => Ok(Json(serde_json::json!({ "report": report }))),
        None => Err(StatusCode::NOT_FOUND),
    }
}

async fn report_dates(
    State(state): State<AppState>,
) -> Result<Json<Vec<NaiveDate>>, StatusCode> {
    state.store.report_dates().await.map(Json).map_err(|e| {
        error!("api: report dates lookup failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

#[derive(Debug, Default, Deserialize)]
struct TriggerBody {
    date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TriggerResponse {
    triggered: bool,
    outcome: Option<PipelineOutcome>,
}

/// Authenticated manual trigger for one pipeline run. The shared secret is
/// compared against configuration; a missing secret or mismatch yields 401
/// without revealing which.
async fn trigger_run(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<TriggerBody>>,
) -> Result<Json<TriggerResponse>, StatusCode> {
    let provided = headers
        .get(CRON_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());
    let authorized = matches!(
        (state.cron_secret.as_deref(), provided),
        (Some(expected), Some(given)) if expected == given
    );
    if !authorized {
        warn!("api: unauthorized cron trigger rejected");
        return Err(StatusCode::UNAUTHORIZED);
    }

    let day = body
        .and_then(|Json(b)| b.date)
        .unwrap_or_else(today_date);

    match state.scheduler.run_guarded(day).await {
        Ok(Some(outcome)) => Ok(Json(TriggerResponse {
            triggered: true,
            outcome: Some(outcome),
        })),
        Ok(None) => Ok(Json(TriggerResponse {
            triggered: false,
            outcome: None,
        })),
        Err(e) => {
            // Internal detail stays out of the response to untrusted callers.
            error!("api: triggered run failed: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
