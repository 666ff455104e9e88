use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use insight_hub::ai::AiClient;
use insight_hub::api::{create_router, AppState};
use insight_hub::config::AppConfig;
use insight_hub::pipeline::run_daily_pipeline;
use insight_hub::scheduler::Scheduler;
use insight_hub::sources::{Collector, FoloCollector, HotlistCollector, RssCollector};
use insight_hub::store::Store;
use insight_hub::utils::today_date;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "insight-hub", about = "Daily content aggregation and digest pipeline")]
struct Cli {
    /// Run one pipeline immediately and exit instead of serving
    #[arg(long)]
    once: bool,

    /// Target fetch day (YYYY-MM-DD), defaults to today
    #[arg(long)]
    date: Option<NaiveDate>,
}

fn build_collectors(config: &AppConfig) -> Vec<Box<dyn Collector>> {
    vec![
        Box::new(HotlistCollector::new(
            config.hotlist_api_base.clone(),
            config.platforms.clone(),
        )),
        Box::new(RssCollector::new(config.rss_feeds.clone())),
        Box::new(FoloCollector::new(
            config.folo_api_base.clone(),
            config.folo_cookie.clone(),
        )),
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("loading configuration")?;

    info!("starting insight-hub");
    let store = Arc::new(
        Store::connect(&config.database_url)
            .await
            .context("connecting to database")?,
    );

    let ai = Arc::new(AiClient::new(&config.ai));
    let collectors = Arc::new(build_collectors(&config));

    if cli.once {
        let day = cli.date.unwrap_or_else(today_date);
        let outcome =
            run_daily_pipeline(&store, ai.as_ref(), &collectors, day).await?;
        info!(
            "run finished: {} articles, report {}",
            outcome.articles_count,
            if outcome.report_generated { "generated" } else { "not generated" }
        );
        return Ok(());
    }

    let scheduler = Scheduler::new(config.schedule, store.clone(), ai, collectors);
    scheduler.clone().spawn();

    let state = AppState {
        store,
        scheduler,
        cron_secret: config.cron_secret.clone(),
    };
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app).await.context("serving HTTP")?;

    Ok(())
}
