use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use echotrade::analysis::PatternAnalyzer;
use echotrade::api::router::create_router;
use echotrade::broker::http::HttpOrderGateway;
use echotrade::broker::sim::SimulatedGateway;
use echotrade::broker::OrderGateway;
use echotrade::config::AppConfig;
use echotrade::db;
use echotrade::execution::engine::CopyEngine;
use echotrade::metrics::init_metrics;
use echotrade::services::copy_scheduler::run_copy_scheduler;
use echotrade::services::notifier::Notifier;
use echotrade::services::pattern_sweep::run_pattern_sweep;
use echotrade::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);

    tracing::info!("Connecting to database...");
    let db = db::init_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&db).await?;
    tracing::info!("Database connected, migrations applied");

    let metrics_handle = init_metrics();

    // --- Shared collaborators ---
    let notifier = match (&config.telegram_bot_token, &config.telegram_chat_id) {
        (Some(token), Some(chat)) => Some(Arc::new(Notifier::new(token.clone(), chat.clone()))),
        _ => {
            tracing::info!("Telegram not configured, notifications disabled");
            None
        }
    };

    let gateway: Arc<dyn OrderGateway> = match &config.gateway_url {
        Some(url) => {
            tracing::info!(url = %url, "Using HTTP order gateway");
            Arc::new(HttpOrderGateway::new(
                url.clone(),
                config.gateway_api_key.clone(),
            ))
        }
        None => {
            tracing::warn!("GATEWAY_URL not set, replica orders will be simulated");
            Arc::new(SimulatedGateway::new())
        }
    };

    let pause_flag = Arc::new(AtomicBool::new(false));
    let engine = Arc::new(CopyEngine::new(
        db.clone(),
        gateway,
        config.platform.clone(),
        notifier.clone(),
        pause_flag.clone(),
    ));
    let analyzer = PatternAnalyzer::new(db.clone(), config.platform.clone());

    // --- Background services ---
    tokio::spawn(run_copy_scheduler(
        db.clone(),
        engine.clone(),
        config.copy_scheduler_interval_secs,
    ));
    tokio::spawn(run_pattern_sweep(
        db.clone(),
        analyzer.clone(),
        notifier.clone(),
        config.pattern_sweep_interval_secs,
        config.platform.analysis_window_days,
    ));

    let state = AppState {
        db,
        config,
        metrics_handle,
        notifier,
        engine,
        analyzer,
        pause_flag,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();
}
