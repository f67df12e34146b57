pub mod analysis;
pub mod api;
pub mod broker;
pub mod config;
pub mod db;
pub mod errors;
pub mod execution;
pub mod metrics;
pub mod models;
pub mod services;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::analysis::PatternAnalyzer;
use crate::config::AppConfig;
use crate::execution::engine::CopyEngine;
use crate::services::notifier::Notifier;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: AppConfig,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
    pub notifier: Option<Arc<Notifier>>,
    pub engine: Arc<CopyEngine>,
    pub analyzer: PatternAnalyzer,
    pub pause_flag: Arc<AtomicBool>,
}
