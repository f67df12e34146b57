use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
pub fn init_metrics() -> PrometheusHandle {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // Pre-register counters so they appear even before the first increment.
    counter!("leader_fills_total").absolute(0);
    counter!("copy_trades_filled").absolute(0);
    counter!("copy_trades_skipped").absolute(0);
    counter!("copy_trades_delayed").absolute(0);
    counter!("copy_trades_cancelled").absolute(0);
    counter!("copy_trades_failed").absolute(0);
    counter!("copy_trades_closed").absolute(0);

    for alert_type in ["wash_trading", "manipulation", "bot_behavior", "unusual_activity"] {
        counter!("fraud_alerts_total", "alert_type" => alert_type).absolute(0);
    }

    // Pre-register gauges at zero.
    gauge!("active_subscriptions").set(0.0);

    // Histograms are lazily created on first record; force creation.
    histogram!("fan_out_duration_seconds").record(0.0);
    histogram!("analysis_duration_seconds").record(0.0);

    handle
}
