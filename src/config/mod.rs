use rust_decimal::Decimal;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,

    // Order gateway (optional; orders are simulated when unset)
    pub gateway_url: Option<String>,
    pub gateway_api_key: Option<String>,

    // Telegram notifications (optional)
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,

    // Background services
    pub copy_scheduler_interval_secs: u64,
    pub pattern_sweep_interval_secs: u64,

    pub platform: PlatformConfig,
}

/// Business constants loaded once at startup and owned by `AppState`.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    /// Platform fee charged on each filled copy trade, percent of notional.
    pub platform_fee_pct: Decimal,
    /// Cap on live subscriptions per follower.
    pub max_subscriptions_per_follower: i64,
    /// Analyzer lookback window, days.
    pub analysis_window_days: i64,
    /// Hard cap on trades fed into one analysis run.
    pub analysis_max_trades: i64,
    /// Below this many trades the analyzer refuses to score.
    pub analysis_min_trades: usize,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            platform_fee_pct: Decimal::ONE, // 1%
            max_subscriptions_per_follower: 10,
            analysis_window_days: 30,
            analysis_max_trades: 500,
            analysis_min_trades: 10,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,

            gateway_url: env::var("GATEWAY_URL").ok(),
            gateway_api_key: env::var("GATEWAY_API_KEY").ok(),

            telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN").ok(),
            telegram_chat_id: env::var("TELEGRAM_CHAT_ID").ok(),

            copy_scheduler_interval_secs: env::var("COPY_SCHEDULER_INTERVAL_SECS")
                .unwrap_or_else(|_| "5".into())
                .parse()
                .unwrap_or(5),
            pattern_sweep_interval_secs: env::var("PATTERN_SWEEP_INTERVAL_SECS")
                .unwrap_or_else(|_| "3600".into())
                .parse()
                .unwrap_or(3600),

            platform: PlatformConfig {
                platform_fee_pct: env::var("PLATFORM_FEE_PCT")
                    .unwrap_or_else(|_| "1".into())
                    .parse()
                    .unwrap_or(Decimal::ONE),
                max_subscriptions_per_follower: env::var("MAX_SUBSCRIPTIONS_PER_FOLLOWER")
                    .unwrap_or_else(|_| "10".into())
                    .parse()
                    .unwrap_or(10),
                analysis_window_days: env::var("ANALYSIS_WINDOW_DAYS")
                    .unwrap_or_else(|_| "30".into())
                    .parse()
                    .unwrap_or(30),
                analysis_max_trades: env::var("ANALYSIS_MAX_TRADES")
                    .unwrap_or_else(|_| "500".into())
                    .parse()
                    .unwrap_or(500),
                analysis_min_trades: env::var("ANALYSIS_MIN_TRADES")
                    .unwrap_or_else(|_| "10".into())
                    .parse()
                    .unwrap_or(10),
            },
        })
    }

    /// Returns true if both Telegram credentials are configured.
    pub fn has_telegram(&self) -> bool {
        self.telegram_bot_token.is_some() && self.telegram_chat_id.is_some()
    }
}
