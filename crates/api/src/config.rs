//! Application configuration loaded from environment variables.

use std::time::Duration;

use domain::Money;
use payment::RedirectUrls;
use workflow::CheckoutSettings;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `4000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `json` for JSON log lines, anything else for text
/// - `DATABASE_URL`: PostgreSQL connection string; in-memory store when unset
/// - `FRONTEND_URL`: base of the payment redirect URLs (default: `"http://localhost:5174"`)
/// - `STRIPE_SECRET_KEY`: Stripe API key; in-memory gateway when unset
/// - `STRIPE_WEBHOOK_SECRET`: webhook signing secret; webhook disabled when unset
/// - `CHECKOUT_CURRENCY`: ISO currency code (default: `"inr"`)
/// - `DELIVERY_CHARGE_MINOR`: delivery fee in minor units (default: `2000`)
/// - `CALL_TIMEOUT_SECS`: per-call timeout for store and gateway (default: `5`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub json_logs: bool,
    pub database_url: Option<String>,
    pub frontend_url: String,
    pub stripe_secret_key: Option<String>,
    pub stripe_webhook_secret: Option<String>,
    pub currency: String,
    pub delivery_charge_minor: i64,
    pub call_timeout_secs: u64,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    ///
    /// Blank values count as unset. Unparseable numbers fall back to the
    /// default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: get("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: get("RUST_LOG").unwrap_or(defaults.log_level),
            json_logs: get("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
            database_url: get("DATABASE_URL"),
            frontend_url: get("FRONTEND_URL").unwrap_or(defaults.frontend_url),
            stripe_secret_key: get("STRIPE_SECRET_KEY"),
            stripe_webhook_secret: get("STRIPE_WEBHOOK_SECRET"),
            currency: get("CHECKOUT_CURRENCY")
                .map(|c| c.to_ascii_lowercase())
                .unwrap_or(defaults.currency),
            delivery_charge_minor: get("DELIVERY_CHARGE_MINOR")
                .and_then(|v| v.parse().ok())
                .filter(|v: &i64| *v >= 0)
                .unwrap_or(defaults.delivery_charge_minor),
            call_timeout_secs: get("CALL_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .filter(|v: &u64| *v > 0)
                .unwrap_or(defaults.call_timeout_secs),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Settings applied to every checkout.
    pub fn checkout_settings(&self) -> CheckoutSettings {
        CheckoutSettings {
            delivery_charge: Money::from_minor(self.delivery_charge_minor),
            currency: self.currency.clone(),
            redirects: RedirectUrls::new(self.frontend_url.clone()),
            call_timeout: self.call_timeout(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            log_level: "info".to_string(),
            json_logs: false,
            database_url: None,
            frontend_url: "http://localhost:5174".to_string(),
            stripe_secret_key: None,
            stripe_webhook_secret: None,
            currency: "inr".to_string(),
            delivery_charge_minor: 2000,
            call_timeout_secs: 5,
        }
    }
}
