use std::env;
use std::time::Duration;

use crate::trial::DEFAULT_TRIAL_DAYS;
use crate::util::MILLIS_PER_DAY;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Document store holding user records
    pub database_path: String,
    /// Local store holding the license record and app settings
    pub settings_database_path: String,
    pub dev_mode: bool,
    pub trial_days: i64,
    /// How often the license record is re-read from its store
    pub license_poll: Duration,
    pub bootstrap_admin_password: Option<String>,
    pub bootstrap_super_admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("BIZDESK_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let trial_days: i64 = env::var("TRIAL_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|d| *d > 0)
            .unwrap_or(DEFAULT_TRIAL_DAYS);

        let poll_secs: u64 = env::var("LICENSE_POLL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|s| *s > 0)
            .unwrap_or(5);

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port,
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "bizdesk.db".to_string()),
            settings_database_path: env::var("SETTINGS_DATABASE_PATH")
                .unwrap_or_else(|_| "bizdesk_settings.db".to_string()),
            dev_mode,
            trial_days,
            license_poll: Duration::from_secs(poll_secs),
            bootstrap_admin_password: env::var("BOOTSTRAP_ADMIN_PASSWORD").ok().filter(|p| !p.is_empty()),
            bootstrap_super_admin_password: env::var("BOOTSTRAP_SUPERADMIN_PASSWORD")
                .ok()
                .filter(|p| !p.is_empty()),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Falls back to the default window when `trial_days` doesn't fit.
    pub fn trial_window_ms(&self) -> i64 {
        self.trial_days
            .checked_mul(MILLIS_PER_DAY)
            .unwrap_or(DEFAULT_TRIAL_DAYS * MILLIS_PER_DAY)
    }
}
