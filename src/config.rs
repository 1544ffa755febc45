use std::env::var;
use std::str::FromStr;

use chrono::Duration;
use dotenvy::dotenv;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Postgres,
    Memory,
}

pub struct Config {
    pub port: u16,
    pub scheme: String,
    pub host: String,
    pub storage: StorageKind,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub cron_secret: String,
    pub admin_token: String,
    pub lookback: Duration,
    pub stale_after: Duration,
}

impl Config {
    pub fn try_parse() -> Result<Config, String> {
        let _ = dotenv();

        let storage = match var("STORAGE").as_deref() {
            Err(_) | Ok("postgres") => StorageKind::Postgres,
            Ok("memory") => StorageKind::Memory,
            Ok(other) => return Err(format!("Unknown STORAGE value '{other}'")),
        };

        let database_url = var("DATABASE_URL").ok();
        if storage == StorageKind::Postgres && database_url.is_none() {
            return Err("An error occured while getting DATABASE_URL env param".to_string());
        }

        let cron_secret = required("CRON_SECRET")?;
        let admin_token = var("ADMIN_TOKEN")
            .ok()
            .filter(|token| !token.is_empty())
            .unwrap_or_else(|| cron_secret.clone());

        Ok(Config {
            port: parsed("PORT")?,
            scheme: required("SCHEME")?,
            host: required("HOST")?,
            storage,
            database_url,
            database_max_connections: parsed_or("DATABASE_MAX_CONNECTIONS", 5)?,
            cron_secret,
            admin_token,
            lookback: window("DISPATCH_LOOKBACK_HOURS", 24, Duration::try_hours)?,
            stale_after: window("STALE_PROCESSING_MINUTES", 60, Duration::try_minutes)?,
        })
    }
}

fn required(name: &str) -> Result<String, String> {
    var(name)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| format!("An error occured while getting {name} env param"))
}

fn parsed<T: FromStr>(name: &str) -> Result<T, String> {
    required(name)?
        .parse::<T>()
        .map_err(|_| format!("An error occured while parsing {name} env param"))
}

fn parsed_or<T: FromStr>(name: &str, default: T) -> Result<T, String> {
    match var(name) {
        Ok(value) => value
            .parse::<T>()
            .map_err(|_| format!("An error occured while parsing {name} env param")),
        Err(_) => Ok(default),
    }
}

fn window(name: &str, default: i64, unit: fn(i64) -> Option<Duration>) -> Result<Duration, String> {
    positive_window(name, parsed_or(name, default)?, unit)
}

fn positive_window(
    name: &str,
    value: i64,
    unit: fn(i64) -> Option<Duration>,
) -> Result<Duration, String> {
    if value <= 0 {
        return Err(format!("{name} must be a positive number"));
    }
    unit(value).ok_or_else(|| format!("{name} is out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_must_be_positive_and_in_range() {
        assert_eq!(
            positive_window("DISPATCH_LOOKBACK_HOURS", 24, Duration::try_hours),
            Ok(Duration::hours(24))
        );
        assert!(positive_window("DISPATCH_LOOKBACK_HOURS", 0, Duration::try_hours).is_err());
        assert!(positive_window("STALE_PROCESSING_MINUTES", -5, Duration::try_minutes).is_err());
        assert_eq!(
            positive_window("DISPATCH_LOOKBACK_HOURS", i64::MAX, Duration::try_hours),
            Err("DISPATCH_LOOKBACK_HOURS is out of range".to_string())
        );
    }
}
