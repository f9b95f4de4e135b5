use std::env;
use std::str::FromStr;
use tracing::warn;

pub const DEFAULT_BUSINESS_START_HOUR: u32 = 10;
pub const DEFAULT_BUSINESS_END_HOUR: u32 = 17;
pub const DEFAULT_BOOKING_WINDOW_DAYS: i64 = 90;
pub const MAX_BOOKING_WINDOW_DAYS: i64 = 366;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub clinic_api_url: String,
    pub clinic_api_key: Option<String>,
    pub business_start_hour: u32,
    pub business_end_hour: u32,
    pub booking_window_days: i64,
    pub request_timeout_secs: u64,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            clinic_api_url: String::new(),
            clinic_api_key: None,
            business_start_hour: DEFAULT_BUSINESS_START_HOUR,
            business_end_hour: DEFAULT_BUSINESS_END_HOUR,
            booking_window_days: DEFAULT_BOOKING_WINDOW_DAYS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            port: DEFAULT_PORT,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            clinic_api_url: env::var("CLINIC_API_URL")
                .unwrap_or_else(|_| {
                    warn!("CLINIC_API_URL not set, using empty value");
                    String::new()
                }),
            clinic_api_key: env::var("CLINIC_API_KEY").ok().filter(|key| !key.is_empty()),
            business_start_hour: parse_or_default("BUSINESS_START_HOUR", DEFAULT_BUSINESS_START_HOUR),
            business_end_hour: parse_or_default("BUSINESS_END_HOUR", DEFAULT_BUSINESS_END_HOUR),
            booking_window_days: bounded_window_days(parse_or_default(
                "BOOKING_WINDOW_DAYS",
                DEFAULT_BOOKING_WINDOW_DAYS,
            )),
            request_timeout_secs: parse_or_default("REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            port: parse_or_default("PORT", DEFAULT_PORT),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.clinic_api_url.is_empty()
    }
}

/// Clamps a booking window to `[0, MAX_BOOKING_WINDOW_DAYS]`.
pub fn bounded_window_days(days: i64) -> i64 {
    let bounded = days.clamp(0, MAX_BOOKING_WINDOW_DAYS);
    if bounded != days {
        warn!("Booking window of {} days is out of range, using {}", days, bounded);
    }
    bounded
}

fn parse_or_default<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display + Copy,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", key, raw, default);
            default
        }),
        Err(_) => {
            warn!("{} not set, using default {}", key, default);
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_uses_clinic_hours() {
        let config = AppConfig::default();

        assert_eq!(config.business_start_hour, 10);
        assert_eq!(config.business_end_hour, 17);
        assert_eq!(config.booking_window_days, 90);
        assert!(!config.is_configured());
    }

    #[test]
    fn test_booking_window_is_bounded() {
        assert_eq!(bounded_window_days(90), 90);
        assert_eq!(bounded_window_days(-5), 0);
        assert_eq!(bounded_window_days(i64::MAX), MAX_BOOKING_WINDOW_DAYS);
    }

    #[test]
    fn test_parse_or_default_falls_back_on_garbage() {
        env::set_var("SHARED_CONFIG_TEST_GARBAGE", "ten");
        assert_eq!(parse_or_default("SHARED_CONFIG_TEST_GARBAGE", 10u32), 10);

        env::set_var("SHARED_CONFIG_TEST_VALUE", " 9 ");
        assert_eq!(parse_or_default("SHARED_CONFIG_TEST_VALUE", 10u32), 9);

        assert_eq!(parse_or_default("SHARED_CONFIG_TEST_MISSING", 42u64), 42);
    }
}
