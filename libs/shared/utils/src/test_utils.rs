use std::sync::Arc;

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, Weekday};
use serde_json::{json, Value};

use shared_config::AppConfig;

pub struct TestConfig {
    pub clinic_api_url: String,
    pub clinic_api_key: Option<String>,
    pub business_start_hour: u32,
    pub business_end_hour: u32,
    pub booking_window_days: i64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            clinic_api_url: "http://localhost:8089".to_string(),
            clinic_api_key: Some("test-api-key".to_string()),
            business_start_hour: 10,
            business_end_hour: 17,
            booking_window_days: 90,
        }
    }
}

impl TestConfig {
    /// Points the config at a mock backend, e.g. `MockServer::uri()`.
    pub fn with_backend(uri: impl Into<String>) -> Self {
        Self {
            clinic_api_url: uri.into(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            clinic_api_url: self.clinic_api_url.clone(),
            clinic_api_key: self.clinic_api_key.clone(),
            business_start_hour: self.business_start_hour,
            business_end_hour: self.business_end_hour,
            booking_window_days: self.booking_window_days,
            request_timeout_secs: 5,
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestDates;

impl TestDates {
    /// First `weekday` strictly after `from`.
    pub fn next_weekday(from: NaiveDate, weekday: Weekday) -> NaiveDate {
        let mut date = from + Duration::days(1);
        while date.weekday() != weekday {
            date += Duration::days(1);
        }
        date
    }

    /// A Monday in the future relative to the local clock.
    pub fn upcoming_monday() -> NaiveDate {
        Self::next_weekday(Local::now().date_naive(), Weekday::Mon)
    }

    pub fn at_hour(date: NaiveDate, hour: u32) -> NaiveDateTime {
        date.and_hms_opt(hour, 0, 0).unwrap_or_else(|| date.and_time(Default::default()))
    }
}

pub struct MockClinicResponses;

impl MockClinicResponses {
    pub fn available_hours(hours: &[u32]) -> Value {
        json!(hours.iter().map(|hour| format!("{:02}:00", hour)).collect::<Vec<_>>())
    }

    pub fn blocked_days(days: &[NaiveDate]) -> Value {
        json!(days.iter().map(|day| day.format("%Y-%m-%d").to_string()).collect::<Vec<_>>())
    }

    pub fn submission_ok() -> Value {
        json!({
            "ok": true,
            "message": "Solicitud registrada"
        })
    }

    pub fn submission_rejected(message: &str) -> Value {
        json!({
            "ok": false,
            "message": message
        })
    }

    pub fn error_response(message: &str) -> Value {
        json!({
            "message": message
        })
    }
}
