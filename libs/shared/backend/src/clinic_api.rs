use std::time::Duration;

use anyhow::Result;
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};

use shared_config::AppConfig;

/// Non-success HTTP status returned by the clinic backend.
///
/// Carried inside the `anyhow::Error` so callers that care about the
/// backend's own message can `downcast_ref` it.
#[derive(Debug, Clone, Error)]
#[error("API error ({status}): {body}")]
pub struct ApiStatusError {
    pub status: u16,
    pub body: String,
}

impl ApiStatusError {
    /// Human readable message from a JSON error body (`message` or `error`).
    pub fn message(&self) -> Option<String> {
        let value: Value = serde_json::from_str(&self.body).ok()?;
        ["message", "error", "mensaje"]
            .iter()
            .find_map(|key| value.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .filter(|msg| !msg.trim().is_empty())
    }

    pub fn is_auth_error(&self) -> bool {
        matches!(self.status, 401 | 403)
    }
}

pub struct ClinicApiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ClinicApiClient {
    pub fn new(config: &AppConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build HTTP client with timeout, using defaults: {}", e);
                Client::new()
            });

        Self {
            client,
            base_url: config.clinic_api_url.trim_end_matches('/').to_string(),
            api_key: config.clinic_api_key.clone(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(key) = self.api_key.as_deref() {
            match HeaderValue::from_str(key) {
                Ok(value) => {
                    headers.insert("apikey", value);
                }
                Err(_) => warn!("CLINIC_API_KEY contains invalid header characters, skipping"),
            }
        }

        if let Some(token) = auth_token {
            match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => warn!("Auth token contains invalid header characters, skipping"),
            }
        }

        headers
    }

    pub async fn request<T>(&self, method: Method, path: &str,
                            auth_token: Option<&str>, body: Option<Value>)
                            -> Result<T>
    where T: DeserializeOwned {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let headers = self.get_headers(auth_token);

        let mut req = self.client.request(method, &url)
            .headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("API error ({}): {}", status, error_text);

            return Err(ApiStatusError {
                status: status.as_u16(),
                body: error_text,
            }.into());
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    pub async fn get<T>(&self, path: &str, auth_token: Option<&str>) -> Result<T>
    where T: DeserializeOwned {
        self.request(Method::GET, path, auth_token, None).await
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_message_prefers_message_field() {
        let err = ApiStatusError {
            status: 409,
            body: r#"{"ok": false, "message": "Slot already taken"}"#.to_string(),
        };
        assert_eq!(err.message().as_deref(), Some("Slot already taken"));
        assert!(!err.is_auth_error());
    }

    #[test]
    fn test_status_error_message_missing_for_plain_text() {
        let err = ApiStatusError {
            status: 500,
            body: "Internal Server Error".to_string(),
        };
        assert_eq!(err.message(), None);
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let config = AppConfig {
            clinic_api_url: "http://localhost:8080/".to_string(),
            ..AppConfig::default()
        };
        let client = ClinicApiClient::new(&config);
        assert_eq!(client.get_base_url(), "http://localhost:8080");
    }
}
