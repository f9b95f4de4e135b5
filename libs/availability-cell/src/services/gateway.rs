// libs/availability-cell/src/services/gateway.rs
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Method;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use shared_backend::{ApiStatusError, ClinicApiClient};
use shared_config::AppConfig;

use crate::models::{
    AppointmentId, NewAppointment, ProfessionalAction, ProfessionalActionRequest,
    ProfessionalId, RescheduleAppointmentRequest, SubmissionReceipt,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Request to clinic backend failed: {0}")]
    Transport(String),

    #[error("Clinic backend rejected request ({status})")]
    Rejected { status: u16, message: Option<String> },

    #[error("Unexpected response from clinic backend: {0}")]
    MalformedResponse(String),
}

impl GatewayError {
    /// The backend's own explanation, when it sent one.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            GatewayError::Rejected { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for GatewayError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(status) = err.downcast_ref::<ApiStatusError>() {
            return GatewayError::Rejected {
                status: status.status,
                message: status.message(),
            };
        }

        match err.downcast_ref::<reqwest::Error>() {
            Some(reqwest_err) if reqwest_err.is_decode() => {
                GatewayError::MalformedResponse(reqwest_err.to_string())
            }
            _ => GatewayError::Transport(err.to_string()),
        }
    }
}

/// Operations this crate needs from the clinic's appointment/calendar service.
#[async_trait]
pub trait AppointmentGateway: Send + Sync {
    /// Days the professional is fully unavailable within `[from, to]`.
    async fn get_blocked_days(
        &self,
        professional_id: ProfessionalId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NaiveDate>, GatewayError>;

    /// Free hours of a day as `"HH:00"` strings.
    async fn get_available_hours(
        &self,
        professional_id: ProfessionalId,
        date: NaiveDate,
    ) -> Result<Vec<String>, GatewayError>;

    async fn submit_appointment(
        &self,
        appointment: &NewAppointment,
    ) -> Result<SubmissionReceipt, GatewayError>;

    async fn submit_reschedule(
        &self,
        appointment_id: AppointmentId,
        new_date_time: NaiveDateTime,
    ) -> Result<SubmissionReceipt, GatewayError>;

    async fn submit_professional_action(
        &self,
        appointment_id: AppointmentId,
        action: ProfessionalAction,
        new_date_time: Option<NaiveDateTime>,
    ) -> Result<SubmissionReceipt, GatewayError>;

    async fn submit_cancel_request(
        &self,
        appointment_id: AppointmentId,
    ) -> Result<SubmissionReceipt, GatewayError>;
}

/// REST implementation bound to one caller's bearer token.
pub struct HttpAppointmentGateway {
    client: ClinicApiClient,
    auth_token: Option<String>,
}

impl HttpAppointmentGateway {
    pub fn new(config: &AppConfig, auth_token: Option<String>) -> Self {
        Self {
            client: ClinicApiClient::new(config),
            auth_token,
        }
    }

    fn token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    async fn submit(
        &self,
        method: Method,
        path: &str,
        body: Value,
    ) -> Result<SubmissionReceipt, GatewayError> {
        let receipt: SubmissionReceipt = self.client
            .request(method, path, self.token(), Some(body))
            .await?;
        Ok(receipt)
    }
}

#[async_trait]
impl AppointmentGateway for HttpAppointmentGateway {
    async fn get_blocked_days(
        &self,
        professional_id: ProfessionalId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NaiveDate>, GatewayError> {
        let path = format!(
            "/api/professionals/{}/blocked-days?from={}&to={}",
            professional_id,
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d")
        );
        let days: Vec<NaiveDate> = self.client.get(&path, self.token()).await?;

        debug!("Professional {} has {} blocked days between {} and {}",
               professional_id, days.len(), from, to);
        Ok(days)
    }

    async fn get_available_hours(
        &self,
        professional_id: ProfessionalId,
        date: NaiveDate,
    ) -> Result<Vec<String>, GatewayError> {
        let path = format!(
            "/api/professionals/{}/available-hours?date={}",
            professional_id,
            date.format("%Y-%m-%d")
        );
        let hours: Vec<String> = self.client.get(&path, self.token()).await?;

        debug!("Professional {} has {} available hours on {}", professional_id, hours.len(), date);
        Ok(hours)
    }

    async fn submit_appointment(
        &self,
        appointment: &NewAppointment,
    ) -> Result<SubmissionReceipt, GatewayError> {
        let body = serde_json::to_value(appointment)
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;
        self.submit(Method::POST, "/api/appointments", body).await
    }

    async fn submit_reschedule(
        &self,
        appointment_id: AppointmentId,
        new_date_time: NaiveDateTime,
    ) -> Result<SubmissionReceipt, GatewayError> {
        let body = serde_json::to_value(RescheduleAppointmentRequest { new_date_time })
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;
        let path = format!("/api/appointments/{}/reschedule", appointment_id);
        self.submit(Method::PUT, &path, body).await
    }

    async fn submit_professional_action(
        &self,
        appointment_id: AppointmentId,
        action: ProfessionalAction,
        new_date_time: Option<NaiveDateTime>,
    ) -> Result<SubmissionReceipt, GatewayError> {
        let body = serde_json::to_value(ProfessionalActionRequest { action, new_date_time })
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;
        let path = format!("/api/appointments/{}/actions", appointment_id);
        self.submit(Method::POST, &path, body).await
    }

    async fn submit_cancel_request(
        &self,
        appointment_id: AppointmentId,
    ) -> Result<SubmissionReceipt, GatewayError> {
        let path = format!("/api/appointments/{}/cancel-request", appointment_id);
        self.submit(Method::POST, &path, Value::Object(Default::default())).await
    }
}
