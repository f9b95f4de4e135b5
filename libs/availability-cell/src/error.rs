// libs/availability-cell/src/error.rs
use thiserror::Error;

use shared_models::error::AppError;

pub const AVAILABILITY_QUERY_MESSAGE: &str = "Could not verify availability, please try again";
pub const NO_AVAILABILITY_MESSAGE: &str =
    "The professional has no available hours that day, please pick another date";
pub const SUBMISSION_FALLBACK_MESSAGE: &str = "The request could not be completed, please try again";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityError {
    #[error("Validation error on {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("Availability query failed: {0}")]
    AvailabilityQuery(String),

    #[error("Submission rejected: {0}")]
    Submission(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl AvailabilityError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        AvailabilityError::Validation {
            field,
            message: message.into(),
        }
    }

    /// Text a booking surface shows next to the failed control.
    pub fn user_message(&self) -> String {
        match self {
            AvailabilityError::Validation { message, .. } => message.clone(),
            AvailabilityError::AvailabilityQuery(_) => AVAILABILITY_QUERY_MESSAGE.to_string(),
            AvailabilityError::Submission(message) => message.clone(),
            AvailabilityError::Configuration(message) => message.clone(),
        }
    }
}

impl From<AvailabilityError> for AppError {
    fn from(err: AvailabilityError) -> Self {
        match err {
            AvailabilityError::Validation { field, message } => {
                AppError::ValidationError(format!("{}: {}", field, message))
            }
            AvailabilityError::AvailabilityQuery(detail) => {
                tracing::warn!("Availability query failed: {}", detail);
                AppError::ExternalService(AVAILABILITY_QUERY_MESSAGE.to_string())
            }
            AvailabilityError::Submission(message) => AppError::ExternalService(message),
            AvailabilityError::Configuration(message) => AppError::Internal(message),
        }
    }
}
