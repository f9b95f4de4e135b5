// libs/availability-cell/src/services/submission.rs
use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::error::{AvailabilityError, SUBMISSION_FALLBACK_MESSAGE};
use crate::models::{AppointmentId, NewAppointment, ProfessionalAction, SubmissionReceipt};
use crate::services::gateway::{AppointmentGateway, GatewayError};

/// Sends booking, reschedule and cancellation requests to the backend.
#[derive(Clone)]
pub struct SubmissionService {
    gateway: Arc<dyn AppointmentGateway>,
}

impl SubmissionService {
    pub fn new(gateway: Arc<dyn AppointmentGateway>) -> Self {
        Self { gateway }
    }

    pub async fn book(&self, appointment: &NewAppointment) -> Result<SubmissionReceipt, AvailabilityError> {
        validate_new_appointment(appointment)?;

        debug!("Booking appointment with professional {} at {}",
               appointment.professional_id, appointment.date_time);
        let receipt = settle(self.gateway.submit_appointment(appointment).await)?;
        info!("Appointment booked with professional {} at {}",
              appointment.professional_id, appointment.date_time);
        Ok(receipt)
    }

    pub async fn reschedule(
        &self,
        appointment_id: AppointmentId,
        new_date_time: NaiveDateTime,
    ) -> Result<SubmissionReceipt, AvailabilityError> {
        debug!("Rescheduling appointment {} to {}", appointment_id, new_date_time);
        let receipt = settle(self.gateway.submit_reschedule(appointment_id, new_date_time).await)?;
        info!("Appointment {} rescheduled to {}", appointment_id, new_date_time);
        Ok(receipt)
    }

    pub async fn professional_reschedule(
        &self,
        appointment_id: AppointmentId,
        new_date_time: NaiveDateTime,
    ) -> Result<SubmissionReceipt, AvailabilityError> {
        debug!("Professional rescheduling appointment {} to {}", appointment_id, new_date_time);
        let receipt = settle(
            self.gateway
                .submit_professional_action(appointment_id, ProfessionalAction::Reschedule, Some(new_date_time))
                .await,
        )?;
        info!("Appointment {} rescheduled by professional to {}", appointment_id, new_date_time);
        Ok(receipt)
    }

    pub async fn request_cancellation(
        &self,
        appointment_id: AppointmentId,
    ) -> Result<SubmissionReceipt, AvailabilityError> {
        debug!("Requesting cancellation of appointment {}", appointment_id);
        let receipt = settle(self.gateway.submit_cancel_request(appointment_id).await)?;
        info!("Cancellation requested for appointment {}", appointment_id);
        Ok(receipt)
    }
}

pub fn validate_new_appointment(appointment: &NewAppointment) -> Result<(), AvailabilityError> {
    if appointment.motive.trim().is_empty() {
        return Err(AvailabilityError::validation("motive", "Please describe the reason for the appointment"));
    }

    let contact = &appointment.patient_contact;
    if contact.name.trim().is_empty() {
        return Err(AvailabilityError::validation("patient_contact", "Patient name is required"));
    }

    let has_email = contact.email.as_deref().is_some_and(|email| email.contains('@'));
    let has_phone = contact.phone.as_deref().is_some_and(|phone| !phone.trim().is_empty());
    if !has_email && !has_phone {
        return Err(AvailabilityError::validation(
            "patient_contact",
            "An email address or phone number is required",
        ));
    }

    Ok(())
}

/// Backend message verbatim when there is one, generic text otherwise.
fn settle(result: Result<SubmissionReceipt, GatewayError>) -> Result<SubmissionReceipt, AvailabilityError> {
    match result {
        Ok(receipt) if receipt.ok => Ok(receipt),
        Ok(receipt) => {
            warn!("Backend declined submission: {:?}", receipt.message);
            Err(AvailabilityError::Submission(
                non_empty(receipt.message).unwrap_or_else(|| SUBMISSION_FALLBACK_MESSAGE.to_string()),
            ))
        }
        Err(e) => {
            warn!("Submission failed: {}", e);
            Err(AvailabilityError::Submission(
                non_empty(e.backend_message().map(str::to_string))
                    .unwrap_or_else(|| SUBMISSION_FALLBACK_MESSAGE.to_string()),
            ))
        }
    }
}

fn non_empty(message: Option<String>) -> Option<String> {
    message.filter(|msg| !msg.trim().is_empty())
}
