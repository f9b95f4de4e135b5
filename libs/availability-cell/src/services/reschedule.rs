// libs/availability-cell/src/services/reschedule.rs
use tracing::debug;

use crate::error::AvailabilityError;
use crate::models::{Appointment, AppointmentStatus, CandidateSlot, ProfessionalId, RescheduleContext};

impl RescheduleContext {
    /// Captures the current slot of an appointment about to be moved.
    pub fn from_appointment(appointment: &Appointment) -> Result<Self, AvailabilityError> {
        match appointment.status {
            AppointmentStatus::Pending
            | AppointmentStatus::Confirmed
            | AppointmentStatus::Rescheduled => {}
            status => {
                return Err(AvailabilityError::validation(
                    "appointment",
                    format!("a {} appointment cannot be rescheduled", status),
                ));
            }
        }

        let slot = CandidateSlot::from_date_time(appointment.professional_id, appointment.date_time)
            .ok_or_else(|| {
                AvailabilityError::validation(
                    "appointment",
                    format!("{} does not start on a whole hour", appointment.date_time),
                )
            })?;

        let context = Self {
            appointment_id: appointment.id,
            professional_id: slot.professional_id,
            date: slot.date,
            hour: slot.hour,
        };
        debug!("Reschedule context for appointment {}: professional {} on {} at {}:00",
               context.appointment_id, context.professional_id, context.date, context.hour);

        Ok(context)
    }
}

/// Which booking surface a flow serves. The reschedule variants carry the
/// slot that must stay selectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingMode {
    NewBooking,
    PatientReschedule(RescheduleContext),
    ProfessionalReschedule(RescheduleContext),
}

impl BookingMode {
    pub fn patient_reschedule(appointment: &Appointment) -> Result<Self, AvailabilityError> {
        RescheduleContext::from_appointment(appointment).map(BookingMode::PatientReschedule)
    }

    pub fn professional_reschedule(appointment: &Appointment) -> Result<Self, AvailabilityError> {
        RescheduleContext::from_appointment(appointment).map(BookingMode::ProfessionalReschedule)
    }

    pub fn reschedule_context(&self) -> Option<&RescheduleContext> {
        match self {
            BookingMode::NewBooking => None,
            BookingMode::PatientReschedule(ctx) | BookingMode::ProfessionalReschedule(ctx) => Some(ctx),
        }
    }

    pub fn is_reschedule(&self) -> bool {
        self.reschedule_context().is_some()
    }

    /// Reschedules never change professional.
    pub fn fixed_professional(&self) -> Option<ProfessionalId> {
        self.reschedule_context().map(|ctx| ctx.professional_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn appointment(status: AppointmentStatus) -> Appointment {
        Appointment {
            id: 55,
            professional_id: 7,
            date_time: NaiveDate::from_ymd_opt(2024, 6, 10)
                .unwrap()
                .and_hms_opt(14, 0, 0)
                .unwrap(),
            status,
            motive: Some("Control".to_string()),
        }
    }

    #[test]
    fn test_context_captures_current_slot() {
        let mode = BookingMode::patient_reschedule(&appointment(AppointmentStatus::Confirmed)).unwrap();
        let ctx = mode.reschedule_context().unwrap();

        assert_eq!(ctx.appointment_id, 55);
        assert_eq!(ctx.professional_id, 7);
        assert_eq!(ctx.hour, 14);
        assert_eq!(mode.fixed_professional(), Some(7));
    }

    #[test]
    fn test_cancelled_appointment_cannot_be_rescheduled() {
        let result = BookingMode::professional_reschedule(&appointment(AppointmentStatus::Cancelled));
        assert!(matches!(result, Err(AvailabilityError::Validation { field: "appointment", .. })));
    }

    #[test]
    fn test_off_hour_appointment_has_no_slot_to_keep() {
        let mut half_past = appointment(AppointmentStatus::Confirmed);
        half_past.date_time = NaiveDate::from_ymd_opt(2024, 6, 10)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();

        let result = BookingMode::patient_reschedule(&half_past);
        assert!(matches!(result, Err(AvailabilityError::Validation { field: "appointment", .. })));
    }

    #[test]
    fn test_new_booking_has_no_exception() {
        assert!(BookingMode::NewBooking.reschedule_context().is_none());
        assert!(!BookingMode::NewBooking.is_reschedule());
    }
}
