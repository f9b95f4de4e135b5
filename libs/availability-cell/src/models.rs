// libs/availability-cell/src/models.rs
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AvailabilityError;

pub type ProfessionalId = i64;
pub type AppointmentId = i64;

/// Every bookable unit is one hour long.
pub const SLOT_MINUTES: u32 = 60;

// ==============================================================================
// CALENDAR CONFIGURATION
// ==============================================================================

/// Opening hours of the clinic. Both bounds are bookable hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BusinessHours {
    start_hour: u32,
    end_hour: u32,
}

impl BusinessHours {
    pub fn new(start_hour: u32, end_hour: u32) -> Result<Self, AvailabilityError> {
        if end_hour > 23 {
            return Err(AvailabilityError::Configuration(format!(
                "business end hour must be between 0 and 23, got {}",
                end_hour
            )));
        }
        if start_hour >= end_hour {
            return Err(AvailabilityError::Configuration(format!(
                "business start hour ({}) must be before end hour ({})",
                start_hour, end_hour
            )));
        }

        Ok(Self { start_hour, end_hour })
    }

    pub fn start_hour(&self) -> u32 {
        self.start_hour
    }

    pub fn end_hour(&self) -> u32 {
        self.end_hour
    }
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            start_hour: 10,
            end_hour: 17,
        }
    }
}

/// Weekdays on which the clinic takes appointments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkingDaySet {
    mask: u8,
}

impl WorkingDaySet {
    /// Monday through Friday.
    pub fn weekdays() -> Self {
        Self::from_days([
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ])
    }

    pub fn from_days<I>(days: I) -> Self
    where
        I: IntoIterator<Item = Weekday>,
    {
        let mask = days
            .into_iter()
            .fold(0u8, |mask, day| mask | (1 << day.num_days_from_monday()));
        Self { mask }
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.mask & (1 << day.num_days_from_monday()) != 0
    }
}

impl Default for WorkingDaySet {
    fn default() -> Self {
        Self::weekdays()
    }
}

// ==============================================================================
// SLOT MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockedDay {
    pub professional_id: ProfessionalId,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OccupiedSlot {
    pub professional_id: ProfessionalId,
    pub date: NaiveDate,
    pub hour: u32,
}

/// A (professional, date, hour) tuple under evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateSlot {
    pub professional_id: ProfessionalId,
    pub date: NaiveDate,
    pub hour: u32,
}

impl CandidateSlot {
    pub fn new(professional_id: ProfessionalId, date: NaiveDate, hour: u32) -> Self {
        Self {
            professional_id,
            date,
            hour,
        }
    }

    /// `None` when the date-time does not start on a whole hour.
    pub fn from_date_time(professional_id: ProfessionalId, date_time: NaiveDateTime) -> Option<Self> {
        let time = date_time.time();
        if time.minute() != 0 || time.second() != 0 || time.nanosecond() != 0 {
            return None;
        }

        Some(Self::new(professional_id, date_time.date(), time.hour()))
    }

    pub fn date_time(&self) -> Option<NaiveDateTime> {
        NaiveTime::from_hms_opt(self.hour, 0, 0).map(|time| self.date.and_time(time))
    }

    pub fn weekday(&self) -> Weekday {
        self.date.weekday()
    }
}

/// Slot of the appointment being moved. It never counts as occupied while
/// that same appointment is being rescheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescheduleContext {
    pub appointment_id: AppointmentId,
    pub professional_id: ProfessionalId,
    pub date: NaiveDate,
    pub hour: u32,
}

// ==============================================================================
// EXTERNAL APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Rescheduled,
    Completed,
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Rescheduled => write!(f, "rescheduled"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// An existing appointment as the backend reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub professional_id: ProfessionalId,
    pub date_time: NaiveDateTime,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub motive: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientContact {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub professional_id: ProfessionalId,
    pub date_time: NaiveDateTime,
    pub motive: String,
    pub patient_contact: PatientContact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfessionalAction {
    #[serde(rename = "REPROGRAMAR")]
    Reschedule,
    #[serde(rename = "CONFIRMAR")]
    Confirm,
    #[serde(rename = "CANCELAR")]
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescheduleAppointmentRequest {
    pub new_date_time: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfessionalActionRequest {
    pub action: ProfessionalAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_date_time: Option<NaiveDateTime>,
}

/// Backend answer to every submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub ok: bool,
    #[serde(default)]
    pub message: Option<String>,
}

// ==============================================================================
// RESULT STATES
// ==============================================================================

/// What a booking surface should render for one professional and day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DayAvailability {
    Available { hours: Vec<u32> },
    /// The query succeeded but every hour is taken.
    NoAvailability { message: String },
    /// The date itself is not selectable (blocked, non-working or past).
    Blocked,
    /// Availability could not be verified, nothing is bookable.
    Unverified { message: String },
}

impl DayAvailability {
    pub fn hours(&self) -> &[u32] {
        match self {
            DayAvailability::Available { hours } => hours,
            _ => &[],
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, DayAvailability::Available { .. })
    }
}
