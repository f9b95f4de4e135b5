// libs/availability-cell/src/services/occupied_slots.rs
use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Timelike};
use tracing::{debug, warn};

use crate::models::{OccupiedSlot, ProfessionalId, RescheduleContext};
use crate::services::calendar::CalendarConstraints;
use crate::services::gateway::AppointmentGateway;

/// Taken hours of one professional on one day.
///
/// A snapshot built from a failed query has every business hour occupied
/// and carries the failure in `query_error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupiedHours {
    professional_id: ProfessionalId,
    date: NaiveDate,
    hours: BTreeSet<u32>,
    query_error: Option<String>,
}

impl OccupiedHours {
    /// Occupied = business hours minus what the backend reports as free.
    /// An empty `available` list occupies the whole day.
    pub fn from_available(
        constraints: &CalendarConstraints,
        professional_id: ProfessionalId,
        date: NaiveDate,
        available: &[u32],
    ) -> Self {
        let hours = constraints
            .enumerate_hours()
            .filter(|hour| !available.contains(hour))
            .collect();

        Self {
            professional_id,
            date,
            hours,
            query_error: None,
        }
    }

    pub fn fully_occupied(
        constraints: &CalendarConstraints,
        professional_id: ProfessionalId,
        date: NaiveDate,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            professional_id,
            date,
            hours: constraints.enumerate_hours().collect(),
            query_error: Some(reason.into()),
        }
    }

    /// Frees the rescheduled appointment's own hour. Unverified snapshots
    /// stay fully occupied.
    pub fn with_reschedule_exception(mut self, reschedule: Option<&RescheduleContext>) -> Self {
        if let Some(ctx) = reschedule {
            if self.is_verified() && ctx.professional_id == self.professional_id && ctx.date == self.date {
                self.hours.remove(&ctx.hour);
            }
        }
        self
    }

    pub fn professional_id(&self) -> ProfessionalId {
        self.professional_id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn is_occupied(&self, hour: u32) -> bool {
        self.hours.contains(&hour)
    }

    pub fn hours(&self) -> impl Iterator<Item = u32> + '_ {
        self.hours.iter().copied()
    }

    pub fn is_verified(&self) -> bool {
        self.query_error.is_none()
    }

    pub fn query_error(&self) -> Option<&str> {
        self.query_error.as_deref()
    }

    pub fn slots(&self) -> impl Iterator<Item = OccupiedSlot> + '_ {
        self.hours.iter().map(move |&hour| OccupiedSlot {
            professional_id: self.professional_id,
            date: self.date,
            hour,
        })
    }
}

/// Parses the backend's `"HH:00"` entries. Partial hours are rejected.
pub fn parse_available_hours(raw: &[String]) -> Result<Vec<u32>, String> {
    raw.iter()
        .map(|entry| {
            let trimmed = entry.trim();
            let time = NaiveTime::parse_from_str(trimmed, "%H:%M")
                .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
                .map_err(|_| format!("invalid hour '{}'", entry))?;

            if time.minute() != 0 || time.second() != 0 {
                return Err(format!("hour '{}' is not on a whole hour", entry));
            }
            Ok(time.hour())
        })
        .collect()
}

#[derive(Clone)]
pub struct OccupiedSlotResolver {
    gateway: Arc<dyn AppointmentGateway>,
    constraints: CalendarConstraints,
}

impl OccupiedSlotResolver {
    pub fn new(gateway: Arc<dyn AppointmentGateway>, constraints: CalendarConstraints) -> Self {
        Self { gateway, constraints }
    }

    /// Never fails: query or parse errors produce a fully occupied snapshot
    /// that records the error.
    pub async fn load_for_day(
        &self,
        professional_id: ProfessionalId,
        date: NaiveDate,
        reschedule: Option<&RescheduleContext>,
    ) -> OccupiedHours {
        debug!("Resolving occupied hours for professional {} on {}", professional_id, date);

        let available = self
            .gateway
            .get_available_hours(professional_id, date)
            .await
            .map_err(|e| e.to_string())
            .and_then(|raw| parse_available_hours(&raw));

        let occupied = match available {
            Ok(hours) => {
                let ignored = hours
                    .iter()
                    .filter(|hour| !self.constraints.is_within_business_hours(**hour))
                    .count();
                if ignored > 0 {
                    debug!("Ignoring {} available hours outside business hours", ignored);
                }
                OccupiedHours::from_available(&self.constraints, professional_id, date, &hours)
            }
            Err(reason) => {
                warn!("Available-hours query failed for professional {} on {}: {}",
                      professional_id, date, reason);
                OccupiedHours::fully_occupied(&self.constraints, professional_id, date, reason)
            }
        };

        occupied.with_reschedule_exception(reschedule)
    }
}
