// libs/availability-cell/src/services/blocked_days.rs
use std::collections::BTreeSet;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::error::AvailabilityError;
use crate::models::{BlockedDay, ProfessionalId};
use crate::services::gateway::AppointmentGateway;

/// Days on which one professional takes no appointments at all, as loaded
/// for a bounded window. Dates outside the window are unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockedDayIndex {
    professional_id: ProfessionalId,
    range_start: NaiveDate,
    range_end: NaiveDate,
    days: BTreeSet<NaiveDate>,
}

impl BlockedDayIndex {
    pub fn new<I>(
        professional_id: ProfessionalId,
        range_start: NaiveDate,
        range_end: NaiveDate,
        days: I,
    ) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        Self {
            professional_id,
            range_start,
            range_end,
            days: days.into_iter().collect(),
        }
    }

    /// One backend query for `[range_start, range_end]`. Errors are returned
    /// to the caller, never turned into an empty set.
    pub async fn load(
        gateway: &dyn AppointmentGateway,
        professional_id: ProfessionalId,
        range_start: NaiveDate,
        range_end: NaiveDate,
    ) -> Result<Self, AvailabilityError> {
        if range_end < range_start {
            return Err(AvailabilityError::validation(
                "date_range",
                format!("range end {} is before range start {}", range_end, range_start),
            ));
        }

        debug!("Loading blocked days for professional {} from {} to {}",
               professional_id, range_start, range_end);

        let days = gateway
            .get_blocked_days(professional_id, range_start, range_end)
            .await
            .map_err(|e| {
                warn!("Blocked-day query failed for professional {}: {}", professional_id, e);
                AvailabilityError::AvailabilityQuery(e.to_string())
            })?;

        Ok(Self::new(professional_id, range_start, range_end, days))
    }

    pub fn professional_id(&self) -> ProfessionalId {
        self.professional_id
    }

    pub fn range_start(&self) -> NaiveDate {
        self.range_start
    }

    pub fn range_end(&self) -> NaiveDate {
        self.range_end
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.range_start <= date && date <= self.range_end
    }

    pub fn is_blocked(&self, date: NaiveDate) -> bool {
        self.days.contains(&date)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn blocked_days(&self) -> impl Iterator<Item = BlockedDay> + '_ {
        self.days.iter().map(move |&date| BlockedDay {
            professional_id: self.professional_id,
            date,
        })
    }
}
