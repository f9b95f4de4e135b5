// libs/availability-cell/src/services/calendar.rs
use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use shared_config::AppConfig;

use crate::error::AvailabilityError;
use crate::models::{BusinessHours, WorkingDaySet};

/// Static business rules: which days the clinic opens and at which hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalendarConstraints {
    hours: BusinessHours,
    working_days: WorkingDaySet,
}

impl CalendarConstraints {
    pub fn new(hours: BusinessHours, working_days: WorkingDaySet) -> Self {
        Self { hours, working_days }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, AvailabilityError> {
        let hours = BusinessHours::new(config.business_start_hour, config.business_end_hour)?;
        debug!(
            "Calendar constraints: {}:00-{}:00, Monday to Friday",
            hours.start_hour(),
            hours.end_hour()
        );

        Ok(Self::new(hours, WorkingDaySet::weekdays()))
    }

    pub fn business_hours(&self) -> &BusinessHours {
        &self.hours
    }

    pub fn working_days(&self) -> &WorkingDaySet {
        &self.working_days
    }

    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        self.working_days.contains(date.weekday())
    }

    /// Closing hour included: a slot may start exactly at `end_hour`.
    pub fn is_within_business_hours(&self, hour: u32) -> bool {
        self.hours.start_hour() <= hour && hour <= self.hours.end_hour()
    }

    pub fn enumerate_hours(&self) -> RangeInclusive<u32> {
        self.hours.start_hour()..=self.hours.end_hour()
    }
}
