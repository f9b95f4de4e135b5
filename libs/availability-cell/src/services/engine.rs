// libs/availability-cell/src/services/engine.rs
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::error::{AVAILABILITY_QUERY_MESSAGE, NO_AVAILABILITY_MESSAGE};
use crate::models::{CandidateSlot, DayAvailability, ProfessionalId, RescheduleContext};
use crate::services::blocked_days::BlockedDayIndex;
use crate::services::calendar::CalendarConstraints;
use crate::services::clock::{Clock, SystemClock};
use crate::services::occupied_slots::OccupiedHours;

/// Single bookability predicate shared by new bookings and both reschedule
/// flows. Pure over the snapshots it is given, apart from reading "today"
/// once per call from the injected clock.
#[derive(Clone)]
pub struct SlotAvailabilityEngine {
    constraints: CalendarConstraints,
    clock: Arc<dyn Clock>,
}

impl SlotAvailabilityEngine {
    pub fn new(constraints: CalendarConstraints, clock: Arc<dyn Clock>) -> Self {
        Self { constraints, clock }
    }

    pub fn with_system_clock(constraints: CalendarConstraints) -> Self {
        Self::new(constraints, Arc::new(SystemClock))
    }

    pub fn constraints(&self) -> &CalendarConstraints {
        &self.constraints
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Date-level check for a date picker. Ignores hour occupancy.
    pub fn is_date_selectable(&self, date: NaiveDate, blocked: &BlockedDayIndex) -> bool {
        self.date_selectable_on(date, self.today(), blocked)
    }

    /// Day filter for a date picker, with "today" fixed at creation.
    pub fn date_filter<'a>(&'a self, blocked: &'a BlockedDayIndex) -> impl Fn(NaiveDate) -> bool + 'a {
        let today = self.today();
        move |date| self.date_selectable_on(date, today, blocked)
    }

    pub fn selectable_days(
        &self,
        range_start: NaiveDate,
        range_end: NaiveDate,
        blocked: &BlockedDayIndex,
    ) -> Vec<NaiveDate> {
        let filter = self.date_filter(blocked);
        range_start
            .iter_days()
            .take_while(|date| *date <= range_end)
            .filter(|date| filter(*date))
            .collect()
    }

    pub fn is_bookable(
        &self,
        candidate: &CandidateSlot,
        blocked: &BlockedDayIndex,
        occupied: &OccupiedHours,
        reschedule: Option<&RescheduleContext>,
    ) -> bool {
        self.bookable_on(candidate, self.today(), blocked, occupied, reschedule)
    }

    /// Time-picker filter. Date-times off the hour are never selectable.
    pub fn is_hour_selectable(
        &self,
        professional_id: ProfessionalId,
        date_time: NaiveDateTime,
        blocked: &BlockedDayIndex,
        occupied: &OccupiedHours,
        reschedule: Option<&RescheduleContext>,
    ) -> bool {
        CandidateSlot::from_date_time(professional_id, date_time)
            .map(|candidate| self.is_bookable(&candidate, blocked, occupied, reschedule))
            .unwrap_or(false)
    }

    pub fn free_hours_for_day(
        &self,
        professional_id: ProfessionalId,
        date: NaiveDate,
        blocked: &BlockedDayIndex,
        occupied: &OccupiedHours,
        reschedule: Option<&RescheduleContext>,
    ) -> Vec<u32> {
        let today = self.today();
        if !self.date_selectable_on(date, today, blocked) || blocked.professional_id() != professional_id {
            return Vec::new();
        }

        self.constraints
            .enumerate_hours()
            .filter(|hour| {
                let candidate = CandidateSlot::new(professional_id, date, *hour);
                self.bookable_on(&candidate, today, blocked, occupied, reschedule)
            })
            .collect()
    }

    /// `free_hours_for_day` as a render state, keeping "unverified" apart
    /// from "no hours left".
    pub fn day_availability(
        &self,
        professional_id: ProfessionalId,
        date: NaiveDate,
        blocked: &BlockedDayIndex,
        occupied: &OccupiedHours,
        reschedule: Option<&RescheduleContext>,
    ) -> DayAvailability {
        if !self.is_date_selectable(date, blocked) || blocked.professional_id() != professional_id {
            return DayAvailability::Blocked;
        }
        if !occupied.is_verified() {
            return DayAvailability::Unverified {
                message: AVAILABILITY_QUERY_MESSAGE.to_string(),
            };
        }

        let hours = self.free_hours_for_day(professional_id, date, blocked, occupied, reschedule);
        debug!("Professional {} has {} free hours on {}", professional_id, hours.len(), date);

        if hours.is_empty() {
            DayAvailability::NoAvailability {
                message: NO_AVAILABILITY_MESSAGE.to_string(),
            }
        } else {
            DayAvailability::Available { hours }
        }
    }

    fn date_selectable_on(&self, date: NaiveDate, today: NaiveDate, blocked: &BlockedDayIndex) -> bool {
        self.constraints.is_working_day(date)
            && date >= today
            && blocked.covers(date)
            && !blocked.is_blocked(date)
    }

    fn bookable_on(
        &self,
        candidate: &CandidateSlot,
        today: NaiveDate,
        blocked: &BlockedDayIndex,
        occupied: &OccupiedHours,
        reschedule: Option<&RescheduleContext>,
    ) -> bool {
        // Snapshots of another professional or day say nothing about this slot.
        if blocked.professional_id() != candidate.professional_id
            || occupied.professional_id() != candidate.professional_id
            || occupied.date() != candidate.date
            || !occupied.is_verified()
        {
            return false;
        }

        if !self.date_selectable_on(candidate.date, today, blocked)
            || !self.constraints.is_within_business_hours(candidate.hour)
        {
            return false;
        }

        let is_own_slot = reschedule.is_some_and(|ctx| {
            ctx.professional_id == candidate.professional_id
                && ctx.date == candidate.date
                && ctx.hour == candidate.hour
        });

        is_own_slot || !occupied.is_occupied(candidate.hour)
    }
}
