// libs/availability-cell/src/services/flow.rs
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::{debug, info, warn};

use shared_config::bounded_window_days;

use crate::error::AvailabilityError;
use crate::models::{
    CandidateSlot, DayAvailability, NewAppointment, PatientContact, ProfessionalId,
    RescheduleContext, SubmissionReceipt,
};
use crate::services::blocked_days::BlockedDayIndex;
use crate::services::engine::SlotAvailabilityEngine;
use crate::services::gateway::AppointmentGateway;
use crate::services::occupied_slots::{OccupiedHours, OccupiedSlotResolver};
use crate::services::reschedule::BookingMode;
use crate::services::submission::SubmissionService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    ProfessionalResolved,
    BlockedDaysLoaded,
    DateSelected,
    HoursLoaded,
    SlotConfirmed,
    Submitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStatus {
    Success,
    Failure,
}

/// What the patient fills in on a brand-new booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingDetails {
    pub motive: String,
    pub patient_contact: PatientContact,
}

/// Pending blocked-day load. Run `fetch` and hand the response back to
/// [`BookingFlow::apply_blocked_days`].
pub struct BlockedDaysQuery {
    token: u64,
    professional_id: ProfessionalId,
    range_start: NaiveDate,
    range_end: NaiveDate,
    gateway: Arc<dyn AppointmentGateway>,
}

pub struct BlockedDaysResponse {
    token: u64,
    result: Result<BlockedDayIndex, AvailabilityError>,
}

impl BlockedDaysQuery {
    pub fn professional_id(&self) -> ProfessionalId {
        self.professional_id
    }

    pub async fn fetch(self) -> BlockedDaysResponse {
        let result = BlockedDayIndex::load(
            self.gateway.as_ref(),
            self.professional_id,
            self.range_start,
            self.range_end,
        )
        .await;

        BlockedDaysResponse {
            token: self.token,
            result,
        }
    }
}

/// Pending occupied-hours load for the selected date.
pub struct HoursQuery {
    token: u64,
    professional_id: ProfessionalId,
    date: NaiveDate,
    reschedule: Option<RescheduleContext>,
    resolver: OccupiedSlotResolver,
}

pub struct HoursResponse {
    token: u64,
    occupied: OccupiedHours,
}

impl HoursQuery {
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub async fn fetch(self) -> HoursResponse {
        let occupied = self
            .resolver
            .load_for_day(self.professional_id, self.date, self.reschedule.as_ref())
            .await;

        HoursResponse {
            token: self.token,
            occupied,
        }
    }
}

impl HoursResponse {
    pub fn date(&self) -> NaiveDate {
        self.occupied.date()
    }
}

/// State of one booking or reschedule dialog.
///
/// Each instance owns its snapshots. Queries are tagged with a token and a
/// response is applied only while its token is the latest of its kind, so a
/// slow answer for an earlier date never overwrites a newer selection.
pub struct BookingFlow {
    engine: SlotAvailabilityEngine,
    gateway: Arc<dyn AppointmentGateway>,
    submissions: SubmissionService,
    mode: BookingMode,
    window_days: i64,
    state: FlowState,
    professional_id: Option<ProfessionalId>,
    blocked_days: Option<BlockedDayIndex>,
    occupied: Option<OccupiedHours>,
    selected_date: Option<NaiveDate>,
    selected_hour: Option<u32>,
    blocked_token: u64,
    hours_token: u64,
    last_error: Option<AvailabilityError>,
    last_submission: Option<SubmissionStatus>,
}

impl BookingFlow {
    pub fn new(
        engine: SlotAvailabilityEngine,
        gateway: Arc<dyn AppointmentGateway>,
        mode: BookingMode,
        window_days: i64,
    ) -> Self {
        Self {
            engine,
            submissions: SubmissionService::new(gateway.clone()),
            gateway,
            mode,
            window_days: bounded_window_days(window_days),
            state: FlowState::Idle,
            professional_id: None,
            blocked_days: None,
            occupied: None,
            selected_date: None,
            selected_hour: None,
            blocked_token: 0,
            hours_token: 0,
            last_error: None,
            last_submission: None,
        }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn mode(&self) -> &BookingMode {
        &self.mode
    }

    pub fn professional_id(&self) -> Option<ProfessionalId> {
        self.professional_id
    }

    pub fn selected_date(&self) -> Option<NaiveDate> {
        self.selected_date
    }

    pub fn selected_hour(&self) -> Option<u32> {
        self.selected_hour
    }

    pub fn blocked_days(&self) -> Option<&BlockedDayIndex> {
        self.blocked_days.as_ref()
    }

    pub fn occupied_hours(&self) -> Option<&OccupiedHours> {
        self.occupied.as_ref()
    }

    pub fn last_error(&self) -> Option<&AvailabilityError> {
        self.last_error.as_ref()
    }

    pub fn last_submission(&self) -> Option<SubmissionStatus> {
        self.last_submission
    }

    pub fn can_submit(&self) -> bool {
        self.state == FlowState::SlotConfirmed
    }

    /// Starts a reschedule flow on the appointment's own professional.
    pub fn begin(&mut self) -> Result<BlockedDaysQuery, AvailabilityError> {
        match self.mode.fixed_professional() {
            Some(professional_id) => self.select_professional(professional_id),
            None => Err(AvailabilityError::validation("professional", "Please select a professional")),
        }
    }

    /// Resets everything below the professional and issues a fresh
    /// blocked-day load for `[today, today + window]`.
    pub fn select_professional(
        &mut self,
        professional_id: ProfessionalId,
    ) -> Result<BlockedDaysQuery, AvailabilityError> {
        self.ensure_open()?;

        if let Some(fixed) = self.mode.fixed_professional() {
            if fixed != professional_id {
                return Err(AvailabilityError::validation(
                    "professional",
                    "The professional cannot be changed while rescheduling",
                ));
            }
        }

        let range_start = self.engine.today();
        let range_end = range_start
            .checked_add_signed(Duration::days(self.window_days))
            .ok_or_else(|| {
                AvailabilityError::Configuration(format!(
                    "booking window of {} days from {} is past the last representable date",
                    self.window_days, range_start
                ))
            })?;

        self.blocked_token += 1;
        self.hours_token += 1;
        self.professional_id = Some(professional_id);
        self.blocked_days = None;
        self.occupied = None;
        self.selected_date = None;
        self.selected_hour = None;
        self.last_error = None;
        self.state = FlowState::ProfessionalResolved;

        debug!("Flow resolved professional {} (query {})", professional_id, self.blocked_token);

        Ok(BlockedDaysQuery {
            token: self.blocked_token,
            professional_id,
            range_start,
            range_end,
            gateway: self.gateway.clone(),
        })
    }

    /// Returns `false` when the response was stale and got discarded.
    pub fn apply_blocked_days(&mut self, response: BlockedDaysResponse) -> bool {
        if response.token != self.blocked_token || self.state != FlowState::ProfessionalResolved {
            debug!("Discarding stale blocked-day response (query {}, current {})",
                   response.token, self.blocked_token);
            return false;
        }

        match response.result {
            Ok(index) => {
                debug!("Loaded {} blocked days for professional {}", index.len(), index.professional_id());
                self.blocked_days = Some(index);
                self.last_error = None;
                self.state = FlowState::BlockedDaysLoaded;
            }
            Err(e) => {
                warn!("Blocked days unavailable, date selection stays disabled: {}", e);
                self.last_error = Some(e);
            }
        }
        true
    }

    /// `false` until blocked days are loaded.
    pub fn is_date_selectable(&self, date: NaiveDate) -> bool {
        self.blocked_days
            .as_ref()
            .is_some_and(|blocked| self.engine.is_date_selectable(date, blocked))
    }

    pub fn selectable_days(&self) -> Vec<NaiveDate> {
        match &self.blocked_days {
            Some(blocked) => self.engine.selectable_days(blocked.range_start(), blocked.range_end(), blocked),
            None => Vec::new(),
        }
    }

    pub fn select_date(&mut self, date: NaiveDate) -> Result<HoursQuery, AvailabilityError> {
        self.ensure_open()?;

        let professional_id = match (self.professional_id, &self.blocked_days) {
            (Some(professional_id), Some(_)) => professional_id,
            _ => {
                return Err(AvailabilityError::validation(
                    "date",
                    "Availability has not been loaded for this professional yet",
                ));
            }
        };

        if !self.is_date_selectable(date) {
            return Err(AvailabilityError::validation("date", format!("{} is not available", date)));
        }

        self.hours_token += 1;
        self.selected_date = Some(date);
        self.selected_hour = None;
        self.occupied = None;
        self.last_error = None;
        self.state = FlowState::DateSelected;
        debug!("Flow selected {} (query {})", date, self.hours_token);

        Ok(HoursQuery {
            token: self.hours_token,
            professional_id,
            date,
            reschedule: self.mode.reschedule_context().copied(),
            resolver: OccupiedSlotResolver::new(self.gateway.clone(), *self.engine.constraints()),
        })
    }

    /// Returns `false` when the response was stale and got discarded.
    pub fn apply_hours(&mut self, response: HoursResponse) -> bool {
        if response.token != self.hours_token
            || self.state != FlowState::DateSelected
            || self.selected_date != Some(response.occupied.date())
        {
            debug!("Discarding stale hours response for {} (query {}, current {})",
                   response.occupied.date(), response.token, self.hours_token);
            return false;
        }

        self.last_error = response
            .occupied
            .query_error()
            .map(|reason| AvailabilityError::AvailabilityQuery(reason.to_string()));
        self.occupied = Some(response.occupied);
        self.state = FlowState::HoursLoaded;
        true
    }

    /// `None` while the selected date has not been checked yet.
    pub fn day_availability(&self) -> Option<DayAvailability> {
        let (professional_id, date, blocked, occupied) = self.day_snapshots()?;
        Some(self.engine.day_availability(
            professional_id,
            date,
            blocked,
            occupied,
            self.mode.reschedule_context(),
        ))
    }

    pub fn free_hours(&self) -> Vec<u32> {
        match self.day_snapshots() {
            Some((professional_id, date, blocked, occupied)) => self.engine.free_hours_for_day(
                professional_id,
                date,
                blocked,
                occupied,
                self.mode.reschedule_context(),
            ),
            None => Vec::new(),
        }
    }

    pub fn is_hour_selectable(&self, date_time: NaiveDateTime) -> bool {
        match self.day_snapshots() {
            Some((professional_id, _, blocked, occupied)) => self.engine.is_hour_selectable(
                professional_id,
                date_time,
                blocked,
                occupied,
                self.mode.reschedule_context(),
            ),
            None => false,
        }
    }

    pub fn select_hour(&mut self, hour: u32) -> Result<(), AvailabilityError> {
        self.ensure_open()?;

        if !matches!(self.state, FlowState::HoursLoaded | FlowState::SlotConfirmed) {
            return Err(AvailabilityError::validation("hour", "Please select a date first"));
        }

        let (professional_id, date, blocked, occupied) = self
            .day_snapshots()
            .ok_or_else(|| AvailabilityError::validation("hour", "Please select a date first"))?;

        let candidate = CandidateSlot::new(professional_id, date, hour);
        if !self.engine.is_bookable(&candidate, blocked, occupied, self.mode.reschedule_context()) {
            return Err(AvailabilityError::validation("hour", format!("{}:00 is not available", hour)));
        }

        self.selected_hour = Some(hour);
        self.state = FlowState::SlotConfirmed;
        Ok(())
    }

    /// Sends the confirmed slot. Failure leaves the flow on the confirmed
    /// slot so the user can retry or pick another one.
    pub async fn submit(
        &mut self,
        details: Option<&BookingDetails>,
    ) -> Result<SubmissionReceipt, AvailabilityError> {
        self.ensure_open()?;

        let (professional_id, date_time) = match (self.state, self.professional_id, self.selected_slot()) {
            (FlowState::SlotConfirmed, Some(professional_id), Some(date_time)) => (professional_id, date_time),
            (_, None, _) => {
                return Err(AvailabilityError::validation("professional", "Please select a professional"));
            }
            _ => return Err(AvailabilityError::validation("slot", "Please select a date and hour")),
        };

        let result = match self.mode {
            BookingMode::NewBooking => {
                let details = details.ok_or_else(|| {
                    AvailabilityError::validation("motive", "Please describe the reason for the appointment")
                })?;
                let appointment = NewAppointment {
                    professional_id,
                    date_time,
                    motive: details.motive.trim().to_string(),
                    patient_contact: details.patient_contact.clone(),
                };
                self.submissions.book(&appointment).await
            }
            BookingMode::PatientReschedule(ctx) => {
                self.submissions.reschedule(ctx.appointment_id, date_time).await
            }
            BookingMode::ProfessionalReschedule(ctx) => {
                self.submissions.professional_reschedule(ctx.appointment_id, date_time).await
            }
        };

        match result {
            Ok(receipt) => {
                info!("Flow submitted slot {} with professional {}", date_time, professional_id);
                self.state = FlowState::Submitted;
                self.last_submission = Some(SubmissionStatus::Success);
                self.last_error = None;
                Ok(receipt)
            }
            Err(e) => {
                if !matches!(e, AvailabilityError::Validation { .. }) {
                    self.last_submission = Some(SubmissionStatus::Failure);
                }
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    fn selected_slot(&self) -> Option<NaiveDateTime> {
        let date = self.selected_date?;
        let hour = self.selected_hour?;
        date.and_hms_opt(hour, 0, 0)
    }

    fn day_snapshots(&self) -> Option<(ProfessionalId, NaiveDate, &BlockedDayIndex, &OccupiedHours)> {
        Some((
            self.professional_id?,
            self.selected_date?,
            self.blocked_days.as_ref()?,
            self.occupied.as_ref()?,
        ))
    }

    fn ensure_open(&self) -> Result<(), AvailabilityError> {
        if self.state == FlowState::Submitted {
            return Err(AvailabilityError::validation("flow", "This request has already been submitted"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for BlockedDaysQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockedDaysQuery")
            .field("token", &self.token)
            .field("professional_id", &self.professional_id)
            .field("range_start", &self.range_start)
            .field("range_end", &self.range_end)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for HoursQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HoursQuery")
            .field("token", &self.token)
            .field("professional_id", &self.professional_id)
            .field("date", &self.date)
            .finish_non_exhaustive()
    }
}
