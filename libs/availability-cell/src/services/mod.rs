// libs/availability-cell/src/services/mod.rs
pub mod calendar;
pub mod clock;
pub mod gateway;
pub mod blocked_days;
pub mod occupied_slots;
pub mod engine;
pub mod reschedule;
pub mod submission;
pub mod flow;

pub use calendar::CalendarConstraints;
pub use clock::{Clock, FixedClock, SystemClock};
pub use gateway::{AppointmentGateway, GatewayError, HttpAppointmentGateway};
pub use blocked_days::BlockedDayIndex;
pub use occupied_slots::{OccupiedHours, OccupiedSlotResolver};
pub use engine::SlotAvailabilityEngine;
pub use reschedule::BookingMode;
pub use submission::SubmissionService;
pub use flow::{BookingDetails, BookingFlow, FlowState, SubmissionStatus};
