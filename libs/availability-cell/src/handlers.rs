// libs/availability-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use headers::{Authorization, authorization::Bearer};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::{bounded_window_days, AppConfig, MAX_BOOKING_WINDOW_DAYS};
use shared_models::error::AppError;

use crate::models::{AppointmentId, CandidateSlot, DayAvailability, ProfessionalId, RescheduleContext};
use crate::services::blocked_days::BlockedDayIndex;
use crate::services::calendar::CalendarConstraints;
use crate::services::engine::SlotAvailabilityEngine;
use crate::services::gateway::{AppointmentGateway, HttpAppointmentGateway};
use crate::services::occupied_slots::OccupiedSlotResolver;

/// Longest range a single selectable-days request may span.
const MAX_RANGE_DAYS: i64 = MAX_BOOKING_WINDOW_DAYS;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct SelectableDaysQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct FreeHoursQuery {
    pub date: NaiveDate,
    pub appointment_id: Option<AppointmentId>,
    pub current_date_time: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize)]
pub struct SlotCheckQuery {
    pub date_time: NaiveDateTime,
    pub appointment_id: Option<AppointmentId>,
    pub current_date_time: Option<NaiveDateTime>,
}

// ==============================================================================
// AVAILABILITY HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_selectable_days(
    State(state): State<Arc<AppConfig>>,
    Path(professional_id): Path<ProfessionalId>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<SelectableDaysQuery>,
) -> Result<Json<Value>, AppError> {
    let engine = engine_for(&state)?;
    let gateway = HttpAppointmentGateway::new(&state, Some(auth.token().to_string()));

    let from = query.from.unwrap_or_else(|| engine.today());
    let to = match query.to {
        Some(to) => to,
        None => from
            .checked_add_signed(Duration::days(bounded_window_days(state.booking_window_days)))
            .ok_or_else(|| AppError::BadRequest(format!("'from' {} is too far in the future", from)))?,
    };

    if to < from {
        return Err(AppError::BadRequest("'to' must not be before 'from'".to_string()));
    }
    if (to - from).num_days() > MAX_RANGE_DAYS {
        return Err(AppError::BadRequest(format!("Date range cannot exceed {} days", MAX_RANGE_DAYS)));
    }

    let blocked = BlockedDayIndex::load(&gateway, professional_id, from, to).await?;
    let days = engine.selectable_days(from, to, &blocked);

    debug!("Professional {} has {} selectable days between {} and {}",
           professional_id, days.len(), from, to);

    Ok(Json(json!({
        "professional_id": professional_id,
        "from": from,
        "to": to,
        "days": days
    })))
}

#[axum::debug_handler]
pub async fn get_free_hours(
    State(state): State<Arc<AppConfig>>,
    Path(professional_id): Path<ProfessionalId>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<FreeHoursQuery>,
) -> Result<Json<Value>, AppError> {
    let reschedule = reschedule_from_query(professional_id, query.appointment_id, query.current_date_time)?;
    let engine = engine_for(&state)?;
    let gateway: Arc<dyn AppointmentGateway> =
        Arc::new(HttpAppointmentGateway::new(&state, Some(auth.token().to_string())));

    let availability = day_availability(
        &engine,
        gateway,
        professional_id,
        query.date,
        reschedule.as_ref(),
    )
    .await?;

    Ok(Json(json!({
        "professional_id": professional_id,
        "date": query.date,
        "availability": availability
    })))
}

#[axum::debug_handler]
pub async fn check_slot(
    State(state): State<Arc<AppConfig>>,
    Path(professional_id): Path<ProfessionalId>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<SlotCheckQuery>,
) -> Result<Json<Value>, AppError> {
    let reschedule = reschedule_from_query(professional_id, query.appointment_id, query.current_date_time)?;
    let engine = engine_for(&state)?;
    let gateway: Arc<dyn AppointmentGateway> =
        Arc::new(HttpAppointmentGateway::new(&state, Some(auth.token().to_string())));

    let date = query.date_time.date();
    let availability = day_availability(
        &engine,
        gateway,
        professional_id,
        date,
        reschedule.as_ref(),
    )
    .await?;

    let bookable = CandidateSlot::from_date_time(professional_id, query.date_time)
        .is_some_and(|slot| availability.hours().contains(&slot.hour));

    Ok(Json(json!({
        "professional_id": professional_id,
        "date_time": query.date_time,
        "bookable": bookable,
        "availability": availability
    })))
}

// ==============================================================================
// HELPERS
// ==============================================================================

fn engine_for(config: &AppConfig) -> Result<SlotAvailabilityEngine, AppError> {
    let constraints = CalendarConstraints::from_config(config)?;
    Ok(SlotAvailabilityEngine::with_system_clock(constraints))
}

/// Blocked days first; hours are only queried for a selectable date.
async fn day_availability(
    engine: &SlotAvailabilityEngine,
    gateway: Arc<dyn AppointmentGateway>,
    professional_id: ProfessionalId,
    date: NaiveDate,
    reschedule: Option<&RescheduleContext>,
) -> Result<DayAvailability, AppError> {
    let blocked = BlockedDayIndex::load(gateway.as_ref(), professional_id, date, date).await?;
    if !engine.is_date_selectable(date, &blocked) {
        return Ok(DayAvailability::Blocked);
    }

    let resolver = OccupiedSlotResolver::new(gateway, *engine.constraints());
    let occupied = resolver.load_for_day(professional_id, date, reschedule).await;

    Ok(engine.day_availability(professional_id, date, &blocked, &occupied, reschedule))
}

fn reschedule_from_query(
    professional_id: ProfessionalId,
    appointment_id: Option<AppointmentId>,
    current_date_time: Option<NaiveDateTime>,
) -> Result<Option<RescheduleContext>, AppError> {
    match (appointment_id, current_date_time) {
        (None, None) => Ok(None),
        (Some(appointment_id), Some(current)) => {
            // An appointment off the hour does not own any slot.
            let slot = CandidateSlot::from_date_time(professional_id, current).ok_or_else(|| {
                AppError::BadRequest("'current_date_time' must start on a whole hour".to_string())
            })?;

            Ok(Some(RescheduleContext {
                appointment_id,
                professional_id,
                date: slot.date,
                hour: slot.hour,
            }))
        }
        _ => Err(AppError::BadRequest(
            "'appointment_id' and 'current_date_time' must be provided together".to_string(),
        )),
    }
}
