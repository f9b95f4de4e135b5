// libs/availability-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn availability_routes(state: Arc<AppConfig>) -> Router {
    // Callers' bearer tokens are forwarded to the clinic backend as-is
    Router::new()
        .route("/professionals/{professional_id}/selectable-days", get(handlers::get_selectable_days))
        .route("/professionals/{professional_id}/free-hours", get(handlers::get_free_hours))
        .route("/professionals/{professional_id}/slots/check", get(handlers::check_slot))
        .with_state(state)
}
