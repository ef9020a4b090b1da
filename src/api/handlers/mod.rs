//! REST endpoint handlers organized by resource.

pub mod admin;
pub mod agent;
pub mod system;
pub mod users;
pub mod waitlist;

use axum::Router;
use axum::middleware;

use crate::api::rate_limit::global_rate_limit;
use crate::app_state::AppState;

/// Composes all resource routes under `/api`, behind the global limiter.
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(agent::routes(state))
        .merge(users::routes())
        .merge(waitlist::routes())
        .merge(admin::routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            global_rate_limit,
        ))
}
