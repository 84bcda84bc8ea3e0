use axum::{extract::State, response::IntoResponse};
use service_core::error::AppError;
use service_core::extract::{ApiPath, ApiQuery, ValidatedJson};
use service_core::response::{created, ok};
use uuid::Uuid;

use crate::dtos::BookingListParams;
use crate::models::{CreateBooking, UpdateBooking};
use crate::startup::AppState;

pub async fn list_bookings(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<BookingListParams>,
) -> Result<impl IntoResponse, AppError> {
    let bookings = state.db.list_bookings(&params.into()).await?;
    Ok(ok(bookings))
}

pub async fn create_booking(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreateBooking>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state
        .db
        .create_booking(&state.codes, &input, state.clock.now())
        .await?;
    Ok(created(booking))
}

/// Booking header with its line items and payments.
pub async fn get_booking(
    State(state): State<AppState>,
    ApiPath(booking_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = state
        .db
        .get_booking_detail(booking_id, state.clock.today())
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Booking {} not found", booking_id)))?;
    Ok(ok(detail))
}

pub async fn update_booking(
    State(state): State<AppState>,
    ApiPath(booking_id): ApiPath<Uuid>,
    ValidatedJson(input): ValidatedJson<UpdateBooking>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state
        .db
        .update_booking(
            booking_id,
            &input,
            state.config.status_transitions,
            state.clock.now(),
        )
        .await?;
    Ok(ok(booking))
}

pub async fn delete_booking(
    State(state): State<AppState>,
    ApiPath(booking_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.db.delete_booking(booking_id).await?;
    Ok(ok(serde_json::json!({ "booking_id": booking_id, "deleted": true })))
}
