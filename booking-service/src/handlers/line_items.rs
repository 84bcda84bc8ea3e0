//! Hotel, tour, transfer and flight line items. Every write answers with the
//! line and the booking totals it produced.

use axum::{extract::State, response::IntoResponse};
use service_core::error::AppError;
use service_core::extract::{ApiPath, ValidatedJson};
use service_core::response::{created, ok};
use uuid::Uuid;

use crate::models::{
    FlightLineInput, FlightLinePatch, HotelLineInput, HotelLinePatch, ServiceType, TourLineInput,
    TourLinePatch, TransferLineInput, TransferLinePatch,
};
use crate::startup::AppState;

async fn delete_line_of(
    state: &AppState,
    service_type: ServiceType,
    line_id: Uuid,
) -> Result<impl IntoResponse, AppError> {
    let booking = state
        .db
        .delete_line(service_type, line_id, state.clock.today())
        .await?;
    Ok(ok(booking))
}

pub async fn create_hotel_line(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<HotelLineInput>,
) -> Result<impl IntoResponse, AppError> {
    let mutation = state
        .db
        .create_hotel_line(&input, state.clock.today())
        .await?;
    Ok(created(mutation))
}

pub async fn update_hotel_line(
    State(state): State<AppState>,
    ApiPath(line_id): ApiPath<Uuid>,
    ValidatedJson(patch): ValidatedJson<HotelLinePatch>,
) -> Result<impl IntoResponse, AppError> {
    let mutation = state
        .db
        .update_hotel_line(line_id, &patch, state.clock.today())
        .await?;
    Ok(ok(mutation))
}

pub async fn delete_hotel_line(
    State(state): State<AppState>,
    ApiPath(line_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    delete_line_of(&state, ServiceType::Hotel, line_id).await
}

pub async fn create_tour_line(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<TourLineInput>,
) -> Result<impl IntoResponse, AppError> {
    let mutation = state
        .db
        .create_tour_line(&input, state.clock.today())
        .await?;
    Ok(created(mutation))
}

pub async fn update_tour_line(
    State(state): State<AppState>,
    ApiPath(line_id): ApiPath<Uuid>,
    ValidatedJson(patch): ValidatedJson<TourLinePatch>,
) -> Result<impl IntoResponse, AppError> {
    let mutation = state
        .db
        .update_tour_line(line_id, &patch, state.clock.today())
        .await?;
    Ok(ok(mutation))
}

pub async fn delete_tour_line(
    State(state): State<AppState>,
    ApiPath(line_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    delete_line_of(&state, ServiceType::Tour, line_id).await
}

pub async fn create_transfer_line(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<TransferLineInput>,
) -> Result<impl IntoResponse, AppError> {
    let mutation = state
        .db
        .create_transfer_line(&input, state.clock.today())
        .await?;
    Ok(created(mutation))
}

pub async fn update_transfer_line(
    State(state): State<AppState>,
    ApiPath(line_id): ApiPath<Uuid>,
    ValidatedJson(patch): ValidatedJson<TransferLinePatch>,
) -> Result<impl IntoResponse, AppError> {
    let mutation = state
        .db
        .update_transfer_line(line_id, &patch, state.clock.today())
        .await?;
    Ok(ok(mutation))
}

pub async fn delete_transfer_line(
    State(state): State<AppState>,
    ApiPath(line_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    delete_line_of(&state, ServiceType::Transfer, line_id).await
}

pub async fn create_flight_line(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<FlightLineInput>,
) -> Result<impl IntoResponse, AppError> {
    let mutation = state
        .db
        .create_flight_line(&input, state.clock.today())
        .await?;
    Ok(created(mutation))
}

pub async fn update_flight_line(
    State(state): State<AppState>,
    ApiPath(line_id): ApiPath<Uuid>,
    ValidatedJson(patch): ValidatedJson<FlightLinePatch>,
) -> Result<impl IntoResponse, AppError> {
    let mutation = state
        .db
        .update_flight_line(line_id, &patch, state.clock.today())
        .await?;
    Ok(ok(mutation))
}

pub async fn delete_flight_line(
    State(state): State<AppState>,
    ApiPath(line_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    delete_line_of(&state, ServiceType::Flight, line_id).await
}
