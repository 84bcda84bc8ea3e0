//! Read-only financial reports. None of these take row locks.

use axum::{extract::State, response::IntoResponse};
use service_core::error::AppError;
use service_core::extract::{ApiPath, ApiQuery};
use service_core::response::ok;
use uuid::Uuid;

use crate::dtos::{CashFlowParams, DateRangeParams, MonthParams};
use crate::startup::AppState;

pub async fn dashboard_stats(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let stats = state.db.dashboard_stats(state.clock.today()).await?;
    Ok(ok(stats))
}

pub async fn monthly_pnl(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<MonthParams>,
) -> Result<impl IntoResponse, AppError> {
    let (year, month) = params.resolve(state.clock.today())?;
    let pnl = state.db.monthly_pnl(year, month).await?;
    Ok(ok(pnl))
}

pub async fn cash_flow(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<CashFlowParams>,
) -> Result<impl IntoResponse, AppError> {
    let (from_date, to_date) = params.resolve(state.clock.today());
    let report = state.db.cash_flow(from_date, to_date).await?;
    Ok(ok(report))
}

pub async fn booking_profitability(
    State(state): State<AppState>,
    ApiPath(booking_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let report = state.db.booking_profitability(booking_id).await?;
    Ok(ok(report))
}

pub async fn sales_by_client(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<DateRangeParams>,
) -> Result<impl IntoResponse, AppError> {
    params.check()?;
    let report = state
        .db
        .sales_by_client(params.from_date, params.to_date)
        .await?;
    Ok(ok(report))
}

pub async fn sales_by_service(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<DateRangeParams>,
) -> Result<impl IntoResponse, AppError> {
    params.check()?;
    let report = state
        .db
        .sales_by_service(params.from_date, params.to_date)
        .await?;
    Ok(ok(report))
}

pub async fn outstanding(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let report = state.db.outstanding(state.clock.today()).await?;
    Ok(ok(report))
}
