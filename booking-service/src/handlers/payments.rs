use axum::{extract::State, response::IntoResponse};
use service_core::error::AppError;
use service_core::extract::{ApiPath, ApiQuery, ValidatedJson};
use service_core::response::{created, ok};
use uuid::Uuid;

use crate::dtos::{ClientPaymentListParams, SupplierPaymentListParams};
use crate::models::{CreateClientPayment, CreateSupplierPayment, UpdateSupplierPayment};
use crate::startup::AppState;

pub async fn list_client_payments(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ClientPaymentListParams>,
) -> Result<impl IntoResponse, AppError> {
    let payments = state.db.list_client_payments(params.booking_id).await?;
    Ok(ok(payments))
}

pub async fn create_client_payment(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreateClientPayment>,
) -> Result<impl IntoResponse, AppError> {
    let mutation = state
        .db
        .create_client_payment(&input, state.clock.today())
        .await?;
    Ok(created(mutation))
}

pub async fn delete_client_payment(
    State(state): State<AppState>,
    ApiPath(payment_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mutation = state
        .db
        .delete_client_payment(payment_id, state.clock.today())
        .await?;
    Ok(ok(mutation))
}

pub async fn list_supplier_payments(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SupplierPaymentListParams>,
) -> Result<impl IntoResponse, AppError> {
    let payments = state.db.list_supplier_payments(&params.into()).await?;
    Ok(ok(payments))
}

pub async fn create_supplier_payment(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreateSupplierPayment>,
) -> Result<impl IntoResponse, AppError> {
    let payment = state
        .db
        .create_supplier_payment(&input, state.clock.today())
        .await?;
    Ok(created(payment))
}

/// Edit a payable or mark it paid.
pub async fn update_supplier_payment(
    State(state): State<AppState>,
    ApiPath(payment_id): ApiPath<Uuid>,
    ValidatedJson(input): ValidatedJson<UpdateSupplierPayment>,
) -> Result<impl IntoResponse, AppError> {
    let payment = state
        .db
        .update_supplier_payment(payment_id, &input, state.clock.today())
        .await?;
    Ok(ok(payment))
}

pub async fn supplier_payment_summary(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let summary = state
        .db
        .supplier_payment_summary(state.clock.today())
        .await?;
    Ok(ok(summary))
}
