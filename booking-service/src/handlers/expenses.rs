use axum::{extract::State, response::IntoResponse};
use service_core::error::AppError;
use service_core::extract::{ApiQuery, ValidatedJson};
use service_core::response::{created, ok};

use crate::dtos::{ExpenseListParams, YearParams};
use crate::models::CreateExpense;
use crate::startup::AppState;

pub async fn list_expenses(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ExpenseListParams>,
) -> Result<impl IntoResponse, AppError> {
    let expenses = state.db.list_expenses(&params.into()).await?;
    Ok(ok(expenses))
}

pub async fn create_expense(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreateExpense>,
) -> Result<impl IntoResponse, AppError> {
    let expense = state.db.create_expense(&input).await?;
    Ok(created(expense))
}

pub async fn expense_summary(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<YearParams>,
) -> Result<impl IntoResponse, AppError> {
    let year = params.resolve(state.clock.today());
    let summary = state.db.expense_summary(year).await?;
    Ok(ok(summary))
}
