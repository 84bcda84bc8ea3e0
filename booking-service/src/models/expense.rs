//! Operational (overhead) expenses.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OperationalExpense {
    pub expense_id: Uuid,
    pub expense_date: NaiveDate,
    pub category: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub is_recurring: bool,
    pub created_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateExpense {
    pub expense_date: NaiveDate,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub amount: Decimal,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
}

/// Filter parameters for listing expenses. Dates are inclusive.
#[derive(Debug, Clone, Default)]
pub struct ListExpensesFilter {
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub category: Option<String>,
}
