//! Query-string parameters accepted by the list and report endpoints.

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use service_core::error::AppError;
use uuid::Uuid;

use crate::models::{
    BookingStatus, ListBookingsFilter, ListExpensesFilter, ListSupplierPaymentsFilter,
    SupplierPaymentStatus,
};

#[derive(Debug, Default, Deserialize)]
pub struct BookingListParams {
    pub status: Option<BookingStatus>,
    pub client_id: Option<Uuid>,
}

impl From<BookingListParams> for ListBookingsFilter {
    fn from(params: BookingListParams) -> Self {
        Self {
            status: params.status,
            client_id: params.client_id,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ClientPaymentListParams {
    pub booking_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SupplierPaymentListParams {
    pub booking_id: Option<Uuid>,
    pub status: Option<SupplierPaymentStatus>,
}

impl From<SupplierPaymentListParams> for ListSupplierPaymentsFilter {
    fn from(params: SupplierPaymentListParams) -> Self {
        Self {
            booking_id: params.booking_id,
            status: params.status,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ExpenseListParams {
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub category: Option<String>,
}

impl From<ExpenseListParams> for ListExpensesFilter {
    fn from(params: ExpenseListParams) -> Self {
        Self {
            from_date: params.from_date,
            to_date: params.to_date,
            category: params.category.filter(|c| !c.trim().is_empty()),
        }
    }
}

/// `?year=YYYY`, defaulting to the current year.
#[derive(Debug, Default, Deserialize)]
pub struct YearParams {
    pub year: Option<i32>,
}

impl YearParams {
    pub fn resolve(&self, today: NaiveDate) -> i32 {
        self.year.unwrap_or_else(|| today.year())
    }
}

/// `?month=YYYY-MM`, defaulting to the current month.
#[derive(Debug, Default, Deserialize)]
pub struct MonthParams {
    pub month: Option<String>,
}

impl MonthParams {
    pub fn resolve(&self, today: NaiveDate) -> Result<(i32, u32), AppError> {
        match self.month.as_deref() {
            None => Ok((today.year(), today.month())),
            Some(raw) => parse_month(raw),
        }
    }
}

fn parse_month(raw: &str) -> Result<(i32, u32), AppError> {
    let invalid =
        || AppError::BadRequest(anyhow::anyhow!("month must be YYYY-MM, got '{}'", raw));

    let (year, month) = raw.trim().split_once('-').ok_or_else(invalid)?;
    if year.len() != 4 || month.len() != 2 {
        return Err(invalid());
    }
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }

    Ok((year, month))
}

/// `?from_date&to_date` for the cash-flow report. Defaults to the year to date.
#[derive(Debug, Default, Deserialize)]
pub struct CashFlowParams {
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

impl CashFlowParams {
    pub fn resolve(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let to_date = self.to_date.unwrap_or(today);
        let from_date = self
            .from_date
            .or_else(|| NaiveDate::from_ymd_opt(to_date.year(), 1, 1))
            .unwrap_or(to_date);
        (from_date, to_date)
    }
}

/// Optional inclusive travel-date window for the sales reports.
#[derive(Debug, Default, Deserialize)]
pub struct DateRangeParams {
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

impl DateRangeParams {
    pub fn check(&self) -> Result<(), AppError> {
        match (self.from_date, self.to_date) {
            (Some(from), Some(to)) if to < from => Err(AppError::validation(
                "to_date",
                "to_date must not be before from_date",
            )),
            _ => Ok(()),
        }
    }
}
