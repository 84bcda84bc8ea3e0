//! Client receipts and supplier payables.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::{Booking, UnknownVariant};

/// Money received from a client against a booking.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ClientPayment {
    pub payment_id: Uuid,
    pub booking_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub payment_date: NaiveDate,
    pub payment_method: Option<String>,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
    pub created_utc: DateTime<Utc>,
}

/// Input for recording a client payment.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateClientPayment {
    pub booking_id: Uuid,
    pub amount: Decimal,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    /// Defaults to today.
    pub payment_date: Option<NaiveDate>,
    #[validate(length(max = 50))]
    pub payment_method: Option<String>,
    #[validate(length(max = 100))]
    pub reference_number: Option<String>,
    pub notes: Option<String>,
}

/// A recorded or removed client payment with the booking totals it produced.
#[derive(Debug, Clone, Serialize)]
pub struct ClientPaymentMutation {
    pub payment: ClientPayment,
    pub booking: Booking,
}

/// Kind of supplier a payable is owed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplierType {
    Hotel,
    Tour,
    Transfer,
    Flight,
    Other,
}

impl SupplierType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupplierType::Hotel => "hotel",
            SupplierType::Tour => "tour",
            SupplierType::Transfer => "transfer",
            SupplierType::Flight => "flight",
            SupplierType::Other => "other",
        }
    }
}

impl FromStr for SupplierType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hotel" => Ok(SupplierType::Hotel),
            "tour" => Ok(SupplierType::Tour),
            "transfer" => Ok(SupplierType::Transfer),
            "flight" => Ok(SupplierType::Flight),
            "other" => Ok(SupplierType::Other),
            other => Err(UnknownVariant::new("supplier type", other)),
        }
    }
}

impl TryFrom<String> for SupplierType {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplierPaymentStatus {
    #[default]
    Pending,
    Paid,
}

impl SupplierPaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupplierPaymentStatus::Pending => "pending",
            SupplierPaymentStatus::Paid => "paid",
        }
    }
}

impl FromStr for SupplierPaymentStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SupplierPaymentStatus::Pending),
            "paid" => Ok(SupplierPaymentStatus::Paid),
            other => Err(UnknownVariant::new("supplier payment status", other)),
        }
    }
}

impl TryFrom<String> for SupplierPaymentStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Money owed, or already paid, to a supplier for a booking.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SupplierPayment {
    pub payment_id: Uuid,
    pub booking_id: Uuid,
    #[sqlx(try_from = "String")]
    pub supplier_type: SupplierType,
    pub supplier_name: String,
    pub service_id: Option<Uuid>,
    pub amount: Decimal,
    pub currency: String,
    #[sqlx(try_from = "String")]
    pub status: SupplierPaymentStatus,
    pub due_date: Option<NaiveDate>,
    pub payment_date: Option<NaiveDate>,
    pub payment_method: Option<String>,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl SupplierPayment {
    /// Amount settled so far: all of it once marked paid.
    pub fn paid_amount(&self) -> Decimal {
        match self.status {
            SupplierPaymentStatus::Paid => self.amount,
            SupplierPaymentStatus::Pending => Decimal::ZERO,
        }
    }
}

/// Input for recording a supplier payable.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSupplierPayment {
    pub booking_id: Uuid,
    pub supplier_type: SupplierType,
    #[validate(length(min = 1, max = 200))]
    pub supplier_name: String,
    pub service_id: Option<Uuid>,
    pub amount: Decimal,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    #[serde(default)]
    pub status: SupplierPaymentStatus,
    pub due_date: Option<NaiveDate>,
    pub payment_date: Option<NaiveDate>,
    #[validate(length(max = 50))]
    pub payment_method: Option<String>,
    #[validate(length(max = 100))]
    pub reference_number: Option<String>,
    pub notes: Option<String>,
}

/// Input for editing a supplier payable or marking it paid.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateSupplierPayment {
    #[validate(length(min = 1, max = 200))]
    pub supplier_name: Option<String>,
    pub amount: Option<Decimal>,
    pub status: Option<SupplierPaymentStatus>,
    pub due_date: Option<NaiveDate>,
    pub payment_date: Option<NaiveDate>,
    #[validate(length(max = 50))]
    pub payment_method: Option<String>,
    #[validate(length(max = 100))]
    pub reference_number: Option<String>,
    pub notes: Option<String>,
}

/// Payment date to store for a payable in `status`. Paying stamps today unless
/// the caller names a date; reopening clears it.
pub(crate) fn settled_on(
    status: SupplierPaymentStatus,
    requested: Option<NaiveDate>,
    existing: Option<NaiveDate>,
    today: NaiveDate,
) -> Option<NaiveDate> {
    match status {
        SupplierPaymentStatus::Paid => requested.or(existing).or(Some(today)),
        SupplierPaymentStatus::Pending => None,
    }
}

/// Filter parameters for listing supplier payments.
#[derive(Debug, Clone, Default)]
pub struct ListSupplierPaymentsFilter {
    pub booking_id: Option<Uuid>,
    pub status: Option<SupplierPaymentStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, d).unwrap()
    }

    #[test]
    fn paying_stamps_today_when_no_date_given() {
        assert_eq!(
            settled_on(SupplierPaymentStatus::Paid, None, None, day(20)),
            Some(day(20))
        );
        assert_eq!(
            settled_on(SupplierPaymentStatus::Paid, Some(day(18)), None, day(20)),
            Some(day(18))
        );
        assert_eq!(
            settled_on(SupplierPaymentStatus::Paid, None, Some(day(3)), day(20)),
            Some(day(3))
        );
    }

    #[test]
    fn reopening_clears_payment_date() {
        assert_eq!(
            settled_on(SupplierPaymentStatus::Pending, Some(day(18)), Some(day(3)), day(20)),
            None
        );
    }

    #[test]
    fn supplier_type_round_trips_through_storage() {
        assert_eq!(
            SupplierType::try_from("transfer".to_string()),
            Ok(SupplierType::Transfer)
        );
        assert!("bus".parse::<SupplierType>().is_err());
    }
}
