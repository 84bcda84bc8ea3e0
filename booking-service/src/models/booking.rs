//! Booking header model and lifecycle rules.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::{
    ClientPayment, FlightLine, HotelLine, PaymentStatus, SupplierPayment, TourLine, TransferLine,
    UnknownVariant,
};

/// Booking lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Inquiry,
    Quoted,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Inquiry,
        BookingStatus::Quoted,
        BookingStatus::Confirmed,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Inquiry => "inquiry",
            BookingStatus::Quoted => "quoted",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// Confirmed bookings stay confirmed once completed.
    pub fn is_confirmed(&self) -> bool {
        matches!(self, BookingStatus::Confirmed | BookingStatus::Completed)
    }

    /// Position on the inquiry -> quoted -> confirmed -> completed chain.
    fn chain_position(&self) -> Option<u8> {
        match self {
            BookingStatus::Inquiry => Some(0),
            BookingStatus::Quoted => Some(1),
            BookingStatus::Confirmed => Some(2),
            BookingStatus::Completed => Some(3),
            BookingStatus::Cancelled => None,
        }
    }

    pub fn can_transition_to(&self, next: BookingStatus, policy: TransitionPolicy) -> bool {
        if *self == next || policy == TransitionPolicy::Permissive {
            return true;
        }

        match (self, next) {
            (_, BookingStatus::Cancelled) => !self.is_terminal(),
            (BookingStatus::Confirmed, BookingStatus::Quoted) => true,
            _ => match (self.chain_position(), next.chain_position()) {
                (Some(from), Some(to)) => to > from,
                _ => false,
            },
        }
    }

    pub fn check_transition(
        &self,
        next: BookingStatus,
        policy: TransitionPolicy,
    ) -> Result<(), AppError> {
        if self.can_transition_to(next, policy) {
            Ok(())
        } else {
            Err(AppError::validation(
                "status",
                format!(
                    "Cannot move booking from '{}' to '{}'",
                    self.as_str(),
                    next.as_str()
                ),
            ))
        }
    }
}

impl FromStr for BookingStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inquiry" => Ok(BookingStatus::Inquiry),
            "quoted" => Ok(BookingStatus::Quoted),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(UnknownVariant::new("booking status", other)),
        }
    }
}

impl TryFrom<String> for BookingStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// How strictly status changes are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    /// Any transition is accepted.
    #[default]
    Permissive,
    /// Forward chain, cancellation from a non-terminal state and confirmed -> quoted.
    Strict,
}

/// Lifecycle timestamps carried on the booking row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusStamps {
    pub is_confirmed: bool,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl StatusStamps {
    /// Stamps for a booking created directly in `status`.
    pub fn initial(status: BookingStatus, now: DateTime<Utc>) -> Self {
        Self::default().enter(status, now)
    }

    /// Stamps after moving from `from` to `to`. Earlier stamps are kept when
    /// moving backwards.
    pub fn after_transition(
        self,
        from: BookingStatus,
        to: BookingStatus,
        now: DateTime<Utc>,
    ) -> Self {
        if from == to {
            return self;
        }
        self.enter(to, now)
    }

    fn enter(mut self, status: BookingStatus, now: DateTime<Utc>) -> Self {
        match status {
            BookingStatus::Confirmed => self.confirmed_at = Some(now),
            BookingStatus::Completed => {
                self.completed_at = Some(now);
                self.confirmed_at.get_or_insert(now);
            }
            _ => {}
        }
        self.is_confirmed = status.is_confirmed();
        self
    }
}

/// Booking header with its derived financial totals.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Booking {
    pub booking_id: Uuid,
    pub booking_code: String,
    #[serde(skip)]
    pub code_number: i64,
    pub client_id: Uuid,
    pub client_name: String,
    pub pax_count: i32,
    pub travel_date_from: Option<NaiveDate>,
    pub travel_date_to: Option<NaiveDate>,
    #[sqlx(try_from = "String")]
    pub status: BookingStatus,
    pub is_confirmed: bool,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub currency: String,
    pub notes: Option<String>,
    pub total_cost_price: Decimal,
    pub total_sell_price: Decimal,
    pub gross_profit: Decimal,
    #[sqlx(try_from = "String")]
    pub payment_status: PaymentStatus,
    pub amount_received: Decimal,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Booking {
    pub fn stamps(&self) -> StatusStamps {
        StatusStamps {
            is_confirmed: self.is_confirmed,
            confirmed_at: self.confirmed_at,
            completed_at: self.completed_at,
        }
    }
}

/// A booking with everything it owns.
#[derive(Debug, Clone, Serialize)]
pub struct BookingDetail {
    #[serde(flatten)]
    pub booking: Booking,
    pub hotels: Vec<HotelLine>,
    pub tours: Vec<TourLine>,
    pub transfers: Vec<TransferLine>,
    pub flights: Vec<FlightLine>,
    pub client_payments: Vec<ClientPayment>,
    pub supplier_payments: Vec<SupplierPayment>,
}

/// Filter parameters for listing bookings.
#[derive(Debug, Clone, Default)]
pub struct ListBookingsFilter {
    pub status: Option<BookingStatus>,
    pub client_id: Option<Uuid>,
}

fn default_pax_count() -> i32 {
    1
}

/// Input for creating a booking. Totals are never accepted from callers.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBooking {
    pub client_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub client_name: String,
    #[serde(default = "default_pax_count")]
    #[validate(range(min = 0, max = 1000))]
    pub pax_count: i32,
    pub travel_date_from: Option<NaiveDate>,
    pub travel_date_to: Option<NaiveDate>,
    pub status: Option<BookingStatus>,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    #[validate(length(max = 4000))]
    pub notes: Option<String>,
}

/// Input for updating a booking.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateBooking {
    pub client_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200))]
    pub client_name: Option<String>,
    #[validate(range(min = 0, max = 1000))]
    pub pax_count: Option<i32>,
    pub travel_date_from: Option<NaiveDate>,
    pub travel_date_to: Option<NaiveDate>,
    pub status: Option<BookingStatus>,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    #[validate(length(max = 4000))]
    pub notes: Option<String>,
}

/// Travel end must not precede travel start.
pub(crate) fn check_travel_dates(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<(), AppError> {
    match (from, to) {
        (Some(from), Some(to)) if to < from => Err(AppError::validation(
            "travel_date_to",
            "travel_date_to must not be before travel_date_from",
        )),
        _ => Ok(()),
    }
}
