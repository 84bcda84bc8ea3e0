//! Domain models for booking-service.

mod booking;
mod expense;
mod payment;
mod payment_status;
mod report;
mod service_line;

pub(crate) use booking::check_travel_dates;
pub(crate) use payment::settled_on;
pub use booking::{
    Booking, BookingDetail, BookingStatus, CreateBooking, ListBookingsFilter, StatusStamps,
    TransitionPolicy, UpdateBooking,
};
pub use expense::{CreateExpense, ListExpensesFilter, OperationalExpense};
pub use payment::{
    ClientPayment, ClientPaymentMutation, CreateClientPayment, CreateSupplierPayment,
    ListSupplierPaymentsFilter, SupplierPayment, SupplierPaymentStatus, SupplierType,
    UpdateSupplierPayment,
};
pub use payment_status::PaymentStatus;
pub use report::*;
pub use service_line::{
    CostInputs, FlightLine, FlightLineInput, FlightLinePatch, HotelLine, HotelLineInput,
    HotelLinePatch, LineFinancials, LineMutation, LineTerms, OperationType, ServiceLine,
    ServiceType, TourLine, TourLineInput, TourLinePatch, TransferLine, TransferLineInput,
    TransferLinePatch,
};

use thiserror::Error;

/// A stored or submitted value that does not name a known enum variant.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Currency assumed when a caller omits one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Round to cents the way Postgres `NUMERIC(14,2)` does, so that values priced
/// in memory match what is stored.
pub fn round_money(value: rust_decimal::Decimal) -> rust_decimal::Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}
