//! Services module for booking-service.

pub mod aggregator;
pub mod booking_code;
pub mod bookings;
pub mod database;
pub mod expenses;
pub mod ledger;
pub mod line_items;
pub mod metrics;
pub mod payment_status;
pub mod payments;
pub mod reports;

pub use aggregator::{recompute_booking_aggregates, BookingAggregate};
pub use booking_code::{BookingCode, BookingCodeGenerator};
pub use database::Database;
pub use metrics::{get_metrics, init_metrics};
