pub mod bookings;
pub mod expenses;
pub mod health;
pub mod line_items;
pub mod payments;
pub mod reports;

pub use health::{health_check, metrics_endpoint, readiness_check};
