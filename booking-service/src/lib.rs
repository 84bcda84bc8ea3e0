//! booking-service: financial engine for travel bookings.
//!
//! Prices service line items, keeps booking totals consistent with their lines
//! and payments, allocates booking codes and serves the back-office reports.

pub mod clock;
pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
