//! HTTP middleware shared by the services.

pub mod tracing;
