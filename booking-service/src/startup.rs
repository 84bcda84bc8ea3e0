//! Application startup and lifecycle management.

use crate::clock::{Clock, SystemClock};
use crate::config::BookingConfig;
use crate::handlers::{self, bookings, expenses, line_items, payments, reports};
use crate::middleware::http_metrics_middleware;
use crate::services::{init_metrics, BookingCodeGenerator, Database};
use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::tracing::request_id_middleware;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: BookingConfig,
    pub db: Database,
    pub codes: Arc<BookingCodeGenerator>,
    pub clock: Arc<dyn Clock>,
}

/// All HTTP routes with their middleware.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/bookings",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route(
            "/bookings/:id",
            get(bookings::get_booking)
                .put(bookings::update_booking)
                .delete(bookings::delete_booking),
        )
        .route("/booking-hotels", post(line_items::create_hotel_line))
        .route(
            "/booking-hotels/:id",
            put(line_items::update_hotel_line).delete(line_items::delete_hotel_line),
        )
        .route("/booking-tours", post(line_items::create_tour_line))
        .route(
            "/booking-tours/:id",
            put(line_items::update_tour_line).delete(line_items::delete_tour_line),
        )
        .route("/booking-transfers", post(line_items::create_transfer_line))
        .route(
            "/booking-transfers/:id",
            put(line_items::update_transfer_line).delete(line_items::delete_transfer_line),
        )
        .route("/booking-flights", post(line_items::create_flight_line))
        .route(
            "/booking-flights/:id",
            put(line_items::update_flight_line).delete(line_items::delete_flight_line),
        )
        .route(
            "/client-payments",
            get(payments::list_client_payments).post(payments::create_client_payment),
        )
        .route("/client-payments/:id", delete(payments::delete_client_payment))
        .route(
            "/supplier-payments",
            get(payments::list_supplier_payments).post(payments::create_supplier_payment),
        )
        .route(
            "/supplier-payments/summary",
            get(payments::supplier_payment_summary),
        )
        .route("/supplier-payments/:id", put(payments::update_supplier_payment))
        .route(
            "/operational-expenses",
            get(expenses::list_expenses).post(expenses::create_expense),
        )
        .route(
            "/operational-expenses/summary",
            get(expenses::expense_summary),
        )
        .route("/reports/dashboard-stats", get(reports::dashboard_stats))
        .route("/reports/monthly-pl", get(reports::monthly_pnl))
        .route("/reports/cash-flow", get(reports::cash_flow))
        .route(
            "/reports/booking-profitability/:id",
            get(reports::booking_profitability),
        )
        .route("/reports/sales-by-client", get(reports::sales_by_client))
        .route("/reports/sales-by-service", get(reports::sales_by_service))
        .route("/reports/outstanding", get(reports::outstanding))
        .route_layer(middleware::from_fn(http_metrics_middleware));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    http_port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application against the wall clock, running migrations.
    pub async fn build(config: BookingConfig) -> Result<Self, AppError> {
        Self::build_with_clock(config, Arc::new(SystemClock)).await
    }

    /// Build the application with an explicit notion of "today".
    pub async fn build_with_clock(
        config: BookingConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AppError> {
        init_metrics();

        let db = Database::new(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
            e
        })?;

        db.run_migrations().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to run migrations");
            e
        })?;

        let codes = Arc::new(BookingCodeGenerator::from_config(&config.booking_code));

        let state = AppState {
            config: config.clone(),
            db,
            codes,
            clock,
        };

        let addr = format!("{}:{}", config.common.host, config.common.port);
        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let http_port = listener.local_addr()?.port();

        tracing::info!(
            http_port = http_port,
            booking_code_prefix = %config.booking_code.prefix,
            status_transitions = ?config.status_transitions,
            "Booking service listener bound"
        );

        Ok(Self {
            http_port,
            listener,
            state,
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    /// Get a reference to the database.
    pub fn db(&self) -> &Database {
        &self.state.db
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let app = router(self.state);

        tracing::info!(
            service = "booking-service",
            version = env!("CARGO_PKG_VERSION"),
            http_port = self.http_port,
            "Service ready to accept connections"
        );

        axum::serve(self.listener, app).await
    }
}
