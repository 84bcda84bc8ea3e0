//! Booking-level derived totals.
//!
//! [`recompute_booking_aggregates`] is the only code that writes
//! `total_cost_price`, `total_sell_price`, `gross_profit`, `amount_received`
//! and `payment_status` on a booking. Every mutating operation calls it inside
//! its own transaction after the triggering write.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use service_core::error::AppError;
use sqlx::PgConnection;
use tracing::{debug, error, instrument};
use uuid::Uuid;

use crate::models::{Booking, PaymentStatus, ServiceLine};
use crate::services::bookings::{lock_booking, BOOKING_COLUMNS};
use crate::services::database::db_error;
use crate::services::ledger;
use crate::services::line_items::fetch_booking_lines;
use crate::services::metrics::{AGGREGATE_RECOMPUTES_TOTAL, DB_QUERY_DURATION};
use crate::services::payment_status::{PaymentPosition, PAYMENT_EPSILON};

/// The derived fields of one booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingAggregate {
    pub total_cost_price: Decimal,
    pub total_sell_price: Decimal,
    pub gross_profit: Decimal,
    pub amount_received: Decimal,
    pub payment_status: PaymentStatus,
}

impl BookingAggregate {
    /// Sum line items and received payments. Each line is checked against its
    /// own inputs first, so a stale line cannot leak into the totals.
    ///
    /// Amounts are summed at face value whatever their currency.
    pub fn compute(
        lines: &[ServiceLine],
        amount_received: Decimal,
        today: NaiveDate,
    ) -> Result<Self, AppError> {
        let mut total_cost_price = Decimal::ZERO;
        let mut total_sell_price = Decimal::ZERO;

        for line in lines {
            ledger::verify_stored(line)?;
            let financials = line.financials();
            total_cost_price += financials.total_cost;
            total_sell_price += financials.sell_price;
        }

        Ok(Self {
            total_cost_price,
            total_sell_price,
            gross_profit: total_sell_price - total_cost_price,
            amount_received,
            payment_status: PaymentPosition::receivable(total_sell_price, amount_received)
                .status(today),
        })
    }

    /// Whether a stored booking carries exactly these derived values.
    pub fn matches(&self, booking: &Booking) -> bool {
        let close = |a: Decimal, b: Decimal| (a - b).abs() < PAYMENT_EPSILON;

        close(self.total_cost_price, booking.total_cost_price)
            && close(self.total_sell_price, booking.total_sell_price)
            && close(self.gross_profit, booking.gross_profit)
            && close(self.amount_received, booking.amount_received)
            && self.payment_status == booking.payment_status
    }
}

/// Recompute and persist a booking's derived fields within `conn`'s
/// transaction. Locks the booking row first.
#[instrument(skip(conn), fields(booking_id = %booking_id))]
pub async fn recompute_booking_aggregates(
    conn: &mut PgConnection,
    booking_id: Uuid,
    today: NaiveDate,
) -> Result<Booking, AppError> {
    let timer = DB_QUERY_DURATION
        .with_label_values(&["recompute_booking_aggregates"])
        .start_timer();

    lock_booking(&mut *conn, booking_id).await?;

    let lines = fetch_booking_lines(&mut *conn, booking_id)
        .await?
        .into_service_lines();

    let amount_received: Decimal = sqlx::query_scalar(
        "SELECT COALESCE(SUM(amount), 0) FROM client_payments WHERE booking_id = $1",
    )
    .bind(booking_id)
    .fetch_one(&mut *conn)
    .await
    .map_err(db_error("sum client payments"))?;

    let aggregate = match BookingAggregate::compute(&lines, amount_received, today) {
        Ok(aggregate) => aggregate,
        Err(e) => {
            error!(booking_id = %booking_id, error = %e, "Line item disagrees with its inputs");
            AGGREGATE_RECOMPUTES_TOTAL
                .with_label_values(&["inconsistent"])
                .inc();
            return Err(e);
        }
    };

    let updated = sqlx::query_as::<_, Booking>(&format!(
        r#"
        UPDATE bookings
        SET total_cost_price = $2,
            total_sell_price = $3,
            gross_profit = $4,
            amount_received = $5,
            payment_status = $6,
            updated_utc = NOW()
        WHERE booking_id = $1
        RETURNING {}
        "#,
        BOOKING_COLUMNS
    ))
    .bind(booking_id)
    .bind(aggregate.total_cost_price)
    .bind(aggregate.total_sell_price)
    .bind(aggregate.gross_profit)
    .bind(aggregate.amount_received)
    .bind(aggregate.payment_status.as_str())
    .fetch_one(&mut *conn)
    .await
    .map_err(db_error("store booking aggregates"))?;

    if !aggregate.matches(&updated) {
        error!(
            booking_id = %booking_id,
            computed = ?aggregate,
            stored_cost = %updated.total_cost_price,
            stored_sell = %updated.total_sell_price,
            "Stored booking aggregates diverge from computed values"
        );
        AGGREGATE_RECOMPUTES_TOTAL
            .with_label_values(&["inconsistent"])
            .inc();
        return Err(AppError::AggregationInconsistency(format!(
            "Booking {} stored aggregates that differ from the computed ones",
            booking_id
        )));
    }

    timer.observe_duration();
    AGGREGATE_RECOMPUTES_TOTAL.with_label_values(&["ok"]).inc();

    debug!(
        booking_id = %booking_id,
        lines = lines.len(),
        total_sell_price = %aggregate.total_sell_price,
        payment_status = aggregate.payment_status.as_str(),
        "Booking aggregates recomputed"
    );

    Ok(updated)
}
