//! Booking header persistence: creation with code allocation, edits with
//! status transitions, guarded deletion and the detail view.

use chrono::{DateTime, NaiveDate, Utc};
use service_core::error::AppError;
use sqlx::PgConnection;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::models::{
    check_travel_dates, Booking, BookingDetail, BookingStatus, CreateBooking, ListBookingsFilter,
    ListSupplierPaymentsFilter, StatusStamps, TransitionPolicy, UpdateBooking, DEFAULT_CURRENCY,
};
use crate::services::aggregator::recompute_booking_aggregates;
use crate::services::booking_code::{AllocationError, BookingCodeGenerator};
use crate::services::database::{commit, db_error, Database};
use crate::services::line_items::fetch_booking_lines;
use crate::services::metrics::{BOOKINGS_TOTAL, DB_QUERY_DURATION};
use crate::services::payments::{fetch_client_payments, fetch_supplier_payments};

pub(crate) const BOOKING_COLUMNS: &str = "booking_id, booking_code, code_number, client_id, \
    client_name, pax_count, travel_date_from, travel_date_to, status, is_confirmed, \
    confirmed_at, completed_at, currency, notes, total_cost_price, total_sell_price, \
    gross_profit, payment_status, amount_received, created_utc, updated_utc";

/// Load a booking and hold its row lock until the transaction ends.
pub(crate) async fn lock_booking(
    conn: &mut PgConnection,
    booking_id: Uuid,
) -> Result<Booking, AppError> {
    sqlx::query_as::<_, Booking>(&format!(
        "SELECT {} FROM bookings WHERE booking_id = $1 FOR UPDATE",
        BOOKING_COLUMNS
    ))
    .bind(booking_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(db_error("lock booking"))?
    .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Booking {} not found", booking_id)))
}

impl Database {
    /// Create a booking under a freshly allocated code.
    #[instrument(skip(self, generator, input), fields(client_id = %input.client_id))]
    pub async fn create_booking(
        &self,
        generator: &BookingCodeGenerator,
        input: &CreateBooking,
        now: DateTime<Utc>,
    ) -> Result<Booking, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_booking"])
            .start_timer();

        check_travel_dates(input.travel_date_from, input.travel_date_to)?;

        let status = input.status.unwrap_or(BookingStatus::Inquiry);
        let stamps = StatusStamps::initial(status, now);
        let currency = input.currency.as_deref().unwrap_or(DEFAULT_CURRENCY);
        let insert_sql = format!(
            r#"
            INSERT INTO bookings (
                booking_id, booking_code, code_number, client_id, client_name, pax_count,
                travel_date_from, travel_date_to, status, is_confirmed, confirmed_at,
                completed_at, currency, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        );
        let insert_sql = insert_sql.as_str();

        let booking = generator
            .allocate(move |_| async move {
                let mut tx = self.begin().await?;

                let current_max: Option<i64> =
                    sqlx::query_scalar("SELECT MAX(code_number) FROM bookings")
                        .fetch_one(&mut *tx)
                        .await
                        .map_err(db_error("read highest booking code"))?;
                let code = generator.next_after(current_max);

                let inserted = sqlx::query_as::<_, Booking>(insert_sql)
                    .bind(Uuid::new_v4())
                    .bind(&code.code)
                    .bind(code.number)
                    .bind(input.client_id)
                    .bind(&input.client_name)
                    .bind(input.pax_count)
                    .bind(input.travel_date_from)
                    .bind(input.travel_date_to)
                    .bind(status.as_str())
                    .bind(stamps.is_confirmed)
                    .bind(stamps.confirmed_at)
                    .bind(stamps.completed_at)
                    .bind(currency)
                    .bind(&input.notes)
                    .fetch_one(&mut *tx)
                    .await;

                let booking = match inserted {
                    Ok(booking) => booking,
                    Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => {
                        tx.rollback().await.ok();
                        return Err(AllocationError::CodeTaken(code.code));
                    }
                    Err(e) => return Err(db_error("create booking")(e).into()),
                };

                let booking =
                    recompute_booking_aggregates(&mut *tx, booking.booking_id, now.date_naive())
                        .await?;
                commit(tx).await?;
                Ok(booking)
            })
            .await?;

        timer.observe_duration();

        BOOKINGS_TOTAL.with_label_values(&[status.as_str()]).inc();

        info!(
            booking_id = %booking.booking_id,
            booking_code = %booking.booking_code,
            status = status.as_str(),
            "Booking created"
        );

        Ok(booking)
    }

    /// Get a booking together with its line items and payments. Line payment
    /// statuses are resolved as of `today`.
    #[instrument(skip(self), fields(booking_id = %booking_id))]
    pub async fn get_booking_detail(
        &self,
        booking_id: Uuid,
        today: NaiveDate,
    ) -> Result<Option<BookingDetail>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_booking_detail"])
            .start_timer();

        let mut conn = self
            .pool()
            .acquire()
            .await
            .map_err(db_error("acquire connection"))?;

        let Some(booking) = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {} FROM bookings WHERE booking_id = $1",
            BOOKING_COLUMNS
        ))
        .bind(booking_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_error("get booking"))?
        else {
            return Ok(None);
        };

        let lines = fetch_booking_lines(&mut conn, booking_id).await?.as_of(today);
        let client_payments = fetch_client_payments(&mut conn, Some(booking_id)).await?;
        let supplier_payments = fetch_supplier_payments(
            &mut conn,
            &ListSupplierPaymentsFilter {
                booking_id: Some(booking_id),
                status: None,
            },
        )
        .await?;

        timer.observe_duration();

        Ok(Some(BookingDetail {
            booking,
            hotels: lines.hotels,
            tours: lines.tours,
            transfers: lines.transfers,
            flights: lines.flights,
            client_payments,
            supplier_payments,
        }))
    }

    /// List bookings, newest code first.
    #[instrument(skip(self))]
    pub async fn list_bookings(&self, filter: &ListBookingsFilter) -> Result<Vec<Booking>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_bookings"])
            .start_timer();

        let bookings = sqlx::query_as::<_, Booking>(&format!(
            r#"
            SELECT {}
            FROM bookings
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR client_id = $2)
            ORDER BY code_number DESC
            "#,
            BOOKING_COLUMNS
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.client_id)
        .fetch_all(self.pool())
        .await
        .map_err(db_error("list bookings"))?;

        timer.observe_duration();

        Ok(bookings)
    }

    /// Update booking header fields and, optionally, its status.
    #[instrument(skip(self, input), fields(booking_id = %booking_id))]
    pub async fn update_booking(
        &self,
        booking_id: Uuid,
        input: &UpdateBooking,
        policy: TransitionPolicy,
        now: DateTime<Utc>,
    ) -> Result<Booking, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_booking"])
            .start_timer();

        let mut tx = self.begin().await?;
        let current = lock_booking(&mut tx, booking_id).await?;

        let status = input.status.unwrap_or(current.status);
        current.status.check_transition(status, policy)?;
        let stamps = current.stamps().after_transition(current.status, status, now);

        let travel_date_from = input.travel_date_from.or(current.travel_date_from);
        let travel_date_to = input.travel_date_to.or(current.travel_date_to);
        check_travel_dates(travel_date_from, travel_date_to)?;

        sqlx::query(
            r#"
            UPDATE bookings
            SET client_id = $2,
                client_name = $3,
                pax_count = $4,
                travel_date_from = $5,
                travel_date_to = $6,
                status = $7,
                is_confirmed = $8,
                confirmed_at = $9,
                completed_at = $10,
                currency = $11,
                notes = $12,
                updated_utc = NOW()
            WHERE booking_id = $1
            "#,
        )
        .bind(booking_id)
        .bind(input.client_id.unwrap_or(current.client_id))
        .bind(input.client_name.as_ref().unwrap_or(&current.client_name))
        .bind(input.pax_count.unwrap_or(current.pax_count))
        .bind(travel_date_from)
        .bind(travel_date_to)
        .bind(status.as_str())
        .bind(stamps.is_confirmed)
        .bind(stamps.confirmed_at)
        .bind(stamps.completed_at)
        .bind(input.currency.as_ref().unwrap_or(&current.currency))
        .bind(input.notes.as_ref().or(current.notes.as_ref()))
        .execute(&mut *tx)
        .await
        .map_err(db_error("update booking"))?;

        let booking = recompute_booking_aggregates(&mut tx, booking_id, now.date_naive()).await?;
        commit(tx).await?;

        timer.observe_duration();

        if status != current.status {
            BOOKINGS_TOTAL.with_label_values(&[status.as_str()]).inc();
            info!(
                booking_id = %booking_id,
                from = current.status.as_str(),
                to = status.as_str(),
                "Booking status changed"
            );
        }

        info!(booking_id = %booking_id, "Booking updated");

        Ok(booking)
    }

    /// Delete a booking that owns no line items or payments.
    #[instrument(skip(self), fields(booking_id = %booking_id))]
    pub async fn delete_booking(&self, booking_id: Uuid) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_booking"])
            .start_timer();

        let mut tx = self.begin().await?;
        lock_booking(&mut tx, booking_id).await?;

        let (hotels, tours, transfers, flights, client_payments, supplier_payments): (
            i64,
            i64,
            i64,
            i64,
            i64,
            i64,
        ) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM booking_hotels WHERE booking_id = $1),
                (SELECT COUNT(*) FROM booking_tours WHERE booking_id = $1),
                (SELECT COUNT(*) FROM booking_transfers WHERE booking_id = $1),
                (SELECT COUNT(*) FROM booking_flights WHERE booking_id = $1),
                (SELECT COUNT(*) FROM client_payments WHERE booking_id = $1),
                (SELECT COUNT(*) FROM supplier_payments WHERE booking_id = $1)
            "#,
        )
        .bind(booking_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("count booking children"))?;

        let line_items = hotels + tours + transfers + flights;
        if line_items + client_payments + supplier_payments > 0 {
            return Err(AppError::ReferentialIntegrity(anyhow::anyhow!(
                "Booking still has {} line items, {} client payments and {} supplier payments",
                line_items,
                client_payments,
                supplier_payments
            )));
        }

        sqlx::query("DELETE FROM bookings WHERE booking_id = $1")
            .bind(booking_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                    AppError::ReferentialIntegrity(anyhow::anyhow!(
                        "Booking is still referenced by other records"
                    ))
                }
                _ => AppError::DatabaseError(anyhow::anyhow!("Failed to delete booking: {}", e)),
            })?;

        commit(tx).await?;

        timer.observe_duration();

        info!(booking_id = %booking_id, "Booking deleted");

        Ok(())
    }
}
