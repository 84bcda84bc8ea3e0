//! Hotel, tour, transfer and flight line items.
//!
//! Every write prices the line through the ledger before touching the
//! database, then locks the owning booking, writes the line and recomputes
//! the booking's aggregates in the same transaction.

use chrono::NaiveDate;
use service_core::error::AppError;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::QueryAs;
use sqlx::{FromRow, PgConnection, Postgres, Transaction};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    round_money, Booking, FlightLine, FlightLineInput, FlightLinePatch, HotelLine,
    HotelLineInput, HotelLinePatch, LineMutation, LineTerms, ServiceLine, ServiceType, TourLine,
    TourLineInput, TourLinePatch, TransferLine, TransferLineInput, TransferLinePatch,
};
use crate::services::aggregator::recompute_booking_aggregates;
use crate::services::bookings::lock_booking;
use crate::services::database::{commit, db_error, Database};
use crate::services::ledger::{self, PricedLine};
use crate::services::metrics::{DB_QUERY_DURATION, LINE_ITEM_MUTATIONS_TOTAL};
use crate::services::payment_status::PaymentPosition;

macro_rules! financial_columns {
    () => {
        "total_cost, sell_price, margin, currency, payment_status, paid_amount, \
         payment_due_date, voucher_issued, notes"
    };
}

const HOTEL_COLUMNS: &str = concat!(
    "line_id, booking_id, hotel_name, room_type, supplier_name, check_in, check_out, nights, \
     number_of_rooms, cost_per_night, ",
    financial_columns!(),
    ", created_utc, updated_utc"
);

const TOUR_COLUMNS: &str = concat!(
    "line_id, booking_id, tour_name, tour_date, operation_type, supplier_name, supplier_cost, \
     guide_cost, vehicle_cost, entrance_fees, other_costs, pax_count, ",
    financial_columns!(),
    ", created_utc, updated_utc"
);

const TRANSFER_COLUMNS: &str = concat!(
    "line_id, booking_id, pickup_location, dropoff_location, transfer_date, vehicle_type, \
     operation_type, supplier_name, cost_price, ",
    financial_columns!(),
    ", created_utc, updated_utc"
);

const FLIGHT_COLUMNS: &str = concat!(
    "line_id, booking_id, airline, flight_number, departure_city, arrival_city, \
     departure_date, pax_count, cost_price, ",
    financial_columns!(),
    ", created_utc, updated_utc"
);

const FINANCIAL_FIELDS: [&str; 9] = [
    "total_cost",
    "sell_price",
    "margin",
    "currency",
    "payment_status",
    "paid_amount",
    "payment_due_date",
    "voucher_issued",
    "notes",
];

/// `$start, $start+1, ...` for the financial columns of an INSERT.
fn financial_placeholders(start: usize) -> String {
    (start..start + FINANCIAL_FIELDS.len())
        .map(|i| format!("${}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `total_cost = $start, ...` for the financial columns of an UPDATE.
fn financial_assignments(start: usize) -> String {
    FINANCIAL_FIELDS
        .iter()
        .enumerate()
        .map(|(i, field)| format!("{} = ${}", field, start + i))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Bind the priced financial columns in [`FINANCIAL_FIELDS`] order.
fn bind_financials<'q, T>(
    query: QueryAs<'q, Postgres, T, PgArguments>,
    priced: &PricedLine,
    terms: &LineTerms,
) -> QueryAs<'q, Postgres, T, PgArguments> {
    query
        .bind(priced.total_cost)
        .bind(terms.sell_price)
        .bind(priced.margin)
        .bind(terms.currency.clone())
        .bind(priced.payment_status.as_str())
        .bind(terms.paid_amount)
        .bind(terms.payment_due_date)
        .bind(terms.voucher_issued)
        .bind(terms.notes.clone())
}

/// Every line on one booking, grouped by service.
#[derive(Debug, Clone, Default)]
pub(crate) struct BookingLines {
    pub hotels: Vec<HotelLine>,
    pub tours: Vec<TourLine>,
    pub transfers: Vec<TransferLine>,
    pub flights: Vec<FlightLine>,
}

impl BookingLines {
    /// Re-resolve each line's supplier payment status against `today`, so a
    /// stored `pending` past its due date reads as `overdue`.
    pub fn as_of(mut self, today: NaiveDate) -> Self {
        let financials = self
            .hotels
            .iter_mut()
            .map(|l| &mut l.financials)
            .chain(self.tours.iter_mut().map(|l| &mut l.financials))
            .chain(self.transfers.iter_mut().map(|l| &mut l.financials))
            .chain(self.flights.iter_mut().map(|l| &mut l.financials));

        for f in financials {
            f.payment_status = PaymentPosition::payable(f.total_cost, f.paid_amount, f.payment_due_date)
                .status(today);
        }
        self
    }

    pub fn into_service_lines(self) -> Vec<ServiceLine> {
        self.hotels
            .into_iter()
            .map(ServiceLine::Hotel)
            .chain(self.tours.into_iter().map(ServiceLine::Tour))
            .chain(self.transfers.into_iter().map(ServiceLine::Transfer))
            .chain(self.flights.into_iter().map(ServiceLine::Flight))
            .collect()
    }
}

async fn fetch_lines<T>(
    conn: &mut PgConnection,
    service_type: ServiceType,
    columns: &str,
    booking_id: Uuid,
) -> Result<Vec<T>, AppError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    sqlx::query_as::<_, T>(&format!(
        "SELECT {} FROM {} WHERE booking_id = $1 ORDER BY created_utc, line_id",
        columns,
        service_type.table()
    ))
    .bind(booking_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(db_error("fetch line items"))
}

/// Load every line item on a booking.
pub(crate) async fn fetch_booking_lines(
    conn: &mut PgConnection,
    booking_id: Uuid,
) -> Result<BookingLines, AppError> {
    Ok(BookingLines {
        hotels: fetch_lines(conn, ServiceType::Hotel, HOTEL_COLUMNS, booking_id).await?,
        tours: fetch_lines(conn, ServiceType::Tour, TOUR_COLUMNS, booking_id).await?,
        transfers: fetch_lines(conn, ServiceType::Transfer, TRANSFER_COLUMNS, booking_id).await?,
        flights: fetch_lines(conn, ServiceType::Flight, FLIGHT_COLUMNS, booking_id).await?,
    })
}

fn line_not_found(service_type: ServiceType, line_id: Uuid) -> AppError {
    AppError::NotFound(anyhow::anyhow!(
        "{} line {} not found",
        service_type.as_str(),
        line_id
    ))
}

/// The booking a line belongs to, read without locking.
async fn line_owner(
    conn: &mut PgConnection,
    service_type: ServiceType,
    line_id: Uuid,
) -> Result<Uuid, AppError> {
    sqlx::query_scalar::<_, Uuid>(&format!(
        "SELECT booking_id FROM {} WHERE line_id = $1",
        service_type.table()
    ))
    .bind(line_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(db_error("find line item"))?
    .ok_or_else(|| line_not_found(service_type, line_id))
}

impl Database {
    /// Open a transaction holding the owning booking's lock and then the
    /// line's. The line is re-read under the lock so edits see fresh state.
    async fn lock_line<T>(
        &self,
        service_type: ServiceType,
        columns: &str,
        line_id: Uuid,
    ) -> Result<(Transaction<'static, Postgres>, T), AppError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut tx = self.begin().await?;
        let booking_id = line_owner(&mut tx, service_type, line_id).await?;
        lock_booking(&mut tx, booking_id).await?;

        let line = sqlx::query_as::<_, T>(&format!(
            "SELECT {} FROM {} WHERE line_id = $1 FOR UPDATE",
            columns,
            service_type.table()
        ))
        .bind(line_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("lock line item"))?
        .ok_or_else(|| line_not_found(service_type, line_id))?;

        Ok((tx, line))
    }

    /// Recompute the booking, commit and record the mutation.
    async fn finish_line_mutation(
        &self,
        mut tx: Transaction<'static, Postgres>,
        service_type: ServiceType,
        operation: &'static str,
        line_id: Uuid,
        booking_id: Uuid,
        today: NaiveDate,
    ) -> Result<Booking, AppError> {
        let booking = recompute_booking_aggregates(&mut tx, booking_id, today).await?;
        commit(tx).await?;

        LINE_ITEM_MUTATIONS_TOTAL
            .with_label_values(&[service_type.as_str(), operation])
            .inc();

        info!(
            booking_id = %booking_id,
            line_id = %line_id,
            service_type = service_type.as_str(),
            operation = operation,
            total_sell_price = %booking.total_sell_price,
            "Line item written"
        );

        Ok(booking)
    }

    #[instrument(skip(self, input), fields(booking_id = %input.booking_id))]
    pub async fn create_hotel_line(
        &self,
        input: &HotelLineInput,
        today: NaiveDate,
    ) -> Result<LineMutation<HotelLine>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_hotel_line"])
            .start_timer();

        let terms = input.terms();
        let priced = ledger::price(&input.cost_inputs(), &terms, today)?;
        let nights = ledger::hotel_nights(input.check_in, input.check_out)?;

        let mut tx = self.begin().await?;
        lock_booking(&mut tx, input.booking_id).await?;

        let sql = format!(
            r#"
            INSERT INTO booking_hotels (
                line_id, booking_id, hotel_name, room_type, supplier_name, check_in,
                check_out, nights, number_of_rooms, cost_per_night, {}
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, {})
            RETURNING {}
            "#,
            financial_columns!(),
            financial_placeholders(11),
            HOTEL_COLUMNS
        );
        let query = sqlx::query_as::<_, HotelLine>(&sql)
            .bind(Uuid::new_v4())
            .bind(input.booking_id)
            .bind(&input.hotel_name)
            .bind(&input.room_type)
            .bind(&input.supplier_name)
            .bind(input.check_in)
            .bind(input.check_out)
            .bind(nights)
            .bind(input.number_of_rooms)
            .bind(round_money(input.cost_per_night));
        let line = bind_financials(query, &priced, &terms)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("create hotel line"))?;

        let booking = self
            .finish_line_mutation(
                tx,
                ServiceType::Hotel,
                "create",
                line.line_id,
                line.booking_id,
                today,
            )
            .await?;

        timer.observe_duration();

        Ok(LineMutation { line, booking })
    }

    #[instrument(skip(self, patch), fields(line_id = %line_id))]
    pub async fn update_hotel_line(
        &self,
        line_id: Uuid,
        patch: &HotelLinePatch,
        today: NaiveDate,
    ) -> Result<LineMutation<HotelLine>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_hotel_line"])
            .start_timer();

        let (mut tx, existing) = self
            .lock_line::<HotelLine>(ServiceType::Hotel, HOTEL_COLUMNS, line_id)
            .await?;

        let input = patch.apply(&existing);
        input.validate()?;
        let terms = input.terms();
        let priced = ledger::price(&input.cost_inputs(), &terms, today)?;
        let nights = ledger::hotel_nights(input.check_in, input.check_out)?;

        let sql = format!(
            r#"
            UPDATE booking_hotels
            SET hotel_name = $2,
                room_type = $3,
                supplier_name = $4,
                check_in = $5,
                check_out = $6,
                nights = $7,
                number_of_rooms = $8,
                cost_per_night = $9,
                {},
                updated_utc = NOW()
            WHERE line_id = $1
            RETURNING {}
            "#,
            financial_assignments(10),
            HOTEL_COLUMNS
        );
        let query = sqlx::query_as::<_, HotelLine>(&sql)
            .bind(line_id)
            .bind(&input.hotel_name)
            .bind(&input.room_type)
            .bind(&input.supplier_name)
            .bind(input.check_in)
            .bind(input.check_out)
            .bind(nights)
            .bind(input.number_of_rooms)
            .bind(round_money(input.cost_per_night));
        let line = bind_financials(query, &priced, &terms)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("update hotel line"))?;

        let booking = self
            .finish_line_mutation(
                tx,
                ServiceType::Hotel,
                "update",
                line_id,
                line.booking_id,
                today,
            )
            .await?;

        timer.observe_duration();

        Ok(LineMutation { line, booking })
    }

    #[instrument(skip(self, input), fields(booking_id = %input.booking_id))]
    pub async fn create_tour_line(
        &self,
        input: &TourLineInput,
        today: NaiveDate,
    ) -> Result<LineMutation<TourLine>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_tour_line"])
            .start_timer();

        let terms = input.terms();
        let priced = ledger::price(&input.cost_inputs(), &terms, today)?;

        let mut tx = self.begin().await?;
        lock_booking(&mut tx, input.booking_id).await?;

        let sql = format!(
            r#"
            INSERT INTO booking_tours (
                line_id, booking_id, tour_name, tour_date, operation_type, supplier_name,
                supplier_cost, guide_cost, vehicle_cost, entrance_fees, other_costs,
                pax_count, {}
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, {})
            RETURNING {}
            "#,
            financial_columns!(),
            financial_placeholders(13),
            TOUR_COLUMNS
        );
        let query = sqlx::query_as::<_, TourLine>(&sql)
            .bind(Uuid::new_v4())
            .bind(input.booking_id)
            .bind(&input.tour_name)
            .bind(input.tour_date)
            .bind(input.operation_type.as_str())
            .bind(&input.supplier_name)
            .bind(input.supplier_cost.map(round_money))
            .bind(input.guide_cost.map(round_money))
            .bind(input.vehicle_cost.map(round_money))
            .bind(input.entrance_fees.map(round_money))
            .bind(input.other_costs.map(round_money))
            .bind(input.pax_count);
        let line = bind_financials(query, &priced, &terms)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("create tour line"))?;

        let booking = self
            .finish_line_mutation(
                tx,
                ServiceType::Tour,
                "create",
                line.line_id,
                line.booking_id,
                today,
            )
            .await?;

        timer.observe_duration();

        Ok(LineMutation { line, booking })
    }

    #[instrument(skip(self, patch), fields(line_id = %line_id))]
    pub async fn update_tour_line(
        &self,
        line_id: Uuid,
        patch: &TourLinePatch,
        today: NaiveDate,
    ) -> Result<LineMutation<TourLine>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_tour_line"])
            .start_timer();

        let (mut tx, existing) = self
            .lock_line::<TourLine>(ServiceType::Tour, TOUR_COLUMNS, line_id)
            .await?;

        let input = patch.apply(&existing);
        input.validate()?;
        let terms = input.terms();
        let priced = ledger::price(&input.cost_inputs(), &terms, today)?;

        let sql = format!(
            r#"
            UPDATE booking_tours
            SET tour_name = $2,
                tour_date = $3,
                operation_type = $4,
                supplier_name = $5,
                supplier_cost = $6,
                guide_cost = $7,
                vehicle_cost = $8,
                entrance_fees = $9,
                other_costs = $10,
                pax_count = $11,
                {},
                updated_utc = NOW()
            WHERE line_id = $1
            RETURNING {}
            "#,
            financial_assignments(12),
            TOUR_COLUMNS
        );
        let query = sqlx::query_as::<_, TourLine>(&sql)
            .bind(line_id)
            .bind(&input.tour_name)
            .bind(input.tour_date)
            .bind(input.operation_type.as_str())
            .bind(&input.supplier_name)
            .bind(input.supplier_cost.map(round_money))
            .bind(input.guide_cost.map(round_money))
            .bind(input.vehicle_cost.map(round_money))
            .bind(input.entrance_fees.map(round_money))
            .bind(input.other_costs.map(round_money))
            .bind(input.pax_count);
        let line = bind_financials(query, &priced, &terms)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("update tour line"))?;

        let booking = self
            .finish_line_mutation(
                tx,
                ServiceType::Tour,
                "update",
                line_id,
                line.booking_id,
                today,
            )
            .await?;

        timer.observe_duration();

        Ok(LineMutation { line, booking })
    }

    #[instrument(skip(self, input), fields(booking_id = %input.booking_id))]
    pub async fn create_transfer_line(
        &self,
        input: &TransferLineInput,
        today: NaiveDate,
    ) -> Result<LineMutation<TransferLine>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_transfer_line"])
            .start_timer();

        let terms = input.terms();
        let priced = ledger::price(&input.cost_inputs(), &terms, today)?;

        let mut tx = self.begin().await?;
        lock_booking(&mut tx, input.booking_id).await?;

        let sql = format!(
            r#"
            INSERT INTO booking_transfers (
                line_id, booking_id, pickup_location, dropoff_location, transfer_date,
                vehicle_type, operation_type, supplier_name, cost_price, {}
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, {})
            RETURNING {}
            "#,
            financial_columns!(),
            financial_placeholders(10),
            TRANSFER_COLUMNS
        );
        let query = sqlx::query_as::<_, TransferLine>(&sql)
            .bind(Uuid::new_v4())
            .bind(input.booking_id)
            .bind(&input.pickup_location)
            .bind(&input.dropoff_location)
            .bind(input.transfer_date)
            .bind(&input.vehicle_type)
            .bind(input.operation_type.as_str())
            .bind(&input.supplier_name)
            .bind(round_money(input.cost_price));
        let line = bind_financials(query, &priced, &terms)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("create transfer line"))?;

        let booking = self
            .finish_line_mutation(
                tx,
                ServiceType::Transfer,
                "create",
                line.line_id,
                line.booking_id,
                today,
            )
            .await?;

        timer.observe_duration();

        Ok(LineMutation { line, booking })
    }

    #[instrument(skip(self, patch), fields(line_id = %line_id))]
    pub async fn update_transfer_line(
        &self,
        line_id: Uuid,
        patch: &TransferLinePatch,
        today: NaiveDate,
    ) -> Result<LineMutation<TransferLine>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_transfer_line"])
            .start_timer();

        let (mut tx, existing) = self
            .lock_line::<TransferLine>(ServiceType::Transfer, TRANSFER_COLUMNS, line_id)
            .await?;

        let input = patch.apply(&existing);
        input.validate()?;
        let terms = input.terms();
        let priced = ledger::price(&input.cost_inputs(), &terms, today)?;

        let sql = format!(
            r#"
            UPDATE booking_transfers
            SET pickup_location = $2,
                dropoff_location = $3,
                transfer_date = $4,
                vehicle_type = $5,
                operation_type = $6,
                supplier_name = $7,
                cost_price = $8,
                {},
                updated_utc = NOW()
            WHERE line_id = $1
            RETURNING {}
            "#,
            financial_assignments(9),
            TRANSFER_COLUMNS
        );
        let query = sqlx::query_as::<_, TransferLine>(&sql)
            .bind(line_id)
            .bind(&input.pickup_location)
            .bind(&input.dropoff_location)
            .bind(input.transfer_date)
            .bind(&input.vehicle_type)
            .bind(input.operation_type.as_str())
            .bind(&input.supplier_name)
            .bind(round_money(input.cost_price));
        let line = bind_financials(query, &priced, &terms)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("update transfer line"))?;

        let booking = self
            .finish_line_mutation(
                tx,
                ServiceType::Transfer,
                "update",
                line_id,
                line.booking_id,
                today,
            )
            .await?;

        timer.observe_duration();

        Ok(LineMutation { line, booking })
    }

    #[instrument(skip(self, input), fields(booking_id = %input.booking_id))]
    pub async fn create_flight_line(
        &self,
        input: &FlightLineInput,
        today: NaiveDate,
    ) -> Result<LineMutation<FlightLine>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_flight_line"])
            .start_timer();

        let terms = input.terms();
        let priced = ledger::price(&input.cost_inputs(), &terms, today)?;

        let mut tx = self.begin().await?;
        lock_booking(&mut tx, input.booking_id).await?;

        let sql = format!(
            r#"
            INSERT INTO booking_flights (
                line_id, booking_id, airline, flight_number, departure_city, arrival_city,
                departure_date, pax_count, cost_price, {}
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, {})
            RETURNING {}
            "#,
            financial_columns!(),
            financial_placeholders(10),
            FLIGHT_COLUMNS
        );
        let query = sqlx::query_as::<_, FlightLine>(&sql)
            .bind(Uuid::new_v4())
            .bind(input.booking_id)
            .bind(&input.airline)
            .bind(&input.flight_number)
            .bind(&input.departure_city)
            .bind(&input.arrival_city)
            .bind(input.departure_date)
            .bind(input.pax_count)
            .bind(round_money(input.cost_price));
        let line = bind_financials(query, &priced, &terms)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("create flight line"))?;

        let booking = self
            .finish_line_mutation(
                tx,
                ServiceType::Flight,
                "create",
                line.line_id,
                line.booking_id,
                today,
            )
            .await?;

        timer.observe_duration();

        Ok(LineMutation { line, booking })
    }

    #[instrument(skip(self, patch), fields(line_id = %line_id))]
    pub async fn update_flight_line(
        &self,
        line_id: Uuid,
        patch: &FlightLinePatch,
        today: NaiveDate,
    ) -> Result<LineMutation<FlightLine>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_flight_line"])
            .start_timer();

        let (mut tx, existing) = self
            .lock_line::<FlightLine>(ServiceType::Flight, FLIGHT_COLUMNS, line_id)
            .await?;

        let input = patch.apply(&existing);
        input.validate()?;
        let terms = input.terms();
        let priced = ledger::price(&input.cost_inputs(), &terms, today)?;

        let sql = format!(
            r#"
            UPDATE booking_flights
            SET airline = $2,
                flight_number = $3,
                departure_city = $4,
                arrival_city = $5,
                departure_date = $6,
                pax_count = $7,
                cost_price = $8,
                {},
                updated_utc = NOW()
            WHERE line_id = $1
            RETURNING {}
            "#,
            financial_assignments(9),
            FLIGHT_COLUMNS
        );
        let query = sqlx::query_as::<_, FlightLine>(&sql)
            .bind(line_id)
            .bind(&input.airline)
            .bind(&input.flight_number)
            .bind(&input.departure_city)
            .bind(&input.arrival_city)
            .bind(input.departure_date)
            .bind(input.pax_count)
            .bind(round_money(input.cost_price));
        let line = bind_financials(query, &priced, &terms)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("update flight line"))?;

        let booking = self
            .finish_line_mutation(
                tx,
                ServiceType::Flight,
                "update",
                line_id,
                line.booking_id,
                today,
            )
            .await?;

        timer.observe_duration();

        Ok(LineMutation { line, booking })
    }

    /// Delete a line of any type and return the recomputed booking.
    #[instrument(skip(self), fields(service_type = service_type.as_str(), line_id = %line_id))]
    pub async fn delete_line(
        &self,
        service_type: ServiceType,
        line_id: Uuid,
        today: NaiveDate,
    ) -> Result<Booking, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_line"])
            .start_timer();

        let mut tx = self.begin().await?;
        let booking_id = line_owner(&mut tx, service_type, line_id).await?;
        lock_booking(&mut tx, booking_id).await?;

        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE line_id = $1",
            service_type.table()
        ))
        .bind(line_id)
        .execute(&mut *tx)
        .await
        .map_err(db_error("delete line item"))?;

        if result.rows_affected() == 0 {
            return Err(line_not_found(service_type, line_id));
        }

        let booking = self
            .finish_line_mutation(tx, service_type, "delete", line_id, booking_id, today)
            .await?;

        timer.observe_duration();

        Ok(booking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LineFinancials, OperationType, PaymentStatus};
    use chrono::Utc;
    use rust_decimal::Decimal;

    #[test]
    fn placeholders_follow_the_fixed_columns() {
        assert_eq!(
            financial_placeholders(11),
            "$11, $12, $13, $14, $15, $16, $17, $18, $19"
        );
    }

    #[test]
    fn assignments_cover_every_financial_column() {
        let assignments = financial_assignments(9);
        assert!(assignments.starts_with("total_cost = $9, sell_price = $10"));
        assert!(assignments.ends_with("notes = $17"));
        assert_eq!(assignments.matches('=').count(), FINANCIAL_FIELDS.len());
    }

    #[test]
    fn column_lists_end_with_the_shared_projection() {
        for columns in [HOTEL_COLUMNS, TOUR_COLUMNS, TRANSFER_COLUMNS, FLIGHT_COLUMNS] {
            assert!(columns.starts_with("line_id, booking_id, "));
            assert!(columns.contains(financial_columns!()));
            assert!(columns.ends_with("created_utc, updated_utc"));
        }
        assert_eq!(
            financial_columns!().split(", ").collect::<Vec<_>>(),
            FINANCIAL_FIELDS.to_vec()
        );
    }

    fn transfer(due: Option<NaiveDate>, paid: &str, stored: PaymentStatus) -> TransferLine {
        TransferLine {
            line_id: Uuid::new_v4(),
            booking_id: Uuid::new_v4(),
            pickup_location: "Airport".to_string(),
            dropoff_location: "Hotel".to_string(),
            transfer_date: None,
            vehicle_type: None,
            operation_type: OperationType::Supplier,
            supplier_name: None,
            cost_price: Decimal::from(100),
            financials: LineFinancials {
                total_cost: Decimal::from(100),
                sell_price: Decimal::from(150),
                margin: Decimal::from(50),
                currency: "USD".to_string(),
                payment_status: stored,
                paid_amount: paid.parse().unwrap(),
                payment_due_date: due,
                voucher_issued: false,
                notes: None,
            },
            created_utc: Utc::now(),
            updated_utc: Utc::now(),
        }
    }

    #[test]
    fn grouped_lines_flatten_in_service_order() {
        assert!(BookingLines::default().into_service_lines().is_empty());
    }

    #[test]
    fn stored_status_is_re_resolved_for_the_read_date() {
        let due = NaiveDate::from_ymd_opt(2025, 11, 1).unwrap();
        let lines = BookingLines {
            transfers: vec![
                transfer(Some(due), "0", PaymentStatus::Pending),
                transfer(Some(due), "100", PaymentStatus::Pending),
                transfer(None, "0", PaymentStatus::Pending),
            ],
            ..Default::default()
        };

        let before_due = lines.clone().as_of(NaiveDate::from_ymd_opt(2025, 10, 20).unwrap());
        assert_eq!(before_due.transfers[0].financials.payment_status, PaymentStatus::Pending);

        let after_due = lines.as_of(NaiveDate::from_ymd_opt(2025, 11, 10).unwrap());
        let statuses: Vec<_> = after_due
            .transfers
            .iter()
            .map(|l| l.financials.payment_status)
            .collect();
        assert_eq!(
            statuses,
            vec![PaymentStatus::Overdue, PaymentStatus::Paid, PaymentStatus::Pending]
        );
    }
}
