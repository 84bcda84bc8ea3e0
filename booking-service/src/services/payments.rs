//! Client payments (receivables settled) and supplier payments (payables).

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use service_core::error::AppError;
use sqlx::PgConnection;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::models::{
    round_money, settled_on, ClientPayment, ClientPaymentMutation, CreateClientPayment,
    CreateSupplierPayment, ListSupplierPaymentsFilter, SupplierPayment, UpdateSupplierPayment,
    DEFAULT_CURRENCY,
};
use crate::services::aggregator::recompute_booking_aggregates;
use crate::services::bookings::lock_booking;
use crate::services::database::{commit, db_error, Database};
use crate::services::ledger::within_money_range;
use crate::services::metrics::{CLIENT_PAYMENT_AMOUNT_TOTAL, DB_QUERY_DURATION};

const CLIENT_PAYMENT_COLUMNS: &str = "payment_id, booking_id, amount, currency, payment_date, \
    payment_method, reference_number, notes, created_utc";

const SUPPLIER_PAYMENT_COLUMNS: &str = "payment_id, booking_id, supplier_type, supplier_name, \
    service_id, amount, currency, status, due_date, payment_date, payment_method, \
    reference_number, notes, created_utc, updated_utc";

fn positive_amount(amount: Decimal) -> Result<Decimal, AppError> {
    let amount = round_money(amount);
    if amount <= Decimal::ZERO {
        return Err(AppError::validation("amount", "amount must be greater than zero"));
    }
    within_money_range("amount", amount)
}

pub(crate) async fn fetch_client_payments(
    conn: &mut PgConnection,
    booking_id: Option<Uuid>,
) -> Result<Vec<ClientPayment>, AppError> {
    sqlx::query_as::<_, ClientPayment>(&format!(
        r#"
        SELECT {}
        FROM client_payments
        WHERE ($1::uuid IS NULL OR booking_id = $1)
        ORDER BY payment_date DESC, created_utc DESC
        "#,
        CLIENT_PAYMENT_COLUMNS
    ))
    .bind(booking_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(db_error("list client payments"))
}

pub(crate) async fn fetch_supplier_payments(
    conn: &mut PgConnection,
    filter: &ListSupplierPaymentsFilter,
) -> Result<Vec<SupplierPayment>, AppError> {
    sqlx::query_as::<_, SupplierPayment>(&format!(
        r#"
        SELECT {}
        FROM supplier_payments
        WHERE ($1::uuid IS NULL OR booking_id = $1)
          AND ($2::text IS NULL OR status = $2)
        ORDER BY due_date ASC NULLS LAST, created_utc DESC
        "#,
        SUPPLIER_PAYMENT_COLUMNS
    ))
    .bind(filter.booking_id)
    .bind(filter.status.map(|s| s.as_str()))
    .fetch_all(&mut *conn)
    .await
    .map_err(db_error("list supplier payments"))
}

impl Database {
    /// Record money received from a client and refresh the booking totals.
    #[instrument(skip(self, input), fields(booking_id = %input.booking_id))]
    pub async fn create_client_payment(
        &self,
        input: &CreateClientPayment,
        today: NaiveDate,
    ) -> Result<ClientPaymentMutation, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_client_payment"])
            .start_timer();

        let amount = positive_amount(input.amount)?;
        let currency = input.currency.as_deref().unwrap_or(DEFAULT_CURRENCY);

        let mut tx = self.begin().await?;
        lock_booking(&mut tx, input.booking_id).await?;

        let payment = sqlx::query_as::<_, ClientPayment>(&format!(
            r#"
            INSERT INTO client_payments (
                payment_id, booking_id, amount, currency, payment_date, payment_method,
                reference_number, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            CLIENT_PAYMENT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(input.booking_id)
        .bind(amount)
        .bind(currency)
        .bind(input.payment_date.unwrap_or(today))
        .bind(&input.payment_method)
        .bind(&input.reference_number)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("create client payment"))?;

        let booking = recompute_booking_aggregates(&mut tx, input.booking_id, today).await?;
        commit(tx).await?;

        timer.observe_duration();

        CLIENT_PAYMENT_AMOUNT_TOTAL
            .with_label_values(&[currency])
            .inc_by(amount.to_f64().unwrap_or(0.0));

        info!(
            payment_id = %payment.payment_id,
            booking_id = %payment.booking_id,
            amount = %payment.amount,
            payment_status = booking.payment_status.as_str(),
            "Client payment recorded"
        );

        Ok(ClientPaymentMutation { payment, booking })
    }

    /// Remove a client payment and refresh the booking totals.
    #[instrument(skip(self), fields(payment_id = %payment_id))]
    pub async fn delete_client_payment(
        &self,
        payment_id: Uuid,
        today: NaiveDate,
    ) -> Result<ClientPaymentMutation, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_client_payment"])
            .start_timer();

        let not_found =
            || AppError::NotFound(anyhow::anyhow!("Client payment {} not found", payment_id));

        let mut tx = self.begin().await?;

        let booking_id: Uuid =
            sqlx::query_scalar("SELECT booking_id FROM client_payments WHERE payment_id = $1")
                .bind(payment_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error("find client payment"))?
                .ok_or_else(not_found)?;
        lock_booking(&mut tx, booking_id).await?;

        let payment = sqlx::query_as::<_, ClientPayment>(&format!(
            "DELETE FROM client_payments WHERE payment_id = $1 RETURNING {}",
            CLIENT_PAYMENT_COLUMNS
        ))
        .bind(payment_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("delete client payment"))?
        .ok_or_else(not_found)?;

        let booking = recompute_booking_aggregates(&mut tx, booking_id, today).await?;
        commit(tx).await?;

        timer.observe_duration();

        info!(
            payment_id = %payment_id,
            booking_id = %booking_id,
            "Client payment deleted"
        );

        Ok(ClientPaymentMutation { payment, booking })
    }

    #[instrument(skip(self))]
    pub async fn list_client_payments(
        &self,
        booking_id: Option<Uuid>,
    ) -> Result<Vec<ClientPayment>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_client_payments"])
            .start_timer();

        let mut conn = self
            .pool()
            .acquire()
            .await
            .map_err(db_error("acquire connection"))?;
        let payments = fetch_client_payments(&mut conn, booking_id).await?;

        timer.observe_duration();

        Ok(payments)
    }

    /// Record a payable to a supplier.
    #[instrument(skip(self, input), fields(booking_id = %input.booking_id))]
    pub async fn create_supplier_payment(
        &self,
        input: &CreateSupplierPayment,
        today: NaiveDate,
    ) -> Result<SupplierPayment, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_supplier_payment"])
            .start_timer();

        let amount = positive_amount(input.amount)?;

        let mut tx = self.begin().await?;
        lock_booking(&mut tx, input.booking_id).await?;

        let payment = sqlx::query_as::<_, SupplierPayment>(&format!(
            r#"
            INSERT INTO supplier_payments (
                payment_id, booking_id, supplier_type, supplier_name, service_id, amount,
                currency, status, due_date, payment_date, payment_method, reference_number,
                notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {}
            "#,
            SUPPLIER_PAYMENT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(input.booking_id)
        .bind(input.supplier_type.as_str())
        .bind(&input.supplier_name)
        .bind(input.service_id)
        .bind(amount)
        .bind(input.currency.as_deref().unwrap_or(DEFAULT_CURRENCY))
        .bind(input.status.as_str())
        .bind(input.due_date)
        .bind(settled_on(input.status, input.payment_date, None, today))
        .bind(&input.payment_method)
        .bind(&input.reference_number)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("create supplier payment"))?;

        commit(tx).await?;

        timer.observe_duration();

        info!(
            payment_id = %payment.payment_id,
            booking_id = %payment.booking_id,
            supplier_type = payment.supplier_type.as_str(),
            status = payment.status.as_str(),
            "Supplier payment recorded"
        );

        Ok(payment)
    }

    /// Edit a supplier payable, typically to mark it paid.
    #[instrument(skip(self, input), fields(payment_id = %payment_id))]
    pub async fn update_supplier_payment(
        &self,
        payment_id: Uuid,
        input: &UpdateSupplierPayment,
        today: NaiveDate,
    ) -> Result<SupplierPayment, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_supplier_payment"])
            .start_timer();

        let mut tx = self.begin().await?;

        let existing = sqlx::query_as::<_, SupplierPayment>(&format!(
            "SELECT {} FROM supplier_payments WHERE payment_id = $1 FOR UPDATE",
            SUPPLIER_PAYMENT_COLUMNS
        ))
        .bind(payment_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("lock supplier payment"))?
        .ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Supplier payment {} not found", payment_id))
        })?;

        let amount = positive_amount(input.amount.unwrap_or(existing.amount))?;
        let status = input.status.unwrap_or(existing.status);
        let payment_date = settled_on(status, input.payment_date, existing.payment_date, today);

        let payment = sqlx::query_as::<_, SupplierPayment>(&format!(
            r#"
            UPDATE supplier_payments
            SET supplier_name = $2,
                amount = $3,
                status = $4,
                due_date = $5,
                payment_date = $6,
                payment_method = $7,
                reference_number = $8,
                notes = $9,
                updated_utc = NOW()
            WHERE payment_id = $1
            RETURNING {}
            "#,
            SUPPLIER_PAYMENT_COLUMNS
        ))
        .bind(payment_id)
        .bind(input.supplier_name.as_ref().unwrap_or(&existing.supplier_name))
        .bind(amount)
        .bind(status.as_str())
        .bind(input.due_date.or(existing.due_date))
        .bind(payment_date)
        .bind(input.payment_method.as_ref().or(existing.payment_method.as_ref()))
        .bind(input.reference_number.as_ref().or(existing.reference_number.as_ref()))
        .bind(input.notes.as_ref().or(existing.notes.as_ref()))
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("update supplier payment"))?;

        commit(tx).await?;

        timer.observe_duration();

        if payment.status != existing.status {
            info!(
                payment_id = %payment_id,
                from = existing.status.as_str(),
                to = payment.status.as_str(),
                "Supplier payment status changed"
            );
        }

        Ok(payment)
    }

    #[instrument(skip(self))]
    pub async fn list_supplier_payments(
        &self,
        filter: &ListSupplierPaymentsFilter,
    ) -> Result<Vec<SupplierPayment>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_supplier_payments"])
            .start_timer();

        let mut conn = self
            .pool()
            .acquire()
            .await
            .map_err(db_error("acquire connection"))?;
        let payments = fetch_supplier_payments(&mut conn, filter).await?;

        timer.observe_duration();

        Ok(payments)
    }
}
