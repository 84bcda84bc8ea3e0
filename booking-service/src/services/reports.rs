//! Read-only financial reports.
//!
//! Reports read the booking totals maintained by the aggregator and never
//! re-derive them; they take no locks. Payment statuses that depend on the
//! date are resolved against the caller's `today`.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use service_core::error::AppError;
use sqlx::FromRow;
use std::collections::{BTreeMap, HashMap};
use tracing::instrument;
use uuid::Uuid;

use crate::models::{
    Booking, BookingProfitability, CashFlowMonth, CashFlowReport, CategoryTotal, ClientSales,
    DashboardStats, LineProfitability, ListSupplierPaymentsFilter, MonthTotal, MonthlyPnl,
    OutstandingBooking, OutstandingLine, OutstandingReport, OutstandingSupplierPayment,
    SalesReport, ServiceCost, ServiceSales, ServiceType, SupplierPayment, SupplierPaymentStatus,
    SupplierPaymentSummary, SupplierPaymentTotals, SupplierType, SupplierTypeSummary,
    UpcomingDeparture,
};
use crate::services::bookings::BOOKING_COLUMNS;
use crate::services::database::{db_error, Database};
use crate::services::line_items::fetch_booking_lines;
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::payment_status::{PaymentPosition, PAYMENT_EPSILON};
use crate::services::payments::fetch_supplier_payments;

/// Days ahead covered by the dashboard's upcoming departures.
const UPCOMING_DAYS: i64 = 7;

/// Profit as a percentage of sell price, to two places. Zero when nothing
/// was sold.
pub fn margin_pct(profit: Decimal, sell: Decimal) -> Decimal {
    if sell.is_zero() {
        return Decimal::ZERO;
    }
    (profit / sell * Decimal::ONE_HUNDRED).round_dp(2)
}

/// First day of the month and first day of the following month.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), AppError> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };

    NaiveDate::from_ymd_opt(year, month, 1)
        .zip(NaiveDate::from_ymd_opt(next_year, next_month, 1))
        .ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!("Invalid month {:04}-{:02}", year, month))
        })
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// `YYYY-MM` keys for every calendar month touched by `[from, to]`.
pub fn month_keys(from: NaiveDate, to: NaiveDate) -> Vec<String> {
    let mut keys = Vec::new();
    let (mut year, mut month) = (from.year(), from.month());

    while (year, month) <= (to.year(), to.month()) {
        keys.push(format!("{:04}-{:02}", year, month));
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }

    keys
}

/// Lay monthly sums onto every month of the range, with a running balance.
pub fn build_cash_flow(
    from_date: NaiveDate,
    to_date: NaiveDate,
    inflow: &[MonthTotal],
    supplier_outflow: &[MonthTotal],
    expense_outflow: &[MonthTotal],
) -> CashFlowReport {
    let index = |totals: &[MonthTotal]| -> HashMap<String, Decimal> {
        totals
            .iter()
            .map(|t| (t.month.clone(), t.total))
            .collect()
    };
    let (inflow, supplier_outflow, expense_outflow) =
        (index(inflow), index(supplier_outflow), index(expense_outflow));
    let get = |map: &HashMap<String, Decimal>, key: &str| map.get(key).copied().unwrap_or_default();

    let mut running_balance = Decimal::ZERO;
    let mut total_inflow = Decimal::ZERO;
    let mut total_outflow = Decimal::ZERO;

    let months = month_keys(from_date, to_date)
        .into_iter()
        .map(|month| {
            let inflow = get(&inflow, &month);
            let supplier = get(&supplier_outflow, &month);
            let expenses = get(&expense_outflow, &month);
            let outflow = supplier + expenses;
            let net = inflow - outflow;

            running_balance += net;
            total_inflow += inflow;
            total_outflow += outflow;

            CashFlowMonth {
                month,
                inflow,
                supplier_outflow: supplier,
                expense_outflow: expenses,
                outflow,
                net,
                running_balance,
            }
        })
        .collect();

    CashFlowReport {
        from_date,
        to_date,
        months,
        total_inflow,
        total_outflow,
        net: total_inflow - total_outflow,
    }
}

/// A booking the client still owes money on.
pub fn outstanding_receivable(booking: &Booking, today: NaiveDate) -> Option<OutstandingBooking> {
    let position = PaymentPosition::receivable(booking.total_sell_price, booking.amount_received);
    let payment_status = position.status(today);
    let outstanding = position.outstanding();

    (payment_status.is_outstanding() && outstanding >= PAYMENT_EPSILON).then(|| {
        OutstandingBooking {
            booking_id: booking.booking_id,
            booking_code: booking.booking_code.clone(),
            client_name: booking.client_name.clone(),
            travel_date_from: booking.travel_date_from,
            total_sell_price: booking.total_sell_price,
            amount_received: booking.amount_received,
            outstanding,
            payment_status,
        }
    })
}

/// Supplier side of one line item, as read for the outstanding report.
#[derive(Debug, Clone, FromRow)]
pub struct LinePayable {
    pub line_id: Uuid,
    pub booking_id: Uuid,
    pub booking_code: String,
    #[sqlx(try_from = "String")]
    pub service_type: ServiceType,
    pub description: String,
    pub total_cost: Decimal,
    pub paid_amount: Decimal,
    pub payment_due_date: Option<NaiveDate>,
}

/// A line item whose supplier has not been paid in full.
pub fn outstanding_line(line: LinePayable, today: NaiveDate) -> Option<OutstandingLine> {
    let position =
        PaymentPosition::payable(line.total_cost, line.paid_amount, line.payment_due_date);
    let payment_status = position.status(today);
    let outstanding = position.outstanding();

    (payment_status.is_outstanding() && outstanding >= PAYMENT_EPSILON).then(|| OutstandingLine {
        line_id: line.line_id,
        booking_id: line.booking_id,
        booking_code: line.booking_code,
        service_type: line.service_type,
        description: line.description,
        total_cost: line.total_cost,
        paid_amount: line.paid_amount,
        outstanding,
        payment_due_date: line.payment_due_date,
        payment_status,
    })
}

/// A supplier payment that is still pending, possibly overdue.
pub fn outstanding_supplier_payment(
    payment: &SupplierPayment,
    today: NaiveDate,
) -> Option<OutstandingSupplierPayment> {
    let position =
        PaymentPosition::payable(payment.amount, payment.paid_amount(), payment.due_date);
    let payment_status = position.status(today);

    payment_status
        .is_outstanding()
        .then(|| OutstandingSupplierPayment {
            payment_id: payment.payment_id,
            booking_id: payment.booking_id,
            supplier_type: payment.supplier_type,
            supplier_name: payment.supplier_name.clone(),
            amount: position.outstanding(),
            currency: payment.currency.clone(),
            due_date: payment.due_date,
            payment_status,
        })
}

/// Pending, paid and overdue totals overall and per supplier type.
pub fn summarize_supplier_payments(
    today: NaiveDate,
    payments: &[SupplierPayment],
) -> SupplierPaymentSummary {
    let mut by_type: BTreeMap<SupplierType, SupplierPaymentTotals> = BTreeMap::new();
    let mut totals = SupplierPaymentTotals::default();

    for payment in payments {
        let overdue = payment.status == SupplierPaymentStatus::Pending
            && matches!(payment.due_date, Some(due) if due < today);

        for bucket in [&mut totals, by_type.entry(payment.supplier_type).or_default()] {
            match payment.status {
                SupplierPaymentStatus::Pending => {
                    bucket.pending_count += 1;
                    bucket.pending_amount += payment.amount;
                }
                SupplierPaymentStatus::Paid => {
                    bucket.paid_count += 1;
                    bucket.paid_amount += payment.amount;
                }
            }
            if overdue {
                bucket.overdue_count += 1;
                bucket.overdue_amount += payment.amount;
            }
        }
    }

    SupplierPaymentSummary {
        as_of: today,
        by_supplier_type: by_type
            .into_iter()
            .map(|(supplier_type, totals)| SupplierTypeSummary {
                supplier_type,
                totals,
            })
            .collect(),
        totals,
    }
}

/// `SELECT '<type>' AS service_type, <columns> FROM <table>` for every
/// service, joined with `UNION ALL`.
fn all_service_lines(columns: &str) -> String {
    ServiceType::ALL
        .iter()
        .map(|service_type| {
            format!(
                "SELECT '{}' AS service_type, {} FROM {}",
                service_type.as_str(),
                columns,
                service_type.table()
            )
        })
        .collect::<Vec<_>>()
        .join(" UNION ALL ")
}

const OUTSTANDING_LINES_SQL: &str = r#"
    SELECT l.line_id, l.booking_id, b.booking_code, l.service_type, l.description,
           l.total_cost, l.paid_amount, l.payment_due_date
    FROM (
        SELECT 'hotel' AS service_type, line_id, booking_id, hotel_name AS description,
               total_cost, paid_amount, payment_due_date
        FROM booking_hotels
        UNION ALL
        SELECT 'tour', line_id, booking_id, tour_name,
               total_cost, paid_amount, payment_due_date
        FROM booking_tours
        UNION ALL
        SELECT 'transfer', line_id, booking_id, pickup_location || ' to ' || dropoff_location,
               total_cost, paid_amount, payment_due_date
        FROM booking_transfers
        UNION ALL
        SELECT 'flight', line_id, booking_id, airline || COALESCE(' ' || flight_number, ''),
               total_cost, paid_amount, payment_due_date
        FROM booking_flights
    ) l
    JOIN bookings b ON b.booking_id = l.booking_id
    WHERE b.status <> 'cancelled'
      AND l.total_cost - l.paid_amount >= 0.01
    ORDER BY l.payment_due_date ASC NULLS LAST, b.code_number, l.line_id
"#;

impl Database {
    #[instrument(skip(self))]
    pub async fn dashboard_stats(&self, today: NaiveDate) -> Result<DashboardStats, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["dashboard_stats"])
            .start_timer();

        let (month_start, next_month) = month_bounds(today.year(), today.month())?;

        let totals: (i64, i64, Decimal, Decimal, Decimal) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status IN ('inquiry', 'quoted')),
                COUNT(*) FILTER (
                    WHERE status <> 'cancelled' AND confirmed_at >= $1 AND confirmed_at < $2
                ),
                COALESCE(SUM(total_sell_price) FILTER (
                    WHERE status <> 'cancelled' AND confirmed_at >= $1 AND confirmed_at < $2
                ), 0),
                COALESCE(SUM(gross_profit) FILTER (
                    WHERE status <> 'cancelled' AND confirmed_at >= $1 AND confirmed_at < $2
                ), 0),
                COALESCE(SUM(GREATEST(total_sell_price - amount_received, 0)) FILTER (
                    WHERE status <> 'cancelled'
                ), 0)
            FROM bookings
            "#,
        )
        .bind(start_of_day(month_start))
        .bind(start_of_day(next_month))
        .fetch_one(self.pool())
        .await
        .map_err(db_error("read dashboard totals"))?;
        let (
            open_inquiries,
            confirmed_this_month,
            revenue_this_month,
            gross_profit_this_month,
            outstanding_receivables,
        ) = totals;

        let outstanding_payables: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM supplier_payments WHERE status = 'pending'",
        )
        .fetch_one(self.pool())
        .await
        .map_err(db_error("read outstanding payables"))?;

        let upcoming_departures = sqlx::query_as::<_, UpcomingDeparture>(
            r#"
            SELECT booking_id, booking_code, client_name, travel_date_from, pax_count, status
            FROM bookings
            WHERE status <> 'cancelled'
              AND travel_date_from BETWEEN $1 AND $2
            ORDER BY travel_date_from, code_number
            "#,
        )
        .bind(today)
        .bind(today + Duration::days(UPCOMING_DAYS))
        .fetch_all(self.pool())
        .await
        .map_err(db_error("read upcoming departures"))?;

        timer.observe_duration();

        Ok(DashboardStats {
            as_of: today,
            open_inquiries,
            confirmed_this_month,
            revenue_this_month,
            gross_profit_this_month,
            outstanding_receivables,
            outstanding_payables,
            upcoming_departures,
        })
    }

    /// Profit and loss for one calendar month.
    #[instrument(skip(self))]
    pub async fn monthly_pnl(&self, year: i32, month: u32) -> Result<MonthlyPnl, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["monthly_pnl"])
            .start_timer();

        let (period_start, next_month) = month_bounds(year, month)?;

        let period = r#"
            SELECT booking_id, total_sell_price, total_cost_price
            FROM bookings
            WHERE status <> 'cancelled'
              AND ((travel_date_from >= $1 AND travel_date_from < $2)
                   OR (confirmed_at >= $3 AND confirmed_at < $4))
        "#;

        let (booking_count, revenue, cost_of_sales): (i64, Decimal, Decimal) =
            sqlx::query_as(&format!(
                r#"
                WITH period AS ({})
                SELECT COUNT(*),
                       COALESCE(SUM(total_sell_price), 0),
                       COALESCE(SUM(total_cost_price), 0)
                FROM period
                "#,
                period
            ))
            .bind(period_start)
            .bind(next_month)
            .bind(start_of_day(period_start))
            .bind(start_of_day(next_month))
            .fetch_one(self.pool())
            .await
            .map_err(db_error("read monthly revenue"))?;

        let cost_by_service = sqlx::query_as::<_, ServiceCost>(&format!(
            r#"
            WITH period AS ({}),
                 lines AS ({})
            SELECT l.service_type,
                   COUNT(*) AS line_count,
                   COALESCE(SUM(l.sell_price), 0) AS revenue,
                   COALESCE(SUM(l.total_cost), 0) AS cost
            FROM lines l
            JOIN period p ON p.booking_id = l.booking_id
            GROUP BY l.service_type
            ORDER BY l.service_type
            "#,
            period,
            all_service_lines("booking_id, sell_price, total_cost")
        ))
        .bind(period_start)
        .bind(next_month)
        .bind(start_of_day(period_start))
        .bind(start_of_day(next_month))
        .fetch_all(self.pool())
        .await
        .map_err(db_error("read monthly cost by service"))?;

        let expenses_by_category = sqlx::query_as::<_, CategoryTotal>(
            r#"
            SELECT category, SUM(amount) AS total
            FROM operational_expenses
            WHERE expense_date >= $1 AND expense_date < $2
            GROUP BY category
            ORDER BY total DESC, category
            "#,
        )
        .bind(period_start)
        .bind(next_month)
        .fetch_all(self.pool())
        .await
        .map_err(db_error("read monthly expenses"))?;

        timer.observe_duration();

        let operating_expenses: Decimal = expenses_by_category.iter().map(|c| c.total).sum();
        let gross_profit = revenue - cost_of_sales;

        Ok(MonthlyPnl {
            month: format!("{:04}-{:02}", year, month),
            period_start,
            period_end: next_month - Duration::days(1),
            booking_count,
            revenue,
            cost_of_sales,
            gross_profit,
            gross_margin_pct: margin_pct(gross_profit, revenue),
            operating_expenses,
            net_profit: gross_profit - operating_expenses,
            cost_by_service,
            expenses_by_category,
        })
    }

    #[instrument(skip(self))]
    pub async fn cash_flow(
        &self,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> Result<CashFlowReport, AppError> {
        if to_date < from_date {
            return Err(AppError::validation(
                "to_date",
                "to_date must not be before from_date",
            ));
        }

        let timer = DB_QUERY_DURATION
            .with_label_values(&["cash_flow"])
            .start_timer();

        let monthly = |sql: &'static str, context: &'static str| async move {
            sqlx::query_as::<_, MonthTotal>(sql)
                .bind(from_date)
                .bind(to_date)
                .fetch_all(self.pool())
                .await
                .map_err(db_error(context))
        };

        let inflow = monthly(
            r#"
            SELECT to_char(payment_date, 'YYYY-MM') AS month, SUM(amount) AS total
            FROM client_payments
            WHERE payment_date BETWEEN $1 AND $2
            GROUP BY 1
            "#,
            "read client inflow",
        )
        .await?;

        let supplier_outflow = monthly(
            r#"
            SELECT to_char(payment_date, 'YYYY-MM') AS month, SUM(amount) AS total
            FROM supplier_payments
            WHERE status = 'paid' AND payment_date BETWEEN $1 AND $2
            GROUP BY 1
            "#,
            "read supplier outflow",
        )
        .await?;

        let expense_outflow = monthly(
            r#"
            SELECT to_char(expense_date, 'YYYY-MM') AS month, SUM(amount) AS total
            FROM operational_expenses
            WHERE expense_date BETWEEN $1 AND $2
            GROUP BY 1
            "#,
            "read expense outflow",
        )
        .await?;

        timer.observe_duration();

        Ok(build_cash_flow(
            from_date,
            to_date,
            &inflow,
            &supplier_outflow,
            &expense_outflow,
        ))
    }

    #[instrument(skip(self), fields(booking_id = %booking_id))]
    pub async fn booking_profitability(
        &self,
        booking_id: Uuid,
    ) -> Result<BookingProfitability, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["booking_profitability"])
            .start_timer();

        let mut conn = self
            .pool()
            .acquire()
            .await
            .map_err(db_error("acquire connection"))?;

        let booking = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {} FROM bookings WHERE booking_id = $1",
            BOOKING_COLUMNS
        ))
        .bind(booking_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_error("get booking"))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Booking {} not found", booking_id)))?;

        let lines = fetch_booking_lines(&mut conn, booking_id)
            .await?
            .into_service_lines()
            .into_iter()
            .map(|line| {
                let f = line.financials();
                LineProfitability {
                    line_id: line.line_id(),
                    service_type: line.service_type(),
                    description: line.description(),
                    sell_price: f.sell_price,
                    total_cost: f.total_cost,
                    margin: f.margin,
                    margin_pct: margin_pct(f.margin, f.sell_price),
                }
            })
            .collect();

        timer.observe_duration();

        Ok(BookingProfitability {
            booking_id: booking.booking_id,
            booking_code: booking.booking_code,
            client_name: booking.client_name,
            status: booking.status,
            total_sell_price: booking.total_sell_price,
            total_cost_price: booking.total_cost_price,
            gross_profit: booking.gross_profit,
            margin_pct: margin_pct(booking.gross_profit, booking.total_sell_price),
            amount_received: booking.amount_received,
            payment_status: booking.payment_status,
            lines,
        })
    }

    /// Sales per client over non-cancelled bookings travelling in the range.
    #[instrument(skip(self))]
    pub async fn sales_by_client(
        &self,
        from_date: Option<NaiveDate>,
        to_date: Option<NaiveDate>,
    ) -> Result<SalesReport<ClientSales>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["sales_by_client"])
            .start_timer();

        let mut rows = sqlx::query_as::<_, ClientSales>(
            r#"
            SELECT client_id,
                   MAX(client_name) AS client_name,
                   COUNT(*) AS booking_count,
                   COALESCE(SUM(total_sell_price), 0) AS total_sell,
                   COALESCE(SUM(total_cost_price), 0) AS total_cost,
                   COALESCE(SUM(gross_profit), 0) AS gross_profit,
                   COALESCE(SUM(amount_received), 0) AS amount_received
            FROM bookings
            WHERE status <> 'cancelled'
              AND ($1::date IS NULL OR travel_date_from >= $1)
              AND ($2::date IS NULL OR travel_date_from <= $2)
            GROUP BY client_id
            ORDER BY total_sell DESC, client_name
            "#,
        )
        .bind(from_date)
        .bind(to_date)
        .fetch_all(self.pool())
        .await
        .map_err(db_error("read sales by client"))?;

        timer.observe_duration();

        for row in &mut rows {
            row.margin_pct = margin_pct(row.gross_profit, row.total_sell);
        }

        Ok(SalesReport {
            from_date,
            to_date,
            total_sell: rows.iter().map(|r| r.total_sell).sum(),
            total_cost: rows.iter().map(|r| r.total_cost).sum(),
            total_profit: rows.iter().map(|r| r.gross_profit).sum(),
            rows,
        })
    }

    /// Sales per service type over non-cancelled bookings travelling in the range.
    #[instrument(skip(self))]
    pub async fn sales_by_service(
        &self,
        from_date: Option<NaiveDate>,
        to_date: Option<NaiveDate>,
    ) -> Result<SalesReport<ServiceSales>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["sales_by_service"])
            .start_timer();

        let mut rows = sqlx::query_as::<_, ServiceSales>(&format!(
            r#"
            WITH scoped AS (
                SELECT booking_id
                FROM bookings
                WHERE status <> 'cancelled'
                  AND ($1::date IS NULL OR travel_date_from >= $1)
                  AND ($2::date IS NULL OR travel_date_from <= $2)
            ),
            lines AS ({})
            SELECT l.service_type,
                   COUNT(*) AS line_count,
                   COUNT(DISTINCT l.booking_id) AS booking_count,
                   COALESCE(SUM(l.sell_price), 0) AS total_sell,
                   COALESCE(SUM(l.total_cost), 0) AS total_cost,
                   COALESCE(SUM(l.margin), 0) AS total_margin
            FROM lines l
            JOIN scoped s ON s.booking_id = l.booking_id
            GROUP BY l.service_type
            ORDER BY total_sell DESC, l.service_type
            "#,
            all_service_lines("booking_id, sell_price, total_cost, margin")
        ))
        .bind(from_date)
        .bind(to_date)
        .fetch_all(self.pool())
        .await
        .map_err(db_error("read sales by service"))?;

        timer.observe_duration();

        for row in &mut rows {
            row.margin_pct = margin_pct(row.total_margin, row.total_sell);
        }

        Ok(SalesReport {
            from_date,
            to_date,
            total_sell: rows.iter().map(|r| r.total_sell).sum(),
            total_cost: rows.iter().map(|r| r.total_cost).sum(),
            total_profit: rows.iter().map(|r| r.total_margin).sum(),
            rows,
        })
    }

    /// Receivables and payables not yet settled.
    #[instrument(skip(self))]
    pub async fn outstanding(&self, today: NaiveDate) -> Result<OutstandingReport, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["outstanding"])
            .start_timer();

        let mut conn = self
            .pool()
            .acquire()
            .await
            .map_err(db_error("acquire connection"))?;

        let bookings = sqlx::query_as::<_, Booking>(&format!(
            r#"
            SELECT {}
            FROM bookings
            WHERE status <> 'cancelled'
              AND total_sell_price - amount_received >= 0.01
            ORDER BY travel_date_from ASC NULLS LAST, code_number
            "#,
            BOOKING_COLUMNS
        ))
        .fetch_all(&mut *conn)
        .await
        .map_err(db_error("read outstanding receivables"))?;

        let lines = sqlx::query_as::<_, LinePayable>(OUTSTANDING_LINES_SQL)
            .fetch_all(&mut *conn)
            .await
            .map_err(db_error("read outstanding line payables"))?;

        let supplier_payments = fetch_supplier_payments(
            &mut conn,
            &ListSupplierPaymentsFilter {
                booking_id: None,
                status: Some(SupplierPaymentStatus::Pending),
            },
        )
        .await?;

        timer.observe_duration();

        let receivables: Vec<OutstandingBooking> = bookings
            .iter()
            .filter_map(|b| outstanding_receivable(b, today))
            .collect();
        let line_payables: Vec<OutstandingLine> = lines
            .into_iter()
            .filter_map(|l| outstanding_line(l, today))
            .collect();
        let supplier_payables: Vec<OutstandingSupplierPayment> = supplier_payments
            .iter()
            .filter_map(|p| outstanding_supplier_payment(p, today))
            .collect();

        Ok(OutstandingReport {
            as_of: today,
            total_receivable: receivables.iter().map(|r| r.outstanding).sum(),
            total_line_payable: line_payables.iter().map(|l| l.outstanding).sum(),
            total_supplier_payable: supplier_payables.iter().map(|p| p.amount).sum(),
            receivables,
            line_payables,
            supplier_payables,
        })
    }

    #[instrument(skip(self))]
    pub async fn supplier_payment_summary(
        &self,
        today: NaiveDate,
    ) -> Result<SupplierPaymentSummary, AppError> {
        let payments = self
            .list_supplier_payments(&ListSupplierPaymentsFilter::default())
            .await?;

        Ok(summarize_supplier_payments(today, &payments))
    }
}
