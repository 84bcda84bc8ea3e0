//! Read models returned by the reporting endpoints.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::{BookingStatus, PaymentStatus, ServiceType, SupplierType};

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub as_of: NaiveDate,
    pub open_inquiries: i64,
    pub confirmed_this_month: i64,
    pub revenue_this_month: Decimal,
    pub gross_profit_this_month: Decimal,
    pub outstanding_receivables: Decimal,
    pub outstanding_payables: Decimal,
    pub upcoming_departures: Vec<UpcomingDeparture>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UpcomingDeparture {
    pub booking_id: Uuid,
    pub booking_code: String,
    pub client_name: String,
    pub travel_date_from: NaiveDate,
    pub pax_count: i32,
    #[sqlx(try_from = "String")]
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyPnl {
    /// `YYYY-MM`.
    pub month: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub booking_count: i64,
    pub revenue: Decimal,
    pub cost_of_sales: Decimal,
    pub gross_profit: Decimal,
    pub gross_margin_pct: Decimal,
    pub operating_expenses: Decimal,
    pub net_profit: Decimal,
    pub cost_by_service: Vec<ServiceCost>,
    pub expenses_by_category: Vec<CategoryTotal>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ServiceCost {
    #[sqlx(try_from = "String")]
    pub service_type: ServiceType,
    pub line_count: i64,
    pub revenue: Decimal,
    pub cost: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Decimal,
}

/// A sum keyed by `YYYY-MM`.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct MonthTotal {
    pub month: String,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashFlowMonth {
    pub month: String,
    pub inflow: Decimal,
    pub supplier_outflow: Decimal,
    pub expense_outflow: Decimal,
    pub outflow: Decimal,
    pub net: Decimal,
    pub running_balance: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct CashFlowReport {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub months: Vec<CashFlowMonth>,
    pub total_inflow: Decimal,
    pub total_outflow: Decimal,
    pub net: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingProfitability {
    pub booking_id: Uuid,
    pub booking_code: String,
    pub client_name: String,
    pub status: BookingStatus,
    pub total_sell_price: Decimal,
    pub total_cost_price: Decimal,
    pub gross_profit: Decimal,
    pub margin_pct: Decimal,
    pub amount_received: Decimal,
    pub payment_status: PaymentStatus,
    pub lines: Vec<LineProfitability>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineProfitability {
    pub line_id: Uuid,
    pub service_type: ServiceType,
    pub description: String,
    pub sell_price: Decimal,
    pub total_cost: Decimal,
    pub margin: Decimal,
    pub margin_pct: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ClientSales {
    pub client_id: Uuid,
    pub client_name: String,
    pub booking_count: i64,
    pub total_sell: Decimal,
    pub total_cost: Decimal,
    pub gross_profit: Decimal,
    pub amount_received: Decimal,
    #[sqlx(skip)]
    pub margin_pct: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ServiceSales {
    #[sqlx(try_from = "String")]
    pub service_type: ServiceType,
    pub line_count: i64,
    pub booking_count: i64,
    pub total_sell: Decimal,
    pub total_cost: Decimal,
    pub total_margin: Decimal,
    #[sqlx(skip)]
    pub margin_pct: Decimal,
}

/// Rows of a sales report with their totals.
#[derive(Debug, Clone, Serialize)]
pub struct SalesReport<T> {
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub rows: Vec<T>,
    pub total_sell: Decimal,
    pub total_cost: Decimal,
    pub total_profit: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutstandingReport {
    pub as_of: NaiveDate,
    pub receivables: Vec<OutstandingBooking>,
    pub line_payables: Vec<OutstandingLine>,
    pub supplier_payables: Vec<OutstandingSupplierPayment>,
    pub total_receivable: Decimal,
    pub total_line_payable: Decimal,
    pub total_supplier_payable: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutstandingBooking {
    pub booking_id: Uuid,
    pub booking_code: String,
    pub client_name: String,
    pub travel_date_from: Option<NaiveDate>,
    pub total_sell_price: Decimal,
    pub amount_received: Decimal,
    pub outstanding: Decimal,
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutstandingLine {
    pub line_id: Uuid,
    pub booking_id: Uuid,
    pub booking_code: String,
    pub service_type: ServiceType,
    pub description: String,
    pub total_cost: Decimal,
    pub paid_amount: Decimal,
    pub outstanding: Decimal,
    pub payment_due_date: Option<NaiveDate>,
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutstandingSupplierPayment {
    pub payment_id: Uuid,
    pub booking_id: Uuid,
    pub supplier_type: SupplierType,
    pub supplier_name: String,
    pub amount: Decimal,
    pub currency: String,
    pub due_date: Option<NaiveDate>,
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SupplierPaymentTotals {
    pub pending_count: i64,
    pub pending_amount: Decimal,
    pub paid_count: i64,
    pub paid_amount: Decimal,
    pub overdue_count: i64,
    pub overdue_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupplierTypeSummary {
    pub supplier_type: SupplierType,
    #[serde(flatten)]
    pub totals: SupplierPaymentTotals,
}

#[derive(Debug, Clone, Serialize)]
pub struct SupplierPaymentSummary {
    pub as_of: NaiveDate,
    pub by_supplier_type: Vec<SupplierTypeSummary>,
    pub totals: SupplierPaymentTotals,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyExpense {
    /// 1 to 12.
    pub month: u32,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpenseSummary {
    pub year: i32,
    pub total: Decimal,
    pub monthly: Vec<MonthlyExpense>,
    pub by_category: Vec<CategoryTotal>,
    pub recurring_total: Decimal,
    pub one_off_total: Decimal,
}
