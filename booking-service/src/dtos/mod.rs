pub mod query;

pub use query::{
    BookingListParams, CashFlowParams, ClientPaymentListParams, DateRangeParams,
    ExpenseListParams, MonthParams, SupplierPaymentListParams, YearParams,
};
