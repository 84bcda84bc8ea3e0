//! Priced service lines: hotels, tours, transfers and flights.
//!
//! Every variant stores its own cost inputs next to a common financial
//! projection ([`LineFinancials`]). The projection is always derived by the
//! ledger from the inputs and is never taken from callers.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::{round_money, Booking, PaymentStatus, UnknownVariant, DEFAULT_CURRENCY};

/// The four kinds of priced service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Hotel,
    Tour,
    Transfer,
    Flight,
}

impl ServiceType {
    pub const ALL: [ServiceType; 4] = [
        ServiceType::Hotel,
        ServiceType::Tour,
        ServiceType::Transfer,
        ServiceType::Flight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Hotel => "hotel",
            ServiceType::Tour => "tour",
            ServiceType::Transfer => "transfer",
            ServiceType::Flight => "flight",
        }
    }

    /// Backing table.
    pub fn table(&self) -> &'static str {
        match self {
            ServiceType::Hotel => "booking_hotels",
            ServiceType::Tour => "booking_tours",
            ServiceType::Transfer => "booking_transfers",
            ServiceType::Flight => "booking_flights",
        }
    }
}

impl FromStr for ServiceType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hotel" => Ok(ServiceType::Hotel),
            "tour" => Ok(ServiceType::Tour),
            "transfer" => Ok(ServiceType::Transfer),
            "flight" => Ok(ServiceType::Flight),
            other => Err(UnknownVariant::new("service type", other)),
        }
    }
}

impl TryFrom<String> for ServiceType {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Who delivers a tour or transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OperationType {
    #[default]
    #[serde(rename = "supplier")]
    Supplier,
    #[serde(rename = "self-operated", alias = "self_operated")]
    SelfOperated,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Supplier => "supplier",
            OperationType::SelfOperated => "self-operated",
        }
    }
}

impl FromStr for OperationType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "supplier" => Ok(OperationType::Supplier),
            "self-operated" | "self_operated" => Ok(OperationType::SelfOperated),
            other => Err(UnknownVariant::new("operation type", other)),
        }
    }
}

impl TryFrom<String> for OperationType {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Cost, price, margin and supplier-payment columns common to every line.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct LineFinancials {
    pub total_cost: Decimal,
    pub sell_price: Decimal,
    pub margin: Decimal,
    pub currency: String,
    #[sqlx(try_from = "String")]
    pub payment_status: PaymentStatus,
    pub paid_amount: Decimal,
    pub payment_due_date: Option<NaiveDate>,
    pub voucher_issued: bool,
    pub notes: Option<String>,
}

/// Type-specific inputs the ledger prices from.
#[derive(Debug, Clone, PartialEq)]
pub enum CostInputs {
    Hotel {
        cost_per_night: Decimal,
        check_in: NaiveDate,
        check_out: NaiveDate,
        number_of_rooms: i32,
    },
    Tour {
        operation_type: OperationType,
        supplier_cost: Option<Decimal>,
        guide_cost: Option<Decimal>,
        vehicle_cost: Option<Decimal>,
        entrance_fees: Option<Decimal>,
        other_costs: Option<Decimal>,
        pax_count: i32,
    },
    Transfer {
        cost_price: Decimal,
    },
    Flight {
        cost_price: Decimal,
        pax_count: i32,
    },
}

/// Price charged to the client and the supplier payment tracking for a line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineTerms {
    pub sell_price: Decimal,
    pub currency: String,
    pub paid_amount: Decimal,
    pub payment_due_date: Option<NaiveDate>,
    pub voucher_issued: bool,
    pub notes: Option<String>,
}

impl LineTerms {
    fn new(
        sell_price: Decimal,
        currency: &Option<String>,
        paid_amount: Option<Decimal>,
        payment_due_date: Option<NaiveDate>,
        voucher_issued: Option<bool>,
        notes: &Option<String>,
    ) -> Self {
        Self {
            sell_price: round_money(sell_price),
            currency: currency
                .clone()
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            paid_amount: round_money(paid_amount.unwrap_or(Decimal::ZERO)),
            payment_due_date,
            voucher_issued: voucher_issued.unwrap_or(false),
            notes: notes.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct HotelLine {
    pub line_id: Uuid,
    pub booking_id: Uuid,
    pub hotel_name: String,
    pub room_type: Option<String>,
    pub supplier_name: Option<String>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nights: i32,
    pub number_of_rooms: i32,
    pub cost_per_night: Decimal,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub financials: LineFinancials,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TourLine {
    pub line_id: Uuid,
    pub booking_id: Uuid,
    pub tour_name: String,
    pub tour_date: Option<NaiveDate>,
    #[sqlx(try_from = "String")]
    pub operation_type: OperationType,
    pub supplier_name: Option<String>,
    pub supplier_cost: Option<Decimal>,
    pub guide_cost: Option<Decimal>,
    pub vehicle_cost: Option<Decimal>,
    pub entrance_fees: Option<Decimal>,
    pub other_costs: Option<Decimal>,
    pub pax_count: i32,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub financials: LineFinancials,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TransferLine {
    pub line_id: Uuid,
    pub booking_id: Uuid,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub transfer_date: Option<NaiveDate>,
    pub vehicle_type: Option<String>,
    #[sqlx(try_from = "String")]
    pub operation_type: OperationType,
    pub supplier_name: Option<String>,
    pub cost_price: Decimal,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub financials: LineFinancials,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FlightLine {
    pub line_id: Uuid,
    pub booking_id: Uuid,
    pub airline: String,
    pub flight_number: Option<String>,
    pub departure_city: Option<String>,
    pub arrival_city: Option<String>,
    pub departure_date: Option<NaiveDate>,
    pub pax_count: i32,
    /// Fare for the whole party, already inclusive of `pax_count`.
    pub cost_price: Decimal,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub financials: LineFinancials,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl HotelLine {
    pub fn cost_inputs(&self) -> CostInputs {
        CostInputs::Hotel {
            cost_per_night: self.cost_per_night,
            check_in: self.check_in,
            check_out: self.check_out,
            number_of_rooms: self.number_of_rooms,
        }
    }
}

impl TourLine {
    pub fn cost_inputs(&self) -> CostInputs {
        CostInputs::Tour {
            operation_type: self.operation_type,
            supplier_cost: self.supplier_cost,
            guide_cost: self.guide_cost,
            vehicle_cost: self.vehicle_cost,
            entrance_fees: self.entrance_fees,
            other_costs: self.other_costs,
            pax_count: self.pax_count,
        }
    }
}

impl TransferLine {
    pub fn cost_inputs(&self) -> CostInputs {
        CostInputs::Transfer {
            cost_price: self.cost_price,
        }
    }
}

impl FlightLine {
    pub fn cost_inputs(&self) -> CostInputs {
        CostInputs::Flight {
            cost_price: self.cost_price,
            pax_count: self.pax_count,
        }
    }
}

/// Any stored line, for code that treats the four kinds uniformly.
#[derive(Debug, Clone)]
pub enum ServiceLine {
    Hotel(HotelLine),
    Tour(TourLine),
    Transfer(TransferLine),
    Flight(FlightLine),
}

impl ServiceLine {
    pub fn service_type(&self) -> ServiceType {
        match self {
            ServiceLine::Hotel(_) => ServiceType::Hotel,
            ServiceLine::Tour(_) => ServiceType::Tour,
            ServiceLine::Transfer(_) => ServiceType::Transfer,
            ServiceLine::Flight(_) => ServiceType::Flight,
        }
    }

    pub fn line_id(&self) -> Uuid {
        match self {
            ServiceLine::Hotel(l) => l.line_id,
            ServiceLine::Tour(l) => l.line_id,
            ServiceLine::Transfer(l) => l.line_id,
            ServiceLine::Flight(l) => l.line_id,
        }
    }

    pub fn financials(&self) -> &LineFinancials {
        match self {
            ServiceLine::Hotel(l) => &l.financials,
            ServiceLine::Tour(l) => &l.financials,
            ServiceLine::Transfer(l) => &l.financials,
            ServiceLine::Flight(l) => &l.financials,
        }
    }

    pub fn cost_inputs(&self) -> CostInputs {
        match self {
            ServiceLine::Hotel(l) => l.cost_inputs(),
            ServiceLine::Tour(l) => l.cost_inputs(),
            ServiceLine::Transfer(l) => l.cost_inputs(),
            ServiceLine::Flight(l) => l.cost_inputs(),
        }
    }

    /// Short human label used in reports.
    pub fn description(&self) -> String {
        match self {
            ServiceLine::Hotel(l) => format!("{} ({} nights)", l.hotel_name, l.nights),
            ServiceLine::Tour(l) => l.tour_name.clone(),
            ServiceLine::Transfer(l) => format!("{} to {}", l.pickup_location, l.dropoff_location),
            ServiceLine::Flight(l) => {
                let mut label = l.airline.clone();
                if let Some(number) = &l.flight_number {
                    label.push(' ');
                    label.push_str(number);
                }
                if let (Some(from), Some(to)) = (&l.departure_city, &l.arrival_city) {
                    label.push_str(&format!(" {}-{}", from, to));
                }
                label
            }
        }
    }
}

/// A changed line together with the booking totals it produced.
#[derive(Debug, Clone, Serialize)]
pub struct LineMutation<T> {
    pub line: T,
    pub booking: Booking,
}

fn default_rooms() -> i32 {
    1
}

fn default_flight_pax() -> i32 {
    1
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct HotelLineInput {
    pub booking_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub hotel_name: String,
    #[validate(length(max = 100))]
    pub room_type: Option<String>,
    #[validate(length(max = 200))]
    pub supplier_name: Option<String>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[serde(default = "default_rooms")]
    #[validate(range(min = 1, max = 500))]
    pub number_of_rooms: i32,
    pub cost_per_night: Decimal,
    pub sell_price: Decimal,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    pub paid_amount: Option<Decimal>,
    pub payment_due_date: Option<NaiveDate>,
    pub voucher_issued: Option<bool>,
    pub notes: Option<String>,
}

impl HotelLineInput {
    pub fn cost_inputs(&self) -> CostInputs {
        CostInputs::Hotel {
            cost_per_night: round_money(self.cost_per_night),
            check_in: self.check_in,
            check_out: self.check_out,
            number_of_rooms: self.number_of_rooms,
        }
    }

    pub fn terms(&self) -> LineTerms {
        LineTerms::new(
            self.sell_price,
            &self.currency,
            self.paid_amount,
            self.payment_due_date,
            self.voucher_issued,
            &self.notes,
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct HotelLinePatch {
    #[validate(length(min = 1, max = 200))]
    pub hotel_name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub room_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub supplier_name: Option<Option<String>>,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    #[validate(range(min = 1, max = 500))]
    pub number_of_rooms: Option<i32>,
    pub cost_per_night: Option<Decimal>,
    pub sell_price: Option<Decimal>,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    pub paid_amount: Option<Decimal>,
    #[serde(default, deserialize_with = "nullable")]
    pub payment_due_date: Option<Option<NaiveDate>>,
    pub voucher_issued: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
}

impl HotelLinePatch {
    /// The full input that results from applying this patch to `existing`.
    pub fn apply(&self, existing: &HotelLine) -> HotelLineInput {
        let f = &existing.financials;
        HotelLineInput {
            booking_id: existing.booking_id,
            hotel_name: pick(&self.hotel_name, &existing.hotel_name),
            room_type: merge(&self.room_type, &existing.room_type),
            supplier_name: merge(&self.supplier_name, &existing.supplier_name),
            check_in: self.check_in.unwrap_or(existing.check_in),
            check_out: self.check_out.unwrap_or(existing.check_out),
            number_of_rooms: self.number_of_rooms.unwrap_or(existing.number_of_rooms),
            cost_per_night: self.cost_per_night.unwrap_or(existing.cost_per_night),
            sell_price: self.sell_price.unwrap_or(f.sell_price),
            currency: Some(pick(&self.currency, &f.currency)),
            paid_amount: Some(self.paid_amount.unwrap_or(f.paid_amount)),
            payment_due_date: merge(&self.payment_due_date, &f.payment_due_date),
            voucher_issued: Some(self.voucher_issued.unwrap_or(f.voucher_issued)),
            notes: merge(&self.notes, &f.notes),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TourLineInput {
    pub booking_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub tour_name: String,
    pub tour_date: Option<NaiveDate>,
    #[serde(default)]
    pub operation_type: OperationType,
    #[validate(length(max = 200))]
    pub supplier_name: Option<String>,
    pub supplier_cost: Option<Decimal>,
    pub guide_cost: Option<Decimal>,
    pub vehicle_cost: Option<Decimal>,
    pub entrance_fees: Option<Decimal>,
    pub other_costs: Option<Decimal>,
    #[serde(default)]
    #[validate(range(min = 0, max = 1000))]
    pub pax_count: i32,
    pub sell_price: Decimal,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    pub paid_amount: Option<Decimal>,
    pub payment_due_date: Option<NaiveDate>,
    pub voucher_issued: Option<bool>,
    pub notes: Option<String>,
}

impl TourLineInput {
    pub fn cost_inputs(&self) -> CostInputs {
        CostInputs::Tour {
            operation_type: self.operation_type,
            supplier_cost: self.supplier_cost.map(round_money),
            guide_cost: self.guide_cost.map(round_money),
            vehicle_cost: self.vehicle_cost.map(round_money),
            entrance_fees: self.entrance_fees.map(round_money),
            other_costs: self.other_costs.map(round_money),
            pax_count: self.pax_count,
        }
    }

    pub fn terms(&self) -> LineTerms {
        LineTerms::new(
            self.sell_price,
            &self.currency,
            self.paid_amount,
            self.payment_due_date,
            self.voucher_issued,
            &self.notes,
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct TourLinePatch {
    #[validate(length(min = 1, max = 200))]
    pub tour_name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub tour_date: Option<Option<NaiveDate>>,
    pub operation_type: Option<OperationType>,
    #[serde(default, deserialize_with = "nullable")]
    pub supplier_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub supplier_cost: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "nullable")]
    pub guide_cost: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "nullable")]
    pub vehicle_cost: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "nullable")]
    pub entrance_fees: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "nullable")]
    pub other_costs: Option<Option<Decimal>>,
    #[validate(range(min = 0, max = 1000))]
    pub pax_count: Option<i32>,
    pub sell_price: Option<Decimal>,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    pub paid_amount: Option<Decimal>,
    #[serde(default, deserialize_with = "nullable")]
    pub payment_due_date: Option<Option<NaiveDate>>,
    pub voucher_issued: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
}

impl TourLinePatch {
    pub fn apply(&self, existing: &TourLine) -> TourLineInput {
        let f = &existing.financials;
        TourLineInput {
            booking_id: existing.booking_id,
            tour_name: pick(&self.tour_name, &existing.tour_name),
            tour_date: merge(&self.tour_date, &existing.tour_date),
            operation_type: self.operation_type.unwrap_or(existing.operation_type),
            supplier_name: merge(&self.supplier_name, &existing.supplier_name),
            supplier_cost: merge(&self.supplier_cost, &existing.supplier_cost),
            guide_cost: merge(&self.guide_cost, &existing.guide_cost),
            vehicle_cost: merge(&self.vehicle_cost, &existing.vehicle_cost),
            entrance_fees: merge(&self.entrance_fees, &existing.entrance_fees),
            other_costs: merge(&self.other_costs, &existing.other_costs),
            pax_count: self.pax_count.unwrap_or(existing.pax_count),
            sell_price: self.sell_price.unwrap_or(f.sell_price),
            currency: Some(pick(&self.currency, &f.currency)),
            paid_amount: Some(self.paid_amount.unwrap_or(f.paid_amount)),
            payment_due_date: merge(&self.payment_due_date, &f.payment_due_date),
            voucher_issued: Some(self.voucher_issued.unwrap_or(f.voucher_issued)),
            notes: merge(&self.notes, &f.notes),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TransferLineInput {
    pub booking_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub pickup_location: String,
    #[validate(length(min = 1, max = 200))]
    pub dropoff_location: String,
    pub transfer_date: Option<NaiveDate>,
    #[validate(length(max = 100))]
    pub vehicle_type: Option<String>,
    #[serde(default)]
    pub operation_type: OperationType,
    #[validate(length(max = 200))]
    pub supplier_name: Option<String>,
    pub cost_price: Decimal,
    pub sell_price: Decimal,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    pub paid_amount: Option<Decimal>,
    pub payment_due_date: Option<NaiveDate>,
    pub voucher_issued: Option<bool>,
    pub notes: Option<String>,
}

impl TransferLineInput {
    pub fn cost_inputs(&self) -> CostInputs {
        CostInputs::Transfer {
            cost_price: round_money(self.cost_price),
        }
    }

    pub fn terms(&self) -> LineTerms {
        LineTerms::new(
            self.sell_price,
            &self.currency,
            self.paid_amount,
            self.payment_due_date,
            self.voucher_issued,
            &self.notes,
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct TransferLinePatch {
    #[validate(length(min = 1, max = 200))]
    pub pickup_location: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub dropoff_location: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub transfer_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "nullable")]
    pub vehicle_type: Option<Option<String>>,
    pub operation_type: Option<OperationType>,
    #[serde(default, deserialize_with = "nullable")]
    pub supplier_name: Option<Option<String>>,
    pub cost_price: Option<Decimal>,
    pub sell_price: Option<Decimal>,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    pub paid_amount: Option<Decimal>,
    #[serde(default, deserialize_with = "nullable")]
    pub payment_due_date: Option<Option<NaiveDate>>,
    pub voucher_issued: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
}

impl TransferLinePatch {
    pub fn apply(&self, existing: &TransferLine) -> TransferLineInput {
        let f = &existing.financials;
        TransferLineInput {
            booking_id: existing.booking_id,
            pickup_location: pick(&self.pickup_location, &existing.pickup_location),
            dropoff_location: pick(&self.dropoff_location, &existing.dropoff_location),
            transfer_date: merge(&self.transfer_date, &existing.transfer_date),
            vehicle_type: merge(&self.vehicle_type, &existing.vehicle_type),
            operation_type: self.operation_type.unwrap_or(existing.operation_type),
            supplier_name: merge(&self.supplier_name, &existing.supplier_name),
            cost_price: self.cost_price.unwrap_or(existing.cost_price),
            sell_price: self.sell_price.unwrap_or(f.sell_price),
            currency: Some(pick(&self.currency, &f.currency)),
            paid_amount: Some(self.paid_amount.unwrap_or(f.paid_amount)),
            payment_due_date: merge(&self.payment_due_date, &f.payment_due_date),
            voucher_issued: Some(self.voucher_issued.unwrap_or(f.voucher_issued)),
            notes: merge(&self.notes, &f.notes),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct FlightLineInput {
    pub booking_id: Uuid,
    #[validate(length(min = 1, max = 100))]
    pub airline: String,
    #[validate(length(max = 20))]
    pub flight_number: Option<String>,
    #[validate(length(max = 100))]
    pub departure_city: Option<String>,
    #[validate(length(max = 100))]
    pub arrival_city: Option<String>,
    pub departure_date: Option<NaiveDate>,
    #[serde(default = "default_flight_pax")]
    #[validate(range(min = 0, max = 1000))]
    pub pax_count: i32,
    pub cost_price: Decimal,
    pub sell_price: Decimal,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    pub paid_amount: Option<Decimal>,
    pub payment_due_date: Option<NaiveDate>,
    pub voucher_issued: Option<bool>,
    pub notes: Option<String>,
}

impl FlightLineInput {
    pub fn cost_inputs(&self) -> CostInputs {
        CostInputs::Flight {
            cost_price: round_money(self.cost_price),
            pax_count: self.pax_count,
        }
    }

    pub fn terms(&self) -> LineTerms {
        LineTerms::new(
            self.sell_price,
            &self.currency,
            self.paid_amount,
            self.payment_due_date,
            self.voucher_issued,
            &self.notes,
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct FlightLinePatch {
    #[validate(length(min = 1, max = 100))]
    pub airline: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub flight_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub departure_city: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub arrival_city: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub departure_date: Option<Option<NaiveDate>>,
    #[validate(range(min = 0, max = 1000))]
    pub pax_count: Option<i32>,
    pub cost_price: Option<Decimal>,
    pub sell_price: Option<Decimal>,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    pub paid_amount: Option<Decimal>,
    #[serde(default, deserialize_with = "nullable")]
    pub payment_due_date: Option<Option<NaiveDate>>,
    pub voucher_issued: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
}

impl FlightLinePatch {
    pub fn apply(&self, existing: &FlightLine) -> FlightLineInput {
        let f = &existing.financials;
        FlightLineInput {
            booking_id: existing.booking_id,
            airline: pick(&self.airline, &existing.airline),
            flight_number: merge(&self.flight_number, &existing.flight_number),
            departure_city: merge(&self.departure_city, &existing.departure_city),
            arrival_city: merge(&self.arrival_city, &existing.arrival_city),
            departure_date: merge(&self.departure_date, &existing.departure_date),
            pax_count: self.pax_count.unwrap_or(existing.pax_count),
            cost_price: self.cost_price.unwrap_or(existing.cost_price),
            sell_price: self.sell_price.unwrap_or(f.sell_price),
            currency: Some(pick(&self.currency, &f.currency)),
            paid_amount: Some(self.paid_amount.unwrap_or(f.paid_amount)),
            payment_due_date: merge(&self.payment_due_date, &f.payment_due_date),
            voucher_issued: Some(self.voucher_issued.unwrap_or(f.voucher_issued)),
            notes: merge(&self.notes, &f.notes),
        }
    }
}

fn pick(update: &Option<String>, current: &str) -> String {
    update.clone().unwrap_or_else(|| current.to_string())
}

/// Take the patched value of a nullable column: absent keeps `current`, an
/// explicit `null` clears it.
fn merge<T: Clone>(update: &Option<Option<T>>, current: &Option<T>) -> Option<T> {
    match update {
        Some(value) => value.clone(),
        None => current.clone(),
    }
}

/// Deserialize a present field, `null` included, as `Some`. Missing fields
/// fall back to `None` through `#[serde(default)]`.
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn financials(total_cost: &str, sell: &str) -> LineFinancials {
        LineFinancials {
            total_cost: dec(total_cost),
            sell_price: dec(sell),
            margin: dec(sell) - dec(total_cost),
            currency: "USD".to_string(),
            payment_status: PaymentStatus::Pending,
            paid_amount: Decimal::ZERO,
            payment_due_date: None,
            voucher_issued: false,
            notes: None,
        }
    }

    fn hotel() -> HotelLine {
        HotelLine {
            line_id: Uuid::new_v4(),
            booking_id: Uuid::new_v4(),
            hotel_name: "Nile Ritz".to_string(),
            room_type: Some("Double".to_string()),
            supplier_name: None,
            check_in: NaiveDate::from_ymd_opt(2025, 12, 10).unwrap(),
            check_out: NaiveDate::from_ymd_opt(2025, 12, 12).unwrap(),
            nights: 2,
            number_of_rooms: 1,
            cost_per_night: dec("150.00"),
            financials: financials("300.00", "200.00"),
            created_utc: Utc::now(),
            updated_utc: Utc::now(),
        }
    }

    #[test]
    fn operation_type_accepts_both_spellings() {
        let hyphen: OperationType = serde_json::from_str("\"self-operated\"").unwrap();
        let underscore: OperationType = serde_json::from_str("\"self_operated\"").unwrap();
        assert_eq!(hyphen, OperationType::SelfOperated);
        assert_eq!(underscore, OperationType::SelfOperated);
        assert_eq!(
            serde_json::to_string(&OperationType::SelfOperated).unwrap(),
            "\"self-operated\""
        );
        assert_eq!("self_operated".parse(), Ok(OperationType::SelfOperated));
    }

    #[test]
    fn patch_keeps_untouched_fields() {
        let existing = hotel();
        let patch = HotelLinePatch {
            sell_price: Some(dec("350.00")),
            ..Default::default()
        };
        let input = patch.apply(&existing);
        assert_eq!(input.booking_id, existing.booking_id);
        assert_eq!(input.hotel_name, "Nile Ritz");
        assert_eq!(input.check_out, existing.check_out);
        assert_eq!(input.cost_per_night, dec("150.00"));
        assert_eq!(input.sell_price, dec("350.00"));
        assert_eq!(input.room_type.as_deref(), Some("Double"));
    }

    #[test]
    fn explicit_null_clears_a_nullable_column() {
        let mut existing = hotel();
        existing.financials.payment_due_date = NaiveDate::from_ymd_opt(2025, 11, 1);
        existing.financials.notes = Some("late check-in".to_string());

        let patch: HotelLinePatch =
            serde_json::from_str(r#"{"room_type": null, "payment_due_date": null}"#).unwrap();
        let input = patch.apply(&existing);

        assert_eq!(input.room_type, None);
        assert_eq!(input.payment_due_date, None);
        assert_eq!(input.notes.as_deref(), Some("late check-in"));
    }

    #[test]
    fn tour_cost_component_can_be_cleared_or_replaced() {
        let patch: TourLinePatch =
            serde_json::from_str(r#"{"guide_cost": null, "vehicle_cost": "95.50"}"#).unwrap();
        assert_eq!(patch.guide_cost, Some(None));
        assert_eq!(patch.vehicle_cost, Some(Some(dec("95.50"))));
        assert_eq!(patch.entrance_fees, None);
    }

    #[test]
    fn inputs_round_money_half_away_from_zero() {
        let input = TransferLineInput {
            booking_id: Uuid::new_v4(),
            pickup_location: "Airport".to_string(),
            dropoff_location: "Hotel".to_string(),
            transfer_date: None,
            vehicle_type: None,
            operation_type: OperationType::Supplier,
            supplier_name: None,
            cost_price: dec("40.125"),
            sell_price: dec("60.005"),
            currency: None,
            paid_amount: None,
            payment_due_date: None,
            voucher_issued: None,
            notes: None,
        };
        assert_eq!(
            input.cost_inputs(),
            CostInputs::Transfer {
                cost_price: dec("40.13")
            }
        );
        let terms = input.terms();
        assert_eq!(terms.sell_price, dec("60.01"));
        assert_eq!(terms.currency, "USD");
        assert_eq!(terms.paid_amount, Decimal::ZERO);
    }

    #[test]
    fn descriptions_name_the_service() {
        let line = ServiceLine::Hotel(hotel());
        assert_eq!(line.description(), "Nile Ritz (2 nights)");
        assert_eq!(line.service_type(), ServiceType::Hotel);
        assert_eq!(line.financials().total_cost, dec("300.00"));
    }
}
