//! Line item pricing.
//!
//! Turns the type-specific cost inputs of a hotel, tour, transfer or flight
//! line into its total cost, margin and supplier payment status. Pure: no I/O.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use service_core::error::AppError;

use crate::models::{round_money, CostInputs, LineTerms, OperationType, PaymentStatus, ServiceLine};
use crate::services::payment_status::{PaymentPosition, PAYMENT_EPSILON};

/// Derived financial fields for one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub total_cost: Decimal,
    pub margin: Decimal,
    /// Only set for hotel stays.
    pub nights: Option<i32>,
    pub payment_status: PaymentStatus,
}

/// Whole nights between check-in and check-out.
pub fn hotel_nights(check_in: NaiveDate, check_out: NaiveDate) -> Result<i32, AppError> {
    let nights = (check_out - check_in).num_days();
    if nights <= 0 {
        return Err(AppError::validation(
            "check_out",
            "check_out must be after check_in",
        ));
    }
    i32::try_from(nights).map_err(|_| AppError::validation("check_out", "Stay is too long"))
}

/// Total supplier cost of a line.
///
/// Flights are priced for the whole party: `cost_price` already covers every
/// passenger and is never multiplied by `pax_count`.
pub fn total_cost(inputs: &CostInputs) -> Result<Decimal, AppError> {
    let total = match inputs {
        CostInputs::Hotel {
            cost_per_night,
            check_in,
            check_out,
            number_of_rooms,
        } => {
            let nights = hotel_nights(*check_in, *check_out)?;
            if *number_of_rooms < 1 {
                return Err(AppError::validation(
                    "number_of_rooms",
                    "number_of_rooms must be at least 1",
                ));
            }
            let per_night = non_negative("cost_per_night", *cost_per_night)?;
            bounded(
                "cost_per_night",
                per_night
                    .checked_mul(Decimal::from(nights))
                    .and_then(|v| v.checked_mul(Decimal::from(*number_of_rooms))),
            )?
        }
        CostInputs::Tour {
            operation_type,
            supplier_cost,
            guide_cost,
            vehicle_cost,
            entrance_fees,
            other_costs,
            pax_count,
        } => {
            non_negative_count("pax_count", *pax_count)?;
            match operation_type {
                OperationType::Supplier => component("supplier_cost", *supplier_cost)?,
                OperationType::SelfOperated => {
                    let mut total = Decimal::ZERO;
                    for (field, value) in [
                        ("guide_cost", guide_cost),
                        ("vehicle_cost", vehicle_cost),
                        ("entrance_fees", entrance_fees),
                        ("other_costs", other_costs),
                    ] {
                        total = bounded(field, total.checked_add(component(field, *value)?))?;
                    }
                    total
                }
            }
        }
        CostInputs::Transfer { cost_price } => non_negative("cost_price", *cost_price)?,
        CostInputs::Flight {
            cost_price,
            pax_count,
        } => {
            non_negative_count("pax_count", *pax_count)?;
            non_negative("cost_price", *cost_price)?
        }
    };

    Ok(round_money(total))
}

/// Price a line: total cost, margin against the sell price and the status of
/// what has been paid to the supplier so far.
pub fn price(
    inputs: &CostInputs,
    terms: &LineTerms,
    today: NaiveDate,
) -> Result<PricedLine, AppError> {
    let total_cost = total_cost(inputs)?;
    let sell_price = non_negative("sell_price", terms.sell_price)?;
    let paid_amount = non_negative("paid_amount", terms.paid_amount)?;

    let nights = match inputs {
        CostInputs::Hotel {
            check_in,
            check_out,
            ..
        } => Some(hotel_nights(*check_in, *check_out)?),
        _ => None,
    };

    Ok(PricedLine {
        total_cost,
        margin: sell_price - total_cost,
        nights,
        payment_status: PaymentPosition::payable(total_cost, paid_amount, terms.payment_due_date)
            .status(today),
    })
}

/// Check that a stored line still agrees with its own inputs.
pub fn verify_stored(line: &ServiceLine) -> Result<(), AppError> {
    let stored = line.financials();
    let expected = total_cost(&line.cost_inputs()).map_err(|e| {
        AppError::AggregationInconsistency(format!(
            "{} line {} has invalid stored inputs: {}",
            line.service_type().as_str(),
            line.line_id(),
            e
        ))
    })?;

    if (expected - stored.total_cost).abs() > PAYMENT_EPSILON {
        return Err(AppError::AggregationInconsistency(format!(
            "{} line {} stores total_cost {} but its inputs price to {}",
            line.service_type().as_str(),
            line.line_id(),
            stored.total_cost,
            expected
        )));
    }

    if (stored.sell_price - stored.total_cost - stored.margin).abs() > PAYMENT_EPSILON {
        return Err(AppError::AggregationInconsistency(format!(
            "{} line {} stores margin {} for sell {} and cost {}",
            line.service_type().as_str(),
            line.line_id(),
            stored.margin,
            stored.sell_price,
            stored.total_cost
        )));
    }

    Ok(())
}

/// Largest amount a `NUMERIC(14,2)` money column holds.
pub fn max_money() -> Decimal {
    Decimal::new(99_999_999_999_999, 2)
}

/// Reject an amount the money columns cannot store.
pub fn within_money_range(field: &str, value: Decimal) -> Result<Decimal, AppError> {
    if value.abs() > max_money() {
        return Err(AppError::validation(
            field,
            format!("{} must not exceed {}", field, max_money()),
        ));
    }
    Ok(value)
}

/// A checked sum or product, attributed to the input that pushed it out of range.
fn bounded(field: &str, value: Option<Decimal>) -> Result<Decimal, AppError> {
    match value {
        Some(value) => within_money_range(field, value),
        None => Err(AppError::validation(
            field,
            format!("{} is too large", field),
        )),
    }
}

fn non_negative(field: &str, value: Decimal) -> Result<Decimal, AppError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(AppError::validation(
            field,
            format!("{} must not be negative", field),
        ));
    }
    within_money_range(field, value)
}

fn component(field: &str, value: Option<Decimal>) -> Result<Decimal, AppError> {
    non_negative(field, value.unwrap_or(Decimal::ZERO))
}

fn non_negative_count(field: &str, value: i32) -> Result<i32, AppError> {
    if value < 0 {
        return Err(AppError::validation(
            field,
            format!("{} must not be negative", field),
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn terms(sell: &str) -> LineTerms {
        LineTerms {
            sell_price: dec(sell),
            currency: "USD".to_string(),
            paid_amount: Decimal::ZERO,
            payment_due_date: None,
            voucher_issued: false,
            notes: None,
        }
    }

    fn today() -> NaiveDate {
        date(2025, 11, 1)
    }

    fn hotel(cost_per_night: &str, check_in: NaiveDate, check_out: NaiveDate, rooms: i32) -> CostInputs {
        CostInputs::Hotel {
            cost_per_night: dec(cost_per_night),
            check_in,
            check_out,
            number_of_rooms: rooms,
        }
    }

    fn self_operated_tour(guide: &str, vehicle: &str, entrance: &str, other: Option<&str>) -> CostInputs {
        CostInputs::Tour {
            operation_type: OperationType::SelfOperated,
            supplier_cost: None,
            guide_cost: Some(dec(guide)),
            vehicle_cost: Some(dec(vehicle)),
            entrance_fees: Some(dec(entrance)),
            other_costs: other.map(dec),
            pax_count: 4,
        }
    }

    #[test]
    fn hotel_two_nights_one_room() {
        let inputs = hotel("150", date(2025, 12, 10), date(2025, 12, 12), 1);
        let priced = price(&inputs, &terms("200"), today()).unwrap();
        assert_eq!(priced.total_cost, dec("300"));
        assert_eq!(priced.margin, dec("-100"));
        assert_eq!(priced.nights, Some(2));
        assert_eq!(priced.payment_status, PaymentStatus::Pending);
    }

    #[test]
    fn hotel_multiplies_rooms() {
        let inputs = hotel("80.50", date(2025, 12, 1), date(2025, 12, 4), 2);
        assert_eq!(total_cost(&inputs).unwrap(), dec("483.00"));
    }

    #[test]
    fn hotel_checkout_must_follow_checkin() {
        for check_out in [date(2025, 12, 10), date(2025, 12, 9)] {
            let inputs = hotel("150", date(2025, 12, 10), check_out, 1);
            let err = total_cost(&inputs).unwrap_err();
            assert!(
                matches!(err, AppError::Validation { ref field, .. } if field == "check_out"),
                "unexpected error: {:?}",
                err
            );
        }
    }

    #[test]
    fn hotel_needs_a_room() {
        let inputs = hotel("150", date(2025, 12, 10), date(2025, 12, 12), 0);
        let err = total_cost(&inputs).unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "number_of_rooms"));
    }

    #[test]
    fn self_operated_tour_sums_components() {
        let inputs = self_operated_tour("100", "120", "80", Some("0"));
        let priced = price(&inputs, &terms("600"), today()).unwrap();
        assert_eq!(priced.total_cost, dec("300"));
        assert_eq!(priced.margin, dec("300"));
        assert_eq!(priced.nights, None);
    }

    #[test]
    fn self_operated_tour_treats_missing_components_as_zero() {
        let inputs = self_operated_tour("100", "120", "80", None);
        assert_eq!(total_cost(&inputs).unwrap(), dec("300"));
    }

    #[test]
    fn supplier_tour_uses_supplier_cost_only() {
        let inputs = CostInputs::Tour {
            operation_type: OperationType::Supplier,
            supplier_cost: Some(dec("250")),
            guide_cost: Some(dec("999")),
            vehicle_cost: None,
            entrance_fees: None,
            other_costs: None,
            pax_count: 2,
        };
        assert_eq!(total_cost(&inputs).unwrap(), dec("250"));
    }

    #[test]
    fn transfer_cost_ignores_operation_type() {
        let inputs = CostInputs::Transfer {
            cost_price: dec("45"),
        };
        let priced = price(&inputs, &terms("70"), today()).unwrap();
        assert_eq!(priced.total_cost, dec("45"));
        assert_eq!(priced.margin, dec("25"));
    }

    #[test]
    fn flight_cost_is_not_multiplied_by_pax() {
        let inputs = CostInputs::Flight {
            cost_price: dec("1200"),
            pax_count: 3,
        };
        let priced = price(&inputs, &terms("1500"), today()).unwrap();
        assert_eq!(priced.total_cost, dec("1200"));
        assert_eq!(priced.margin, dec("300"));
    }

    #[test]
    fn negative_inputs_name_the_field() {
        let inputs = CostInputs::Transfer {
            cost_price: dec("-1"),
        };
        let err = total_cost(&inputs).unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "cost_price"));

        let inputs = self_operated_tour("100", "-5", "0", None);
        let err = total_cost(&inputs).unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "vehicle_cost"));

        let inputs = CostInputs::Transfer {
            cost_price: dec("10"),
        };
        let err = price(&inputs, &terms("-3"), today()).unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "sell_price"));
    }

    #[test]
    fn amounts_beyond_the_money_columns_are_rejected() {
        let inputs = CostInputs::Transfer {
            cost_price: dec("10000000000000"),
        };
        let err = total_cost(&inputs).unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "cost_price"));

        let inputs = CostInputs::Transfer {
            cost_price: dec("999999999999.99"),
        };
        assert_eq!(total_cost(&inputs).unwrap(), max_money());

        let inputs = CostInputs::Transfer {
            cost_price: dec("10"),
        };
        let err = price(&inputs, &terms("1000000000000"), today()).unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "sell_price"));
    }

    #[test]
    fn huge_inputs_fail_validation_instead_of_overflowing() {
        let inputs = CostInputs::Hotel {
            cost_per_night: Decimal::MAX,
            check_in: date(2025, 12, 10),
            check_out: date(2025, 12, 12),
            number_of_rooms: 1,
        };
        let err = total_cost(&inputs).unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "cost_per_night"));

        let inputs = CostInputs::Tour {
            operation_type: OperationType::SelfOperated,
            supplier_cost: None,
            guide_cost: Some(Decimal::MAX),
            vehicle_cost: Some(Decimal::MAX),
            entrance_fees: None,
            other_costs: None,
            pax_count: 2,
        };
        let err = total_cost(&inputs).unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "guide_cost"));
    }

    #[test]
    fn products_and_sums_past_the_column_limit_name_the_input() {
        let inputs = hotel(
            "600000000000",
            date(2025, 12, 10),
            date(2025, 12, 12),
            1,
        );
        let err = total_cost(&inputs).unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "cost_per_night"));

        let inputs = self_operated_tour("600000000000", "600000000000", "0", None);
        let err = total_cost(&inputs).unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "vehicle_cost"));
    }

    #[test]
    fn supplier_payment_status_follows_paid_amount() {
        let inputs = CostInputs::Transfer {
            cost_price: dec("100"),
        };
        let mut line_terms = terms("150");
        line_terms.paid_amount = dec("40");
        assert_eq!(
            price(&inputs, &line_terms, today()).unwrap().payment_status,
            PaymentStatus::Partial
        );

        line_terms.paid_amount = Decimal::ZERO;
        line_terms.payment_due_date = Some(date(2025, 10, 15));
        assert_eq!(
            price(&inputs, &line_terms, today()).unwrap().payment_status,
            PaymentStatus::Overdue
        );
    }

    #[test]
    fn margin_identity_holds_across_inputs() {
        for (cost, sell) in [("0", "0"), ("10.10", "9.99"), ("999.99", "1200.00")] {
            let inputs = CostInputs::Transfer {
                cost_price: dec(cost),
            };
            let priced = price(&inputs, &terms(sell), today()).unwrap();
            assert_eq!(priced.margin, dec(sell) - priced.total_cost);
        }
    }
}
