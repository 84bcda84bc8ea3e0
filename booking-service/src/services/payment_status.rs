//! Payment status resolution shared by bookings, line items and supplier payables.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::PaymentStatus;

/// Amounts closer than one cent are treated as equal.
pub const PAYMENT_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// An amount owed, how much of it has been settled and when it falls due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentPosition {
    pub owed: Decimal,
    pub paid: Decimal,
    pub due_date: Option<NaiveDate>,
}

impl PaymentPosition {
    /// What a client owes on a booking. Bookings carry no due date.
    pub fn receivable(total_sell_price: Decimal, amount_received: Decimal) -> Self {
        Self {
            owed: total_sell_price,
            paid: amount_received,
            due_date: None,
        }
    }

    /// What the agency owes a supplier.
    pub fn payable(owed: Decimal, paid: Decimal, due_date: Option<NaiveDate>) -> Self {
        Self {
            owed,
            paid,
            due_date,
        }
    }

    /// Remaining balance, never negative.
    pub fn outstanding(&self) -> Decimal {
        (self.owed - self.paid).max(Decimal::ZERO)
    }

    pub fn status(&self, today: NaiveDate) -> PaymentStatus {
        resolve(self.owed, self.paid, self.due_date, today)
    }
}

/// Nothing paid is pending (overdue once the due date has passed), enough
/// paid is paid, anything in between is partial.
pub fn resolve(
    owed: Decimal,
    paid: Decimal,
    due_date: Option<NaiveDate>,
    today: NaiveDate,
) -> PaymentStatus {
    if paid < PAYMENT_EPSILON {
        return match due_date {
            Some(due) if due < today => PaymentStatus::Overdue,
            _ => PaymentStatus::Pending,
        };
    }

    if paid >= owed - PAYMENT_EPSILON {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Partial
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, d).unwrap()
    }

    #[test]
    fn nothing_paid_is_pending_until_due() {
        assert_eq!(resolve(dec("100"), dec("0"), None, day(10)), PaymentStatus::Pending);
        assert_eq!(
            resolve(dec("100"), dec("0"), Some(day(10)), day(10)),
            PaymentStatus::Pending
        );
        assert_eq!(
            resolve(dec("100"), dec("0"), Some(day(9)), day(10)),
            PaymentStatus::Overdue
        );
    }

    #[test]
    fn partial_and_paid() {
        assert_eq!(resolve(dec("650"), dec("500"), None, day(10)), PaymentStatus::Partial);
        assert_eq!(resolve(dec("650"), dec("650"), None, day(10)), PaymentStatus::Paid);
        assert_eq!(resolve(dec("650"), dec("700"), None, day(10)), PaymentStatus::Paid);
    }

    #[test]
    fn paid_within_a_cent_counts_as_paid() {
        assert_eq!(
            resolve(dec("100.00"), dec("99.995"), None, day(10)),
            PaymentStatus::Paid
        );
        assert_eq!(
            resolve(dec("100.00"), dec("99.98"), None, day(10)),
            PaymentStatus::Partial
        );
    }

    #[test]
    fn part_payment_is_never_overdue() {
        assert_eq!(
            resolve(dec("100"), dec("10"), Some(day(1)), day(10)),
            PaymentStatus::Partial
        );
    }

    #[test]
    fn empty_booking_is_pending() {
        let position = PaymentPosition::receivable(Decimal::ZERO, Decimal::ZERO);
        assert_eq!(position.status(day(10)), PaymentStatus::Pending);
        assert_eq!(position.outstanding(), Decimal::ZERO);
    }

    #[test]
    fn more_payment_never_moves_status_backwards() {
        fn rank(status: PaymentStatus) -> u8 {
            match status {
                PaymentStatus::Pending | PaymentStatus::Overdue => 0,
                PaymentStatus::Partial => 1,
                PaymentStatus::Paid => 2,
            }
        }

        let owed = dec("300.00");
        let mut previous = 0;
        for cents in (0..=35_000).step_by(250) {
            let paid = Decimal::new(cents, 2);
            let current = rank(resolve(owed, paid, Some(day(1)), day(10)));
            assert!(current >= previous, "status regressed at paid={}", paid);
            previous = current;
        }
        assert_eq!(previous, 2);
    }

    #[test]
    fn resolution_is_pure() {
        let a = resolve(dec("80"), dec("20"), Some(day(3)), day(10));
        let b = resolve(dec("80"), dec("20"), Some(day(3)), day(10));
        assert_eq!(a, b);
    }

    #[test]
    fn outstanding_is_never_negative() {
        let position = PaymentPosition::payable(dec("100"), dec("120"), None);
        assert_eq!(position.outstanding(), Decimal::ZERO);
        let position = PaymentPosition::payable(dec("100"), dec("40"), None);
        assert_eq!(position.outstanding(), dec("60"));
    }
}
