//! Operational expenses: overhead that belongs to no booking.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use service_core::error::AppError;
use std::collections::BTreeMap;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::models::{
    round_money, CategoryTotal, CreateExpense, ExpenseSummary, ListExpensesFilter, MonthlyExpense,
    OperationalExpense, DEFAULT_CURRENCY,
};
use crate::services::database::{db_error, Database};
use crate::services::ledger::within_money_range;
use crate::services::metrics::DB_QUERY_DURATION;

const EXPENSE_COLUMNS: &str = "expense_id, expense_date, category, description, amount, \
    currency, is_recurring, created_utc";

/// Fold a year's expenses into monthly, per-category and recurring splits.
/// Categories are ordered by descending total, then name.
pub fn summarize_expenses(year: i32, expenses: &[OperationalExpense]) -> ExpenseSummary {
    let mut monthly = [Decimal::ZERO; 12];
    let mut by_category: BTreeMap<&str, Decimal> = BTreeMap::new();
    let mut recurring_total = Decimal::ZERO;
    let mut one_off_total = Decimal::ZERO;

    for expense in expenses.iter().filter(|e| e.expense_date.year() == year) {
        monthly[expense.expense_date.month0() as usize] += expense.amount;
        *by_category.entry(expense.category.as_str()).or_default() += expense.amount;
        if expense.is_recurring {
            recurring_total += expense.amount;
        } else {
            one_off_total += expense.amount;
        }
    }

    let mut by_category: Vec<CategoryTotal> = by_category
        .into_iter()
        .map(|(category, total)| CategoryTotal {
            category: category.to_string(),
            total,
        })
        .collect();
    by_category.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));

    ExpenseSummary {
        year,
        total: recurring_total + one_off_total,
        monthly: monthly
            .iter()
            .enumerate()
            .map(|(i, total)| MonthlyExpense {
                month: i as u32 + 1,
                total: *total,
            })
            .collect(),
        by_category,
        recurring_total,
        one_off_total,
    }
}

impl Database {
    #[instrument(skip(self, input), fields(category = %input.category))]
    pub async fn create_expense(
        &self,
        input: &CreateExpense,
    ) -> Result<OperationalExpense, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_expense"])
            .start_timer();

        let amount = round_money(input.amount);
        if amount <= Decimal::ZERO {
            return Err(AppError::validation(
                "amount",
                "amount must be greater than zero",
            ));
        }
        let amount = within_money_range("amount", amount)?;

        let expense = sqlx::query_as::<_, OperationalExpense>(&format!(
            r#"
            INSERT INTO operational_expenses (
                expense_id, expense_date, category, description, amount, currency, is_recurring
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            EXPENSE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(input.expense_date)
        .bind(&input.category)
        .bind(&input.description)
        .bind(amount)
        .bind(input.currency.as_deref().unwrap_or(DEFAULT_CURRENCY))
        .bind(input.is_recurring)
        .fetch_one(self.pool())
        .await
        .map_err(db_error("create expense"))?;

        timer.observe_duration();

        info!(
            expense_id = %expense.expense_id,
            amount = %expense.amount,
            "Operational expense recorded"
        );

        Ok(expense)
    }

    #[instrument(skip(self))]
    pub async fn list_expenses(
        &self,
        filter: &ListExpensesFilter,
    ) -> Result<Vec<OperationalExpense>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_expenses"])
            .start_timer();

        let expenses = sqlx::query_as::<_, OperationalExpense>(&format!(
            r#"
            SELECT {}
            FROM operational_expenses
            WHERE ($1::date IS NULL OR expense_date >= $1)
              AND ($2::date IS NULL OR expense_date <= $2)
              AND ($3::text IS NULL OR category = $3)
            ORDER BY expense_date DESC, created_utc DESC
            "#,
            EXPENSE_COLUMNS
        ))
        .bind(filter.from_date)
        .bind(filter.to_date)
        .bind(&filter.category)
        .fetch_all(self.pool())
        .await
        .map_err(db_error("list expenses"))?;

        timer.observe_duration();

        Ok(expenses)
    }

    #[instrument(skip(self))]
    pub async fn expense_summary(&self, year: i32) -> Result<ExpenseSummary, AppError> {
        let (Some(from_date), Some(to_date)) = (
            NaiveDate::from_ymd_opt(year, 1, 1),
            NaiveDate::from_ymd_opt(year, 12, 31),
        ) else {
            return Err(AppError::BadRequest(anyhow::anyhow!("Invalid year {}", year)));
        };

        let expenses = self
            .list_expenses(&ListExpensesFilter {
                from_date: Some(from_date),
                to_date: Some(to_date),
                category: None,
            })
            .await?;

        Ok(summarize_expenses(year, &expenses))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn expense(date: (i32, u32, u32), category: &str, amount: &str, recurring: bool) -> OperationalExpense {
        OperationalExpense {
            expense_id: Uuid::new_v4(),
            expense_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            category: category.to_string(),
            description: None,
            amount: amount.parse().unwrap(),
            currency: "USD".to_string(),
            is_recurring: recurring,
            created_utc: Utc::now(),
        }
    }

    #[test]
    fn summary_splits_by_month_category_and_recurrence() {
        let expenses = vec![
            expense((2025, 1, 5), "rent", "1000", true),
            expense((2025, 2, 5), "rent", "1000", true),
            expense((2025, 2, 17), "marketing", "250.50", false),
            expense((2025, 12, 31), "software", "49.99", true),
        ];

        let summary = summarize_expenses(2025, &expenses);

        assert_eq!(summary.total.to_string(), "2300.49");
        assert_eq!(summary.monthly.len(), 12);
        assert_eq!(summary.monthly[0].total.to_string(), "1000");
        assert_eq!(summary.monthly[1].total.to_string(), "1250.50");
        assert_eq!(summary.monthly[11].month, 12);
        assert_eq!(summary.monthly[11].total.to_string(), "49.99");
        assert_eq!(summary.recurring_total.to_string(), "2049.99");
        assert_eq!(summary.one_off_total.to_string(), "250.50");
        assert_eq!(
            summary
                .by_category
                .iter()
                .map(|c| c.category.as_str())
                .collect::<Vec<_>>(),
            vec!["rent", "marketing", "software"]
        );
    }

    #[test]
    fn other_years_are_ignored() {
        let expenses = vec![expense((2024, 12, 31), "rent", "1000", true)];
        let summary = summarize_expenses(2025, &expenses);

        assert_eq!(summary.total, Decimal::ZERO);
        assert!(summary.by_category.is_empty());
        assert!(summary.monthly.iter().all(|m| m.total.is_zero()));
    }
}
