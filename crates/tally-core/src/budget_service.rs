//! Budget category maintenance and budgeted-vs-actual aggregation.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_domain::{Budget, BudgetCategory, CategoryKind, Company, Money};
use tracing::debug;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, EntityKind};
use crate::money::{ensure_amount_in_range, percent_of};

/// Aggregated budgeted and actual amounts for a set of categories.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct BudgetTotals {
    pub total_budgeted: Money,
    pub total_actual: Money,
    /// `total_budgeted - total_actual`; negative means over budget.
    pub variance: Money,
    /// Variance as a percentage of the budgeted total, zero when nothing is budgeted.
    pub variance_percent: Decimal,
}

impl BudgetTotals {
    pub fn from_categories<'a>(categories: impl IntoIterator<Item = &'a BudgetCategory>) -> Self {
        let (total_budgeted, total_actual) = categories.into_iter().fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(budgeted, actual), category| {
                (
                    budgeted.saturating_add(category.budgeted),
                    actual.saturating_add(category.actual),
                )
            },
        );
        let variance = total_budgeted.saturating_sub(total_actual);
        let variance_percent = if total_budgeted > Decimal::ZERO {
            percent_of(variance, total_budgeted).unwrap_or(Decimal::ZERO)
        } else {
            Decimal::ZERO
        };
        Self {
            total_budgeted,
            total_actual,
            variance,
            variance_percent,
        }
    }

    pub fn is_over_budget(&self) -> bool {
        self.variance < Decimal::ZERO
    }
}

/// Partial edit of a category. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub kind: Option<CategoryKind>,
    pub budgeted: Option<Money>,
}

/// Cut-offs, in percent of budget used, for advisory utilization insights.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct InsightThresholds {
    pub high_percent: Decimal,
    pub low_percent: Decimal,
}

impl InsightThresholds {
    pub fn new(high_percent: u32, low_percent: u32) -> Self {
        Self {
            high_percent: Decimal::from(high_percent),
            low_percent: Decimal::from(low_percent),
        }
    }
}

impl Default for InsightThresholds {
    fn default() -> Self {
        Self::new(90, 50)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum InsightKind {
    HighUtilization,
    LowUtilization,
    OverBudget,
}

impl fmt::Display for InsightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InsightKind::HighUtilization => "High utilization",
            InsightKind::LowUtilization => "Low utilization / surplus",
            InsightKind::OverBudget => "Over budget",
        };
        f.write_str(label)
    }
}

/// Informational observation about one category. Never changes state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UtilizationInsight {
    pub category_id: Uuid,
    pub category_name: String,
    pub kind: InsightKind,
    pub utilization_percent: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetSummary {
    pub budget_id: Uuid,
    pub totals: BudgetTotals,
    pub income: BudgetTotals,
    pub expense: BudgetTotals,
    pub insights: Vec<UtilizationInsight>,
}

/// Stateless budgeting operations over explicitly supplied budgets.
pub struct BudgetService;

impl BudgetService {
    /// Validates and registers a new budget on the company.
    pub fn create_budget(company: &mut Company, budget: Budget) -> CoreResult<Uuid> {
        if budget.name.trim().is_empty() {
            return Err(CoreError::Validation("Budget name is required".into()));
        }
        if budget.end_date < budget.start_date {
            return Err(CoreError::Validation(format!(
                "Budget `{}` ends ({}) before it starts ({})",
                budget.name, budget.end_date, budget.start_date
            )));
        }
        for category in &budget.categories {
            Self::validate_category(&category.name, category.budgeted)?;
        }
        let id = budget.id;
        debug!(budget = %id, name = %budget.name, "budget created");
        company.budgets.push(budget);
        company.touch();
        Ok(id)
    }

    pub fn budget_mut(company: &mut Company, budget_id: Uuid) -> CoreResult<&mut Budget> {
        company
            .budget_mut(budget_id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Budget, budget_id))
    }

    pub fn calculate_budget_totals(categories: &[BudgetCategory]) -> BudgetTotals {
        BudgetTotals::from_categories(categories)
    }

    /// Appends a category after checking its name and budgeted amount.
    pub fn add_category(budget: &mut Budget, mut category: BudgetCategory) -> CoreResult<Uuid> {
        Self::validate_category(&category.name, category.budgeted)?;
        ensure_amount_in_range(category.actual)?;
        category.name = category.name.trim().to_string();
        let id = category.id;
        debug!(budget = %budget.id, category = %id, name = %category.name, "category added");
        budget.categories.push(category);
        Ok(id)
    }

    /// Replaces the actual amount of a category and returns the new budget totals.
    pub fn update_actual(
        budget: &mut Budget,
        category_id: Uuid,
        new_actual: Money,
    ) -> CoreResult<BudgetTotals> {
        ensure_amount_in_range(new_actual)?;
        let category = Self::category_mut(budget, category_id)?;
        category.actual = new_actual;
        debug!(
            budget = %budget.id,
            category = %category_id,
            actual = %new_actual,
            "actual updated"
        );
        Ok(Self::calculate_budget_totals(&budget.categories))
    }

    /// Adds `amount` to the category's actual and returns the new budget totals.
    pub fn record_actual(
        budget: &mut Budget,
        category_id: Uuid,
        amount: Money,
    ) -> CoreResult<BudgetTotals> {
        let category = Self::category_mut(budget, category_id)?;
        let actual = category
            .actual
            .checked_add(amount)
            .ok_or_else(|| CoreError::Validation(format!("Amount {amount} is out of range")))
            .and_then(ensure_amount_in_range)?;
        category.actual = actual;
        debug!(
            budget = %budget.id,
            category = %category_id,
            amount = %amount,
            "actual recorded"
        );
        Ok(Self::calculate_budget_totals(&budget.categories))
    }

    pub fn update_category(
        budget: &mut Budget,
        category_id: Uuid,
        changes: CategoryChanges,
    ) -> CoreResult<()> {
        let category = Self::category_mut(budget, category_id)?;
        let name = changes.name.as_deref().unwrap_or(&category.name);
        let budgeted = changes.budgeted.unwrap_or(category.budgeted);
        Self::validate_category(name, budgeted)?;

        if let Some(name) = changes.name {
            category.name = name.trim().to_string();
        }
        if let Some(kind) = changes.kind {
            category.kind = kind;
        }
        category.budgeted = budgeted;
        Ok(())
    }

    pub fn remove_category(budget: &mut Budget, category_id: Uuid) -> CoreResult<BudgetCategory> {
        let position = budget
            .categories
            .iter()
            .position(|category| category.id == category_id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Category, category_id))?;
        Ok(budget.categories.remove(position))
    }

    /// `actual / budgeted * 100`, or `None` when nothing was budgeted.
    pub fn utilization(category: &BudgetCategory) -> Option<Decimal> {
        if category.budgeted > Decimal::ZERO {
            percent_of(category.actual, category.budgeted)
        } else {
            None
        }
    }

    pub fn insights(budget: &Budget, thresholds: InsightThresholds) -> Vec<UtilizationInsight> {
        let mut insights = Vec::new();
        for category in &budget.categories {
            let utilization = Self::utilization(category);
            let mut push = |kind| {
                insights.push(UtilizationInsight {
                    category_id: category.id,
                    category_name: category.name.clone(),
                    kind,
                    utilization_percent: utilization,
                })
            };
            if category.is_over_budget() {
                push(InsightKind::OverBudget);
            }
            match utilization {
                Some(percent) if percent > thresholds.high_percent => {
                    push(InsightKind::HighUtilization)
                }
                Some(percent) if percent < thresholds.low_percent => {
                    push(InsightKind::LowUtilization)
                }
                _ => {}
            }
        }
        insights
    }

    pub fn summarize(budget: &Budget, thresholds: InsightThresholds) -> BudgetSummary {
        let of_kind = |kind: CategoryKind| {
            BudgetTotals::from_categories(
                budget
                    .categories
                    .iter()
                    .filter(move |category| category.kind == kind),
            )
        };
        BudgetSummary {
            budget_id: budget.id,
            totals: Self::calculate_budget_totals(&budget.categories),
            income: of_kind(CategoryKind::Income),
            expense: of_kind(CategoryKind::Expense),
            insights: Self::insights(budget, thresholds),
        }
    }

    fn category_mut(budget: &mut Budget, category_id: Uuid) -> CoreResult<&mut BudgetCategory> {
        budget
            .category_mut(category_id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Category, category_id))
    }

    fn validate_category(name: &str, budgeted: Money) -> CoreResult<()> {
        if name.trim().is_empty() {
            return Err(CoreError::Validation("Category name is required".into()));
        }
        if budgeted <= Decimal::ZERO {
            return Err(CoreError::Validation(format!(
                "Budgeted amount for `{}` must be greater than zero",
                name.trim()
            )));
        }
        ensure_amount_in_range(budgeted)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::{parse_amount, MAX_AMOUNT};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tally_domain::BudgetPeriod;

    fn sample_budget() -> Budget {
        Budget::new(
            "Operating",
            BudgetPeriod::Monthly,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
        )
    }

    fn expense(name: &str, budgeted: Money, actual: Money) -> BudgetCategory {
        BudgetCategory::new(name, CategoryKind::Expense, budgeted).with_actual(actual)
    }

    fn add(budget: &mut Budget, category: BudgetCategory) -> Uuid {
        BudgetService::add_category(budget, category).unwrap()
    }

    #[test]
    fn totals_match_reference_scenario() {
        let categories = vec![
            expense("Payroll", dec!(1000), dec!(950)),
            expense("Marketing", dec!(500), dec!(600)),
        ];
        let totals = BudgetService::calculate_budget_totals(&categories);

        assert_eq!(totals.total_budgeted, dec!(1500));
        assert_eq!(totals.total_actual, dec!(1550));
        assert_eq!(totals.variance, dec!(-50));
        assert_eq!(totals.variance_percent.round_dp(1), dec!(-3.3));
        assert!(totals.is_over_budget());
    }

    #[test]
    fn totals_are_idempotent() {
        let categories = vec![expense("Rent", dec!(1200), dec!(1200.005))];
        let first = BudgetService::calculate_budget_totals(&categories);
        let second = BudgetService::calculate_budget_totals(&categories);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_budget_has_zero_variance_percent() {
        let totals = BudgetService::calculate_budget_totals(&[]);
        assert_eq!(totals, BudgetTotals::default());
    }

    #[test]
    fn add_category_rejects_blank_name_and_non_positive_budget() {
        let mut budget = sample_budget();
        let blank = BudgetCategory::new("   ", CategoryKind::Expense, dec!(10));
        let zero = BudgetCategory::new("Office", CategoryKind::Expense, Decimal::ZERO);
        let negative = BudgetCategory::new("Office", CategoryKind::Expense, dec!(-1));

        for category in [blank, zero, negative] {
            let err = BudgetService::add_category(&mut budget, category).expect_err("invalid");
            assert!(matches!(err, CoreError::Validation(_)), "{err:?}");
        }
        assert!(budget.categories.is_empty());
    }

    #[test]
    fn add_category_trims_name() {
        let mut budget = sample_budget();
        let id = BudgetService::add_category(
            &mut budget,
            BudgetCategory::new("  Office  ", CategoryKind::Expense, dec!(10)),
        )
        .unwrap();
        assert_eq!(budget.category(id).unwrap().name, "Office");
    }

    #[test]
    fn update_actual_replaces_and_recomputes() {
        let mut budget = sample_budget();
        let id = add(&mut budget, expense("Rent", dec!(800), dec!(0)));
        add(&mut budget, expense("Utilities", dec!(200), dec!(150)));

        let totals = BudgetService::update_actual(&mut budget, id, dec!(820)).unwrap();
        assert_eq!(budget.category(id).unwrap().actual, dec!(820));
        assert_eq!(totals.total_actual, dec!(970));
        assert_eq!(totals.variance, dec!(30));
    }

    #[test]
    fn update_actual_on_unknown_category_is_not_found() {
        let mut budget = sample_budget();
        add(&mut budget, expense("Rent", dec!(800), dec!(10)));
        let before = budget.clone();

        let err = BudgetService::update_actual(&mut budget, Uuid::new_v4(), dec!(1))
            .expect_err("missing category");
        assert!(matches!(
            err,
            CoreError::NotFound {
                kind: EntityKind::Category,
                ..
            }
        ));
        assert_eq!(budget, before);
    }

    #[test]
    fn record_actual_accumulates() {
        let mut budget = sample_budget();
        let id = add(&mut budget, expense("Fuel", dec!(100), dec!(0)));
        BudgetService::record_actual(&mut budget, id, dec!(30)).unwrap();
        let totals = BudgetService::record_actual(&mut budget, id, dec!(12.5)).unwrap();
        assert_eq!(totals.total_actual, dec!(42.5));
    }

    #[test]
    fn update_category_validates_before_mutating() {
        let mut budget = sample_budget();
        let id = add(&mut budget, expense("Fuel", dec!(100), dec!(0)));
        let err = BudgetService::update_category(
            &mut budget,
            id,
            CategoryChanges {
                name: Some("Transport".into()),
                budgeted: Some(Decimal::ZERO),
                ..CategoryChanges::default()
            },
        )
        .expect_err("zero budget");
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(budget.category(id).unwrap().name, "Fuel");

        BudgetService::update_category(
            &mut budget,
            id,
            CategoryChanges {
                name: Some("Transport".into()),
                kind: Some(CategoryKind::Expense),
                budgeted: Some(dec!(150)),
            },
        )
        .unwrap();
        let category = budget.category(id).unwrap();
        assert_eq!(category.name, "Transport");
        assert_eq!(category.budgeted, dec!(150));
    }

    #[test]
    fn remove_category_reports_missing_ids() {
        let mut budget = sample_budget();
        let id = add(&mut budget, expense("Fuel", dec!(100), dec!(0)));
        let removed = BudgetService::remove_category(&mut budget, id).unwrap();
        assert_eq!(removed.id, id);
        assert!(BudgetService::remove_category(&mut budget, id).is_err());
    }

    #[test]
    fn insights_flag_high_low_and_over_budget() {
        let mut budget = sample_budget();
        let high = add(&mut budget, expense("Rent", dec!(100), dec!(95)));
        let low = add(&mut budget, expense("Travel", dec!(100), dec!(20)));
        let over = add(&mut budget, expense("Legal", dec!(100), dec!(130)));
        add(&mut budget, expense("Software", dec!(100), dec!(70)));

        let insights = BudgetService::insights(&budget, InsightThresholds::default());
        let kinds_for = |id: Uuid| {
            insights
                .iter()
                .filter(|insight| insight.category_id == id)
                .map(|insight| insight.kind)
                .collect::<Vec<_>>()
        };

        assert_eq!(kinds_for(high), vec![InsightKind::HighUtilization]);
        assert_eq!(kinds_for(low), vec![InsightKind::LowUtilization]);
        assert_eq!(
            kinds_for(over),
            vec![InsightKind::OverBudget, InsightKind::HighUtilization]
        );
        assert_eq!(insights.len(), 4);
    }

    #[test]
    fn oversized_actual_is_rejected_without_mutating() {
        let mut budget = sample_budget();
        let tiny = parse_amount("0.0000000001");
        let id = add(&mut budget, expense("Dust", tiny, Decimal::ZERO));
        let before = budget.clone();

        let huge = parse_amount("100000000000000000000");
        let err = BudgetService::update_actual(&mut budget, id, huge).expect_err("out of range");
        assert!(matches!(err, CoreError::Validation(_)));
        let err = BudgetService::record_actual(&mut budget, id, huge).expect_err("out of range");
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(budget, before);

        BudgetService::update_actual(&mut budget, id, MAX_AMOUNT).unwrap();
        let summary = BudgetService::summarize(&budget, InsightThresholds::default());
        assert_eq!(summary.insights[0].kind, InsightKind::OverBudget);
        let percent = MAX_AMOUNT * dec!(1_000_000_000_000);
        assert_eq!(summary.insights[1].utilization_percent, Some(percent));
    }

    #[test]
    fn totals_saturate_on_categories_loaded_from_storage() {
        let huge = parse_amount("50000000000000000000000000000");
        let mut budget = sample_budget();
        let err = BudgetService::add_category(&mut budget, expense("Big", huge, Decimal::ZERO))
            .expect_err("out of range");
        assert!(matches!(err, CoreError::Validation(_)));

        let categories = vec![
            expense("Big", huge, Decimal::ZERO),
            expense("Bigger", huge, Decimal::ZERO),
        ];
        let totals = BudgetService::calculate_budget_totals(&categories);
        assert_eq!(totals.total_budgeted, Decimal::MAX);
        assert_eq!(totals.variance, Decimal::MAX);
        assert_eq!(totals.variance_percent, dec!(100));

        let dust = expense("Dust", parse_amount("0.0000000001"), Decimal::MAX);
        assert_eq!(BudgetService::utilization(&dust), Some(Decimal::MAX));
        let totals = BudgetService::calculate_budget_totals(&[dust]);
        assert!(totals.is_over_budget());
    }

    #[test]
    fn summary_splits_income_and_expense() {
        let mut budget = sample_budget();
        BudgetService::add_category(
            &mut budget,
            BudgetCategory::new("Sales", CategoryKind::Income, dec!(5000)).with_actual(dec!(5500)),
        )
        .unwrap();
        add(&mut budget, expense("Rent", dec!(1000), dec!(1000)));

        let summary = BudgetService::summarize(&budget, InsightThresholds::default());
        assert_eq!(summary.income.total_actual, dec!(5500));
        assert_eq!(summary.expense.total_budgeted, dec!(1000));
        assert_eq!(summary.totals.total_budgeted, dec!(6000));
    }
}
