//! Domain types representing budgets and their categories.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

/// Direction of money flowing through a budget category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Income,
    Expense,
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CategoryKind::Income => "Income",
            CategoryKind::Expense => "Expense",
        };
        f.write_str(label)
    }
}

/// A single budgeted line with the amount actually recorded against it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetCategory {
    pub id: Uuid,
    pub name: String,
    pub kind: CategoryKind,
    pub budgeted: Money,
    #[serde(default)]
    pub actual: Money,
}

impl BudgetCategory {
    pub fn new(name: impl Into<String>, kind: CategoryKind, budgeted: Money) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            budgeted,
            actual: Decimal::ZERO,
        }
    }

    pub fn with_actual(mut self, actual: Money) -> Self {
        self.actual = actual;
        self
    }

    /// `budgeted - actual`; positive means under budget.
    pub fn variance(&self) -> Money {
        self.budgeted.saturating_sub(self.actual)
    }

    pub fn is_over_budget(&self) -> bool {
        self.actual > self.budgeted
    }
}

impl Identifiable for BudgetCategory {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for BudgetCategory {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Displayable for BudgetCategory {
    fn display_label(&self) -> String {
        format!("{} ({})", self.name, self.kind)
    }
}

/// Canonical budgeting cadences.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum BudgetPeriod {
    #[default]
    Monthly,
    Quarterly,
    Yearly,
    Custom,
}

impl fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BudgetPeriod::Monthly => "Monthly",
            BudgetPeriod::Quarterly => "Quarterly",
            BudgetPeriod::Yearly => "Yearly",
            BudgetPeriod::Custom => "Custom",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum BudgetStatus {
    #[default]
    Draft,
    Active,
    Closed,
}

impl fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BudgetStatus::Draft => "Draft",
            BudgetStatus::Active => "Active",
            BudgetStatus::Closed => "Closed",
        };
        f.write_str(label)
    }
}

/// A named plan covering a date range, made of budget categories.
///
/// Totals are always derived from the categories and never stored, so the
/// budget-level sums cannot drift from the category amounts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Budget {
    pub id: Uuid,
    pub name: String,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub status: BudgetStatus,
    #[serde(default)]
    pub categories: Vec<BudgetCategory>,
}

impl Budget {
    pub fn new(
        name: impl Into<String>,
        period: BudgetPeriod,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            period,
            start_date,
            end_date,
            status: BudgetStatus::default(),
            categories: Vec::new(),
        }
    }

    pub fn category(&self, id: Uuid) -> Option<&BudgetCategory> {
        self.categories.iter().find(|category| category.id == id)
    }

    pub fn category_mut(&mut self, id: Uuid) -> Option<&mut BudgetCategory> {
        self.categories.iter_mut().find(|category| category.id == id)
    }

    pub fn total_budgeted(&self) -> Money {
        self.categories
            .iter()
            .fold(Decimal::ZERO, |sum, category| {
                sum.saturating_add(category.budgeted)
            })
    }

    pub fn total_actual(&self) -> Money {
        self.categories
            .iter()
            .fold(Decimal::ZERO, |sum, category| {
                sum.saturating_add(category.actual)
            })
    }
}

impl Identifiable for Budget {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for Budget {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn totals_are_derived_from_categories() {
        let mut budget = Budget::new(
            "FY25",
            BudgetPeriod::Yearly,
            date(2025, 1, 1),
            date(2025, 12, 31),
        );
        budget.categories.push(
            BudgetCategory::new("Rent", CategoryKind::Expense, dec!(1000)).with_actual(dec!(950)),
        );
        budget.categories.push(
            BudgetCategory::new("Travel", CategoryKind::Expense, dec!(500)).with_actual(dec!(600)),
        );

        assert_eq!(budget.total_budgeted(), dec!(1500));
        assert_eq!(budget.total_actual(), dec!(1550));
        assert!(budget.categories[1].is_over_budget());
        assert_eq!(budget.categories[0].variance(), dec!(50));
    }

    #[test]
    fn category_kind_serializes_lowercase() {
        let json = serde_json::to_string(&CategoryKind::Income).unwrap();
        assert_eq!(json, "\"income\"");
    }
}
