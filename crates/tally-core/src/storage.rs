use std::{
    collections::{BTreeMap, HashSet},
    sync::RwLock,
};

use rust_decimal::Decimal;
use tally_domain::{Company, Displayable};
use uuid::Uuid;

use crate::CoreError;

/// Abstraction over persistence backends capable of storing company aggregates.
///
/// Saves replace the stored aggregate wholesale; concurrent writers follow
/// last-write-wins semantics.
pub trait CompanyStore: Send + Sync {
    fn load(&self, id: Uuid) -> Result<Option<Company>, CoreError>;
    fn save(&self, company: &Company) -> Result<(), CoreError>;
    fn list(&self) -> Result<Vec<Uuid>, CoreError>;
    fn delete(&self, id: Uuid) -> Result<(), CoreError>;
}

/// Process-local store keeping companies in memory.
#[derive(Debug, Default)]
pub struct InMemoryCompanyStore {
    companies: RwLock<BTreeMap<Uuid, Company>>,
}

impl InMemoryCompanyStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> CoreError {
        CoreError::Storage("in-memory store lock poisoned".into())
    }
}

impl CompanyStore for InMemoryCompanyStore {
    fn load(&self, id: Uuid) -> Result<Option<Company>, CoreError> {
        let companies = self.companies.read().map_err(|_| Self::poisoned())?;
        Ok(companies.get(&id).cloned())
    }

    fn save(&self, company: &Company) -> Result<(), CoreError> {
        let mut companies = self.companies.write().map_err(|_| Self::poisoned())?;
        companies.insert(company.id, company.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<Uuid>, CoreError> {
        let companies = self.companies.read().map_err(|_| Self::poisoned())?;
        Ok(companies.keys().copied().collect())
    }

    fn delete(&self, id: Uuid) -> Result<(), CoreError> {
        let mut companies = self.companies.write().map_err(|_| Self::poisoned())?;
        companies.remove(&id);
        Ok(())
    }
}

/// Detects inconsistencies a loaded company snapshot should not contain.
pub fn company_warnings(company: &Company) -> Vec<String> {
    let mut warnings = Vec::new();

    for budget in &company.budgets {
        let mut seen = HashSet::new();
        for category in &budget.categories {
            if !seen.insert(category.id) {
                warnings.push(format!(
                    "budget {} contains duplicate category id {}",
                    budget.id, category.id
                ));
            }
            if category.budgeted <= Decimal::ZERO {
                warnings.push(format!(
                    "budget {} category `{}` has a non-positive budgeted amount",
                    budget.id,
                    category.display_label()
                ));
            }
        }
        if budget.end_date < budget.start_date {
            warnings.push(format!("budget {} ends before it starts", budget.id));
        }
    }

    for entry in company.journal_entries.iter().filter(|entry| entry.is_posted()) {
        if !entry.totals().is_balanced() {
            warnings.push(format!(
                "posted journal entry `{}` is not balanced",
                entry.display_label()
            ));
        }
        if entry.lines().iter().any(|line| line.has_both_sides()) {
            warnings.push(format!(
                "posted journal entry `{}` has a line with both debit and credit",
                entry.display_label()
            ));
        }
    }
    warnings
}
