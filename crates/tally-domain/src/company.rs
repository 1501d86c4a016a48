//! The company aggregate handed to and from the persistence gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{budget::Budget, common::*, invoice::Invoice, journal::JournalEntry};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    #[serde(default = "Company::default_currency")]
    pub currency: String,
    #[serde(default)]
    pub budgets: Vec<Budget>,
    #[serde(default)]
    pub invoices: Vec<Invoice>,
    #[serde(default)]
    pub journal_entries: Vec<JournalEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Company {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            currency: Self::default_currency(),
            budgets: Vec::new(),
            invoices: Vec::new(),
            journal_entries: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn default_currency() -> String {
        "USD".into()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn budget(&self, id: Uuid) -> Option<&Budget> {
        self.budgets.iter().find(|budget| budget.id == id)
    }

    pub fn budget_mut(&mut self, id: Uuid) -> Option<&mut Budget> {
        self.budgets.iter_mut().find(|budget| budget.id == id)
    }

    pub fn journal_entry(&self, id: Uuid) -> Option<&JournalEntry> {
        self.journal_entries.iter().find(|entry| entry.id == id)
    }

    pub fn journal_entry_mut(&mut self, id: Uuid) -> Option<&mut JournalEntry> {
        self.journal_entries.iter_mut().find(|entry| entry.id == id)
    }

    pub fn invoice(&self, id: Uuid) -> Option<&Invoice> {
        self.invoices.iter().find(|invoice| invoice.id == id)
    }
}

impl Identifiable for Company {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for Company {
    fn name(&self) -> &str {
        &self.name
    }
}
