//! Receivable invoices as seen by the aging classifier.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum InvoiceStatus {
    Draft,
    #[default]
    Outstanding,
    Overdue,
    Paid,
}

impl InvoiceStatus {
    pub fn is_settled(self) -> bool {
        self == InvoiceStatus::Paid
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InvoiceStatus::Draft => "Draft",
            InvoiceStatus::Outstanding => "Outstanding",
            InvoiceStatus::Overdue => "Overdue",
            InvoiceStatus::Paid => "Paid",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Invoice {
    pub id: Uuid,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub customer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<NaiveDate>,
    pub due_date: NaiveDate,
    pub total: Money,
    #[serde(default)]
    pub status: InvoiceStatus,
}

impl Invoice {
    pub fn new(customer: impl Into<String>, due_date: NaiveDate, total: Money) -> Self {
        Self {
            id: Uuid::new_v4(),
            number: String::new(),
            customer: customer.into(),
            issue_date: None,
            due_date,
            total,
            status: InvoiceStatus::default(),
        }
    }

    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = number.into();
        self
    }

    pub fn with_status(mut self, status: InvoiceStatus) -> Self {
        self.status = status;
        self
    }
}

impl Identifiable for Invoice {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Displayable for Invoice {
    fn display_label(&self) -> String {
        if self.number.is_empty() {
            format!("{} due {}", self.customer, self.due_date)
        } else {
            format!("{} {} due {}", self.number, self.customer, self.due_date)
        }
    }
}
