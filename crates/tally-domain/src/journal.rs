//! Double-entry journal entries and the line-level edit model.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

/// Largest debit/credit difference still considered balanced.
pub const BALANCE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// A write to one side of a journal line.
///
/// Writing one side always clears the other, so a line edited only through
/// [`JournalLine::apply`] never carries both a debit and a credit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "side", content = "amount", rename_all = "lowercase")]
pub enum LineEdit {
    Debit(Money),
    Credit(Money),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JournalLine {
    pub account: String,
    #[serde(default)]
    debit: Money,
    #[serde(default)]
    credit: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

impl JournalLine {
    /// Creates a line with neither side populated.
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            debit: Decimal::ZERO,
            credit: Decimal::ZERO,
            memo: None,
        }
    }

    pub fn debit(account: impl Into<String>, amount: Money) -> Self {
        let mut line = Self::new(account);
        line.apply(LineEdit::Debit(amount));
        line
    }

    pub fn credit(account: impl Into<String>, amount: Money) -> Self {
        let mut line = Self::new(account);
        line.apply(LineEdit::Credit(amount));
        line
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    pub fn apply(&mut self, edit: LineEdit) {
        match edit {
            LineEdit::Debit(amount) => {
                self.debit = amount;
                self.credit = Decimal::ZERO;
            }
            LineEdit::Credit(amount) => {
                self.credit = amount;
                self.debit = Decimal::ZERO;
            }
        }
    }

    pub fn debit_amount(&self) -> Money {
        self.debit
    }

    pub fn credit_amount(&self) -> Money {
        self.credit
    }

    /// Neither side carries an amount.
    pub fn is_empty(&self) -> bool {
        self.debit.is_zero() && self.credit.is_zero()
    }

    /// Both sides carry an amount. Only reachable through deserialized data.
    pub fn has_both_sides(&self) -> bool {
        !self.debit.is_zero() && !self.credit.is_zero()
    }

    /// The same line with debit and credit swapped.
    pub fn reversed(&self) -> Self {
        Self {
            account: self.account.clone(),
            debit: self.credit,
            credit: self.debit,
            memo: self.memo.clone(),
        }
    }
}

/// Independent sums of the debit and credit columns.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct JournalTotals {
    pub total_debits: Money,
    pub total_credits: Money,
}

impl JournalTotals {
    pub fn from_lines(lines: &[JournalLine]) -> Self {
        lines.iter().fold(Self::default(), |mut totals, line| {
            totals.total_debits = totals.total_debits.saturating_add(line.debit);
            totals.total_credits = totals.total_credits.saturating_add(line.credit);
            totals
        })
    }

    /// `total_debits - total_credits`.
    pub fn difference(&self) -> Money {
        self.total_debits.saturating_sub(self.total_credits)
    }

    pub fn is_balanced(&self) -> bool {
        self.difference().abs() <= BALANCE_TOLERANCE
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum EntryStatus {
    #[default]
    Draft,
    Posted,
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntryStatus::Draft => "Draft",
            EntryStatus::Posted => "Posted",
        };
        f.write_str(label)
    }
}

/// Errors raised by the entry itself when an edit or post would break its invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalEditError {
    AlreadyPosted(Uuid),
    LineOutOfRange { index: usize, len: usize },
    Unbalanced(JournalTotals),
}

impl fmt::Display for JournalEditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JournalEditError::AlreadyPosted(id) => {
                write!(f, "journal entry {id} is posted and cannot be edited")
            }
            JournalEditError::LineOutOfRange { index, len } => {
                write!(f, "line {index} does not exist (entry has {len} lines)")
            }
            JournalEditError::Unbalanced(totals) => write!(
                f,
                "debits {} do not equal credits {}",
                totals.total_debits, totals.total_credits
            ),
        }
    }
}

impl std::error::Error for JournalEditError {}

/// A dated set of journal lines. Lines may only change while the entry is a draft.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JournalEntry {
    pub id: Uuid,
    pub date: NaiveDate,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default)]
    lines: Vec<JournalLine>,
    #[serde(default)]
    status: EntryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    posted_at: Option<DateTime<Utc>>,
}

impl JournalEntry {
    pub fn new(date: NaiveDate, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            description: description.into(),
            reference: None,
            lines: Vec::new(),
            status: EntryStatus::Draft,
            posted_at: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_lines(mut self, lines: impl IntoIterator<Item = JournalLine>) -> Self {
        self.lines.extend(lines);
        self
    }

    pub fn lines(&self) -> &[JournalLine] {
        &self.lines
    }

    pub fn status(&self) -> EntryStatus {
        self.status
    }

    pub fn is_posted(&self) -> bool {
        self.status == EntryStatus::Posted
    }

    pub fn posted_at(&self) -> Option<DateTime<Utc>> {
        self.posted_at
    }

    pub fn totals(&self) -> JournalTotals {
        JournalTotals::from_lines(&self.lines)
    }

    /// Appends a line and returns its index.
    pub fn add_line(&mut self, line: JournalLine) -> Result<usize, JournalEditError> {
        self.ensure_draft()?;
        self.lines.push(line);
        Ok(self.lines.len() - 1)
    }

    pub fn edit_line(&mut self, index: usize, edit: LineEdit) -> Result<(), JournalEditError> {
        self.line_mut(index)?.apply(edit);
        Ok(())
    }

    pub fn set_account(
        &mut self,
        index: usize,
        account: impl Into<String>,
    ) -> Result<(), JournalEditError> {
        self.line_mut(index)?.account = account.into();
        Ok(())
    }

    pub fn remove_line(&mut self, index: usize) -> Result<JournalLine, JournalEditError> {
        self.line_mut(index)?;
        Ok(self.lines.remove(index))
    }

    /// Moves the entry to [`EntryStatus::Posted`] when its lines balance.
    pub fn post(&mut self, at: DateTime<Utc>) -> Result<(), JournalEditError> {
        self.ensure_draft()?;
        let totals = self.totals();
        if !totals.is_balanced() {
            return Err(JournalEditError::Unbalanced(totals));
        }
        self.status = EntryStatus::Posted;
        self.posted_at = Some(at);
        Ok(())
    }

    fn ensure_draft(&self) -> Result<(), JournalEditError> {
        if self.is_posted() {
            Err(JournalEditError::AlreadyPosted(self.id))
        } else {
            Ok(())
        }
    }

    fn line_mut(&mut self, index: usize) -> Result<&mut JournalLine, JournalEditError> {
        self.ensure_draft()?;
        let len = self.lines.len();
        self.lines
            .get_mut(index)
            .ok_or(JournalEditError::LineOutOfRange { index, len })
    }
}

impl Identifiable for JournalEntry {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Displayable for JournalEntry {
    fn display_label(&self) -> String {
        format!("{} {} ({})", self.date, self.description, self.status)
    }
}
