//! Double-entry validation, posting and ledger rollups.

use std::collections::BTreeMap;
use std::ops::Deref;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_domain::{
    Company, JournalEntry, JournalLine, JournalTotals, LineEdit, Money, BALANCE_TOLERANCE,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, EntityKind};
use crate::money::MAX_AMOUNT;

/// Read-only snapshot of an entry that has been posted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostedEntry(JournalEntry);

impl PostedEntry {
    pub fn entry(&self) -> &JournalEntry {
        &self.0
    }
}

impl Deref for PostedEntry {
    type Target = JournalEntry;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Posted activity for one account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountBalance {
    pub account: String,
    pub total_debits: Money,
    pub total_credits: Money,
}

impl AccountBalance {
    /// Debit-positive net balance.
    pub fn balance(&self) -> Money {
        self.total_debits.saturating_sub(self.total_credits)
    }
}

pub struct JournalService;

impl JournalService {
    pub fn create_entry(company: &mut Company, entry: JournalEntry) -> CoreResult<Uuid> {
        if company.journal_entry(entry.id).is_some() {
            return Err(CoreError::Validation(format!(
                "Journal entry {} already exists",
                entry.id
            )));
        }
        let id = entry.id;
        company.journal_entries.push(entry);
        company.touch();
        Ok(id)
    }

    pub fn entry_mut(company: &mut Company, entry_id: Uuid) -> CoreResult<&mut JournalEntry> {
        company
            .journal_entry_mut(entry_id)
            .ok_or_else(|| CoreError::not_found(EntityKind::JournalEntry, entry_id))
    }

    pub fn compute_totals(lines: &[JournalLine]) -> JournalTotals {
        JournalTotals::from_lines(lines)
    }

    /// Debits and credits agree within [`BALANCE_TOLERANCE`].
    pub fn is_balanced(lines: &[JournalLine]) -> bool {
        Self::compute_totals(lines).is_balanced()
    }

    pub fn add_line(entry: &mut JournalEntry, line: JournalLine) -> CoreResult<usize> {
        Ok(entry.add_line(line)?)
    }

    pub fn edit_line(entry: &mut JournalEntry, index: usize, edit: LineEdit) -> CoreResult<()> {
        Ok(entry.edit_line(index, edit)?)
    }

    pub fn set_account(
        entry: &mut JournalEntry,
        index: usize,
        account: impl Into<String>,
    ) -> CoreResult<()> {
        Ok(entry.set_account(index, account)?)
    }

    pub fn remove_line(entry: &mut JournalEntry, index: usize) -> CoreResult<JournalLine> {
        Ok(entry.remove_line(index)?)
    }

    /// Checks that every line is a well-formed single-sided posting.
    pub fn validate_lines(lines: &[JournalLine]) -> CoreResult<()> {
        if lines.len() < 2 {
            return Err(CoreError::Validation(
                "A journal entry needs at least two lines".into(),
            ));
        }
        for (index, line) in lines.iter().enumerate() {
            let row = index + 1;
            if line.account.trim().is_empty() {
                return Err(CoreError::Validation(format!(
                    "Line {row}: account is required"
                )));
            }
            if line.debit_amount() < Decimal::ZERO || line.credit_amount() < Decimal::ZERO {
                return Err(CoreError::Validation(format!(
                    "Line {row}: amounts cannot be negative"
                )));
            }
            if line.has_both_sides() {
                return Err(CoreError::Validation(format!(
                    "Line {row}: a line cannot carry both a debit and a credit"
                )));
            }
            if line.is_empty() {
                return Err(CoreError::Validation(format!(
                    "Line {row}: enter a debit or a credit amount"
                )));
            }
            if line.debit_amount() > MAX_AMOUNT || line.credit_amount() > MAX_AMOUNT {
                return Err(CoreError::Validation(format!(
                    "Line {row}: amount exceeds {MAX_AMOUNT}"
                )));
            }
        }
        Ok(())
    }

    pub fn validate_and_post(entry: &mut JournalEntry) -> CoreResult<PostedEntry> {
        Self::validate_and_post_at(entry, Utc::now())
    }

    /// Posts the entry when its lines are valid and balanced. On failure the
    /// entry is left untouched and still a draft.
    pub fn validate_and_post_at(
        entry: &mut JournalEntry,
        at: DateTime<Utc>,
    ) -> CoreResult<PostedEntry> {
        if entry.is_posted() {
            return Err(CoreError::AlreadyPosted(entry.id));
        }
        Self::validate_lines(entry.lines())?;
        if let Err(err) = entry.post(at) {
            let totals = entry.totals();
            warn!(
                entry = %entry.id,
                debits = %totals.total_debits,
                credits = %totals.total_credits,
                tolerance = %BALANCE_TOLERANCE,
                "journal entry rejected"
            );
            return Err(err.into());
        }
        debug!(entry = %entry.id, "journal entry posted");
        Ok(PostedEntry(entry.clone()))
    }

    pub fn post_entry(
        company: &mut Company,
        entry_id: Uuid,
        at: DateTime<Utc>,
    ) -> CoreResult<PostedEntry> {
        let posted = Self::validate_and_post_at(Self::entry_mut(company, entry_id)?, at)?;
        company.touch();
        Ok(posted)
    }

    /// Sums posted lines per account, sorted by account name. Drafts are ignored.
    pub fn trial_balance<'a>(
        entries: impl IntoIterator<Item = &'a JournalEntry>,
    ) -> Vec<AccountBalance> {
        let mut by_account: BTreeMap<&str, (Money, Money)> = BTreeMap::new();
        for entry in entries.into_iter().filter(|entry| entry.is_posted()) {
            for line in entry.lines() {
                let slot = by_account
                    .entry(line.account.as_str())
                    .or_insert((Decimal::ZERO, Decimal::ZERO));
                slot.0 = slot.0.saturating_add(line.debit_amount());
                slot.1 = slot.1.saturating_add(line.credit_amount());
            }
        }
        by_account
            .into_iter()
            .map(|(account, (total_debits, total_credits))| AccountBalance {
                account: account.to_string(),
                total_debits,
                total_credits,
            })
            .collect()
    }

    /// Builds a draft that undoes a posted entry by swapping every line's sides.
    pub fn reversing_entry(posted: &JournalEntry, date: NaiveDate) -> CoreResult<JournalEntry> {
        if !posted.is_posted() {
            return Err(CoreError::Validation(format!(
                "Journal entry {} must be posted before it can be reversed",
                posted.id
            )));
        }
        let mut reversal = JournalEntry::new(date, format!("Reversal of {}", posted.description))
            .with_lines(posted.lines().iter().map(JournalLine::reversed));
        reversal.reference = Some(posted.id.to_string());
        Ok(reversal)
    }
}
