//! Facade that routes engine operations for one company through injected
//! persistence and notification collaborators.

use std::sync::Arc;

use chrono::NaiveDate;
use tally_config::Config;
use tally_core::{
    parse_amount, AccountBalance, AgingReport, AgingService, AmountFormatter, BudgetService,
    BudgetSummary, BudgetTotals, CategoryChanges, Clock, CompanyStore, CoreError, CoreResult,
    EntityKind, InsightThresholds, JournalService, Notification, NotificationSink, PostedEntry,
    RawAmount, SymbolFormatter, SystemClock,
};
use tally_domain::{
    Budget, BudgetCategory, Company, JournalEntry, JournalLine, LineEdit, NamedEntity,
};
use uuid::Uuid;

use crate::errors::{Result, TallyError};

/// Holds the current company and the collaborators its operations report to.
///
/// Every operation works on the in-memory aggregate; nothing is persisted until
/// [`CompanySession::save`] is called.
pub struct CompanySession {
    company: Company,
    store: Arc<dyn CompanyStore>,
    sink: Arc<dyn NotificationSink>,
    clock: Box<dyn Clock>,
    thresholds: InsightThresholds,
    formatter: SymbolFormatter,
}

impl CompanySession {
    pub fn new(
        company: Company,
        store: Arc<dyn CompanyStore>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            company,
            store,
            sink,
            clock: Box::new(SystemClock),
            thresholds: InsightThresholds::default(),
            formatter: SymbolFormatter::default(),
        }
    }

    /// Loads a stored company.
    pub fn open(
        company_id: Uuid,
        store: Arc<dyn CompanyStore>,
        sink: Arc<dyn NotificationSink>,
    ) -> Result<Self> {
        match store.load(company_id) {
            Ok(Some(company)) => Ok(Self::new(company, store, sink)),
            Ok(None) => {
                let err = CoreError::not_found(EntityKind::Company, company_id);
                sink.notify(Notification::from(&err));
                Err(err.into())
            }
            Err(err) => {
                sink.notify(Notification::from(&err));
                Err(err.into())
            }
        }
    }

    /// Starts a new company in the config's currency and stores it.
    pub fn create(
        name: impl Into<String>,
        config: &Config,
        store: Arc<dyn CompanyStore>,
        sink: Arc<dyn NotificationSink>,
    ) -> Result<Self> {
        config.validate()?;
        let name = name.into();
        if name.trim().is_empty() {
            let err = CoreError::Validation("Company name is required".into());
            sink.notify(Notification::from(&err));
            return Err(err.into());
        }
        let mut company = Company::new(name.trim());
        company.currency = config.currency.clone();
        let session = Self::new(company, store, sink).with_config(config);
        session.save()?;
        Ok(session)
    }

    /// Opens the company named by `config.current_company`, applying the
    /// config's thresholds and currency symbol.
    pub fn from_config(
        config: &Config,
        store: Arc<dyn CompanyStore>,
        sink: Arc<dyn NotificationSink>,
    ) -> Result<Self> {
        config.validate()?;
        let company_id = config.current_company.ok_or(TallyError::NoCurrentCompany)?;
        Ok(Self::open(company_id, store, sink)?.with_config(config))
    }

    pub fn with_config(mut self, config: &Config) -> Self {
        self.thresholds = InsightThresholds::new(
            config.high_utilization_percent,
            config.low_utilization_percent,
        );
        self.formatter = SymbolFormatter::new(config.currency_symbol.clone());
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn company(&self) -> &Company {
        &self.company
    }

    /// Writes the aggregate back through the store. Last write wins.
    pub fn save(&self) -> Result<()> {
        let result = self.store.save(&self.company);
        self.report(result, |_| format!("Saved {}", self.company.name()))
    }

    pub fn create_budget(&mut self, budget: Budget) -> Result<Uuid> {
        let name = budget.name.clone();
        let result = BudgetService::create_budget(&mut self.company, budget);
        self.report(result, |_| format!("Budget `{name}` created"))
    }

    pub fn add_category(&mut self, budget_id: Uuid, category: BudgetCategory) -> Result<Uuid> {
        let name = category.name.trim().to_string();
        let result = self.with_budget(budget_id, |budget| {
            BudgetService::add_category(budget, category)
        });
        self.report(result, |_| format!("Category `{name}` added"))
    }

    /// Replaces a category's actual with a free-text or numeric amount.
    pub fn update_actual(
        &mut self,
        budget_id: Uuid,
        category_id: Uuid,
        amount: impl Into<RawAmount>,
    ) -> Result<BudgetTotals> {
        let amount = parse_amount(amount);
        let result = self.with_budget(budget_id, |budget| {
            BudgetService::update_actual(budget, category_id, amount)
        });
        self.report(result, |totals| {
            format!(
                "Actual updated; variance {}",
                self.formatter.format_amount(totals.variance)
            )
        })
    }

    pub fn record_actual(
        &mut self,
        budget_id: Uuid,
        category_id: Uuid,
        amount: impl Into<RawAmount>,
    ) -> Result<BudgetTotals> {
        let amount = parse_amount(amount);
        let result = self.with_budget(budget_id, |budget| {
            BudgetService::record_actual(budget, category_id, amount)
        });
        self.report(result, |_| {
            format!("Recorded {}", self.formatter.format_amount(amount))
        })
    }

    pub fn update_category(
        &mut self,
        budget_id: Uuid,
        category_id: Uuid,
        changes: CategoryChanges,
    ) -> Result<()> {
        let result = self.with_budget(budget_id, |budget| {
            BudgetService::update_category(budget, category_id, changes)
        });
        self.report(result, |_| "Category updated".to_string())
    }

    pub fn remove_category(
        &mut self,
        budget_id: Uuid,
        category_id: Uuid,
    ) -> Result<BudgetCategory> {
        let result = self.with_budget(budget_id, |budget| {
            BudgetService::remove_category(budget, category_id)
        });
        self.report(result, |removed| {
            format!("Category `{}` removed", removed.name)
        })
    }

    /// Totals and advisory insights. Reads only; never notifies.
    pub fn budget_summary(&self, budget_id: Uuid) -> Result<BudgetSummary> {
        let budget = self
            .company
            .budget(budget_id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Budget, budget_id))?;
        Ok(BudgetService::summarize(budget, self.thresholds))
    }

    pub fn create_entry(&mut self, entry: JournalEntry) -> Result<Uuid> {
        let result = JournalService::create_entry(&mut self.company, entry);
        self.report(result, |id| format!("Journal entry {id} created"))
    }

    pub fn add_line(&mut self, entry_id: Uuid, line: JournalLine) -> Result<usize> {
        let result = JournalService::entry_mut(&mut self.company, entry_id)
            .and_then(|entry| JournalService::add_line(entry, line));
        self.quiet(result)
    }

    pub fn edit_line(&mut self, entry_id: Uuid, index: usize, edit: LineEdit) -> Result<()> {
        let result = JournalService::entry_mut(&mut self.company, entry_id)
            .and_then(|entry| JournalService::edit_line(entry, index, edit));
        self.quiet(result)
    }

    pub fn set_account(
        &mut self,
        entry_id: Uuid,
        index: usize,
        account: impl Into<String>,
    ) -> Result<()> {
        let result = JournalService::entry_mut(&mut self.company, entry_id)
            .and_then(|entry| JournalService::set_account(entry, index, account));
        self.quiet(result)
    }

    pub fn remove_line(&mut self, entry_id: Uuid, index: usize) -> Result<JournalLine> {
        let result = JournalService::entry_mut(&mut self.company, entry_id)
            .and_then(|entry| JournalService::remove_line(entry, index));
        self.quiet(result)
    }

    pub fn post_entry(&mut self, entry_id: Uuid) -> Result<PostedEntry> {
        let now = self.clock.now();
        let result = JournalService::post_entry(&mut self.company, entry_id, now);
        self.report(result, |posted| {
            format!(
                "Posted `{}` for {}",
                posted.description,
                self.formatter.format_amount(posted.totals().total_debits)
            )
        })
    }

    /// Drafts a reversal of a posted entry and adds it to the company.
    pub fn reverse_entry(&mut self, entry_id: Uuid, date: NaiveDate) -> Result<Uuid> {
        let result = self
            .company
            .journal_entry(entry_id)
            .ok_or_else(|| CoreError::not_found(EntityKind::JournalEntry, entry_id))
            .and_then(|posted| JournalService::reversing_entry(posted, date))
            .and_then(|reversal| JournalService::create_entry(&mut self.company, reversal));
        self.report(result, |id| format!("Reversal {id} drafted"))
    }

    /// Aging of the company's invoices as of the session clock's today.
    pub fn aging_report(&self) -> AgingReport {
        AgingService::aging_report(&self.company.invoices, self.clock.today())
    }

    pub fn trial_balance(&self) -> Vec<AccountBalance> {
        JournalService::trial_balance(&self.company.journal_entries)
    }

    fn with_budget<T>(
        &mut self,
        budget_id: Uuid,
        op: impl FnOnce(&mut Budget) -> CoreResult<T>,
    ) -> CoreResult<T> {
        let result = op(BudgetService::budget_mut(&mut self.company, budget_id)?);
        if result.is_ok() {
            self.company.touch();
        }
        result
    }

    /// Sends one notification for the outcome and lifts the error.
    fn report<T>(&self, result: CoreResult<T>, success: impl FnOnce(&T) -> String) -> Result<T> {
        match result {
            Ok(value) => {
                self.sink.notify(Notification::success(success(&value)));
                Ok(value)
            }
            Err(err) => {
                self.sink.notify(Notification::from(&err));
                Err(err.into())
            }
        }
    }

    /// Line edits are keystroke-level: only failures are worth a notification.
    fn quiet<T>(&mut self, result: CoreResult<T>) -> Result<T> {
        match result {
            Ok(value) => {
                self.company.touch();
                Ok(value)
            }
            Err(err) => {
                self.sink.notify(Notification::from(&err));
                Err(err.into())
            }
        }
    }
}
