//! Days-past-due classification of receivables.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_domain::{Invoice, Money};
use uuid::Uuid;

/// Collections band an unpaid invoice falls into, ordered from newest to oldest.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub enum AgingBucket {
    Current,
    Days1To30,
    Days31To60,
    Days61To90,
    Over90,
}

impl AgingBucket {
    pub const ALL: [AgingBucket; 5] = [
        AgingBucket::Current,
        AgingBucket::Days1To30,
        AgingBucket::Days31To60,
        AgingBucket::Days61To90,
        AgingBucket::Over90,
    ];

    /// Thresholds are checked from the oldest band down; the first match wins.
    pub fn for_days_past_due(days: i64) -> Self {
        if days > 90 {
            AgingBucket::Over90
        } else if days > 60 {
            AgingBucket::Days61To90
        } else if days > 30 {
            AgingBucket::Days31To60
        } else if days > 0 {
            AgingBucket::Days1To30
        } else {
            AgingBucket::Current
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AgingBucket::Current => "Current",
            AgingBucket::Days1To30 => "1-30 Days",
            AgingBucket::Days31To60 => "31-60 Days",
            AgingBucket::Days61To90 => "61-90 Days",
            AgingBucket::Over90 => "90+ Days",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for AgingBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One unpaid invoice with its computed age.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgedInvoice {
    pub invoice_id: Uuid,
    pub customer: String,
    pub days_past_due: i64,
    pub bucket: AgingBucket,
    pub total: Money,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BucketTotal {
    pub bucket: AgingBucket,
    pub count: usize,
    pub total: Money,
}

/// Per-bucket totals in bucket order, always listing every bucket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgingReport {
    pub as_of: NaiveDate,
    pub buckets: Vec<BucketTotal>,
    pub total_outstanding: Money,
}

impl AgingReport {
    pub fn bucket(&self, bucket: AgingBucket) -> &BucketTotal {
        &self.buckets[bucket.index()]
    }
}

/// Stateless aging helpers over invoice collections.
pub struct AgingService;

impl AgingService {
    /// Whole days elapsed since `due_date`; negative when the due date is ahead.
    pub fn days_past_due(due_date: NaiveDate, today: NaiveDate) -> i64 {
        (today - due_date).num_days()
    }

    /// Ages a single invoice. Paid invoices have no age and yield `None`.
    pub fn age_invoice(invoice: &Invoice, today: NaiveDate) -> Option<AgedInvoice> {
        if invoice.status.is_settled() {
            return None;
        }
        let days_past_due = Self::days_past_due(invoice.due_date, today);
        Some(AgedInvoice {
            invoice_id: invoice.id,
            customer: invoice.customer.clone(),
            days_past_due,
            bucket: AgingBucket::for_days_past_due(days_past_due),
            total: invoice.total,
        })
    }

    pub fn age_invoices(invoices: &[Invoice], today: NaiveDate) -> Vec<AgedInvoice> {
        invoices
            .iter()
            .filter_map(|invoice| Self::age_invoice(invoice, today))
            .collect()
    }

    pub fn aging_report(invoices: &[Invoice], today: NaiveDate) -> AgingReport {
        let mut buckets = AgingBucket::ALL.map(|bucket| BucketTotal {
            bucket,
            count: 0,
            total: Decimal::ZERO,
        });
        let mut total_outstanding = Decimal::ZERO;
        for aged in Self::age_invoices(invoices, today) {
            let slot = &mut buckets[aged.bucket.index()];
            slot.count += 1;
            slot.total = slot.total.saturating_add(aged.total);
            total_outstanding = total_outstanding.saturating_add(aged.total);
        }
        AgingReport {
            as_of: today,
            buckets: buckets.to_vec(),
            total_outstanding,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use tally_domain::InvoiceStatus;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    fn invoice_due(days_ago: i64, total: Money, status: InvoiceStatus) -> Invoice {
        Invoice::new("Globex", today() - Duration::days(days_ago), total).with_status(status)
    }

    #[test]
    fn boundaries_fall_into_the_lower_band() {
        assert_eq!(AgingBucket::for_days_past_due(-3), AgingBucket::Current);
        assert_eq!(AgingBucket::for_days_past_due(0), AgingBucket::Current);
        assert_eq!(AgingBucket::for_days_past_due(1), AgingBucket::Days1To30);
        assert_eq!(AgingBucket::for_days_past_due(30), AgingBucket::Days1To30);
        assert_eq!(AgingBucket::for_days_past_due(31), AgingBucket::Days31To60);
        assert_eq!(AgingBucket::for_days_past_due(60), AgingBucket::Days31To60);
        assert_eq!(AgingBucket::for_days_past_due(61), AgingBucket::Days61To90);
        assert_eq!(AgingBucket::for_days_past_due(90), AgingBucket::Days61To90);
        assert_eq!(AgingBucket::for_days_past_due(91), AgingBucket::Over90);
    }

    #[test]
    fn outstanding_invoice_45_days_late_is_31_to_60() {
        let invoice = invoice_due(45, dec!(300), InvoiceStatus::Outstanding);
        let aged = AgingService::age_invoice(&invoice, today()).expect("unpaid invoice ages");
        assert_eq!(aged.days_past_due, 45);
        assert_eq!(aged.bucket.label(), "31-60 Days");
    }

    #[test]
    fn paid_invoices_are_excluded() {
        let invoice = invoice_due(45, dec!(300), InvoiceStatus::Paid);
        assert!(AgingService::age_invoice(&invoice, today()).is_none());
        assert!(AgingService::age_invoices(&[invoice], today()).is_empty());
    }

    #[test]
    fn report_sums_totals_per_bucket() {
        let invoices = vec![
            invoice_due(-10, dec!(100), InvoiceStatus::Outstanding),
            invoice_due(5, dec!(50), InvoiceStatus::Overdue),
            invoice_due(20, dec!(25.5), InvoiceStatus::Overdue),
            invoice_due(120, dec!(1000), InvoiceStatus::Overdue),
            invoice_due(120, dec!(999), InvoiceStatus::Paid),
        ];
        let report = AgingService::aging_report(&invoices, today());

        assert_eq!(report.buckets.len(), 5);
        assert_eq!(report.bucket(AgingBucket::Current).total, dec!(100));
        assert_eq!(report.bucket(AgingBucket::Days1To30).count, 2);
        assert_eq!(report.bucket(AgingBucket::Days1To30).total, dec!(75.5));
        assert_eq!(report.bucket(AgingBucket::Days31To60).count, 0);
        assert_eq!(report.bucket(AgingBucket::Over90).total, dec!(1000));
        assert_eq!(report.total_outstanding, dec!(1175.5));
    }

    proptest! {
        #[test]
        fn every_age_maps_to_exactly_one_band(days in -10_000i64..10_000) {
            let bucket = AgingBucket::for_days_past_due(days);
            let matches = AgingBucket::ALL
                .iter()
                .filter(|candidate| match candidate {
                    AgingBucket::Current => days <= 0,
                    AgingBucket::Days1To30 => (1..=30).contains(&days),
                    AgingBucket::Days31To60 => (31..=60).contains(&days),
                    AgingBucket::Days61To90 => (61..=90).contains(&days),
                    AgingBucket::Over90 => days > 90,
                })
                .collect::<Vec<_>>();
            prop_assert_eq!(matches, vec![&bucket]);
        }
    }
}
