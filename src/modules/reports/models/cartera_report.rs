use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::modules::invoices::models::InvoiceStatus;

/// Number of invoices in one status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: InvoiceStatus,
    pub invoices: i64,
}

/// Portfolio-wide money totals
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CarteraTotals {
    /// Σ total of non-annulled invoices
    pub invoiced: Decimal,
    /// Σ amount_due of non-annulled invoices
    pub amount_due: Decimal,
    /// Σ paid_amount of non-annulled invoices
    pub collected: Decimal,
    /// Σ balance of invoices that still accept payments
    pub outstanding: Decimal,
}

/// One overdue debt: an unpaid installment or a past-due cash invoice
#[derive(Debug, Clone, PartialEq)]
pub struct OverdueItem {
    pub invoice_id: String,
    pub due_date: NaiveDate,
    pub balance: Decimal,
}

impl OverdueItem {
    pub fn days_past_due(&self, as_of: NaiveDate) -> i64 {
        (as_of - self.due_date).num_days()
    }
}

/// Overdue balance aggregated by days past due
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgingBucket {
    pub label: &'static str,
    pub min_days: i64,
    /// `None` for the open-ended last bucket
    pub max_days: Option<i64>,
    pub items: i64,
    pub balance: Decimal,
}

impl AgingBucket {
    fn empty(label: &'static str, min_days: i64, max_days: Option<i64>) -> Self {
        Self {
            label,
            min_days,
            max_days,
            items: 0,
            balance: Decimal::ZERO,
        }
    }

    fn contains(&self, days: i64) -> bool {
        days >= self.min_days && self.max_days.map_or(true, |max| days <= max)
    }
}

/// Cartera (accounts receivable) snapshot at a business date
#[derive(Debug, Clone, Serialize)]
pub struct CarteraSummary {
    pub as_of: NaiveDate,
    pub invoices_by_status: Vec<StatusCount>,
    pub totals: CarteraTotals,
    /// Σ balance of every overdue item
    pub overdue: Decimal,
    /// Invoices holding at least one overdue item
    pub overdue_invoices: i64,
    pub aging: Vec<AgingBucket>,
}

/// Buckets 1–30, 31–60, 61–90 and 91+ days past due
///
/// Items that are not yet past due at `as_of` are ignored.
pub fn aging_buckets(items: &[OverdueItem], as_of: NaiveDate) -> Vec<AgingBucket> {
    let mut buckets = vec![
        AgingBucket::empty("1-30", 1, Some(30)),
        AgingBucket::empty("31-60", 31, Some(60)),
        AgingBucket::empty("61-90", 61, Some(90)),
        AgingBucket::empty("91+", 91, None),
    ];

    for item in items {
        let days = item.days_past_due(as_of);
        if let Some(bucket) = buckets.iter_mut().find(|b| b.contains(days)) {
            bucket.items += 1;
            bucket.balance += item.balance;
        }
    }

    buckets
}

impl CarteraSummary {
    pub fn build(
        as_of: NaiveDate,
        counts: Vec<StatusCount>,
        totals: CarteraTotals,
        overdue_items: &[OverdueItem],
    ) -> Self {
        // Every status is listed, zero when absent
        let invoices_by_status = InvoiceStatus::ALL
            .into_iter()
            .map(|status| StatusCount {
                status,
                invoices: counts
                    .iter()
                    .find(|c| c.status == status)
                    .map_or(0, |c| c.invoices),
            })
            .collect();

        let aging = aging_buckets(overdue_items, as_of);
        let overdue = aging.iter().map(|b| b.balance).sum();

        let mut invoice_ids: Vec<&str> = overdue_items
            .iter()
            .filter(|item| item.days_past_due(as_of) > 0)
            .map(|item| item.invoice_id.as_str())
            .collect();
        invoice_ids.sort_unstable();
        invoice_ids.dedup();

        Self {
            as_of,
            invoices_by_status,
            totals,
            overdue,
            overdue_invoices: invoice_ids.len() as i64,
            aging,
        }
    }
}
