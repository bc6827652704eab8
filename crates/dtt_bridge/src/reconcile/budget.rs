//! Budget domain binding and display derivations.
//!
//! # Invariants
//! - `minus`/`plus` scale `totalCent` by 1/10000 while `display_balance`
//!   scales by 1/100.
//! - Stored `lastUpdated` stays an epoch integer; only the label is formatted.

use crate::model::command::Domain;
use crate::model::snapshot::{Budget, Snapshot, Spending};
use crate::reconcile::{DomainSlot, Reconciler};
use chrono::{Local, TimeZone};
use std::fmt::Display;

const SPLIT_SCALE: f64 = 10_000.0;
const BALANCE_SCALE: f64 = 100.0;
const SHORT_DATE_FORMAT: &str = "%m/%d/%y";

/// Budget totals and spendings as last reported by the core.
pub struct BudgetDomain;

impl DomainSlot for BudgetDomain {
    type State = Budget;

    const DOMAIN: Domain = Domain::Budget;

    fn extract(snapshot: &Snapshot) -> Option<&Self::State> {
        snapshot.budget.as_ref()
    }
}

/// Display split of a signed cent total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetSummary {
    pub minus: f64,
    pub plus: f64,
    pub display_balance: f64,
}

impl BudgetSummary {
    pub fn from_total_cent(total_cent: i64) -> Self {
        let magnitude = total_cent.unsigned_abs() as f64 / SPLIT_SCALE;
        let (minus, plus) = if total_cent < 0 {
            (magnitude, 0.0)
        } else {
            (0.0, magnitude)
        };
        Self {
            minus,
            plus,
            display_balance: total_cent as f64 / BALANCE_SCALE,
        }
    }
}

/// One spending with its display date label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendingView {
    pub spending: Spending,
    pub date_label: String,
}

/// Render-ready budget state.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetView {
    pub total_cent: i64,
    pub summary: BudgetSummary,
    pub spendings: Vec<SpendingView>,
}

impl BudgetView {
    /// Builds the view with dates in the local time zone.
    pub fn from_budget(budget: &Budget) -> Self {
        Self::from_budget_in(budget, &Local)
    }

    pub fn from_budget_in<Tz>(budget: &Budget, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        Self {
            total_cent: budget.total_cent,
            summary: BudgetSummary::from_total_cent(budget.total_cent),
            spendings: budget
                .spendings
                .iter()
                .map(|spending| SpendingView {
                    spending: spending.clone(),
                    date_label: format_spending_date_in(spending.last_updated, tz),
                })
                .collect(),
        }
    }
}

impl Reconciler<BudgetDomain> {
    /// Render-ready view of the held budget, if any.
    pub fn view(&self) -> Option<BudgetView> {
        self.held().map(|budget| BudgetView::from_budget(&budget))
    }
}

/// Formats epoch milliseconds as a `MM/DD/YY` label in the local time zone.
pub fn format_spending_date(epoch_ms: i64) -> String {
    format_spending_date_in(epoch_ms, &Local)
}

/// Formats epoch milliseconds as a `MM/DD/YY` label in `tz`.
///
/// Out-of-range timestamps fall back to the raw integer.
pub fn format_spending_date_in<Tz>(epoch_ms: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match tz.timestamp_millis_opt(epoch_ms).single() {
        Some(moment) => moment.format(SHORT_DATE_FORMAT).to_string(),
        None => epoch_ms.to_string(),
    }
}
