//! Derived view models: pure functions over fetched record collections.
//!
//! Nothing in here is cached or stored. Every figure is recomputed from the current
//! collections, and any amount that fails to parse contributes zero. A term that would
//! overflow a total is skipped the same way.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;
use utils::text::normalize_query;
use uuid::Uuid;

use crate::models::{
    costs::{CostFrequency, ExtraCost, FixedCost},
    document::{AccountingDocument, DocumentStatus},
    lead::{Lead, LeadStatus},
    maintenance::{Maintenance, MaintenanceStatus},
    staff::StaffProfile,
    ticket::{Ticket, TicketStatus},
};

/// Text fields a record exposes to the page search box
pub trait Searchable {
    fn search_fields(&self) -> Vec<&str>;
}

/// Case-insensitive substring search across each record's searchable fields.
///
/// A blank query returns the whole collection in its original order.
pub fn search<'a, T: Searchable>(records: &'a [T], query: &str) -> Vec<&'a T> {
    let Some(needle) = normalize_query(query) else {
        return records.iter().collect();
    };
    records
        .iter()
        .filter(|record| {
            record
                .search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Count records whose status is in `allowed`
pub fn count_with_status<T, S, F>(records: &[T], status: F, allowed: &[S]) -> usize
where
    S: PartialEq,
    F: Fn(&T) -> S,
{
    records
        .iter()
        .filter(|record| allowed.contains(&status(record)))
        .count()
}

/// Adds `term` to `total`, leaving `total` unchanged when the sum would overflow.
fn add_amount(total: Decimal, term: Decimal) -> Decimal {
    total.checked_add(term).unwrap_or_else(|| {
        warn!(%total, %term, "amount skipped: total would overflow");
        total
    })
}

fn sum_amounts(terms: impl IntoIterator<Item = Decimal>) -> Decimal {
    terms.into_iter().fold(Decimal::ZERO, add_amount)
}

/// Monthly figure of a single cost. Unknown frequencies contribute nothing.
pub fn monthly_equivalent(cost: &FixedCost) -> Decimal {
    let amount = cost.amount.value();
    match cost.frequency {
        CostFrequency::Monthly => amount,
        CostFrequency::Quarterly => amount / Decimal::from(3),
        CostFrequency::Yearly => amount / Decimal::from(12),
        CostFrequency::Unknown => Decimal::ZERO,
    }
}

/// Sum of monthly equivalents across every location
pub fn monthly_fixed_cost_total(costs: &[FixedCost]) -> Decimal {
    sum_amounts(costs.iter().map(monthly_equivalent))
}

/// Monthly equivalents grouped by location; `None` collects costs with no location
pub fn monthly_fixed_cost_by_location(costs: &[FixedCost]) -> BTreeMap<Option<Uuid>, Decimal> {
    let mut totals = BTreeMap::new();
    for cost in costs {
        let total = totals.entry(cost.location_id).or_insert(Decimal::ZERO);
        *total = add_amount(*total, monthly_equivalent(cost));
    }
    totals
}

pub fn extra_cost_total(costs: &[ExtraCost]) -> Decimal {
    sum_amounts(costs.iter().map(|c| c.amount.value()))
}

/// Maintenances still pending or scheduled
pub fn pending_maintenance_count(items: &[Maintenance]) -> usize {
    count_with_status(items, |m| m.status, &MaintenanceStatus::NEEDS_ACTION)
}

/// Maintenances needing action with a scheduled date on or after `today`, soonest first
pub fn upcoming_maintenances(items: &[Maintenance], today: NaiveDate) -> Vec<&Maintenance> {
    let mut upcoming: Vec<&Maintenance> = items
        .iter()
        .filter(|m| m.status.needs_action())
        .filter(|m| m.scheduled_date.is_some_and(|d| d >= today))
        .collect();
    upcoming.sort_by_key(|m| m.scheduled_date);
    upcoming
}

/// Documents waiting for payment (pending or overdue)
pub fn pending_document_count(documents: &[AccountingDocument]) -> usize {
    count_with_status(documents, |d| d.status, &DocumentStatus::OUTSTANDING)
}

pub fn document_total_by_status(
    documents: &[AccountingDocument],
) -> BTreeMap<DocumentStatus, Decimal> {
    let mut totals = BTreeMap::new();
    for doc in documents {
        let total = totals.entry(doc.status).or_insert(Decimal::ZERO);
        *total = add_amount(*total, doc.amount.value());
    }
    totals
}

/// Percentage of converted leads, rounded to two decimals. `None` without leads.
pub fn lead_conversion_rate(leads: &[Lead]) -> Option<Decimal> {
    if leads.is_empty() {
        return None;
    }
    let converted = count_with_status(leads, |l| l.status, &[LeadStatus::Converted]);
    let rate = Decimal::from(converted) * Decimal::ONE_HUNDRED / Decimal::from(leads.len());
    Some(rate.round_dp(2))
}

/// Revenue of tickets that were not cancelled or refunded
pub fn ticket_revenue(tickets: &[Ticket]) -> Decimal {
    sum_amounts(
        tickets
            .iter()
            .filter(|t| TicketStatus::PAID.contains(&t.status))
            .map(|t| t.price.value()),
    )
}

pub fn active_staff_count(staff: &[StaffProfile]) -> usize {
    staff.iter().filter(|s| s.is_active).count()
}

/// Headline figures of the accounting dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountingSummary {
    pub monthly_fixed_costs: Decimal,
    pub extra_costs: Decimal,
    pub pending_maintenances: usize,
    pub pending_documents: usize,
}

impl AccountingSummary {
    pub fn compute(
        fixed: &[FixedCost],
        extra: &[ExtraCost],
        maintenances: &[Maintenance],
        documents: &[AccountingDocument],
    ) -> Self {
        Self {
            monthly_fixed_costs: monthly_fixed_cost_total(fixed),
            extra_costs: extra_cost_total(extra),
            pending_maintenances: pending_maintenance_count(maintenances),
            pending_documents: pending_document_count(documents),
        }
    }
}
