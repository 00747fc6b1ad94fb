//! Plain-text rendering of records, dashboard widgets and toasts.

use std::fmt::Display;

use domain::models::{
    costs::{ExtraCost, FixedCost},
    document::AccountingDocument,
    landing_page::LandingPage,
    lead::Lead,
    location::Location,
    maintenance::Maintenance,
    staff::StaffProfile,
    ticket::Ticket,
};
use rust_decimal::Decimal;
use services::services::{
    notification::{Notifier, Toast, ToastKind},
    pages::{DashboardView, Widget},
};

/// A record that can be shown as one table row.
pub trait Row {
    const HEADERS: &'static [&'static str];

    fn cells(&self) -> Vec<String>;
}

fn opt<T: Display>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

impl Row for FixedCost {
    const HEADERS: &'static [&'static str] = &["ID", "NAME", "CATEGORY", "AMOUNT", "FREQUENCY"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.category.to_string(),
            self.amount.to_string(),
            self.frequency.to_string(),
        ]
    }
}

impl Row for ExtraCost {
    const HEADERS: &'static [&'static str] = &["ID", "NAME", "CATEGORY", "AMOUNT", "SUPPLIER", "PAID"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.category.to_string(),
            self.amount.to_string(),
            opt(&self.supplier),
            opt(&self.payment_date),
        ]
    }
}

impl Row for Maintenance {
    const HEADERS: &'static [&'static str] = &["ID", "TITLE", "TYPE", "STATUS", "SCHEDULED", "ESTIMATE"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.title.clone(),
            self.maintenance_type.to_string(),
            self.status.to_string(),
            opt(&self.scheduled_date),
            self.estimated_cost.to_string(),
        ]
    }
}

impl Row for AccountingDocument {
    const HEADERS: &'static [&'static str] = &["ID", "TITLE", "TYPE", "NUMBER", "AMOUNT", "DUE", "STATUS"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.title.clone(),
            self.document_type.to_string(),
            opt(&self.number),
            self.amount.to_string(),
            opt(&self.due_date),
            self.status.to_string(),
        ]
    }
}

impl Row for LandingPage {
    const HEADERS: &'static [&'static str] = &["ID", "SLUG", "TITLE", "ACTIVE", "VIEWS", "LEADS"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.slug.clone(),
            self.title.clone(),
            self.is_active.to_string(),
            self.views.to_string(),
            self.lead_count.to_string(),
        ]
    }
}

impl Row for Lead {
    const HEADERS: &'static [&'static str] = &["ID", "NAME", "EMAIL", "PHONE", "STATUS"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.full_name(),
            opt(&self.email),
            opt(&self.phone),
            self.status.to_string(),
        ]
    }
}

impl Row for Ticket {
    const HEADERS: &'static [&'static str] = &["ID", "CODE", "TYPE", "PRICE", "STATUS", "HOLDER"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.ticket_code.clone(),
            self.ticket_type.clone(),
            self.price.to_string(),
            self.status.to_string(),
            opt(&self.holder_name),
        ]
    }
}

impl Row for StaffProfile {
    const HEADERS: &'static [&'static str] = &["ID", "NAME", "ROLE", "COMMISSION %", "ACTIVE"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.full_name(),
            self.role.to_string(),
            self.commission_rate.to_string(),
            self.is_active.to_string(),
        ]
    }
}

impl Row for Location {
    const HEADERS: &'static [&'static str] = &["ID", "NAME", "CITY", "CAPACITY", "ACTIVE"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            opt(&self.city),
            opt(&self.capacity),
            self.is_active.to_string(),
        ]
    }
}

/// Left-aligned columns separated by two spaces.
pub fn table<R: Row>(rows: &[R]) -> String {
    let cells: Vec<Vec<String>> = rows.iter().map(R::cells).collect();
    let mut widths: Vec<usize> = R::HEADERS.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let headers: Vec<String> = R::HEADERS.iter().map(|h| h.to_string()).collect();
    std::iter::once(&headers)
        .chain(cells.iter())
        .map(|row| {
            row.iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{cell:<width$}"))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn widget<T>(label: &str, widget: &Widget<T>, show: impl Fn(&T) -> String) -> String {
    let value = match widget {
        Widget::Loading => "loading…".to_string(),
        Widget::Ready(value) => show(value),
        Widget::Failed(message) => format!("unavailable ({message})"),
    };
    format!("{label:<24}{value}")
}

fn money(value: &Decimal) -> String {
    format!("{:.2}", value)
}

pub fn dashboard(view: &DashboardView) -> String {
    [
        widget("Monthly fixed costs", &view.monthly_fixed_costs, money),
        widget("Extra costs", &view.extra_costs, money),
        widget("Open maintenances", &view.pending_maintenances, usize::to_string),
        widget("Pending documents", &view.pending_documents, usize::to_string),
    ]
    .join("\n")
}

/// Prints toasts to stderr so stdout stays clean for tables and JSON.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, toast: Toast) {
        let marker = match toast.kind {
            ToastKind::Success => "✔",
            ToastKind::Error => "✖",
            ToastKind::Info => "•",
        };
        match toast.description {
            Some(description) => eprintln!("{marker} {}: {description}", toast.title),
            None => eprintln!("{marker} {}", toast.title),
        }
    }
}

#[cfg(test)]
mod tests {
    use domain::{Amount, models::costs::{CostFrequency, FixedCostCategory}};
    use uuid::Uuid;

    use super::*;

    fn cost(name: &str, amount: &str) -> FixedCost {
        FixedCost {
            id: Uuid::nil(),
            location_id: None,
            name: name.to_string(),
            category: FixedCostCategory::Rent,
            amount: Amount::new(amount),
            frequency: CostFrequency::Quarterly,
            start_date: None,
            end_date: None,
            notes: None,
            created_at: None,
        }
    }

    #[test]
    fn test_table_aligns_columns() {
        let out = table(&[cost("Rent", "300"), cost("Warehouse lease", "1200.5")]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ID"));
        let name_col = lines[0].find("NAME").unwrap();
        assert_eq!(lines[1].find("Rent"), Some(name_col));
        assert_eq!(lines[2].find("Warehouse lease"), Some(name_col));
        assert!(lines[2].contains("quarterly"));
    }

    #[test]
    fn test_dashboard_shows_each_widget_state() {
        let view = DashboardView {
            monthly_fixed_costs: Widget::Ready(Decimal::from(700)),
            extra_costs: Widget::Failed("Database unavailable".into()),
            pending_maintenances: Widget::Loading,
            pending_documents: Widget::Ready(3),
        };
        let out = dashboard(&view);
        assert!(out.contains("700.00"));
        assert!(out.contains("unavailable (Database unavailable)"));
        assert!(out.contains("loading"));
        assert!(out.lines().last().unwrap().ends_with('3'));
    }
}
