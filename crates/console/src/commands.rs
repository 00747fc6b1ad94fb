use std::{process::ExitCode, time::Duration};

use anyhow::{Result, bail};
use dialoguer::Confirm;
use domain::{
    Amount,
    aggregates::Searchable,
    models::{
        costs::{CreateExtraCost, CreateFixedCost, ExtraCost, FixedCost},
        document::AccountingDocument,
        landing_page::LandingPage,
        lead::Lead,
        location::Location,
        maintenance::Maintenance,
        staff::StaffProfile,
        ticket::Ticket,
    },
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use services::services::{
    mutations::{MutationError, MutationOutcome},
    pages::{AccountingDashboard, AppContext, ResourcePage, Widget},
    resources::Resource,
};
use tracing::debug;
use uuid::Uuid;

use crate::{
    cli::{Command, ResourceKind},
    render::{self, Row},
};

/// Binds `$r` to the record type behind a [`ResourceKind`].
macro_rules! with_resource {
    ($kind:expr, $r:ident => $body:expr) => {
        match $kind {
            ResourceKind::FixedCosts => {
                type $r = FixedCost;
                $body
            }
            ResourceKind::ExtraCosts => {
                type $r = ExtraCost;
                $body
            }
            ResourceKind::Maintenances => {
                type $r = Maintenance;
                $body
            }
            ResourceKind::Documents => {
                type $r = AccountingDocument;
                $body
            }
            ResourceKind::LandingPages => {
                type $r = LandingPage;
                $body
            }
            ResourceKind::Leads => {
                type $r = Lead;
                $body
            }
            ResourceKind::Tickets => {
                type $r = Ticket;
                $body
            }
            ResourceKind::Staff => {
                type $r = StaffProfile;
                $body
            }
            ResourceKind::Locations => {
                type $r = Location;
                $body
            }
        }
    };
}

pub async fn dispatch(ctx: &AppContext, command: Command, json: bool) -> Result<ExitCode> {
    match command {
        Command::Dashboard => dashboard(ctx).await,
        Command::List {
            resource,
            search,
            location,
        } => with_resource!(resource, R => list::<R>(ctx, search, location, json).await),
        Command::CreateFixedCost {
            name,
            amount,
            frequency,
            category,
            location,
            start_date,
            end_date,
            notes,
        } => {
            let form = CreateFixedCost {
                location_id: location,
                name,
                category,
                amount: Amount::new(amount),
                frequency,
                start_date,
                end_date,
                notes,
            };
            create::<FixedCost>(ctx, form, json).await
        }
        Command::CreateExtraCost {
            name,
            amount,
            category,
            location,
            event,
            supplier,
            invoice_number,
            payment_date,
            notes,
        } => {
            let form = CreateExtraCost {
                location_id: location,
                event_id: event,
                name,
                category,
                amount: Amount::new(amount),
                supplier,
                invoice_number,
                payment_date,
                notes,
            };
            create::<ExtraCost>(ctx, form, json).await
        }
        Command::Delete { resource, id, yes } => {
            with_resource!(resource, R => delete::<R>(ctx, id, yes).await)
        }
    }
}

fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

async fn dashboard(ctx: &AppContext) -> Result<ExitCode> {
    let dashboard = AccountingDashboard::new(ctx);
    let pb = spinner("Loading accounting overview");
    let view = dashboard.refresh().await;
    pb.finish_and_clear();

    let Some(view) = view else {
        bail!("dashboard closed before it finished loading");
    };
    println!("{}", render::dashboard(&view));

    let failed = [
        matches!(view.monthly_fixed_costs, Widget::Failed(_)),
        matches!(view.extra_costs, Widget::Failed(_)),
        matches!(view.pending_maintenances, Widget::Failed(_)),
        matches!(view.pending_documents, Widget::Failed(_)),
    ];
    Ok(if failed.contains(&true) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn list<R>(
    ctx: &AppContext,
    search: Option<String>,
    location: Option<Uuid>,
    json: bool,
) -> Result<ExitCode>
where
    R: Resource + Searchable + Row + Serialize,
{
    let mut page = ResourcePage::<R>::new(ctx);
    if let Some(location) = location {
        page = page.with_filter("locationId", location);
    }
    if let Some(search) = search {
        page.set_search(search);
    }

    let pb = spinner(format!("Loading {}", R::PATH));
    let loaded = page.load().await;
    pb.finish_and_clear();

    match loaded {
        None => bail!("list closed before it finished loading"),
        Some(Err(err)) => {
            eprintln!("✖ {}", err.user_message());
            return Ok(ExitCode::FAILURE);
        }
        Some(Ok(_)) => {}
    }

    let view = page.visible();
    debug!(key = %page.list_key(), shown = view.rows.len(), total = view.total, "listed");
    if json {
        println!("{}", serde_json::to_string_pretty(&view.rows)?);
    } else if view.rows.is_empty() {
        eprintln!("No matching records.");
    } else {
        println!("{}", render::table(&view.rows));
        eprintln!("{} of {} shown", view.rows.len(), view.total);
    }
    Ok(ExitCode::SUCCESS)
}

async fn create<R>(ctx: &AppContext, form: R::Create, json: bool) -> Result<ExitCode>
where
    R: Resource + Searchable + Row + Serialize,
{
    let mut page = ResourcePage::<R>::new(ctx);
    page.open_create_with(form)?;

    let pb = spinner(format!("Saving {}", R::LABEL.to_lowercase()));
    let result = page.submit().await;
    pb.finish_and_clear();

    match result {
        Ok(MutationOutcome::Created(record)) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                println!("{}", render::table(std::slice::from_ref(&record)));
            }
            Ok(ExitCode::SUCCESS)
        }
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(MutationError::Validation(errors)) => {
            eprintln!("✖ {} not saved:", R::LABEL);
            for error in errors.iter() {
                eprintln!("  {}: {}", error.field, error.message);
            }
            Ok(ExitCode::FAILURE)
        }
        // Already reported through the notifier.
        Err(MutationError::Api(_)) => Ok(ExitCode::FAILURE),
        Err(err) => Err(err.into()),
    }
}

async fn delete<R>(ctx: &AppContext, id: Uuid, yes: bool) -> Result<ExitCode>
where
    R: Resource + Searchable,
{
    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete {} {id}?", R::LABEL.to_lowercase()))
            .default(false)
            .interact()?;
        if !confirmed {
            eprintln!("Aborted.");
            return Ok(ExitCode::SUCCESS);
        }
    }

    let page = ResourcePage::<R>::new(ctx);
    match page.delete(id).await {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(MutationError::Api(_)) => Ok(ExitCode::FAILURE),
        Err(err) => Err(err.into()),
    }
}
