use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use domain::models::costs::{CostFrequency, ExtraCostCategory, FixedCostCategory};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "ops-console")]
#[command(about = "Accounting and operations console for the venue platform")]
pub struct Cli {
    /// TOML settings file
    #[arg(long, global = true, env = "OPS_CONFIG")]
    pub config: Option<PathBuf>,
    /// Overrides `api_base_url`
    #[arg(long, global = true)]
    pub base_url: Option<String>,
    /// Print records as JSON instead of a table
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Accounting overview: monthly fixed costs, extra costs, open maintenances and documents
    Dashboard,
    /// List a collection, optionally narrowed by a search term or location
    List {
        #[arg(value_enum)]
        resource: ResourceKind,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        location: Option<Uuid>,
    },
    CreateFixedCost {
        #[arg(long)]
        name: String,
        #[arg(long)]
        amount: String,
        #[arg(long, default_value = "monthly")]
        frequency: CostFrequency,
        #[arg(long, default_value = "other")]
        category: FixedCostCategory,
        #[arg(long)]
        location: Option<Uuid>,
        #[arg(long)]
        start_date: Option<NaiveDate>,
        #[arg(long)]
        end_date: Option<NaiveDate>,
        #[arg(long)]
        notes: Option<String>,
    },
    CreateExtraCost {
        #[arg(long)]
        name: String,
        #[arg(long)]
        amount: String,
        #[arg(long, default_value = "other")]
        category: ExtraCostCategory,
        #[arg(long)]
        location: Option<Uuid>,
        #[arg(long)]
        event: Option<Uuid>,
        #[arg(long)]
        supplier: Option<String>,
        #[arg(long)]
        invoice_number: Option<String>,
        #[arg(long)]
        payment_date: Option<NaiveDate>,
        #[arg(long)]
        notes: Option<String>,
    },
    Delete {
        #[arg(value_enum)]
        resource: ResourceKind,
        id: Uuid,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y', default_value_t = false)]
        yes: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResourceKind {
    FixedCosts,
    ExtraCosts,
    Maintenances,
    Documents,
    LandingPages,
    Leads,
    Tickets,
    Staff,
    Locations,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_list_with_filters() {
        let cli = Cli::try_parse_from([
            "ops-console",
            "list",
            "fixed-costs",
            "--search",
            "rent",
            "--base-url",
            "http://10.0.0.5:5000",
        ])
        .unwrap();
        assert_eq!(cli.base_url.as_deref(), Some("http://10.0.0.5:5000"));
        let Command::List {
            resource, search, ..
        } = cli.command
        else {
            panic!("expected list");
        };
        assert_eq!(resource, ResourceKind::FixedCosts);
        assert_eq!(search.as_deref(), Some("rent"));
    }

    #[test]
    fn test_create_fixed_cost_defaults_to_monthly() {
        let cli = Cli::try_parse_from([
            "ops-console",
            "create-fixed-cost",
            "--name",
            "Rent",
            "--amount",
            "1500",
        ])
        .unwrap();
        let Command::CreateFixedCost { frequency, category, .. } = cli.command else {
            panic!("expected create-fixed-cost");
        };
        assert_eq!(frequency, CostFrequency::Monthly);
        assert_eq!(category, FixedCostCategory::Other);
    }
}
