//! CLI module
//!
//! Command-line interface for airtable-kit: argument parsing and the
//! handlers behind each subcommand.

pub mod output;

use crate::api::{Api, RecordQuery};
use crate::config::load_config;
use crate::error::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "airtable-kit",
    version,
    about = "Inspect Airtable bases, schemas and records",
    arg_required_else_help = true
)]
pub struct Cli {
    /// Personal access token (overrides config and AIRTABLE_API_KEY)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Configuration file (default: <config dir>/airtable-kit/config.toml)
    #[arg(long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the user and scopes of the token
    Whoami,
    /// List the bases the token can access
    Bases,
    /// Commands on one base
    Base {
        /// Base id (app...)
        base_id: String,
        #[command(subcommand)]
        command: BaseCommand,
    },
    /// Commands on an enterprise account
    Enterprise {
        /// Enterprise account id (ent...)
        enterprise_id: String,
        #[command(subcommand)]
        command: EnterpriseCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum BaseCommand {
    /// Print the tables, fields and views of the base
    Schema,
    /// Commands on one table
    Table {
        /// Table id or name
        table: String,
        #[command(subcommand)]
        command: TableCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum TableCommand {
    /// List records
    Records(RecordsArgs),
}

#[derive(Debug, Args)]
pub struct RecordsArgs {
    /// Filter with an Airtable formula
    #[arg(long)]
    pub formula: Option<String>,
    /// View name or id
    #[arg(long)]
    pub view: Option<String>,
    /// Only show this field (repeatable)
    #[arg(long = "field")]
    pub fields: Vec<String>,
    /// Stop after this many records
    #[arg(long)]
    pub limit: Option<u32>,
}

impl RecordsArgs {
    fn to_query(&self) -> RecordQuery {
        let mut query = RecordQuery::new().with_fields(self.fields.iter().cloned());
        if let Some(formula) = &self.formula {
            query = query.with_formula(crate::formulas::Formula::raw(formula.clone()));
        }
        if let Some(view) = &self.view {
            query = query.with_view(view.clone());
        }
        if let Some(limit) = self.limit {
            query = query.with_max_records(limit);
        }
        query
    }
}

#[derive(Debug, Subcommand)]
pub enum EnterpriseCommand {
    /// Print enterprise account metadata
    Info,
}

/// Build a client from the config file, the environment and `--api-key`
pub fn build_api(cli: &Cli) -> Result<Api> {
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(key) = &cli.api_key {
        config.api_key = Some(key.clone());
    }
    Api::from_config(&config)
}

/// Run a parsed command
pub async fn run(cli: Cli) -> Result<()> {
    let api = build_api(&cli)?;

    match &cli.command {
        Command::Whoami => {
            let me = api.whoami().await?;
            output::print(&me, cli.json, output::whoami_table)
        }
        Command::Bases => {
            let bases = api.bases().await?;
            let infos: Vec<_> = bases
                .iter()
                .map(|b| {
                    serde_json::json!({
                        "id": b.id(),
                        "name": b.name(),
                        "permissionLevel": b.permission_level(),
                    })
                })
                .collect();
            output::print(&infos, cli.json, |_| output::bases_table(&bases))
        }
        Command::Base { base_id, command } => {
            let base = api.base(base_id.clone());
            match command {
                BaseCommand::Schema => {
                    let schema = base.schema().await?;
                    output::print(&schema, cli.json, output::schema_table)
                }
                BaseCommand::Table { table, command } => match command {
                    TableCommand::Records(args) => {
                        let records = base.table(table.clone()).all(&args.to_query()).await?;
                        output::print(&records, cli.json, |records| {
                            output::records_table(records, &args.fields)
                        })
                    }
                },
            }
        }
        Command::Enterprise {
            enterprise_id,
            command: EnterpriseCommand::Info,
        } => {
            let info = api.enterprise(enterprise_id.clone()).info().await?;
            output::print(&info, cli.json, output::enterprise_table)
        }
    }
}
