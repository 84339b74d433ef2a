use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use grant_triage::catalog::{load_catalog_file, resolve_catalog, CatalogStore};
use grant_triage::config::{Config, ConfigOverrides};
use grant_triage::leads::{summarize_leads, triage_submission, LeadStore, LeadSubmission};
use grant_triage::output::csv::{catalog_to_csv, leads_to_csv, results_to_csv};
use grant_triage::output::json::render_json;
use grant_triage::output::table::{
    render_best_table, render_catalog_table, render_leads_table, render_profile_table,
    render_report_table, render_results_table,
};
use grant_triage::profile::classify::classify_business_size;
use grant_triage::profile::ProfileInput;
use grant_triage::report::{EligibilityReport, Notifier};
use grant_triage::server::run_server;
use grant_triage::triage::{find_all_matching_grants, find_best_grant, TriageResult};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(
    name = "grant-triage",
    about = "Grant scheme eligibility triage for business projects"
)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// JSON catalog file to triage against instead of the catalog database
    #[arg(long)]
    catalog: Option<String>,
    #[arg(long = "catalog-db")]
    catalog_db: Option<String>,
    #[arg(long = "leads-db")]
    leads_db: Option<String>,
    #[arg(long)]
    webhook: Option<String>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Best eligible scheme for a profile JSON file
    Best { profile: PathBuf },
    /// Every active scheme, eligible first
    All { profile: PathBuf },
    /// Size class from headcount and annual turnover
    Classify {
        #[arg(long)]
        employees: u32,
        #[arg(long, default_value_t = 0.0)]
        turnover: f64,
    },
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    Leads {
        #[command(subcommand)]
        action: LeadsAction,
    },
    /// Triage a lead submission, store it and deliver the eligibility report
    Report { submission: PathBuf },
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[derive(Debug, Subcommand)]
enum CatalogAction {
    List,
    Import { path: PathBuf },
    Deactivate { id: String },
    Activate { id: String },
}

#[derive(Debug, Subcommand)]
enum LeadsAction {
    List {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    Submit { submission: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(config_path.as_path()))?;
    config.apply_overrides(ConfigOverrides {
        catalog_path: cli.catalog.clone(),
        catalog_db_path: cli.catalog_db.clone(),
        leads_db_path: cli.leads_db.clone(),
        webhook_url: cli.webhook.clone(),
    });

    match &cli.command {
        Commands::Config { init, show } => {
            handle_config_command(*init, *show, &config, &config_path)?;
        }
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host.clone();
            }
            if let Some(port) = port {
                config.server.port = *port;
            }
            let bind = config.bind_addr();
            let addr: SocketAddr = bind
                .parse()
                .map_err(|e| anyhow!("invalid bind address {bind}: {e}"))?;
            run_server(config, addr).await?;
        }
        Commands::Classify {
            employees,
            turnover,
        } => {
            let size = classify_business_size(*employees, *turnover);
            println!("{}", size.as_slug());
        }
        Commands::Best { profile } => {
            let catalog = resolve_catalog(&config)?;
            let profile = read_json::<ProfileInput>(profile)?.into_profile();
            let best = find_best_grant(&catalog.schemes, &profile);
            match cli.output {
                OutputFormat::Table => {
                    println!("{}", render_profile_table(&profile));
                    println!("{}", render_best_table(best.as_ref()));
                }
                OutputFormat::Json => println!("{}", render_json(&best)?),
                OutputFormat::Csv => {
                    println!("{}", results_to_csv(best.as_slice())?)
                }
            }
        }
        Commands::All { profile } => {
            let catalog = resolve_catalog(&config)?;
            let profile = read_json::<ProfileInput>(profile)?.into_profile();
            let results = find_all_matching_grants(&catalog.schemes, &profile);
            print_results(&results, cli.output)?;
        }
        Commands::Catalog { action } => handle_catalog_command(action, &config, cli.output)?,
        Commands::Leads { action } => handle_leads_command(action, &config, cli.output)?,
        Commands::Report { submission } => {
            let submission = read_json::<LeadSubmission>(submission)?;
            let report = deliver_report(&submission, &config).await?;
            match cli.output {
                OutputFormat::Table => println!("{}", render_report_table(&report)),
                OutputFormat::Json | OutputFormat::Csv => println!("{}", render_json(&report)?),
            }
        }
    }

    Ok(())
}

fn handle_config_command(init: bool, show: bool, config: &Config, config_path: &Path) -> Result<()> {
    if init {
        Config::write_template(config_path)?;
        println!("Wrote config template to {}", config_path.display());
    }
    if show || !init {
        println!("{}", render_json(config)?);
    }
    Ok(())
}

fn handle_catalog_command(
    action: &CatalogAction,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    match action {
        CatalogAction::List => {
            let catalog = resolve_catalog(config)?;
            match format {
                OutputFormat::Table => {
                    println!("{}", render_catalog_table(&catalog.schemes));
                    println!("source: {}  fingerprint: {}", catalog.source, catalog.fingerprint);
                }
                OutputFormat::Json => println!("{}", render_json(&catalog)?),
                OutputFormat::Csv => println!("{}", catalog_to_csv(&catalog.schemes)?),
            }
        }
        CatalogAction::Import { path } => {
            let schemes = load_catalog_file(path)?;
            let mut store = CatalogStore::open(&config.resolved_catalog_db_path())?;
            let count = store.upsert_all(&schemes)?;
            info!("imported {count} grant schemes from {}", path.display());
            println!("Imported {count} grant schemes");
        }
        CatalogAction::Deactivate { id } => {
            let store = CatalogStore::open(&config.resolved_catalog_db_path())?;
            store.set_active(id, false)?;
            println!("Deactivated {id}");
        }
        CatalogAction::Activate { id } => {
            let store = CatalogStore::open(&config.resolved_catalog_db_path())?;
            store.set_active(id, true)?;
            println!("Activated {id}");
        }
    }
    Ok(())
}

fn handle_leads_command(action: &LeadsAction, config: &Config, format: OutputFormat) -> Result<()> {
    let store = LeadStore::open(&config.resolved_leads_db_path())?;
    match action {
        LeadsAction::List { limit } => {
            let leads = store.list_leads(*limit)?;
            match format {
                OutputFormat::Table => {
                    println!("{}", render_leads_table(&leads));
                    println!("{}", summarize_leads(&leads));
                }
                OutputFormat::Json => println!("{}", render_json(&leads)?),
                OutputFormat::Csv => println!("{}", leads_to_csv(&leads)?),
            }
        }
        LeadsAction::Submit { submission } => {
            let submission = read_json::<LeadSubmission>(submission)?;
            let catalog = resolve_catalog(config)?;
            let outcome = triage_submission(&submission, &catalog)?;
            let id = store.insert_lead(&outcome.record)?;
            info!(lead_id = id, email = %outcome.record.email, "stored lead");
            print_results(&outcome.results, format)?;
        }
    }
    Ok(())
}

async fn deliver_report(submission: &LeadSubmission, config: &Config) -> Result<EligibilityReport> {
    let catalog = resolve_catalog(config)?;
    let outcome = triage_submission(submission, &catalog)?;
    let store = LeadStore::open(&config.resolved_leads_db_path())?;
    store.insert_lead(&outcome.record)?;

    let notifier = Notifier::from_config(&config.report, Notifier::limiter_for(&config.report))?;
    let dispatch = notifier.dispatch(&outcome).await?;
    if !store.mark_email_sent(&outcome.record.email)? {
        warn!("no stored lead found for {}", outcome.record.email);
    }
    Ok(dispatch.report)
}

fn print_results(results: &[TriageResult], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_results_table(results)),
        OutputFormat::Json => println!("{}", render_json(results)?),
        OutputFormat::Csv => println!("{}", results_to_csv(results)?),
    }
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed reading {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("failed parsing JSON: {}", path.display()))
}
