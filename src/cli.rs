//! Command-line interface
//!
//! Parses arguments, layers them over the loaded configuration, wires the
//! production collaborators and prints the job report on stdout.

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::application::{RepairCollaborators, render_audit, render_repair, run_audit, run_repair};
use crate::infrastructure::config::{AppConfig, ConfigManager, DiscoveryBackend};
use crate::infrastructure::{
    HttpProber, RandomDelayPacer, build_discovery, init_logging_with_config, log_system_info,
};

#[derive(Debug, Parser)]
#[command(name = "catalog-audit", version)]
#[command(about = "Audit and repair image URLs in a product spreadsheet")]
#[command(after_help = "Environment:\n  RUST_LOG   Log filter override (wins over --log-level)")]
pub struct Cli {
    /// Configuration file (default: <config dir>/catalog-audit/config.json)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Sheet column holding the image URL
    #[arg(long, global = true, value_name = "NAME")]
    pub image_column: Option<String>,

    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true, default_value_t = false)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Report unreachable or missing image URLs
    Audit(AuditArgs),
    /// Replace unreachable or missing image URLs and save an updated copy
    Repair(RepairArgs),
    /// Write the default configuration file
    InitConfig(InitConfigArgs),
}

/// Row selection flags shared by both jobs
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Only rows whose Category equals this value
    #[arg(long, conflicts_with = "all_categories")]
    pub category: Option<String>,

    /// Ignore the configured category filter
    #[arg(long, default_value_t = false)]
    pub all_categories: bool,

    /// Only the first N matching rows
    #[arg(long, value_name = "N", conflicts_with = "no_limit")]
    pub limit: Option<usize>,

    /// Ignore the configured row limit
    #[arg(long, default_value_t = false)]
    pub no_limit: bool,
}

impl FilterArgs {
    fn apply(&self, category: &mut Option<String>, limit: &mut Option<usize>) {
        if self.all_categories {
            *category = None;
        } else if let Some(value) = &self.category {
            *category = Some(value.clone());
        }

        if self.no_limit {
            *limit = None;
        } else if let Some(value) = self.limit {
            *limit = Some(value);
        }
    }
}

#[derive(Debug, Args)]
pub struct AuditArgs {
    /// Input workbook (.xlsx)
    pub input: PathBuf,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Stop after this many broken URLs
    #[arg(long, value_name = "N")]
    pub broken_limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct RepairArgs {
    /// Input workbook (.xlsx)
    pub input: PathBuf,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Image discovery backend
    #[arg(long, value_enum)]
    pub backend: Option<DiscoveryBackend>,

    /// JSON catalog for the `catalog` backend
    #[arg(long, value_name = "PATH")]
    pub catalog: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct InitConfigArgs {
    /// Overwrite an existing file
    #[arg(long, default_value_t = false)]
    pub force: bool,
}

impl Cli {
    /// Layer command-line values over `config`.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(column) = &self.image_column {
            config.sheet.image_column = column.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if self.json_logs {
            config.logging.json_format = true;
        }

        match &self.command {
            Command::Audit(args) => {
                args.filter.apply(&mut config.audit.category, &mut config.audit.limit);
                if let Some(limit) = args.broken_limit {
                    config.audit.broken_limit = limit;
                }
            }
            Command::Repair(args) => {
                args.filter.apply(&mut config.repair.category, &mut config.repair.limit);
                if let Some(path) = &args.catalog {
                    config.discovery.catalog_path = Some(path.clone());
                    // --catalog alone implies the catalog backend
                    if args.backend.is_none() {
                        config.discovery.backend = DiscoveryBackend::Catalog;
                    }
                }
                if let Some(backend) = args.backend {
                    config.discovery.backend = backend;
                }
            }
            Command::InitConfig(_) => {}
        }
    }
}

/// Run the parsed command to completion.
pub async fn run(cli: Cli) -> Result<()> {
    let manager = ConfigManager::resolve(cli.config.as_deref())?;

    if let Command::InitConfig(args) = &cli.command {
        return init_config(&manager, args.force).await;
    }

    let mut config = manager
        .load_config()
        .await
        .with_context(|| format!("Failed to load configuration from {}", manager.config_path().display()))?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    init_logging_with_config(&config.logging)?;
    log_system_info();

    match &cli.command {
        Command::Audit(args) => {
            let prober = Arc::new(HttpProber::from_probe_config(&config.probe)?);
            let report = run_audit(&args.input, &config, prober).await?;
            print!("{}", render_audit(&report, config.audit.url_display_width));
        }
        Command::Repair(args) => {
            let collaborators = RepairCollaborators {
                prober: Arc::new(HttpProber::from_probe_config(&config.probe)?),
                discovery: build_discovery(&config.discovery).await?,
                pacer: Arc::new(RandomDelayPacer::from_repair_config(&config.repair)),
            };
            let report = run_repair(&args.input, &config, collaborators).await?;
            print!("{}", render_repair(&report));
        }
        Command::InitConfig(_) => {}
    }

    info!("🏁 Done");
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> Result<()> {
    let path = manager.config_path();
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    manager.save_config(&AppConfig::default()).await?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}
