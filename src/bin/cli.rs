//! resale-feed CLI
//!
//! Local execution entry point over a storage directory.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use resale_feed::{
    config::{CONFIG_FILE, load_contract},
    error::Result,
    export::{ExportKind, builtin_versions},
    models::{ClassificationMode, ConditionPolicy},
    pipeline::{self, ExportOptions},
    storage::{ListingStore, LocalStorage},
    utils,
};

/// resale-feed - marketplace inventory file generator
#[derive(Parser, Debug)]
#[command(
    name = "resale-feed",
    version,
    about = "Classify scraped listings and export marketplace inventory files"
)]
struct Cli {
    /// Path to storage directory containing config and data files
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify stored listings and print a summary
    Classify {
        /// Override the configured classification mode
        #[arg(long, value_enum)]
        mode: Option<ClassificationMode>,

        /// Do not require new/unused condition
        #[arg(long)]
        any_condition: bool,

        /// Write the full classification report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Export exportable listings as an inventory file
    Export {
        /// Output format (default from config)
        #[arg(long, value_enum)]
        format: Option<ExportKind>,

        /// Output directory (default from config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Do not flag exported listings
        #[arg(long)]
        no_mark: bool,

        /// Include listings already marked exported
        #[arg(long)]
        include_exported: bool,
    },

    /// Flag every listing that is not new/unused as filtered
    FilterNonNew,

    /// Merge keyword rules from a CSV file
    ImportKeywords { csv: PathBuf },

    /// Write keyword rules to a CSV file
    ExportKeywords { csv: PathBuf },

    /// Merge NG sellers from a CSV file
    ImportSellers { csv: PathBuf },

    /// Validate configuration and contracts
    Validate,

    /// Show storage contents
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool, configured: &str) {
    let level = if verbose { "debug" } else { configured };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
    utils::log::init(level);
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.storage_dir.join(CONFIG_FILE);
    let mut config = resale_feed::models::Config::load_or_default(&config_path);
    init_logging(cli.verbose, &config.logging.level);

    log::info!("Loaded configuration from {}", cli.storage_dir.display());
    config.validate()?;

    let storage = LocalStorage::new(&cli.storage_dir).with_export_dir(&config.export.output_dir);

    match cli.command {
        Command::Classify {
            mode,
            any_condition,
            report,
        } => {
            if let Some(mode) = mode {
                config.eligibility.mode = mode;
            }
            if any_condition {
                config.eligibility.condition_policy = ConditionPolicy::Any;
            }

            let outcome =
                pipeline::run_classify(&storage, &config.eligibility, config.logging.show_progress)
                    .await?;

            if let Some(path) = report {
                outcome.write_report(&path).await?;
                log::info!("Report written to {}", path.display());
            }
        }

        Command::Export {
            format,
            output,
            no_mark,
            include_exported,
        } => {
            let storage = match output {
                Some(dir) => storage.with_export_dir(dir),
                None => storage,
            };
            let options = ExportOptions {
                kind: format.unwrap_or(config.export.format),
                mark_exported: config.export.mark_exported && !no_mark,
                include_exported,
            };
            pipeline::run_export(&storage, &config, &cli.storage_dir, &options).await?;
        }

        Command::FilterNonNew => {
            let ids = pipeline::run_filter_non_new(&storage).await?;
            log::debug!("Filtered ids: {:?}", ids);
        }

        Command::ImportKeywords { csv } => {
            pipeline::run_import_keywords(&storage, &csv).await?;
        }

        Command::ExportKeywords { csv } => {
            pipeline::run_export_keywords(&storage, &csv).await?;
        }

        Command::ImportSellers { csv } => {
            pipeline::run_import_sellers(&storage, &csv).await?;
        }

        Command::Validate => {
            pipeline::run_validate(&cli.storage_dir)?;
        }

        Command::Info => {
            log::info!("Storage directory: {}", cli.storage_dir.display());

            let listings = storage.load_listings().await?;
            let filtered = listings.iter().filter(|l| l.is_filtered).count();
            let exported = listings.iter().filter(|l| l.exported).count();
            let last_export = listings.iter().filter_map(|l| l.exported_at).max();

            utils::log::summary(
                "Storage",
                &[
                    ("Listings", listings.len().to_string()),
                    ("Filtered", filtered.to_string()),
                    ("Exported", exported.to_string()),
                    (
                        "Last export",
                        last_export
                            .map(|t| t.to_rfc3339())
                            .unwrap_or_else(|| "never".to_string()),
                    ),
                    (
                        "Keyword rules",
                        storage.load_keyword_rules().await?.len().to_string(),
                    ),
                    (
                        "NG sellers",
                        storage.load_seller_entries().await?.len().to_string(),
                    ),
                    (
                        "Contracts",
                        builtin_versions().collect::<Vec<_>>().join(", "),
                    ),
                    (
                        "Default contract",
                        load_contract(&config.export, &cli.storage_dir, ExportKind::Tsv)
                            .map(|c| c.version().to_string())
                            .unwrap_or_else(|e| format!("unavailable ({e})")),
                    ),
                ],
            );
        }
    }

    log::info!("Done!");

    Ok(())
}
