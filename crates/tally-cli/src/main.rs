//! tally - command-line front end for the back-office runtime.
//!
//! Locks the data file, loads the datastore snapshot from it, runs one
//! command and writes the snapshot back when the command mutated it. The
//! lock is held until the process is done with the file.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tally_runtime::config::{ConfigError, ConfigLoader, TallyConfig};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Environment variable holding the log filter directive.
const LOG_ENV: &str = "TALLY_LOG";

#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(about = "Retail back-office: collections, counters and role permissions")]
#[command(version)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Project root directory (defaults to current directory)
    #[arg(short = 'C', long, global = true)]
    project: Option<PathBuf>,

    /// Datastore snapshot file (also: TALLY_DATA_PATH)
    #[arg(long, value_name = "FILE", global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Store the default role catalog if no roles exist yet
    SeedRoles,

    /// Check whether a role may perform an action on a module
    Can {
        /// Role to check (omit to check an anonymous user)
        #[arg(long)]
        role: Option<String>,
        /// Action name (view, add, edit, delete, print, export, approve)
        action: String,
        /// Module name (e.g. sales_pos)
        module: String,
    },

    /// Allocate the next value of a counter
    NextId {
        /// Counter name
        counter: String,
        /// First value when the counter does not exist yet
        #[arg(long, value_name = "N")]
        start: Option<i64>,
        /// Prefix for the document number (e.g. RCPT)
        #[arg(long, value_name = "P", default_value = "")]
        prefix: String,
        /// Extra key parts appended to the counter name
        #[arg(long = "scope", value_name = "PART")]
        scope: Vec<String>,
        /// Scope the counter to today's local date
        #[arg(long)]
        daily: bool,
    },

    /// Print every record of a collection as JSON
    List {
        collection: String,
    },

    /// Print one record as JSON
    Get {
        collection: String,
        id: String,
    },

    /// Create a record from a JSON object and print its identifier
    Create {
        collection: String,
        /// Record fields as a JSON object
        json: String,
    },

    /// Merge a JSON object into an existing record
    Update {
        collection: String,
        id: String,
        /// Fields to merge as a JSON object
        json: String,
    },

    /// Delete a record
    Remove {
        collection: String,
        id: String,
    },
}

/// CLI-based configuration resolver.
///
/// Merges file/env config via [`ConfigLoader`] and applies CLI argument
/// overrides as the highest-priority layer.
struct CliConfigResolver {
    project_root: PathBuf,
    debug: bool,
    data: Option<PathBuf>,
}

impl CliConfigResolver {
    fn from_args(args: &Args) -> Self {
        let project_root = args.project.clone().unwrap_or_else(|| {
            std::env::current_dir().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to get current directory, using '.'");
                PathBuf::from(".")
            })
        });

        Self {
            project_root,
            debug: args.debug,
            data: args.data.clone(),
        }
    }

    fn resolve(&self) -> Result<TallyConfig, ConfigError> {
        let mut config = ConfigLoader::new()
            .with_project_root(&self.project_root)
            .load()?;
        self.apply_overrides(&mut config);
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut TallyConfig) {
        if self.debug {
            config.debug = true;
        }
        if let Some(path) = &self.data {
            config.data.path = Some(path.clone());
        }
    }
}

fn init_tracing(config: &TallyConfig) {
    let filter = if config.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_filter(filter),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let resolver = CliConfigResolver::from_args(&args);

    // Resolved before tracing so the config can turn on debug output.
    let config = resolver
        .resolve()
        .map_err(|e| anyhow::anyhow!("Config error: {e}"))?;
    init_tracing(&config);

    tracing::debug!(
        project = %resolver.project_root.display(),
        data = %config.data.resolved_path().display(),
        "Resolved configuration"
    );

    commands::run(args.command, config)
        .await
        .context("command failed")
}
