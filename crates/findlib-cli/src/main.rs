#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod logging;

use clap::Parser;
use findlib_core::config::parse_addr;
use findlib_core::Config;
use miette::{IntoDiagnostic, Result};

#[derive(Parser, Debug)]
#[command(name = "findlib")]
#[command(author, version, about = "Locate libraries and headers through native package managers", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Do not consult or update the cache daemon
    #[arg(long, global = true)]
    no_cache: bool,

    /// Cache daemon address (overrides FINDLIB_CACHE_ADDR)
    #[arg(long, global = true, value_name = "ADDR")]
    cache_addr: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Find the best matching header or library file
    Find {
        /// What kind of file to look for
        #[arg(value_enum)]
        kind: commands::find::Kind,

        /// Library name, with or without a leading "lib"
        name: String,

        /// Version constraint, e.g. "ver.major == 8" or "ver >= (8, 31)"
        #[arg(short, long)]
        constraint: Option<String>,
    },

    /// List every file discovered for a library
    Files {
        name: String,

        #[arg(short, long)]
        constraint: Option<String>,
    },

    /// Print the -I flag for the directory containing a header
    Include {
        /// Header file name, e.g. "pcre.h"
        header: String,
    },

    /// Compile a version constraint and evaluate it against a version
    Check {
        /// The constraint expression
        expr: String,

        /// Version to evaluate against (defaults to 0.0.0)
        #[arg(long, value_name = "X.Y.Z")]
        ver: Option<String>,
    },

    /// List every executable on PATH matching the given names
    Which {
        #[arg(required = true)]
        programs: Vec<String>,
    },

    /// Start the cache daemon (foreground)
    Daemon,

    /// Ping the cache daemon
    Ping,

    /// Show cache daemon counters
    Stats,

    /// Stop the running cache daemon
    Stop,
}

fn build_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::from_env().into_diagnostic()?;
    if let Some(addr) = &cli.cache_addr {
        config = config.with_cache_addr(parse_addr("--cache-addr", addr).into_diagnostic()?);
    }
    if cli.no_cache {
        config = config.with_no_cache(true);
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.verbose, cli.json);

    let config = build_config(&cli)?;
    tracing::debug!(?config, "configuration loaded");

    match &cli.command {
        Commands::Version => commands::version::run(),
        Commands::Find {
            kind,
            name,
            constraint,
        } => commands::find::run(&config, *kind, name, constraint.as_deref(), cli.json),
        Commands::Files { name, constraint } => {
            commands::files::run(&config, name, constraint.as_deref(), cli.json)
        }
        Commands::Include { header } => commands::include::run(header, cli.json),
        Commands::Check { expr, ver } => commands::check::run(expr, ver.as_deref(), cli.json),
        Commands::Which { programs } => commands::which::run(programs, cli.json),
        Commands::Daemon => commands::daemon::run(&config),
        Commands::Ping => commands::ping::run(&config, cli.json),
        Commands::Stats => commands::stats::run(&config, cli.json),
        Commands::Stop => commands::stop::run(&config),
    }
}
