//! # trcctl Entry Point
//!
//! Assembles subcommands, installs the tracing subscriber, and maps command
//! results to the process exit code.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{ArgAction, Parser, ValueEnum};
use tracing_subscriber::EnvFilter;
use trc_cli::check::{run_parse_check, ParseCheckArgs};
use trc_cli::config::{ConfigError, ToolConfig};
use trc_cli::migrate::{
    run_migrate_chain, run_migrate_keys, run_migrate_trc, MigrateChainArgs, MigrateKeysArgs,
    MigrateTrcArgs,
};
use trc_cli::sign::{run_sign_trc, SignTrcArgs};
use trc_cli::verify::{run_verify, VerifyArgs};
use trc_core::TracingLogger;

/// trcctl: migrate, sign, and verify TRCs and certificate chains.
#[derive(Parser, Debug)]
#[command(name = "trcctl", version, about)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// YAML file with default settings.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Migrate legacy TRCs to the current schema and re-sign them.
    MigrateTrc(MigrateTrcArgs),
    /// Migrate legacy certificate chains and re-sign them.
    MigrateChain(MigrateChainArgs),
    /// Rewrite legacy seed-only key files as raw key plus seed.
    MigrateKeys(MigrateKeysArgs),
    /// Verify TRC update chains and certificate chains.
    Verify(VerifyArgs),
    /// Add an authority's signature to current-schema TRCs.
    SignTrc(SignTrcArgs),
    /// Count TRC and chain files that parse under a schema.
    ParseCheck(ParseCheckArgs),
}

fn init_tracing(verbose: u8, format: LogFormat) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn run(cli: &Cli) -> anyhow::Result<u8> {
    let config = ToolConfig::load(cli.config.as_deref())?;
    tracing::debug!(?config, "tool configuration");

    let logger = TracingLogger::shared("trcctl");
    let report = match &cli.command {
        Commands::MigrateTrc(args) => {
            run_migrate_trc(args, &config, logger).context("migrate-trc")?
        }
        Commands::MigrateChain(args) => {
            run_migrate_chain(args, &config, logger).context("migrate-chain")?
        }
        Commands::MigrateKeys(args) => {
            run_migrate_keys(args, &config, logger).context("migrate-keys")?
        }
        Commands::Verify(args) => run_verify(args, logger).context("verify")?,
        Commands::SignTrc(args) => run_sign_trc(args, &config, logger).context("sign-trc")?,
        Commands::ParseCheck(args) => {
            let report = run_parse_check(args, logger).context("parse-check")?;
            println!("TRCs: {}", report.trcs);
            println!("chains: {}", report.chains);
            return Ok(report.combined().exit_code());
        }
    };
    println!("{report}");
    Ok(report.exit_code())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    match run(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            if e.downcast_ref::<ConfigError>().is_some() {
                ExitCode::from(2)
            } else {
                ExitCode::from(1)
            }
        }
    }
}
