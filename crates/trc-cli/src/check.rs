//! # Parse-Check Subcommand
//!
//! Reads every TRC and chain file under the given schema and reports how
//! many parse, per document type. Nothing is written.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use trc_core::Logger;
use trc_migrate::{VersionedChain, VersionedTrc};

use crate::batch::{BatchReport, BatchRunner};
use crate::config::{parse_schema, ConfigError};
use crate::read_input;

/// Arguments for `parse-check`.
#[derive(Args, Debug, Clone)]
pub struct ParseCheckArgs {
    /// TRC files.
    #[arg(short = 't', long = "trcs", num_args = 1..)]
    pub trcs: Vec<PathBuf>,

    /// Certificate chain files.
    #[arg(short = 'c', long = "chains", num_args = 1..)]
    pub chains: Vec<PathBuf>,

    /// Schema the files are expected to follow: legacy or current.
    #[arg(long = "from", default_value = "legacy")]
    pub from: String,
}

/// Per-type results of a parse check.
#[derive(Debug, Clone, Default)]
pub struct ParseCheckReport {
    pub trcs: BatchReport,
    pub chains: BatchReport,
}

impl ParseCheckReport {
    pub fn combined(&self) -> BatchReport {
        let mut all = self.trcs.clone();
        all.merge(self.chains.clone());
        all
    }
}

pub fn run_parse_check(
    args: &ParseCheckArgs,
    logger: Arc<dyn Logger>,
) -> Result<ParseCheckReport, ConfigError> {
    let schema = parse_schema(&args.from)?;

    let mut trcs = BatchRunner::new(logger.clone());
    trcs.run_paths(&args.trcs, |path| VersionedTrc::parse(&read_input(path)?, schema));

    let mut chains = BatchRunner::new(logger.clone());
    chains.run_paths(&args.chains, |path| {
        VersionedChain::parse(&read_input(path)?, schema)
    });

    let report = ParseCheckReport {
        trcs: trcs.finish(),
        chains: chains.finish(),
    };
    logger.info(&format!("{schema} TRCs: {}", report.trcs));
    logger.info(&format!("{schema} chains: {}", report.chains));
    Ok(report)
}
