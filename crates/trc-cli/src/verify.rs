//! # Verify Subcommand
//!
//! Checks a set of TRCs and certificate chains together:
//!
//! 1. Every TRC file is parsed (current schema).
//! 2. TRCs are grouped by ISD and each group is verified as one update
//!    chain. One diagnostic line per ISD.
//! 3. Each chain is verified against the TRC of its leaf's ISD whose
//!    version is the issuer certificate's `trc_version`, taken only from
//!    ISDs whose update chain verified. One diagnostic line per chain.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use trc_core::{IsdId, Logger, Timestamp, TrustError};
use trc_pki::{CertificateChain, QuorumSignatureEngine, TrustRootDocument};

use crate::batch::{BatchReport, BatchRunner};
use crate::config::ConfigError;
use crate::read_input;

/// Arguments for `verify`.
#[derive(Args, Debug, Clone, Default)]
pub struct VerifyArgs {
    /// TRC files; together they provide the anchors for the chains.
    #[arg(short = 't', long = "trcs", num_args = 1..)]
    pub trcs: Vec<PathBuf>,

    /// Certificate chain files.
    #[arg(short = 'c', long = "chains", num_args = 1..)]
    pub chains: Vec<PathBuf>,

    /// Verification time in Unix seconds (default: now).
    #[arg(long)]
    pub at: Option<i64>,
}

/// Anchors indexed by ISD and version.
type AnchorIndex = BTreeMap<(IsdId, u64), TrustRootDocument>;

pub fn run_verify(args: &VerifyArgs, logger: Arc<dyn Logger>) -> Result<BatchReport, ConfigError> {
    if args.trcs.is_empty() && args.chains.is_empty() {
        return Err(ConfigError::Invalid(
            "nothing to verify (use --trcs and/or --chains)".into(),
        ));
    }
    let now = match args.at {
        Some(secs) => Timestamp::from_epoch_secs(secs)
            .map_err(|e| ConfigError::Invalid(format!("--at: {e}")))?,
        None => Timestamp::now(),
    };

    let engine = QuorumSignatureEngine::new(logger.clone());
    let mut runner = BatchRunner::new(logger.clone());

    let parsed = runner.run_paths(&args.trcs, |path| {
        TrustRootDocument::from_json(&read_input(path)?)
    });
    let mut by_isd: BTreeMap<IsdId, Vec<(PathBuf, TrustRootDocument)>> = BTreeMap::new();
    for (path, trc) in parsed {
        by_isd.entry(trc.isd()).or_default().push((path, trc));
    }

    let mut anchors = AnchorIndex::new();
    for (isd, group) in by_isd {
        let files: Vec<String> = group.iter().map(|(p, _)| p.display().to_string()).collect();
        let label = format!("ISD{isd} update chain [{}]", files.join(", "));
        let trcs: Vec<TrustRootDocument> = group.into_iter().map(|(_, t)| t).collect();
        if runner
            .run_item(&label, || engine.verify_update_chain(&trcs))
            .is_some()
        {
            for trc in trcs {
                anchors.insert((trc.isd(), trc.version()), trc);
            }
        }
    }
    logger.debug(&format!("{} verified anchor(s)", anchors.len()));

    runner.run_paths(&args.chains, |path| {
        let chain = CertificateChain::from_json(&read_input(path)?)?;
        verify_chain(&chain, &anchors, now)
    });
    Ok(runner.finish())
}

fn verify_chain(
    chain: &CertificateChain,
    anchors: &AnchorIndex,
    now: Timestamp,
) -> Result<(), TrustError> {
    let subject = chain.leaf().subject;
    let issuer = chain.issuer();
    let key = (subject.isd(), issuer.trc_version);
    let anchor = anchors.get(&key).ok_or_else(|| TrustError::AnchorMismatch {
        authority: issuer.subject,
        reason: format!(
            "no verified ISD{}-V{} among the supplied TRCs",
            key.0, key.1
        ),
    })?;
    chain.verify(&subject, anchor, now)
}
