//! # Sign-TRC Subcommand
//!
//! Adds the signature of the authority owning `--conf-dir` to each
//! current-schema TRC. The online key is loaded once, before any item.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use trc_core::{Logger, TrustError};
use trc_crypto::{ConfDir, KeyMaterial, KeyRole};
use trc_migrate::write_atomic;
use trc_pki::{QuorumSignatureEngine, TrustRootDocument};

use crate::batch::{BatchReport, BatchRunner};
use crate::config::{ConfigError, OutputArgs, ToolConfig};
use crate::read_input;

/// Arguments for `sign-trc`.
#[derive(Args, Debug, Clone)]
pub struct SignTrcArgs {
    /// Current-schema TRC files to sign.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Conf dir of the signing authority.
    #[arg(long = "conf-dir")]
    pub conf_dir: PathBuf,

    #[command(flatten)]
    pub output: OutputArgs,
}

pub fn run_sign_trc(
    args: &SignTrcArgs,
    config: &ToolConfig,
    logger: Arc<dyn Logger>,
) -> Result<BatchReport, ConfigError> {
    let policy = args.output.document_policy(config)?;
    let conf = ConfDir::open(&args.conf_dir).map_err(ConfigError::KeyStore)?;
    let key = KeyMaterial::load(&conf.path, KeyRole::Online, &logger)
        .map_err(ConfigError::KeyStore)?
        .ok_or_else(|| {
            ConfigError::KeyStore(TrustError::MissingKey {
                authority: conf.authority,
                role: KeyRole::Online.as_str().to_string(),
            })
        })?;
    logger.info(&format!("signing as {}", conf.authority));

    let engine = QuorumSignatureEngine::new(logger.clone());
    let mut runner = BatchRunner::new(logger.clone());
    runner.run_paths(&args.files, |path| {
        let mut trc = TrustRootDocument::from_json(&read_input(path)?)?;
        engine.sign(&mut trc, conf.authority, key.keypair())?;
        let dest = policy.document_destination(path, &trc.file_name());
        write_atomic(&dest, trc.to_json()?.as_bytes())?;
        logger.info(&format!(
            "{} -> {} ({} of {} signatures, quorum {})",
            path.display(),
            dest.display(),
            trc.signatures().len(),
            trc.core_authorities().len(),
            if trc.is_quorum_reached() { "reached" } else { "pending" }
        ));
        Ok(dest)
    });
    Ok(runner.finish())
}
