//! # Migrate Subcommands
//!
//! `migrate-trc`, `migrate-chain` and `migrate-keys`. Documents are read in
//! the `--from` schema, upgraded, re-signed with keys from the supplied
//! conf dirs, and placed according to the output flags.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use trc_core::{Logger, TrustError};
use trc_crypto::KeyMaterialStore;
use trc_migrate::{
    write_atomic, DocumentMigrator, KeyMigration, MigrationConfig, OutputPolicy,
};

use crate::batch::{BatchReport, BatchRunner};
use crate::config::{parse_schema, require_conf_dirs, ConfigError, OutputArgs, ToolConfig};

/// Arguments for `migrate-trc`.
#[derive(Args, Debug, Clone)]
pub struct MigrateTrcArgs {
    /// TRC files to migrate.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Authority conf dirs holding the core ASes' online keys.
    #[arg(short = 'c', long = "conf-dirs", num_args = 1..)]
    pub conf_dirs: Vec<PathBuf>,

    /// Validity period of the migrated TRCs, in days.
    #[arg(short = 'p', long = "period")]
    pub validity_period_days: Option<u64>,

    /// Schema of the input files: legacy or current.
    #[arg(long = "from", default_value = "legacy")]
    pub from: String,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments for `migrate-chain`.
#[derive(Args, Debug, Clone)]
pub struct MigrateChainArgs {
    /// Certificate chain files to migrate.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Authority conf dirs holding the issuers' signing and online keys.
    #[arg(short = 'c', long = "conf-dirs", num_args = 1..)]
    pub conf_dirs: Vec<PathBuf>,

    /// Schema of the input files: legacy or current.
    #[arg(long = "from", default_value = "legacy")]
    pub from: String,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments for `migrate-keys`.
#[derive(Args, Debug, Clone)]
pub struct MigrateKeysArgs {
    /// Authority conf dirs whose key files are rewritten.
    pub conf_dirs: Vec<PathBuf>,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Build the read-only key store for a batch.
pub fn load_key_store(
    conf_dirs: &[PathBuf],
    logger: &Arc<dyn Logger>,
) -> Result<Arc<KeyMaterialStore>, ConfigError> {
    require_conf_dirs(conf_dirs)?;
    let store = KeyMaterialStore::load_conf_dirs(conf_dirs, logger).map_err(ConfigError::KeyStore)?;
    logger.info(&format!(
        "loaded keys for {} core authorities from {} conf dir(s)",
        store.len(),
        conf_dirs.len()
    ));
    Ok(Arc::new(store))
}

fn place(
    policy: &OutputPolicy,
    source: &Path,
    file_name: &str,
    json: &str,
    logger: &Arc<dyn Logger>,
) -> Result<PathBuf, TrustError> {
    let dest = policy.document_destination(source, file_name);
    write_atomic(&dest, json.as_bytes())?;
    logger.info(&format!("{} -> {}", source.display(), dest.display()));
    Ok(dest)
}

pub fn run_migrate_trc(
    args: &MigrateTrcArgs,
    config: &ToolConfig,
    logger: Arc<dyn Logger>,
) -> Result<BatchReport, ConfigError> {
    let validity_period_days = args
        .validity_period_days
        .unwrap_or(config.validity_period_days);
    if validity_period_days == 0 {
        return Err(ConfigError::Invalid(
            "validity period must be at least one day".into(),
        ));
    }
    let migration = MigrationConfig {
        validity_period_days,
        input_schema: parse_schema(&args.from)?,
    };
    let policy = args.output.document_policy(config)?;
    let store = load_key_store(&args.conf_dirs, &logger)?;
    let migrator = DocumentMigrator::new(migration, store, logger.clone());

    let mut runner = BatchRunner::new(logger.clone());
    runner.run_paths(&args.files, |path| {
        let trc = migrator.migrate_trc(path)?.into_document();
        place(&policy, path, &trc.file_name(), &trc.to_json()?, &logger)
    });
    Ok(runner.finish())
}

pub fn run_migrate_chain(
    args: &MigrateChainArgs,
    config: &ToolConfig,
    logger: Arc<dyn Logger>,
) -> Result<BatchReport, ConfigError> {
    let migration = MigrationConfig {
        validity_period_days: config.validity_period_days,
        input_schema: parse_schema(&args.from)?,
    };
    let policy = args.output.document_policy(config)?;
    let store = load_key_store(&args.conf_dirs, &logger)?;
    let migrator = DocumentMigrator::new(migration, store, logger.clone());

    let mut runner = BatchRunner::new(logger.clone());
    runner.run_paths(&args.files, |path| {
        let chain = migrator.migrate_chain(path)?.into_document();
        place(&policy, path, &chain.file_name(), &chain.to_json()?, &logger)
    });
    Ok(runner.finish())
}

pub fn run_migrate_keys(
    args: &MigrateKeysArgs,
    config: &ToolConfig,
    logger: Arc<dyn Logger>,
) -> Result<BatchReport, ConfigError> {
    require_conf_dirs(&args.conf_dirs)?;
    let policy = args.output.key_policy(config)?;

    let mut runner = BatchRunner::new(logger.clone());
    runner.run_paths(&args.conf_dirs, |dir| {
        let migration = KeyMigration::collect(dir)?;
        if migration.is_empty() {
            logger.info(&format!("{}: no legacy key files", dir.display()));
        }
        let written = migration.write(&policy)?;
        logger.debug(&format!("{}: wrote {} file(s)", dir.display(), written.len()));
        Ok(written)
    });
    Ok(runner.finish())
}
