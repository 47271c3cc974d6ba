//! # Tool Configuration
//!
//! Optional YAML file with defaults for every batch command. Command-line
//! flags override file values; file values override built-in defaults.
//!
//! ```yaml
//! validity_period_days: 365
//! mode: outdir
//! outdir: translated_certs
//! suffix: test
//! nested_by_element: false
//! key_outdir: translated_keys
//! ```
//!
//! Every error in this module is a global configuration error: it is raised
//! before any item runs and makes the process exit with status 2.

use std::path::{Path, PathBuf};

use clap::Args;
use serde::Deserialize;
use thiserror::Error;
use trc_core::TrustError;
use trc_migrate::{OutputMode, OutputPolicy, SchemaVersion};

/// A configuration problem that aborts a command before any item runs.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("cannot load key material: {0}")]
    KeyStore(#[source] TrustError),

    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    pub validity_period_days: u64,
    pub mode: OutputMode,
    pub outdir: PathBuf,
    pub suffix: String,
    pub nested_by_element: bool,
    pub key_outdir: PathBuf,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            validity_period_days: 365,
            mode: OutputMode::OutDir,
            outdir: PathBuf::from("translated_certs"),
            suffix: "test".to_string(),
            nested_by_element: false,
            key_outdir: PathBuf::from("translated_keys"),
        }
    }
}

impl ToolConfig {
    /// Load `path`, or the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file is a valid config with every default.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }
}

/// Placement flags shared by the migrate and sign commands.
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Output mode: overwrite, suffix, or outdir (case-insensitive).
    #[arg(long)]
    pub mode: Option<String>,

    /// Output directory for outdir mode.
    #[arg(short, long)]
    pub outdir: Option<PathBuf>,

    /// Suffix appended to source file names in suffix mode.
    #[arg(short, long)]
    pub suffix: Option<String>,

    /// Nest outdir output by element (the source's grandparent directory).
    #[arg(short = 'e', long = "element")]
    pub nested_by_element: bool,
}

impl OutputArgs {
    fn mode(&self, config: &ToolConfig) -> Result<OutputMode, ConfigError> {
        match &self.mode {
            Some(raw) => raw
                .parse()
                .map_err(|e: TrustError| ConfigError::Invalid(e.to_string())),
            None => Ok(config.mode),
        }
    }

    /// Placement policy for TRCs and chains.
    pub fn document_policy(&self, config: &ToolConfig) -> Result<OutputPolicy, ConfigError> {
        let mode = self.mode(config)?;
        let outdir = self.outdir.clone().unwrap_or_else(|| config.outdir.clone());
        let suffix = self.suffix.clone().unwrap_or_else(|| config.suffix.clone());
        let nested = self.nested_by_element || config.nested_by_element;
        OutputPolicy::new(mode, outdir, suffix, nested)
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Placement policy for key files: the default output directory is
    /// `key_outdir`, and nesting by element does not apply.
    pub fn key_policy(&self, config: &ToolConfig) -> Result<OutputPolicy, ConfigError> {
        let mode = self.mode(config)?;
        let outdir = self.outdir.clone().unwrap_or_else(|| config.key_outdir.clone());
        let suffix = self.suffix.clone().unwrap_or_else(|| config.suffix.clone());
        OutputPolicy::new(mode, outdir, suffix, false)
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

/// Parse a `--from` value.
pub fn parse_schema(raw: &str) -> Result<SchemaVersion, ConfigError> {
    raw.parse()
        .map_err(|e: TrustError| ConfigError::Invalid(e.to_string()))
}

/// Reject an empty conf-dir list before any item runs.
pub fn require_conf_dirs(conf_dirs: &[PathBuf]) -> Result<(), ConfigError> {
    if conf_dirs.is_empty() {
        return Err(ConfigError::Invalid(
            "no configuration directories supplied (use --conf-dirs)".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ToolConfig::load(None).unwrap();
        assert_eq!(config.validity_period_days, 365);
        assert_eq!(config.mode, OutputMode::OutDir);
        assert_eq!(config.outdir, PathBuf::from("translated_certs"));
        assert_eq!(config.key_outdir, PathBuf::from("translated_keys"));
        assert_eq!(config.suffix, "test");
        assert!(!config.nested_by_element);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = ToolConfig::from_yaml("mode: SUFFIX\nvalidity_period_days: 30\n").unwrap();
        assert_eq!(config.mode, OutputMode::Suffix);
        assert_eq!(config.validity_period_days, 30);
        assert_eq!(config.suffix, "test");
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(ToolConfig::from_yaml("period: 30\n").is_err());
        assert!(ToolConfig::from_yaml("mode: sideways\n").is_err());
    }

    #[test]
    fn test_empty_file_is_defaults() {
        assert_eq!(ToolConfig::from_yaml("\n").unwrap(), ToolConfig::default());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ToolConfig::load(Some(&dir.path().join("absent.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_flags_override_config() {
        let config = ToolConfig::default();
        let args = OutputArgs {
            mode: Some("suffix".into()),
            suffix: Some("new1".into()),
            ..OutputArgs::default()
        };
        let policy = args.document_policy(&config).unwrap();
        assert_eq!(policy.mode(), OutputMode::Suffix);

        let bad = OutputArgs {
            mode: Some("elsewhere".into()),
            ..OutputArgs::default()
        };
        assert!(matches!(bad.document_policy(&config), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_key_policy_uses_key_outdir() {
        let policy = OutputArgs::default().key_policy(&ToolConfig::default()).unwrap();
        assert_eq!(policy.outdir(), Path::new("translated_keys"));
    }

    #[test]
    fn test_require_conf_dirs() {
        assert!(require_conf_dirs(&[]).is_err());
        assert!(require_conf_dirs(&[PathBuf::from("a")]).is_ok());
    }
}
