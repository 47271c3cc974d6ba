//! # Key File Migration
//!
//! Legacy conf dirs store each role's 32-byte seed in `<role>.key`. The
//! current layout keeps the seed in `<role>.seed` and the 64-byte raw key
//! in `<role>.key`. A `.key` file that does not hold a seed-length value is
//! treated as already migrated and left alone.

use std::path::{Path, PathBuf};

use trc_core::TrustError;
use trc_crypto::{KeyMaterial, KeyRole};

use crate::placement::{write_key_atomic, OutputPolicy};

/// Legacy keys found in one conf dir.
#[derive(Debug)]
pub struct KeyMigration {
    conf_dir: PathBuf,
    keys: Vec<KeyMaterial>,
}

impl KeyMigration {
    /// Collect every role whose `.key` file holds a legacy seed.
    ///
    /// # Errors
    ///
    /// `Io` when `conf_dir` is not a directory or a key file cannot be read;
    /// `Crypto` when a key file is not valid base64.
    pub fn collect(conf_dir: &Path) -> Result<Self, TrustError> {
        if !conf_dir.is_dir() {
            return Err(TrustError::io(
                conf_dir,
                std::io::Error::new(std::io::ErrorKind::NotFound, "conf dir does not exist"),
            ));
        }
        let mut keys = Vec::new();
        for role in KeyRole::ALL {
            if let Some(material) = KeyMaterial::load_legacy(conf_dir, role)? {
                keys.push(material);
            }
        }
        Ok(Self {
            conf_dir: conf_dir.to_path_buf(),
            keys,
        })
    }

    pub fn conf_dir(&self) -> &Path {
        &self.conf_dir
    }

    /// Roles that will be rewritten.
    pub fn roles(&self) -> Vec<KeyRole> {
        self.keys.iter().map(KeyMaterial::role).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Write the raw key and seed files for every collected role. Returns
    /// the paths written, raw key first for each role.
    pub fn write(&self, policy: &OutputPolicy) -> Result<Vec<PathBuf>, TrustError> {
        let mut written = Vec::with_capacity(self.keys.len() * 2);
        for material in &self.keys {
            let role = material.role();
            let files = [
                (role.key_file_name(), material.encode_raw()),
                (role.seed_file_name(), material.encode_seed()),
            ];
            for (name, contents) in files {
                let dest = policy.key_destination(&self.conf_dir, &name);
                write_key_atomic(&dest, contents.as_bytes())?;
                written.push(dest);
            }
        }
        Ok(written)
    }
}
