//! # Key Material Store
//!
//! Read-only, per-authority key material for one batch run. Each
//! authority's keys are loaded from its configuration directory and are
//! never shared with, or mutated by, another authority's entry.
//!
//! A configuration directory contains `topology.json` (only `isd_as` and
//! `core` are read) and a `keys/` directory with the role key files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use trc_core::{AuthorityId, Logger, TrustError};

use crate::keys::{KeyMaterial, KeyRole};

/// Topology file name inside a conf dir.
pub const TOPOLOGY_FILE: &str = "topology.json";

#[derive(Debug, Deserialize)]
struct TopologyDescriptor {
    isd_as: AuthorityId,
    #[serde(default)]
    core: bool,
}

/// A parsed authority configuration directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfDir {
    pub path: PathBuf,
    pub authority: AuthorityId,
    pub core: bool,
}

impl ConfDir {
    /// Read `topology.json` from `path`.
    pub fn open(path: &Path) -> Result<Self, TrustError> {
        if !path.is_dir() {
            return Err(TrustError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "conf dir does not exist"),
            ));
        }
        let topo_path = path.join(TOPOLOGY_FILE);
        let raw = std::fs::read(&topo_path).map_err(|e| TrustError::io(&topo_path, e))?;
        let topo: TopologyDescriptor = serde_json::from_slice(&raw).map_err(|e| {
            TrustError::Schema(format!("{}: {e}", topo_path.display()))
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            authority: topo.isd_as,
            core: topo.core,
        })
    }

    /// Final path component, used to name per-element output directories.
    pub fn element_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// All key material held for one authority.
#[derive(Debug)]
pub struct AuthorityKeys {
    pub authority: AuthorityId,
    online: Option<KeyMaterial>,
    offline: Option<KeyMaterial>,
    signing: Option<KeyMaterial>,
}

impl AuthorityKeys {
    pub fn new(authority: AuthorityId) -> Self {
        Self {
            authority,
            online: None,
            offline: None,
            signing: None,
        }
    }

    /// Load every role present in a conf dir.
    pub fn load(conf: &ConfDir, logger: &Arc<dyn Logger>) -> Result<Self, TrustError> {
        let mut keys = Self::new(conf.authority);
        for role in KeyRole::ALL {
            if let Some(material) = KeyMaterial::load(&conf.path, role, logger)? {
                keys.set(material);
            }
        }
        Ok(keys)
    }

    /// Install key material in the slot for its role.
    pub fn set(&mut self, material: KeyMaterial) {
        match material.role() {
            KeyRole::Online => self.online = Some(material),
            KeyRole::Offline => self.offline = Some(material),
            KeyRole::Signing => self.signing = Some(material),
        }
    }

    pub fn get(&self, role: KeyRole) -> Option<&KeyMaterial> {
        match role {
            KeyRole::Online => self.online.as_ref(),
            KeyRole::Offline => self.offline.as_ref(),
            KeyRole::Signing => self.signing.as_ref(),
        }
    }

    /// Roles that have key material.
    pub fn roles(&self) -> Vec<KeyRole> {
        KeyRole::ALL
            .into_iter()
            .filter(|r| self.get(*r).is_some())
            .collect()
    }
}

/// Read-only map from authority to its key material.
#[derive(Debug, Default)]
pub struct KeyMaterialStore {
    authorities: BTreeMap<AuthorityId, AuthorityKeys>,
}

impl KeyMaterialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load keys from the conf dirs of core authorities.
    ///
    /// Conf dirs of non-core ASes are skipped. Any unreadable conf dir or
    /// malformed key file fails the whole load.
    pub fn load_conf_dirs(dirs: &[PathBuf], logger: &Arc<dyn Logger>) -> Result<Self, TrustError> {
        let mut store = Self::new();
        for dir in dirs {
            let conf = ConfDir::open(dir)?;
            if !conf.core {
                logger.debug(&format!(
                    "{}: {} is not a core AS, skipping",
                    dir.display(),
                    conf.authority
                ));
                continue;
            }
            let keys = AuthorityKeys::load(&conf, logger)?;
            logger.debug(&format!(
                "{}: loaded {} key(s) for {}",
                dir.display(),
                keys.roles().len(),
                conf.authority
            ));
            store.insert(keys);
        }
        Ok(store)
    }

    /// Add or replace an authority's keys.
    pub fn insert(&mut self, keys: AuthorityKeys) {
        self.authorities.insert(keys.authority, keys);
    }

    /// Insert a single key, creating the authority entry when needed.
    pub fn insert_key(&mut self, authority: AuthorityId, material: KeyMaterial) {
        self.authorities
            .entry(authority)
            .or_insert_with(|| AuthorityKeys::new(authority))
            .set(material);
    }

    pub fn get(&self, authority: &AuthorityId, role: KeyRole) -> Option<&KeyMaterial> {
        self.authorities.get(authority).and_then(|k| k.get(role))
    }

    /// Like [`get`](Self::get), failing with `MissingKey`.
    pub fn require(&self, authority: &AuthorityId, role: KeyRole) -> Result<&KeyMaterial, TrustError> {
        self.get(authority, role).ok_or_else(|| TrustError::MissingKey {
            authority: *authority,
            role: role.as_str().to_string(),
        })
    }

    pub fn authorities(&self) -> impl Iterator<Item = &AuthorityId> {
        self.authorities.keys()
    }

    pub fn len(&self) -> usize {
        self.authorities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.authorities.is_empty()
    }
}
