//! # Document Migrator
//!
//! Runs one document through the migration pipeline. Each stage is a
//! distinct type, so a document cannot be persisted before it is signed or
//! signed before it is translated.
//!
//! ```text
//! Parsed(versioned) ──translate()──▶ Translated(current, unsigned) ──sign()──▶ Signed(current)
//! ```
//!
//! ## Signing
//!
//! - TRCs are signed by every core authority of the *translated* document
//!   with its configured online key. An authority that already signed
//!   (a current-schema input) is left as is.
//! - Chains are re-signed by the issuing authority: the leaf with its
//!   signing key, the issuer certificate with its online key.
//!
//! A missing key fails the document with `MissingKey`, naming the
//! authority and role.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use trc_core::{Logger, TrustError};
use trc_crypto::{KeyMaterialStore, KeyRole};
use trc_pki::{CertificateChain, QuorumSignatureEngine, TrustRootDocument};

use crate::schema::{SchemaVersion, VersionedChain, VersionedTrc};

// ─── State Types ─────────────────────────────────────────────────────

/// Migration state: input parsed in its own schema.
#[derive(Debug, Clone, Copy)]
pub struct Parsed;

/// Migration state: mapped to the current schema, not yet signed.
#[derive(Debug, Clone, Copy)]
pub struct Translated;

/// Migration state: current schema, signed, ready to persist.
#[derive(Debug, Clone, Copy)]
pub struct Signed;

mod private {
    pub trait Sealed {}
    impl Sealed for super::Parsed {}
    impl Sealed for super::Translated {}
    impl Sealed for super::Signed {}
}

/// Marker trait for migration states. Sealed.
pub trait MigrationState: private::Sealed + std::fmt::Debug {
    fn name() -> &'static str;
}

impl MigrationState for Parsed {
    fn name() -> &'static str {
        "PARSED"
    }
}
impl MigrationState for Translated {
    fn name() -> &'static str {
        "TRANSLATED"
    }
}
impl MigrationState for Signed {
    fn name() -> &'static str {
        "SIGNED"
    }
}

// ─── The Migration ───────────────────────────────────────────────────

/// One document on its way through the pipeline. `D` is the document value
/// held in state `S`: a [`VersionedTrc`]/[`VersionedChain`] while parsed,
/// a [`TrustRootDocument`]/[`CertificateChain`] afterwards.
#[derive(Debug)]
pub struct Migration<D, S: MigrationState> {
    source: PathBuf,
    document: D,
    _state: PhantomData<S>,
}

impl<D, S: MigrationState> Migration<D, S> {
    /// Canonical name of the current state (`PARSED`, ...).
    pub fn state_name(&self) -> &'static str {
        S::name()
    }

    /// File the document was read from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    fn advance<T: MigrationState, E>(
        self,
        step: impl FnOnce(D) -> Result<E, TrustError>,
    ) -> Result<Migration<E, T>, TrustError> {
        let document = step(self.document)?;
        Ok(Migration {
            source: self.source,
            document,
            _state: PhantomData,
        })
    }
}

impl<D> Migration<D, Parsed> {
    pub fn new(source: impl Into<PathBuf>, document: D) -> Self {
        Self {
            source: source.into(),
            document,
            _state: PhantomData,
        }
    }
}

impl<D> Migration<D, Signed> {
    pub fn into_document(self) -> D {
        self.document
    }
}

impl Migration<VersionedTrc, Parsed> {
    pub fn translate(
        self,
        validity_period_days: u64,
    ) -> Result<Migration<TrustRootDocument, Translated>, TrustError> {
        self.advance(|trc| trc.upgrade(validity_period_days))
    }
}

impl Migration<TrustRootDocument, Translated> {
    /// Sign for every core authority that has not signed yet.
    pub fn sign(
        self,
        store: &KeyMaterialStore,
        engine: &QuorumSignatureEngine,
    ) -> Result<Migration<TrustRootDocument, Signed>, TrustError> {
        self.advance(|mut trc| {
            let authorities: Vec<_> = trc.core_authorities().keys().copied().collect();
            for authority in authorities {
                if trc.has_signed(&authority) {
                    continue;
                }
                let key = store.require(&authority, KeyRole::Online)?;
                engine.sign(&mut trc, authority, key.keypair())?;
            }
            Ok(trc)
        })
    }
}

impl Migration<VersionedChain, Parsed> {
    pub fn translate(self) -> Result<Migration<CertificateChain, Translated>, TrustError> {
        self.advance(VersionedChain::upgrade)
    }
}

impl Migration<CertificateChain, Translated> {
    /// Re-sign both certificates with the issuing authority's keys.
    pub fn sign(
        self,
        store: &KeyMaterialStore,
    ) -> Result<Migration<CertificateChain, Signed>, TrustError> {
        self.advance(|mut chain| {
            let issuer = chain.leaf().issuer;
            let signing = store.require(&issuer, KeyRole::Signing)?;
            let online = store.require(&issuer, KeyRole::Online)?;
            chain.sign(signing.keypair(), online.keypair())?;
            Ok(chain)
        })
    }
}

// ─── Migrator ────────────────────────────────────────────────────────

/// Parameters that shape every migrated document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationConfig {
    /// Validity assigned to migrated legacy TRCs, counted from creation.
    pub validity_period_days: u64,
    /// Schema of the input files.
    pub input_schema: SchemaVersion,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            validity_period_days: 365,
            input_schema: SchemaVersion::Legacy,
        }
    }
}

/// Reads, upgrades, and re-signs TRC and chain files.
///
/// Holds the key store read-only; migrating one file never affects another.
#[derive(Debug, Clone)]
pub struct DocumentMigrator {
    config: MigrationConfig,
    store: Arc<KeyMaterialStore>,
    engine: QuorumSignatureEngine,
    logger: Arc<dyn Logger>,
}

impl DocumentMigrator {
    pub fn new(config: MigrationConfig, store: Arc<KeyMaterialStore>, logger: Arc<dyn Logger>) -> Self {
        Self {
            config,
            store,
            engine: QuorumSignatureEngine::new(logger.clone()),
            logger,
        }
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    pub fn parse_trc(&self, path: &Path) -> Result<Migration<VersionedTrc, Parsed>, TrustError> {
        let raw = std::fs::read(path).map_err(|e| TrustError::io(path, e))?;
        let trc = VersionedTrc::parse(&raw, self.config.input_schema)?;
        Ok(Migration::new(path, trc))
    }

    pub fn parse_chain(&self, path: &Path) -> Result<Migration<VersionedChain, Parsed>, TrustError> {
        let raw = std::fs::read(path).map_err(|e| TrustError::io(path, e))?;
        let chain = VersionedChain::parse(&raw, self.config.input_schema)?;
        Ok(Migration::new(path, chain))
    }

    /// Full pipeline for one TRC file.
    pub fn migrate_trc(&self, path: &Path) -> Result<Migration<TrustRootDocument, Signed>, TrustError> {
        let translated = self.parse_trc(path)?.translate(self.config.validity_period_days)?;
        self.logger.debug(&format!(
            "{}: {} as ISD{}-V{}",
            path.display(),
            translated.state_name(),
            translated.document().isd(),
            translated.document().version()
        ));
        let signed = translated.sign(&self.store, &self.engine)?;
        let report = signed.document().verify_self_signed()?;
        self.logger.debug(&format!(
            "{}: {} by {} core authorities",
            path.display(),
            signed.state_name(),
            report.valid_signers.len()
        ));
        Ok(signed)
    }

    /// Full pipeline for one certificate chain file.
    pub fn migrate_chain(
        &self,
        path: &Path,
    ) -> Result<Migration<CertificateChain, Signed>, TrustError> {
        let translated = self.parse_chain(path)?.translate()?;
        let signed = translated.sign(&self.store)?;
        self.logger.debug(&format!(
            "{}: {} by {}",
            path.display(),
            signed.state_name(),
            signed.document().leaf().issuer
        ));
        Ok(signed)
    }
}
