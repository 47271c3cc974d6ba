//! # Versioned Documents
//!
//! An input document is tagged with the schema it is written in before it
//! is parsed; the parser never guesses the schema from which keys happen to
//! be present. [`VersionedTrc::upgrade`] and [`VersionedChain::upgrade`]
//! are total one-way mappings to the current schema. There is no downgrade.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use trc_core::{IsdId, Timestamp, TrustError};
use trc_crypto::{Ed25519PublicKey, KeyAlgorithm};
use trc_pki::{Certificate, CertificateChain, CoreAuthority, TrcFields, TrustRootDocument};

use crate::legacy::{LegacyCertificate, LegacyChain, LegacyCoreAuthority, LegacyTrc};

/// Schema an input document is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaVersion {
    #[default]
    Legacy,
    Current,
}

impl SchemaVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::Current => "current",
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaVersion {
    type Err = TrustError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "legacy" => Ok(Self::Legacy),
            "current" => Ok(Self::Current),
            other => Err(TrustError::Schema(format!(
                "unknown schema version {other:?}, expected legacy or current"
            ))),
        }
    }
}

// ─── TRC ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionedTrc {
    Legacy(LegacyTrc),
    Current(TrustRootDocument),
}

impl VersionedTrc {
    pub fn parse(raw: &[u8], version: SchemaVersion) -> Result<Self, TrustError> {
        match version {
            SchemaVersion::Legacy => Ok(Self::Legacy(serde_json::from_slice(raw)?)),
            SchemaVersion::Current => Ok(Self::Current(TrustRootDocument::from_json(raw)?)),
        }
    }

    pub fn schema_version(&self) -> SchemaVersion {
        match self {
            Self::Legacy(_) => SchemaVersion::Legacy,
            Self::Current(_) => SchemaVersion::Current,
        }
    }

    /// Map to the current schema.
    ///
    /// A legacy TRC gets a fresh validity of `validity_period_days` counted
    /// from its creation time, and comes out unsigned. A current TRC is
    /// returned unchanged, signatures included.
    pub fn upgrade(self, validity_period_days: u64) -> Result<TrustRootDocument, TrustError> {
        match self {
            Self::Current(trc) => Ok(trc),
            Self::Legacy(old) => upgrade_trc(old, validity_period_days),
        }
    }
}

fn upgrade_trc(old: LegacyTrc, validity_period_days: u64) -> Result<TrustRootDocument, TrustError> {
    let core_ases = old
        .core_ases
        .into_iter()
        .map(|(ia, entry)| Ok((ia, upgrade_core_entry(&entry)?)))
        .collect::<Result<BTreeMap<_, _>, TrustError>>()?;
    // The old threshold may exceed the size of the current core set.
    let core_count = u32::try_from(core_ases.len()).unwrap_or(u32::MAX);
    let quorum_trc = old.quorum_own_trc.min(core_count);

    TrustRootDocument::from_fields(TrcFields {
        isd: IsdId::new(old.isd_id)?,
        description: old.description,
        version: old.version,
        creation_time: old.creation_time,
        expiration_time: migrated_expiration(old.creation_time, validity_period_days),
        core_ases,
        root_cas: BTreeMap::new(),
        cert_logs: BTreeMap::new(),
        threshold_eepki: old.quorum_eepki,
        rains: BTreeMap::new(),
        quorum_trc,
        // Not carried forward: the legacy value has no counterpart.
        quorum_cas: 0,
        quarantine: old.quarantine,
        grace_period: old.grace_period,
    })
}

fn upgrade_core_entry(entry: &LegacyCoreAuthority) -> Result<CoreAuthority, TrustError> {
    Ok(CoreAuthority {
        offline_key: Ed25519PublicKey::from_base64(&entry.offline_key)?,
        offline_key_algorithm: KeyAlgorithm::parse_lenient(&entry.offline_key_alg)?,
        online_key: Ed25519PublicKey::from_base64(&entry.online_key)?,
        online_key_algorithm: KeyAlgorithm::parse_lenient(&entry.online_key_alg)?,
    })
}

// ─── Certificate chain ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionedChain {
    Legacy(LegacyChain),
    Current(CertificateChain),
}

impl VersionedChain {
    pub fn parse(raw: &[u8], version: SchemaVersion) -> Result<Self, TrustError> {
        match version {
            SchemaVersion::Legacy => Ok(Self::Legacy(serde_json::from_slice(raw)?)),
            SchemaVersion::Current => Ok(Self::Current(CertificateChain::from_json(raw)?)),
        }
    }

    pub fn schema_version(&self) -> SchemaVersion {
        match self {
            Self::Legacy(_) => SchemaVersion::Legacy,
            Self::Current(_) => SchemaVersion::Current,
        }
    }

    /// Map to the current schema. Legacy certificates come out unsigned.
    pub fn upgrade(self) -> Result<CertificateChain, TrustError> {
        match self {
            Self::Current(chain) => Ok(chain),
            Self::Legacy(LegacyChain(leaf, issuer)) => {
                CertificateChain::new(upgrade_certificate(leaf)?, upgrade_certificate(issuer)?)
            }
        }
    }
}

fn upgrade_certificate(old: LegacyCertificate) -> Result<Certificate, TrustError> {
    Ok(Certificate {
        subject: old.subject,
        issuer: old.issuer,
        version: old.version,
        trc_version: old.trc_version,
        comment: old.comment,
        can_issue: old.can_issue,
        sign_algorithm: KeyAlgorithm::parse_lenient(&old.sign_algorithm)?,
        subject_sign_key: Ed25519PublicKey::from_base64(&old.subject_sig_key)?,
        enc_algorithm: old.enc_algorithm,
        subject_enc_key: old.subject_enc_key,
        issuing_time: old.issuing_time,
        expiration_time: old.expiration_time,
        signature: None,
    })
}

/// Expiration a legacy TRC created at `creation_time` receives.
pub fn migrated_expiration(creation_time: Timestamp, validity_period_days: u64) -> Timestamp {
    creation_time.saturating_add_days(validity_period_days)
}
