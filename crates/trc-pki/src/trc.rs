//! # Trust-Root Document (TRC)
//!
//! The signed trust anchor of one isolation domain. A TRC lists the core
//! authorities of the ISD with their online and offline keys and the
//! threshold of authority signatures (`quorum_trc`) that makes the document
//! authoritative.
//!
//! ## Lifecycle
//!
//! ```text
//! from_fields() ──▶ unsigned ──add_signature()*──▶ signed ──persist──▶ immutable
//! ```
//!
//! Signatures are append-only: an authority signs a version at most once
//! and no signature is ever removed. Any content change requires a new
//! version.
//!
//! ## Encoding
//!
//! The JSON object has exactly the keys of [`TrcFields`] plus `signatures`.
//! Parsing is strict: unknown or missing keys are schema errors. The signed
//! bytes are the JCS encoding of [`TrcFields`], i.e. the document without
//! its `signatures` key.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use trc_core::{AuthorityId, CanonicalBytes, IsdId, Timestamp, TrustError};
use trc_crypto::{verify_with_public_key, Ed25519PublicKey, Ed25519Signature, KeyAlgorithm};

/// Key of the signature map in the JSON encoding.
pub const SIGNATURES_KEY: &str = "signatures";

/// Opaque sub-object carried for subsystems outside this toolchain.
pub type OpaqueMap = BTreeMap<String, Value>;

/// Key material a TRC registers for one core authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoreAuthority {
    pub offline_key: Ed25519PublicKey,
    pub offline_key_algorithm: KeyAlgorithm,
    pub online_key: Ed25519PublicKey,
    pub online_key_algorithm: KeyAlgorithm,
}

/// Every field of a TRC except its signatures.
///
/// This is exactly the value that core authorities sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrcFields {
    pub isd: IsdId,
    pub description: String,
    pub version: u64,
    pub creation_time: Timestamp,
    pub expiration_time: Timestamp,
    pub core_ases: BTreeMap<AuthorityId, CoreAuthority>,
    pub root_cas: OpaqueMap,
    pub cert_logs: OpaqueMap,
    pub threshold_eepki: u32,
    pub rains: OpaqueMap,
    pub quorum_trc: u32,
    pub quorum_cas: u32,
    pub quarantine: bool,
    /// Seconds the previous version stays valid after this one is issued.
    pub grace_period: u64,
}

/// Outcome of counting signatures against a key registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuorumReport {
    /// Authorities whose signature verified against the registry.
    pub valid_signers: BTreeSet<AuthorityId>,
    /// Signers that are unregistered or whose signature did not verify.
    pub rejected_signers: BTreeSet<AuthorityId>,
    /// Threshold applied.
    pub required: usize,
}

impl QuorumReport {
    pub fn is_reached(&self) -> bool {
        self.valid_signers.len() >= self.required
    }

    fn into_result(self) -> Result<Self, TrustError> {
        if self.is_reached() {
            Ok(self)
        } else {
            Err(TrustError::QuorumNotReached {
                required: self.required,
                valid: self.valid_signers.len(),
            })
        }
    }
}

/// A TRC: validated fields plus the append-only signature set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustRootDocument {
    fields: TrcFields,
    signatures: BTreeMap<AuthorityId, Ed25519Signature>,
}

impl TrustRootDocument {
    /// Build an unsigned TRC, enforcing the structural invariants.
    ///
    /// # Errors
    ///
    /// `TrustError::Schema` when the core authority set is empty, a core
    /// authority belongs to another ISD, `quorum_trc` is zero or exceeds the
    /// number of core authorities, the document expires before it is
    /// created, or an opaque map holds a float and so has no signable
    /// encoding.
    pub fn from_fields(fields: TrcFields) -> Result<Self, TrustError> {
        if fields.core_ases.is_empty() {
            return Err(TrustError::Schema("core_ases must not be empty".into()));
        }
        if let Some(foreign) = fields.core_ases.keys().find(|ia| ia.isd() != fields.isd) {
            return Err(TrustError::Schema(format!(
                "core authority {foreign} does not belong to ISD {}",
                fields.isd
            )));
        }
        let authorities = fields.core_ases.len();
        if fields.quorum_trc == 0 || fields.quorum_trc as usize > authorities {
            return Err(TrustError::Schema(format!(
                "quorum_trc must be in 1..={authorities}, got {}",
                fields.quorum_trc
            )));
        }
        if fields.expiration_time <= fields.creation_time {
            return Err(TrustError::Schema(format!(
                "expiration_time {} is not after creation_time {}",
                fields.expiration_time.epoch_secs(),
                fields.creation_time.epoch_secs()
            )));
        }
        CanonicalBytes::new(&fields)?;
        Ok(Self {
            fields,
            signatures: BTreeMap::new(),
        })
    }

    /// Parse the JSON encoding strictly.
    pub fn from_json(raw: &[u8]) -> Result<Self, TrustError> {
        let mut object: serde_json::Map<String, Value> = serde_json::from_slice(raw)?;
        let signatures = object
            .remove(SIGNATURES_KEY)
            .ok_or_else(|| TrustError::Schema(format!("missing field `{SIGNATURES_KEY}`")))?;
        let signatures: BTreeMap<AuthorityId, Ed25519Signature> =
            serde_json::from_value(signatures)?;
        let fields: TrcFields = serde_json::from_value(Value::Object(object))?;

        let mut trc = Self::from_fields(fields)?;
        for (authority, signature) in signatures {
            trc.add_signature(authority, signature)?;
        }
        Ok(trc)
    }

    /// Render the JSON encoding (pretty-printed, maps in key order).
    pub fn to_json(&self) -> Result<String, TrustError> {
        let mut value = serde_json::to_value(&self.fields)?;
        if let Value::Object(object) = &mut value {
            object.insert(
                SIGNATURES_KEY.to_string(),
                serde_json::to_value(&self.signatures)?,
            );
        }
        Ok(serde_json::to_string_pretty(&value)?)
    }

    /// The exact byte sequence every core authority signs.
    pub fn canonical_unsigned_bytes(&self) -> Result<CanonicalBytes, TrustError> {
        Ok(CanonicalBytes::new(&self.fields)?)
    }

    /// Record a signature.
    ///
    /// # Errors
    ///
    /// - `UnknownAuthority` if `authority` is not a core authority.
    /// - `DuplicateSignature` if `authority` already signed this version.
    pub fn add_signature(
        &mut self,
        authority: AuthorityId,
        signature: Ed25519Signature,
    ) -> Result<(), TrustError> {
        if !self.fields.core_ases.contains_key(&authority) {
            return Err(TrustError::UnknownAuthority(authority));
        }
        if self.signatures.contains_key(&authority) {
            return Err(TrustError::DuplicateSignature {
                authority,
                version: self.fields.version,
            });
        }
        self.signatures.insert(authority, signature);
        Ok(())
    }

    /// Whether `authority` has a recorded signature on this version.
    pub fn has_signed(&self, authority: &AuthorityId) -> bool {
        self.signatures.contains_key(authority)
    }

    /// True iff at least `quorum_trc` signatures verify against this
    /// document's own registered online keys.
    pub fn is_quorum_reached(&self) -> bool {
        self.tally(&self.fields.core_ases, self.fields.quorum_trc)
            .map(|report| report.is_reached())
            .unwrap_or(false)
    }

    /// Count signatures against this document's own keys and threshold,
    /// regardless of version.
    pub fn verify_self_signed(&self) -> Result<QuorumReport, TrustError> {
        self.tally(&self.fields.core_ases, self.fields.quorum_trc)?
            .into_result()
    }

    /// Verify this TRC against the version that precedes it.
    ///
    /// A genesis TRC (version 0) is self-signed and verified against its own
    /// keys; `prior` is not consulted. Any later version must be vouched for
    /// by the authorities and keys registered in `prior`, with `prior`'s
    /// threshold, so a TRC can never bootstrap trust with keys it introduces
    /// itself. Individual bad signatures only reduce the count.
    pub fn verify(&self, prior: &Self) -> Result<QuorumReport, TrustError> {
        if self.is_genesis() {
            return self.verify_self_signed();
        }
        if prior.fields.isd != self.fields.isd {
            return Err(TrustError::UpdateChain(format!(
                "predecessor belongs to ISD {}, expected ISD {}",
                prior.fields.isd, self.fields.isd
            )));
        }
        if prior.fields.version.checked_add(1) != Some(self.fields.version) {
            return Err(TrustError::UpdateChain(format!(
                "version {} cannot follow version {}",
                self.fields.version, prior.fields.version
            )));
        }
        self.tally(&prior.fields.core_ases, prior.fields.quorum_trc)?
            .into_result()
    }

    fn tally(
        &self,
        registry: &BTreeMap<AuthorityId, CoreAuthority>,
        quorum: u32,
    ) -> Result<QuorumReport, TrustError> {
        let message = self.canonical_unsigned_bytes()?;
        let mut report = QuorumReport {
            valid_signers: BTreeSet::new(),
            rejected_signers: BTreeSet::new(),
            required: quorum as usize,
        };
        for (authority, signature) in &self.signatures {
            let verified = registry.get(authority).is_some_and(|entry| {
                verify_with_public_key(&message, signature, &entry.online_key).is_ok()
            });
            if verified {
                report.valid_signers.insert(*authority);
            } else {
                report.rejected_signers.insert(*authority);
            }
        }
        Ok(report)
    }

    pub fn fields(&self) -> &TrcFields {
        &self.fields
    }

    pub fn isd(&self) -> IsdId {
        self.fields.isd
    }

    pub fn version(&self) -> u64 {
        self.fields.version
    }

    /// The first version of a domain's TRC.
    pub fn is_genesis(&self) -> bool {
        self.fields.version == 0
    }

    pub fn core_authorities(&self) -> &BTreeMap<AuthorityId, CoreAuthority> {
        &self.fields.core_ases
    }

    pub fn quorum_trc(&self) -> u32 {
        self.fields.quorum_trc
    }

    pub fn creation_time(&self) -> Timestamp {
        self.fields.creation_time
    }

    pub fn expiration_time(&self) -> Timestamp {
        self.fields.expiration_time
    }

    /// End of the window in which this TRC can anchor anything:
    /// `expiration_time + grace_period`.
    pub fn valid_until(&self) -> Timestamp {
        self.fields
            .expiration_time
            .saturating_add_secs(self.fields.grace_period)
    }

    /// Whether `now` lies in `[creation_time, valid_until()]`.
    pub fn is_valid_at(&self, now: Timestamp) -> bool {
        self.fields.creation_time <= now && now <= self.valid_until()
    }

    pub fn signatures(&self) -> &BTreeMap<AuthorityId, Ed25519Signature> {
        &self.signatures
    }

    /// Conventional file name, `ISD<isd>-V<version>.trc`.
    pub fn file_name(&self) -> String {
        format!("ISD{}-V{}.trc", self.fields.isd, self.fields.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{authority, key, trc_fields};
    use trc_core::ErrorKind;

    #[test]
    fn test_from_fields_accepts_valid() {
        let trc = TrustRootDocument::from_fields(trc_fields(1, 0, &[11, 12, 13], 2)).unwrap();
        assert!(trc.is_genesis());
        assert!(trc.signatures().is_empty());
        assert_eq!(trc.file_name(), "ISD1-V0.trc");
    }

    #[test]
    fn test_quorum_bounds_enforced() {
        let zero = TrustRootDocument::from_fields(trc_fields(1, 0, &[11, 12], 0));
        assert_eq!(zero.unwrap_err().kind(), ErrorKind::Schema);
        let too_big = TrustRootDocument::from_fields(trc_fields(1, 0, &[11, 12], 3));
        assert_eq!(too_big.unwrap_err().kind(), ErrorKind::Schema);
    }

    #[test]
    fn test_empty_core_rejected() {
        let mut fields = trc_fields(1, 0, &[11], 1);
        fields.core_ases.clear();
        assert!(TrustRootDocument::from_fields(fields).is_err());
    }

    #[test]
    fn test_expiration_must_follow_creation() {
        let mut fields = trc_fields(1, 0, &[11], 1);
        fields.expiration_time = fields.creation_time;
        assert!(TrustRootDocument::from_fields(fields).is_err());
    }

    #[test]
    fn test_float_in_opaque_map_rejected() {
        let mut fields = trc_fields(1, 0, &[11], 1);
        fields
            .rains
            .insert("ttl".into(), serde_json::json!({ "scale": 0.5 }));
        let err = TrustRootDocument::from_fields(fields).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn test_from_json_rejects_float_in_opaque_map() {
        let trc = TrustRootDocument::from_fields(trc_fields(1, 0, &[11], 1)).unwrap();
        let mut value: Value = serde_json::from_str(&trc.to_json().unwrap()).unwrap();
        value["cert_logs"] = serde_json::json!({ "log1": 1.25 });
        let err = TrustRootDocument::from_json(value.to_string().as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn test_foreign_core_authority_rejected() {
        let mut fields = trc_fields(1, 0, &[11], 1);
        let entry = fields.core_ases.values().next().unwrap().clone();
        fields.core_ases.insert("2-11".parse().unwrap(), entry);
        assert!(TrustRootDocument::from_fields(fields).is_err());
    }

    #[test]
    fn test_canonical_bytes_exclude_signatures() {
        let mut trc = TrustRootDocument::from_fields(trc_fields(1, 0, &[11], 1)).unwrap();
        let before = trc.canonical_unsigned_bytes().unwrap();
        let sig = key(11).sign(&before);
        trc.add_signature(authority(11), sig).unwrap();
        let after = trc.canonical_unsigned_bytes().unwrap();
        assert_eq!(before, after);
        let text = std::str::from_utf8(after.as_bytes()).unwrap();
        assert!(!text.contains("signatures"));
    }

    #[test]
    fn test_add_signature_unknown_authority() {
        let mut trc = TrustRootDocument::from_fields(trc_fields(1, 0, &[11, 12], 1)).unwrap();
        let sig = key(99).sign(&trc.canonical_unsigned_bytes().unwrap());
        let err = trc.add_signature(authority(99), sig).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownAuthority);
    }

    #[test]
    fn test_add_signature_is_append_only() {
        let mut trc = TrustRootDocument::from_fields(trc_fields(1, 0, &[11], 1)).unwrap();
        let sig = key(11).sign(&trc.canonical_unsigned_bytes().unwrap());
        trc.add_signature(authority(11), sig).unwrap();
        let err = trc.add_signature(authority(11), sig).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateSignature);
        assert_eq!(trc.signatures().len(), 1);
    }

    #[test]
    fn test_json_roundtrip_is_field_for_field() {
        let mut trc = TrustRootDocument::from_fields(trc_fields(1, 3, &[11, 12], 2)).unwrap();
        let sig = key(12).sign(&trc.canonical_unsigned_bytes().unwrap());
        trc.add_signature(authority(12), sig).unwrap();

        let json = trc.to_json().unwrap();
        let back = TrustRootDocument::from_json(json.as_bytes()).unwrap();
        assert_eq!(back, trc);
    }

    #[test]
    fn test_json_has_exactly_the_document_keys() {
        let trc = TrustRootDocument::from_fields(trc_fields(1, 0, &[11], 1)).unwrap();
        let value: Value = serde_json::from_str(&trc.to_json().unwrap()).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "cert_logs",
                "core_ases",
                "creation_time",
                "description",
                "expiration_time",
                "grace_period",
                "isd",
                "quarantine",
                "quorum_cas",
                "quorum_trc",
                "rains",
                "root_cas",
                "signatures",
                "threshold_eepki",
                "version",
            ]
        );
    }

    #[test]
    fn test_from_json_rejects_unknown_and_missing_keys() {
        let trc = TrustRootDocument::from_fields(trc_fields(1, 0, &[11], 1)).unwrap();
        let mut value: Value = serde_json::from_str(&trc.to_json().unwrap()).unwrap();

        let mut extra = value.clone();
        extra["policy"] = Value::Bool(true);
        assert!(TrustRootDocument::from_json(extra.to_string().as_bytes()).is_err());

        value.as_object_mut().unwrap().remove("grace_period");
        let err = TrustRootDocument::from_json(value.to_string().as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn test_validity_window_includes_grace() {
        let trc = TrustRootDocument::from_fields(trc_fields(1, 0, &[11], 1)).unwrap();
        let grace_end = trc.valid_until();
        assert!(trc.is_valid_at(trc.expiration_time()));
        assert!(trc.is_valid_at(grace_end));
        assert!(!trc.is_valid_at(grace_end.saturating_add_secs(1)));
    }
}
