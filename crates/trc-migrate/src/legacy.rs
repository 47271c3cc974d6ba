//! # Legacy Encodings
//!
//! The pre-migration TRC and certificate formats. Parsing is as strict as
//! for the current schema: every key is required and unknown keys are
//! rejected. Legacy signatures are kept as opaque text because they are
//! never verified, only replaced.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use trc_core::{AuthorityId, Timestamp};

/// Core-AS entry of a legacy TRC. Keys are base64 text and algorithm
/// names may be upper-case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LegacyCoreAuthority {
    pub offline_key: String,
    pub offline_key_alg: String,
    pub online_key: String,
    pub online_key_alg: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LegacyTrc {
    pub isd_id: u16,
    pub description: String,
    pub version: u64,
    pub creation_time: Timestamp,
    pub expiration_time: Timestamp,
    pub core_ases: BTreeMap<AuthorityId, LegacyCoreAuthority>,
    /// Threshold of core signatures on the TRC itself.
    pub quorum_own_trc: u32,
    pub quorum_cas: u32,
    pub quorum_eepki: u32,
    pub quarantine: bool,
    pub grace_period: u64,
    pub signatures: BTreeMap<AuthorityId, String>,
}

/// A legacy certificate. Differs from the current schema in the name of
/// the signing key field (`subject_sig_key`) and in carrying its signature
/// as opaque text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LegacyCertificate {
    pub subject: AuthorityId,
    pub issuer: AuthorityId,
    pub version: u64,
    pub trc_version: u64,
    pub comment: String,
    pub can_issue: bool,
    pub sign_algorithm: String,
    pub subject_sig_key: String,
    pub enc_algorithm: String,
    pub subject_enc_key: String,
    pub issuing_time: Timestamp,
    pub expiration_time: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// `[leaf, issuer]` in the legacy encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyChain(pub LegacyCertificate, pub LegacyCertificate);

impl LegacyChain {
    pub fn leaf(&self) -> &LegacyCertificate {
        &self.0
    }

    pub fn issuer(&self) -> &LegacyCertificate {
        &self.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn legacy_trc_json() -> serde_json::Value {
        json!({
            "isd_id": 1,
            "description": "ISD 1",
            "version": 0,
            "creation_time": 1_520_000_000,
            "expiration_time": 1_551_536_000,
            "core_ases": {
                "1-11": {
                    "offline_key": "AAAA",
                    "offline_key_alg": "ED25519",
                    "online_key": "AAAA",
                    "online_key_alg": "ED25519"
                }
            },
            "quorum_own_trc": 1,
            "quorum_cas": 1,
            "quorum_eepki": 1,
            "quarantine": false,
            "grace_period": 0,
            "signatures": {"1-11": "c2ln"}
        })
    }

    #[test]
    fn test_parse_legacy_trc() {
        let trc: LegacyTrc = serde_json::from_value(legacy_trc_json()).unwrap();
        assert_eq!(trc.isd_id, 1);
        assert_eq!(trc.core_ases.len(), 1);
        assert_eq!(trc.signatures.len(), 1);
    }

    #[test]
    fn test_legacy_trc_is_strict() {
        let mut extra = legacy_trc_json();
        extra["rains"] = json!({});
        assert!(serde_json::from_value::<LegacyTrc>(extra).is_err());

        let mut missing = legacy_trc_json();
        missing.as_object_mut().unwrap().remove("quorum_own_trc");
        assert!(serde_json::from_value::<LegacyTrc>(missing).is_err());
    }
}
