//! # Certificate
//!
//! A single AS certificate binding a subject authority to its signing key.
//! The signature covers the JCS encoding of every field except `signature`
//! itself; a certificate without a signature is unsigned and never verifies.

use serde::{Deserialize, Serialize};
use trc_core::error::CryptoError;
use trc_core::{AuthorityId, CanonicalBytes, Timestamp, TrustError};
use trc_crypto::{
    verify_with_public_key, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature, KeyAlgorithm,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Certificate {
    pub subject: AuthorityId,
    pub issuer: AuthorityId,
    pub version: u64,
    /// Version of the TRC the issuer chain is anchored in.
    pub trc_version: u64,
    pub comment: String,
    pub can_issue: bool,
    pub sign_algorithm: KeyAlgorithm,
    /// The public key this certificate certifies.
    pub subject_sign_key: Ed25519PublicKey,
    pub enc_algorithm: String,
    /// Encryption key, carried as opaque base64 text.
    pub subject_enc_key: String,
    pub issuing_time: Timestamp,
    pub expiration_time: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Ed25519Signature>,
}

impl Certificate {
    /// JCS bytes of the certificate with `signature` removed.
    pub fn canonical_unsigned_bytes(&self) -> Result<CanonicalBytes, TrustError> {
        let unsigned = Self {
            signature: None,
            ..self.clone()
        };
        Ok(CanonicalBytes::new(&unsigned)?)
    }

    /// Sign with the issuer's key, replacing any previous signature.
    pub fn sign(&mut self, issuer_key: &Ed25519KeyPair) -> Result<(), TrustError> {
        let message = self.canonical_unsigned_bytes()?;
        self.signature = Some(issuer_key.sign(&message));
        Ok(())
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// Check the signature against `issuer_key`.
    ///
    /// # Errors
    ///
    /// `ChainSignature` when the certificate is unsigned or the signature
    /// does not verify.
    pub fn verify_signature(&self, issuer_key: &Ed25519PublicKey) -> Result<(), TrustError> {
        let signature = self.signature.as_ref().ok_or_else(|| {
            TrustError::ChainSignature(format!(
                "certificate of {} (version {}) is unsigned",
                self.subject, self.version
            ))
        })?;
        let message = self.canonical_unsigned_bytes()?;
        verify_with_public_key(&message, signature, issuer_key).map_err(|e| {
            let detail = match e {
                CryptoError::VerificationFailed(msg) => msg,
                other => other.to_string(),
            };
            TrustError::ChainSignature(format!(
                "certificate of {} (version {}): {detail}",
                self.subject, self.version
            ))
        })
    }

    /// Whether `now` lies in `[issuing_time, expiration_time]`.
    pub fn is_valid_at(&self, now: Timestamp) -> bool {
        self.issuing_time <= now && now <= self.expiration_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{authority, certificate, key, ts, DAY};
    use trc_core::ErrorKind;

    #[test]
    fn test_sign_and_verify() {
        let mut cert = certificate(authority(11), authority(11), 50);
        assert!(!cert.is_signed());
        cert.sign(&key(11)).unwrap();
        assert!(cert.is_signed());
        cert.verify_signature(&key(11).public_key()).unwrap();
    }

    #[test]
    fn test_unsigned_fails_with_chain_signature() {
        let cert = certificate(authority(11), authority(11), 50);
        let err = cert.verify_signature(&key(11).public_key()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ChainSignature);
    }

    #[test]
    fn test_wrong_key_fails() {
        let mut cert = certificate(authority(11), authority(11), 50);
        cert.sign(&key(11)).unwrap();
        let err = cert.verify_signature(&key(12).public_key()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ChainSignature);
    }

    #[test]
    fn test_tampered_field_invalidates_signature() {
        let mut cert = certificate(authority(11), authority(11), 50);
        cert.sign(&key(11)).unwrap();
        cert.comment = "edited".into();
        assert!(cert.verify_signature(&key(11).public_key()).is_err());
    }

    #[test]
    fn test_canonical_bytes_ignore_signature() {
        let mut cert = certificate(authority(11), authority(11), 50);
        let before = cert.canonical_unsigned_bytes().unwrap();
        cert.sign(&key(11)).unwrap();
        assert_eq!(before, cert.canonical_unsigned_bytes().unwrap());
    }

    #[test]
    fn test_unsigned_json_omits_signature() {
        let cert = certificate(authority(11), authority(11), 50);
        let json = serde_json::to_value(&cert).unwrap();
        assert!(json.get("signature").is_none());
        assert!(json.get("subject_sign_key").is_some());
        let back: Certificate = serde_json::from_value(json).unwrap();
        assert_eq!(back, cert);
    }

    #[test]
    fn test_legacy_field_name_rejected() {
        let cert = certificate(authority(11), authority(11), 50);
        let mut json = serde_json::to_value(&cert).unwrap();
        let object = json.as_object_mut().unwrap();
        let key = object.remove("subject_sign_key").unwrap();
        object.insert("subject_sig_key".into(), key);
        assert!(serde_json::from_value::<Certificate>(json).is_err());
    }

    #[test]
    fn test_validity_window() {
        let cert = certificate(authority(11), authority(11), 50);
        assert!(!cert.is_valid_at(ts(0)));
        assert!(cert.is_valid_at(ts(DAY as i64)));
        assert!(cert.is_valid_at(ts(30 * DAY as i64)));
        assert!(!cert.is_valid_at(ts(30 * DAY as i64 + 1)));
    }
}
