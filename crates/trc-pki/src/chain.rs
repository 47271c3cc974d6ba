//! # Certificate Chain
//!
//! `[leaf, issuer]`: an end-entity certificate and the certificate of the
//! core authority that issued it. The chain is anchored in a TRC that lists
//! the issuer as a core authority.
//!
//! ## Verification
//!
//! [`CertificateChain::verify`] runs four checks, cheapest first:
//!
//! 1. The leaf subject is the expected subject (`SubjectMismatch`).
//! 2. The issuer certificate verifies under the issuer's online key as
//!    registered in the anchor (`AnchorMismatch` when the issuer is not a
//!    core authority there, `ChainSignature` when the signature is bad).
//! 3. The leaf verifies under the issuer certificate's signing key
//!    (`ChainSignature`).
//! 4. The verification time lies in both certificates' windows and in the
//!    anchor's window, and both certificate windows lie inside the anchor's
//!    `[creation_time, expiration_time + grace_period]` (`Expired`).
//!
//! All four must pass; the order only decides which error is reported.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use trc_core::{AuthorityId, Timestamp, TrustError};
use trc_crypto::Ed25519KeyPair;

use crate::certificate::Certificate;
use crate::trc::TrustRootDocument;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateChain {
    leaf: Certificate,
    issuer: Certificate,
}

impl CertificateChain {
    /// Pair a leaf with its issuer certificate.
    ///
    /// # Errors
    ///
    /// `Schema` when `leaf.issuer != issuer.subject`.
    pub fn new(leaf: Certificate, issuer: Certificate) -> Result<Self, TrustError> {
        if leaf.issuer != issuer.subject {
            return Err(TrustError::Schema(format!(
                "leaf issued by {} but issuer certificate is for {}",
                leaf.issuer, issuer.subject
            )));
        }
        Ok(Self { leaf, issuer })
    }

    pub fn from_json(raw: &[u8]) -> Result<Self, TrustError> {
        Ok(serde_json::from_slice(raw)?)
    }

    pub fn to_json(&self) -> Result<String, TrustError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn leaf(&self) -> &Certificate {
        &self.leaf
    }

    pub fn issuer(&self) -> &Certificate {
        &self.issuer
    }

    /// Sign the leaf with the issuer's signing key and the issuer
    /// certificate with the issuer's online key.
    pub fn sign(
        &mut self,
        leaf_key: &Ed25519KeyPair,
        issuer_key: &Ed25519KeyPair,
    ) -> Result<(), TrustError> {
        self.leaf.sign(leaf_key)?;
        self.issuer.sign(issuer_key)
    }

    /// Verify the chain for `expected_subject` against `anchor` at `now`.
    pub fn verify(
        &self,
        expected_subject: &AuthorityId,
        anchor: &TrustRootDocument,
        now: Timestamp,
    ) -> Result<(), TrustError> {
        if self.leaf.subject != *expected_subject {
            return Err(TrustError::SubjectMismatch {
                expected: *expected_subject,
                actual: self.leaf.subject,
            });
        }

        let registered = anchor
            .core_authorities()
            .get(&self.issuer.subject)
            .ok_or_else(|| TrustError::AnchorMismatch {
                authority: self.issuer.subject,
                reason: format!("not listed in {}", anchor.file_name()),
            })?;
        self.issuer.verify_signature(&registered.online_key)?;

        self.leaf.verify_signature(&self.issuer.subject_sign_key)?;

        self.check_windows(anchor, now)
    }

    /// [`verify`](Self::verify) at the current wall-clock time.
    pub fn verify_now(
        &self,
        expected_subject: &AuthorityId,
        anchor: &TrustRootDocument,
    ) -> Result<(), TrustError> {
        self.verify(expected_subject, anchor, Timestamp::now())
    }

    fn check_windows(&self, anchor: &TrustRootDocument, now: Timestamp) -> Result<(), TrustError> {
        let anchor_start = anchor.creation_time();
        let anchor_end = anchor.valid_until();
        if !anchor.is_valid_at(now) {
            return Err(TrustError::Expired(format!(
                "{} is valid from {anchor_start} until {anchor_end}, verification time is {now}",
                anchor.file_name()
            )));
        }
        for (role, cert) in [("leaf", &self.leaf), ("issuer", &self.issuer)] {
            if !cert.is_valid_at(now) {
                return Err(TrustError::Expired(format!(
                    "{role} certificate of {} is valid from {} until {}, verification time is {now}",
                    cert.subject, cert.issuing_time, cert.expiration_time
                )));
            }
            if cert.issuing_time < anchor_start || cert.expiration_time > anchor_end {
                return Err(TrustError::Expired(format!(
                    "{role} certificate of {} outlives the validity of {}",
                    cert.subject,
                    anchor.file_name()
                )));
            }
        }
        Ok(())
    }

    /// Conventional file name, `ISD<isd>-AS<as>-V<version>.crt`, taken
    /// from the leaf.
    pub fn file_name(&self) -> String {
        format!(
            "ISD{}-AS{}-V{}.crt",
            self.leaf.subject.isd(),
            self.leaf.subject.asn().file_fmt(),
            self.leaf.version
        )
    }
}

impl Serialize for CertificateChain {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.leaf, &self.issuer).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CertificateChain {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (leaf, issuer) = <(Certificate, Certificate)>::deserialize(deserializer)?;
        Self::new(leaf, issuer).map_err(serde::de::Error::custom)
    }
}
