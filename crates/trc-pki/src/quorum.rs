//! # Quorum Signature Engine
//!
//! Produces core-authority signatures over a TRC and decides whether a TRC
//! carries enough of them.
//!
//! ## Rules
//!
//! - An authority signs a given TRC version once. A second `sign` for the
//!   same authority is rejected even when it would reproduce the same
//!   signature, so callers that want idempotence check
//!   [`TrustRootDocument::has_signed`] first.
//! - Genesis TRCs verify against their own keys. Every later version
//!   verifies against the keys and threshold of its predecessor.
//! - Counting is a cardinality check over the set of signers, so the order
//!   in which signatures were collected is irrelevant.

use std::sync::Arc;

use trc_core::{AuthorityId, Logger, TrustError};
use trc_crypto::Ed25519KeyPair;

use crate::trc::{QuorumReport, TrustRootDocument};

/// Signs and verifies TRC quorums.
#[derive(Debug, Clone)]
pub struct QuorumSignatureEngine {
    pub(crate) logger: Arc<dyn Logger>,
}

impl QuorumSignatureEngine {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }

    /// Sign `document` as `authority` with `key` and record the signature.
    ///
    /// # Errors
    ///
    /// - `UnknownAuthority` if `authority` is not a core authority.
    /// - `DuplicateSignature` if `authority` already signed this version.
    pub fn sign(
        &self,
        document: &mut TrustRootDocument,
        authority: AuthorityId,
        key: &Ed25519KeyPair,
    ) -> Result<(), TrustError> {
        let registered = document
            .core_authorities()
            .get(&authority)
            .ok_or(TrustError::UnknownAuthority(authority))?;
        if document.has_signed(&authority) {
            return Err(TrustError::DuplicateSignature {
                authority,
                version: document.version(),
            });
        }
        if registered.online_key != key.public_key() {
            self.logger.warn(&format!(
                "signing ISD{}-V{} as {authority} with a key that is not its registered online key; \
                 the signature will not count toward the quorum",
                document.isd(),
                document.version()
            ));
        }
        let message = document.canonical_unsigned_bytes()?;
        document.add_signature(authority, key.sign(&message))?;
        self.logger.debug(&format!(
            "{authority} signed ISD{}-V{}",
            document.isd(),
            document.version()
        ));
        Ok(())
    }

    /// Verify the quorum of `document`.
    ///
    /// For a genesis TRC `reference` is ignored and the document is checked
    /// against its own keys (pass the document itself). Otherwise
    /// `reference` must be the immediately preceding version.
    pub fn verify_quorum(
        &self,
        document: &TrustRootDocument,
        reference: &TrustRootDocument,
    ) -> Result<QuorumReport, TrustError> {
        let report = document.verify(reference);
        match &report {
            Ok(r) => {
                for signer in &r.rejected_signers {
                    self.logger.warn(&format!(
                        "ISD{}-V{}: signature of {signer} excluded from quorum",
                        document.isd(),
                        document.version()
                    ));
                }
                self.logger.debug(&format!(
                    "ISD{}-V{}: quorum reached with {} of {} required",
                    document.isd(),
                    document.version(),
                    r.valid_signers.len(),
                    r.required
                ));
            }
            Err(e) => self.logger.warn(&format!(
                "ISD{}-V{}: {e}",
                document.isd(),
                document.version()
            )),
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{authority, key, trc_fields};
    use trc_core::{ErrorKind, NoopLogger};

    fn engine() -> QuorumSignatureEngine {
        QuorumSignatureEngine::new(NoopLogger::shared())
    }

    fn genesis(asns: &[u64], quorum: u32) -> TrustRootDocument {
        TrustRootDocument::from_fields(trc_fields(1, 0, asns, quorum)).unwrap()
    }

    #[test]
    fn test_three_authorities_quorum_two() {
        let engine = engine();
        let mut trc = genesis(&[11, 12, 13], 2);

        engine.sign(&mut trc, authority(11), &key(11)).unwrap();
        assert!(!trc.is_quorum_reached());
        let err = engine.verify_quorum(&trc, &trc).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::QuorumNotReached);

        engine.sign(&mut trc, authority(12), &key(12)).unwrap();
        assert!(trc.is_quorum_reached());
        let report = engine.verify_quorum(&trc, &trc).unwrap();
        assert_eq!(report.valid_signers.len(), 2);

        let err = engine.sign(&mut trc, authority(14), &key(14)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownAuthority);
    }

    #[test]
    fn test_duplicate_sign_rejected_even_if_identical() {
        let engine = engine();
        let mut trc = genesis(&[11, 12], 1);
        engine.sign(&mut trc, authority(11), &key(11)).unwrap();
        let err = engine.sign(&mut trc, authority(11), &key(11)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateSignature);
        let err = engine.sign(&mut trc, authority(11), &key(50)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateSignature);
    }

    #[test]
    fn test_wrong_key_signature_does_not_count() {
        let engine = engine();
        let mut trc = genesis(&[11, 12], 2);
        engine.sign(&mut trc, authority(11), &key(11)).unwrap();
        engine.sign(&mut trc, authority(12), &key(77)).unwrap();
        assert!(!trc.is_quorum_reached());
        let err = trc.verify_self_signed().unwrap_err();
        assert!(matches!(err, TrustError::QuorumNotReached { required: 2, valid: 1 }));
    }

    #[test]
    fn test_signing_order_irrelevant() {
        let engine = engine();
        let mut a = genesis(&[11, 12, 13], 3);
        let mut b = genesis(&[11, 12, 13], 3);
        for asn in [11, 12, 13] {
            engine.sign(&mut a, authority(asn), &key(asn)).unwrap();
        }
        for asn in [13, 11, 12] {
            engine.sign(&mut b, authority(asn), &key(asn)).unwrap();
        }
        assert_eq!(a, b);
        assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
    }

    #[test]
    fn test_update_uses_prior_keys() {
        let engine = engine();
        let mut v0 = genesis(&[11, 12], 2);
        engine.sign(&mut v0, authority(11), &key(11)).unwrap();
        engine.sign(&mut v0, authority(12), &key(12)).unwrap();

        // V1 replaces 12 with 13 and registers 13's key. 13 signing alone must
        // not be able to vouch for V1.
        let mut v1 = TrustRootDocument::from_fields(trc_fields(1, 1, &[11, 13], 1)).unwrap();
        engine.sign(&mut v1, authority(13), &key(13)).unwrap();
        assert!(v1.is_quorum_reached());
        let err = engine.verify_quorum(&v1, &v0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::QuorumNotReached);
    }

    #[test]
    fn test_update_reaches_prior_quorum() {
        let engine = engine();
        let v0 = genesis(&[11, 12], 2);
        let mut v1 = TrustRootDocument::from_fields(trc_fields(1, 1, &[11, 12], 2)).unwrap();
        engine.sign(&mut v1, authority(11), &key(11)).unwrap();
        engine.sign(&mut v1, authority(12), &key(12)).unwrap();
        let report = engine.verify_quorum(&v1, &v0).unwrap();
        assert!(report.is_reached());
        assert!(report.rejected_signers.is_empty());
    }

    #[test]
    fn test_update_rejects_wrong_predecessor() {
        let engine = engine();
        let v0 = genesis(&[11], 1);
        let mut v2 = TrustRootDocument::from_fields(trc_fields(1, 2, &[11], 1)).unwrap();
        engine.sign(&mut v2, authority(11), &key(11)).unwrap();
        let err = engine.verify_quorum(&v2, &v0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpdateChain);
    }
}
