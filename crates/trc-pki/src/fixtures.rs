//! Shared builders for unit tests. Keys are derived from the AS number so
//! every test agrees on who holds which key.

use std::collections::BTreeMap;

use trc_core::{Asn, AuthorityId, IsdId, Timestamp};
use trc_crypto::{Ed25519KeyPair, KeyAlgorithm};

use crate::certificate::Certificate;
use crate::trc::{CoreAuthority, TrcFields};

pub const T0: i64 = 1_520_000_000;
pub const DAY: u64 = 86_400;

pub fn authority(asn: u64) -> AuthorityId {
    authority_in(1, asn)
}

pub fn authority_in(isd: u16, asn: u64) -> AuthorityId {
    AuthorityId::new(IsdId::new(isd).unwrap(), Asn::new(asn).unwrap())
}

/// Online key of AS `asn`.
pub fn key(asn: u64) -> Ed25519KeyPair {
    Ed25519KeyPair::from_seed(&[asn as u8; 32])
}

/// Offline key of AS `asn`.
pub fn offline_key(asn: u64) -> Ed25519KeyPair {
    Ed25519KeyPair::from_seed(&[(asn as u8).wrapping_add(100); 32])
}

pub fn ts(offset_secs: i64) -> Timestamp {
    Timestamp::from_epoch_secs(T0 + offset_secs).unwrap()
}

pub fn core_entry(asn: u64) -> CoreAuthority {
    CoreAuthority {
        offline_key: offline_key(asn).public_key(),
        offline_key_algorithm: KeyAlgorithm::Ed25519,
        online_key: key(asn).public_key(),
        online_key_algorithm: KeyAlgorithm::Ed25519,
    }
}

pub fn trc_fields(isd: u16, version: u64, asns: &[u64], quorum_trc: u32) -> TrcFields {
    let core_ases: BTreeMap<AuthorityId, CoreAuthority> = asns
        .iter()
        .map(|asn| (authority_in(isd, *asn), core_entry(*asn)))
        .collect();
    TrcFields {
        isd: IsdId::new(isd).unwrap(),
        description: format!("ISD {isd} test TRC"),
        version,
        creation_time: ts(0),
        expiration_time: ts(365 * DAY as i64),
        core_ases,
        root_cas: BTreeMap::new(),
        cert_logs: BTreeMap::new(),
        threshold_eepki: 0,
        rains: BTreeMap::new(),
        quorum_trc,
        quorum_cas: 0,
        quarantine: false,
        grace_period: 0,
    }
}

/// Unsigned certificate for `subject` issued by `issuer`, certifying the
/// signing key seeded with `subject_seed`.
pub fn certificate(subject: AuthorityId, issuer: AuthorityId, subject_seed: u8) -> Certificate {
    Certificate {
        subject,
        issuer,
        version: 0,
        trc_version: 0,
        comment: String::new(),
        can_issue: subject == issuer,
        sign_algorithm: KeyAlgorithm::Ed25519,
        subject_sign_key: Ed25519KeyPair::from_seed(&[subject_seed; 32]).public_key(),
        enc_algorithm: "curve25519xsalsa20poly1305".into(),
        subject_enc_key: "AAAA".into(),
        issuing_time: ts(DAY as i64),
        expiration_time: ts(30 * DAY as i64),
        signature: None,
    }
}
