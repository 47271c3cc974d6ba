//! # Authority Identifiers
//!
//! Newtypes for isolation-domain and autonomous-system identifiers, and the
//! combined `AuthorityId` (`<isd>-<as>`) that names a core authority or a
//! certificate subject.
//!
//! ## Notation
//!
//! - ISD: decimal, 1..=65535 (0 is the wildcard and is rejected here).
//! - AS: decimal when below 2^32 (`1-11`), otherwise three colon-separated
//!   16-bit hex groups (`1-ff00:0:110`). Both forms parse; `Display` picks
//!   the form by value so rendering is canonical.
//!
//! ## Serde
//!
//! `AuthorityId` serializes as its string form, which lets it act as a JSON
//! object key in the `core_ases` and `signatures` maps.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TrustError;

/// Largest AS number representable in the 48-bit AS space.
pub const MAX_ASN: u64 = (1 << 48) - 1;

const BGP_ASN_LIMIT: u64 = 1 << 32;

/// Isolation-domain identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IsdId(pub u16);

/// Autonomous-system number (48 bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Asn(u64);

/// An ISD-AS pair identifying an authority or certificate subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AuthorityId {
    isd: IsdId,
    asn: Asn,
}

impl IsdId {
    /// Validate a raw ISD number.
    pub fn new(raw: u16) -> Result<Self, TrustError> {
        if raw == 0 {
            return Err(TrustError::Schema("ISD 0 is the wildcard ISD".into()));
        }
        Ok(Self(raw))
    }

    /// The raw number.
    pub fn get(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for IsdId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Asn {
    /// Validate a raw AS number against the 48-bit space.
    pub fn new(raw: u64) -> Result<Self, TrustError> {
        if raw > MAX_ASN {
            return Err(TrustError::Schema(format!("AS number {raw} exceeds 48 bits")));
        }
        Ok(Self(raw))
    }

    /// The raw number.
    pub fn get(&self) -> u64 {
        self.0
    }

    /// Render for use in file names (`:` replaced by `_`).
    pub fn file_fmt(&self) -> String {
        self.to_string().replace(':', "_")
    }
}

impl fmt::Display for Asn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < BGP_ASN_LIMIT {
            write!(f, "{}", self.0)
        } else {
            write!(
                f,
                "{:x}:{:x}:{:x}",
                (self.0 >> 32) & 0xffff,
                (self.0 >> 16) & 0xffff,
                self.0 & 0xffff
            )
        }
    }
}

impl FromStr for Asn {
    type Err = TrustError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.contains(':') {
            let raw: u64 = s
                .parse()
                .map_err(|e| TrustError::Schema(format!("invalid AS number {s:?}: {e}")))?;
            if raw >= BGP_ASN_LIMIT {
                return Err(TrustError::Schema(format!(
                    "decimal AS number {s:?} must be below 2^32; use hex notation"
                )));
            }
            return Self::new(raw);
        }
        let groups: Vec<&str> = s.split(':').collect();
        if groups.len() != 3 {
            return Err(TrustError::Schema(format!(
                "AS {s:?} must have three colon-separated groups"
            )));
        }
        let mut raw = 0u64;
        for group in groups {
            let part = u16::from_str_radix(group, 16)
                .map_err(|e| TrustError::Schema(format!("invalid AS group {group:?} in {s:?}: {e}")))?;
            raw = (raw << 16) | u64::from(part);
        }
        Self::new(raw)
    }
}

impl AuthorityId {
    /// Combine an ISD and an AS.
    pub fn new(isd: IsdId, asn: Asn) -> Self {
        Self { isd, asn }
    }

    /// The isolation domain this authority belongs to.
    pub fn isd(&self) -> IsdId {
        self.isd
    }

    /// The AS number.
    pub fn asn(&self) -> Asn {
        self.asn
    }
}

impl fmt::Display for AuthorityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.isd, self.asn)
    }
}

impl FromStr for AuthorityId {
    type Err = TrustError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (isd, asn) = s
            .split_once('-')
            .ok_or_else(|| TrustError::Schema(format!("authority {s:?} is not in ISD-AS form")))?;
        let isd: u16 = isd
            .parse()
            .map_err(|e| TrustError::Schema(format!("invalid ISD in {s:?}: {e}")))?;
        Ok(Self::new(IsdId::new(isd)?, asn.parse()?))
    }
}

impl Serialize for AuthorityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AuthorityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
