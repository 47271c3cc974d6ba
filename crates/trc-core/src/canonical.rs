//! # Canonical Serialization: JCS Byte Production
//!
//! Defines `CanonicalBytes`, the sole construction path for bytes that are
//! signed by a core authority or an issuing AS.
//!
//! ## Security Invariant
//!
//! The inner `Vec<u8>` is private. Any function that signs or verifies must
//! accept `&CanonicalBytes`, and the only way to produce one is through
//! `CanonicalBytes::new()`. Two parties serializing the same logical
//! document therefore always sign the same byte sequence.
//!
//! ## Rules
//!
//! 1. **Reject floats.** Thresholds, versions and times are integers; a
//!    float in a signed document is a schema error, not a rounding choice.
//! 2. **Sorted keys, compact separators.** Serialization uses `serde_jcs`
//!    (RFC 8785), so map iteration order never reaches the signature.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JCS canonicalization.
///
/// # Invariants
///
/// - The only constructor is `CanonicalBytes::new()`.
/// - No float appears anywhere in the encoded value.
/// - Object keys are sorted and separators are compact (RFC 8785).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::FloatRejected` if the value contains a
    /// float. Returns `CanonicalizationError::SerializationFailed` if JSON or
    /// JCS serialization fails.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        reject_floats(&value)?;
        let s = serde_jcs::to_string(&value)?;
        Ok(Self(s.into_bytes()))
    }

    /// Access the canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

fn reject_floats(value: &Value) -> Result<(), CanonicalizationError> {
    match value {
        Value::Null | Value::Bool(_) | Value::String(_) => Ok(()),
        Value::Number(n) => {
            if n.is_f64() {
                if let Some(f) = n.as_f64() {
                    return Err(CanonicalizationError::FloatRejected(f));
                }
            }
            Ok(())
        }
        Value::Object(map) => map.values().try_for_each(reject_floats),
        Value::Array(arr) => arr.iter().try_for_each(reject_floats),
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn json_value_no_floats() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| serde_json::json!(n)),
            "[a-zA-Z0-9_ -]{0,40}".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 64, 8, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..8).prop_map(Value::Array),
                prop::collection::btree_map("[a-z0-9-]{1,10}", inner, 0..8)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn canonical_bytes_deterministic(value in json_value_no_floats()) {
            let a = CanonicalBytes::new(&value).unwrap();
            let b = CanonicalBytes::new(&value).unwrap();
            prop_assert_eq!(a.as_bytes(), b.as_bytes());
        }

        /// Re-parsing the canonical form and canonicalizing again is a fixed point.
        #[test]
        fn canonical_bytes_idempotent(value in json_value_no_floats()) {
            let first = CanonicalBytes::new(&value).unwrap();
            let reparsed: Value = serde_json::from_slice(first.as_bytes()).unwrap();
            let second = CanonicalBytes::new(&reparsed).unwrap();
            prop_assert_eq!(first.as_bytes(), second.as_bytes());
        }
    }
}
