// Copyright © 2024 The qFALL-persist Authors
//
// This file is part of qFALL-persist.
//
// qFALL-persist is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains plaintexts and ciphertexts of the scheme.

use super::keys::{element_from_repr, element_to_repr, RingRepr};
use crate::{
    error::SerialError,
    serial::{ObjectKind, Serializable},
};
use qfall_math::integer_mod_q::PolynomialRingZq;
use serde::{Deserialize, Serialize};

/// A vector of values in `[0, t)` encoded into the coefficients of one
/// ring element, i.e. at most `n` values fit into a plaintext.
///
/// # Examples
/// ```
/// use qfall_persist::scheme::Plaintext;
///
/// let plaintext = Plaintext::from(vec![1, 2, 3]);
/// assert_eq!(&[1, 2, 3], plaintext.values());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plaintext {
    values: Vec<u64>,
}

impl Plaintext {
    pub fn new(values: Vec<u64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[u64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Vec<u64>> for Plaintext {
    fn from(values: Vec<u64>) -> Self {
        Self::new(values)
    }
}

/// A ciphertext `c = (u, v)`, where `v - s * u` yields the scaled plaintext
/// up to a small error.
///
/// Attributes:
/// - `context`: the fingerprint of the context that produced the ciphertext
/// - `u`: specifies `a * r + e1`
/// - `v`: specifies `b * r + e2 + ⌊q/t⌋ * m`
/// - `len`: the number of plaintext values encoded
#[derive(Debug, Clone, PartialEq)]
pub struct Ciphertext {
    pub(crate) context: String,
    pub(crate) u: PolynomialRingZq,
    pub(crate) v: PolynomialRingZq,
    pub(crate) len: usize,
}

impl Ciphertext {
    /// Returns the number of plaintext values encoded in this ciphertext.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the fingerprint of the context that produced this ciphertext.
    pub fn context_fingerprint(&self) -> &str {
        &self.context
    }
}

/// The stored form of a [`Ciphertext`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiphertextRepr {
    pub context: String,
    pub ring: RingRepr,
    pub len: u64,
    pub u: Vec<String>,
    pub v: Vec<String>,
}

impl Serializable for Ciphertext {
    const KIND: ObjectKind = ObjectKind::Ciphertext;
    type Repr = CiphertextRepr;

    fn to_repr(&self) -> Result<Self::Repr, SerialError> {
        Ok(CiphertextRepr {
            context: self.context.clone(),
            ring: RingRepr::of(&self.u.get_mod(), Self::KIND)?,
            len: self.len as u64,
            u: element_to_repr(&self.u, Self::KIND)?,
            v: element_to_repr(&self.v, Self::KIND)?,
        })
    }

    fn from_repr(repr: Self::Repr) -> Result<Self, SerialError> {
        let modulus = repr.ring.parse(Self::KIND)?;
        if repr.len > u64::from(repr.ring.dimension) {
            return Err(SerialError::InvalidRepr {
                kind: Self::KIND,
                reason: format!(
                    "{} values do not fit into a ring of dimension {}",
                    repr.len, repr.ring.dimension
                ),
            });
        }

        Ok(Self {
            context: repr.context,
            u: element_from_repr(&repr.u, &modulus, Self::KIND)?,
            v: element_from_repr(&repr.v, &modulus, Self::KIND)?,
            len: repr.len as usize,
        })
    }
}

#[cfg(test)]
mod test_ciphertext_serialization {
    use super::{Ciphertext, Plaintext};
    use crate::{
        error::SerialError,
        scheme::{CryptoContext, Feature, Mode, SchemeParameters, SecurityLevel},
        serial::{deserialize_from_bytes, serialize_to_bytes, SerFormat, Serializable},
    };

    fn setup() -> (CryptoContext, Ciphertext, Plaintext) {
        let params = SchemeParameters::new(257, 3.2, SecurityLevel::NotSet, 1, Mode::Optimized)
            .with_ring_dimension(16);
        let mut cc = CryptoContext::new(&params).unwrap();
        cc.enable(Feature::Encryption);
        let key_pair = cc.key_gen().unwrap();
        let plaintext = Plaintext::new(vec![256, 0, 17, 4]);
        let cipher = cc.encrypt(&key_pair.public_key, &plaintext).unwrap();

        // decrypt once to be sure the fixture is meaningful
        assert_eq!(plaintext, cc.decrypt(&key_pair.secret_key, &cipher).unwrap());
        (cc, cipher, plaintext)
    }

    /// Ensures a ciphertext survives the round-trip in both formats.
    #[test]
    fn round_trip() {
        let (_, cipher, _) = setup();

        for format in [SerFormat::Binary, SerFormat::Json] {
            let bytes = serialize_to_bytes(&cipher, format).unwrap();
            let restored: Ciphertext = deserialize_from_bytes(&bytes, format).unwrap();

            assert_eq!(cipher, restored);
            assert_eq!(4, restored.len());
        }
    }

    /// Ensures a stored length larger than the ring is rejected.
    #[test]
    fn invalid_len() {
        let (_, cipher, _) = setup();
        let mut repr = cipher.to_repr().unwrap();
        repr.len = 17;

        assert!(matches!(
            Ciphertext::from_repr(repr),
            Err(SerialError::InvalidRepr { .. })
        ));
    }

    /// Ensures the plaintext accessors agree.
    #[test]
    fn plaintext_accessors() {
        let plaintext = Plaintext::from(vec![5, 6]);

        assert_eq!(2, plaintext.len());
        assert!(!plaintext.is_empty());
        assert!(Plaintext::default().is_empty());
    }
}
