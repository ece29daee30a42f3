// Copyright © 2024 The qFALL-persist Authors
//
// This file is part of qFALL-persist.
//
// qFALL-persist is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains the key types generated by a
//! [`CryptoContext`](super::CryptoContext) and their stored representations.

use crate::{
    error::SerialError,
    serial::{ObjectKind, Serializable},
    utils::{
        coefficients::{from_coefficients, to_coefficients},
        common_moduli::parse_anticyclic,
    },
};
use qfall_math::integer_mod_q::{ModulusPolynomialRingZq, PolynomialRingZq};
use serde::{Deserialize, Serialize};

/// The public key `pk = (a, b = s * a + e)`.
///
/// Attributes:
/// - `context`: the fingerprint of the context that generated the key
/// - `a`: the uniform ring element
/// - `b`: the RLWE sample `s * a + e`
#[derive(Debug, Clone, PartialEq)]
pub struct PublicKey {
    pub(crate) context: String,
    pub(crate) a: PolynomialRingZq,
    pub(crate) b: PolynomialRingZq,
}

/// The secret key `sk = s`.
#[derive(Debug, Clone, PartialEq)]
pub struct SecretKey {
    pub(crate) context: String,
    pub(crate) s: PolynomialRingZq,
}

/// The result of [`CryptoContext::key_gen`](super::CryptoContext::key_gen).
/// Both halves are persisted independently.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyPair {
    pub public_key: PublicKey,
    pub secret_key: SecretKey,
}

impl PublicKey {
    /// Returns the fingerprint of the context that generated this key.
    pub fn context_fingerprint(&self) -> &str {
        &self.context
    }
}

impl SecretKey {
    /// Returns the fingerprint of the context that generated this key.
    pub fn context_fingerprint(&self) -> &str {
        &self.context
    }
}

/// Describes the ring `Z_q[X]/(X^n + 1)` a stored element lives in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingRepr {
    pub dimension: u32,
    pub modulus: String,
}

impl RingRepr {
    pub(crate) fn of(
        modulus: &ModulusPolynomialRingZq,
        kind: ObjectKind,
    ) -> Result<Self, SerialError> {
        let dimension = u32::try_from(modulus.get_degree()).map_err(|e| SerialError::Encode {
            kind,
            reason: e.to_string(),
        })?;
        Ok(Self {
            dimension,
            modulus: modulus.get_q().to_string(),
        })
    }

    pub(crate) fn parse(&self, kind: ObjectKind) -> Result<ModulusPolynomialRingZq, SerialError> {
        let (modulus, _) = parse_anticyclic(self.dimension, &self.modulus)
            .map_err(|reason| SerialError::InvalidRepr { kind, reason })?;
        Ok(modulus)
    }
}

pub(crate) fn element_to_repr(
    element: &PolynomialRingZq,
    kind: ObjectKind,
) -> Result<Vec<String>, SerialError> {
    to_coefficients(element).map_err(|e| SerialError::Encode {
        kind,
        reason: e.to_string(),
    })
}

pub(crate) fn element_from_repr(
    coefficients: &[String],
    modulus: &ModulusPolynomialRingZq,
    kind: ObjectKind,
) -> Result<PolynomialRingZq, SerialError> {
    from_coefficients(coefficients, modulus).map_err(|e| SerialError::InvalidRepr {
        kind,
        reason: e.to_string(),
    })
}

/// The stored form of a [`PublicKey`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyRepr {
    pub context: String,
    pub ring: RingRepr,
    pub a: Vec<String>,
    pub b: Vec<String>,
}

/// The stored form of a [`SecretKey`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretKeyRepr {
    pub context: String,
    pub ring: RingRepr,
    pub s: Vec<String>,
}

impl Serializable for PublicKey {
    const KIND: ObjectKind = ObjectKind::PublicKey;
    type Repr = PublicKeyRepr;

    fn to_repr(&self) -> Result<Self::Repr, SerialError> {
        Ok(PublicKeyRepr {
            context: self.context.clone(),
            ring: RingRepr::of(&self.a.get_mod(), Self::KIND)?,
            a: element_to_repr(&self.a, Self::KIND)?,
            b: element_to_repr(&self.b, Self::KIND)?,
        })
    }

    fn from_repr(repr: Self::Repr) -> Result<Self, SerialError> {
        let modulus = repr.ring.parse(Self::KIND)?;
        Ok(Self {
            context: repr.context,
            a: element_from_repr(&repr.a, &modulus, Self::KIND)?,
            b: element_from_repr(&repr.b, &modulus, Self::KIND)?,
        })
    }
}

impl Serializable for SecretKey {
    const KIND: ObjectKind = ObjectKind::SecretKey;
    type Repr = SecretKeyRepr;

    fn to_repr(&self) -> Result<Self::Repr, SerialError> {
        Ok(SecretKeyRepr {
            context: self.context.clone(),
            ring: RingRepr::of(&self.s.get_mod(), Self::KIND)?,
            s: element_to_repr(&self.s, Self::KIND)?,
        })
    }

    fn from_repr(repr: Self::Repr) -> Result<Self, SerialError> {
        let modulus = repr.ring.parse(Self::KIND)?;
        Ok(Self {
            context: repr.context,
            s: element_from_repr(&repr.s, &modulus, Self::KIND)?,
        })
    }
}
