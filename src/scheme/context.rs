// Copyright © 2024 The qFALL-persist Authors
//
// This file is part of qFALL-persist.
//
// qFALL-persist is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains the [`CryptoContext`], which owns the ring and
//! error distribution of a scheme instance and provides key generation,
//! encryption, decryption and homomorphic addition.

use super::{
    ciphertext::{Ciphertext, Plaintext},
    keys::{KeyPair, PublicKey, RingRepr, SecretKey},
    parameters::{Mode, SchemeParameters},
};
use crate::{
    error::{ContextError, SerialError},
    serial::{ObjectKind, Serializable},
    utils::{common_moduli::new_anticyclic, digest::sha256},
};
use log::debug;
use qfall_math::{
    integer::{PolyOverZ, Z},
    integer_mod_q::{ModulusPolynomialRingZq, PolynomialRingZq},
    rational::Q,
    traits::{GetCoefficient, Pow, SetCoefficient},
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt};

/// Capabilities that have to be enabled on a [`CryptoContext`] before
/// the corresponding operations are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Feature {
    /// Key generation, encryption and decryption.
    Encryption,
    /// Somewhat homomorphic evaluation, i.e. [`CryptoContext::eval_add`].
    She,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feature::Encryption => f.write_str("PKE"),
            Feature::She => f.write_str("SHE"),
        }
    }
}

/// A scheme instance over the ring `R_q = Z_q[X]/(X^n + 1)`.
///
/// Attributes:
/// - `params`: the [`SchemeParameters`] the context was built from
/// - `dimension`: the ring dimension `n`
/// - `n`: the ring dimension as [`Z`] for the samplers
/// - `q`: the modulus polynomial `X^n + 1 mod q`
/// - `gaussian`: the Gaussian parameter `sigma * sqrt(2 * pi)` of the error distribution
/// - `features`: the enabled [`Feature`]s
/// - `fingerprint`: identifies the ring and plaintext space; keys and
/// ciphertexts carry it to detect use with a different context
///
/// # Examples
/// ```
/// use qfall_persist::scheme::{CryptoContext, Feature, SchemeParameters};
///
/// let mut cc = CryptoContext::new(&SchemeParameters::default()).unwrap();
/// assert!(cc.enable(Feature::Encryption));
///
/// assert_eq!(4096, cc.ring_dimension());
/// ```
#[derive(Debug, Clone)]
pub struct CryptoContext {
    params: SchemeParameters,
    dimension: u32,
    n: Z,
    q: ModulusPolynomialRingZq,
    gaussian: Q,
    features: BTreeSet<Feature>,
    fingerprint: String,
}

impl CryptoContext {
    /// Constructs a context for the given parameters.
    ///
    /// The ring dimension `n` and the bit length `l` of `q` are chosen by
    /// [`SchemeParameters::select_ring`], then `q` is sampled as a prime in `[2^(l-1), 2^l)`.
    /// No [`Feature`] is enabled on the returned context.
    ///
    /// Parameters:
    /// - `params`: specifies the public parameters
    ///
    /// Returns a new [`CryptoContext`] or a [`ContextError`] if the parameters are infeasible.
    ///
    /// # Examples
    /// ```
    /// use qfall_persist::scheme::{CryptoContext, Mode, SchemeParameters, SecurityLevel};
    ///
    /// let params = SchemeParameters::new(257, 3.2, SecurityLevel::NotSet, 1, Mode::Rlwe)
    ///     .with_ring_dimension(16);
    /// let cc = CryptoContext::new(&params).unwrap();
    /// ```
    ///
    /// # Errors and Failures
    /// - Returns a [`ContextError`] of type
    /// [`InfeasibleParameters`](ContextError::InfeasibleParameters) if
    /// [`SchemeParameters::select_ring`] fails.
    pub fn new(params: &SchemeParameters) -> Result<Self, ContextError> {
        let (n, bits) = params.select_ring()?;

        // generate prime q in [2^(bits - 1), 2^bits)
        let upper_bound = Z::from(2).pow(i64::from(bits))?;
        let lower_bound = Z::from(2).pow(i64::from(bits) - 1)?;
        let q = Z::sample_prime_uniform(&lower_bound, &upper_bound)?;

        let context = Self::from_ring(params.clone(), n, new_anticyclic(n, q)?, BTreeSet::new())?;
        debug!(
            "constructed crypto context with n = {n} and a {bits}-bit modulus, fingerprint {}",
            context.fingerprint
        );
        Ok(context)
    }

    fn from_ring(
        params: SchemeParameters,
        dimension: u32,
        q: ModulusPolynomialRingZq,
        features: BTreeSet<Feature>,
    ) -> Result<Self, ContextError> {
        let modulus = q.get_q();
        if modulus <= Z::from(params.plaintext_modulus) {
            return Err(ContextError::InfeasibleParameters(format!(
                "the modulus {modulus} does not exceed the plaintext modulus {}",
                params.plaintext_modulus
            )));
        }
        if !(params.sigma > 0.0 && params.sigma.is_finite()) {
            return Err(ContextError::InfeasibleParameters(format!(
                "sigma must be positive, but is {}",
                params.sigma
            )));
        }

        // s = sigma * sqrt(2 * pi)
        let gaussian = Q::from(params.sigma) * (Q::from(2) * Q::PI).sqrt();
        let fingerprint = sha256(format!(
            "ring {dimension} {modulus} plaintext {}",
            params.plaintext_modulus
        ));

        Ok(Self {
            params,
            dimension,
            n: Z::from(dimension),
            q,
            gaussian,
            features,
            fingerprint,
        })
    }

    /// Enables `feature` on this context.
    ///
    /// Returns `true` if the feature was not enabled before. Enabling a
    /// feature twice has no further effect.
    pub fn enable(&mut self, feature: Feature) -> bool {
        let newly_enabled = self.features.insert(feature);
        if newly_enabled {
            debug!("enabled feature {feature}");
        } else {
            debug!("feature {feature} was already enabled");
        }
        newly_enabled
    }

    pub fn is_enabled(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    /// Returns the enabled features in ascending order.
    pub fn features(&self) -> impl Iterator<Item = Feature> + '_ {
        self.features.iter().copied()
    }

    pub fn parameters(&self) -> &SchemeParameters {
        &self.params
    }

    pub fn ring_dimension(&self) -> u32 {
        self.dimension
    }

    /// Returns the ciphertext modulus `q`.
    pub fn modulus(&self) -> Z {
        self.q.get_q()
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    fn require(&self, feature: Feature) -> Result<(), ContextError> {
        if self.is_enabled(feature) {
            Ok(())
        } else {
            Err(ContextError::FeatureNotEnabled(feature))
        }
    }

    /// Accepts an object only if it carries this context's fingerprint and
    /// all of its ring elements live in this context's ring.
    fn check_origin(
        &self,
        fingerprint: &str,
        elements: &[&PolynomialRingZq],
        object: &'static str,
    ) -> Result<(), ContextError> {
        if fingerprint == self.fingerprint
            && elements.iter().all(|element| element.get_mod() == self.q)
        {
            Ok(())
        } else {
            Err(ContextError::ForeignObject(object))
        }
    }

    /// Samples from the error distribution `χ`.
    fn sample_error(&self) -> Result<PolynomialRingZq, ContextError> {
        Ok(PolynomialRingZq::sample_discrete_gauss(
            &self.q,
            &self.n,
            0,
            &self.gaussian,
        )?)
    }

    /// Samples from the secret distribution selected by [`Mode`].
    fn sample_secret(&self) -> Result<PolynomialRingZq, ContextError> {
        match self.params.mode {
            Mode::Optimized => {
                let ternary = PolyOverZ::sample_uniform(i64::from(self.dimension) - 1, -1, 2)?;
                Ok(PolynomialRingZq::from((&ternary, &self.q)))
            }
            Mode::Rlwe => self.sample_error(),
        }
    }

    /// Generates a fresh key pair by following these steps:
    /// - a <- R_q
    /// - s <- secret distribution, e <- χ
    /// - b = s * a + e
    ///
    /// Then, `pk = (a, b)` and `sk = s` are returned.
    ///
    /// # Examples
    /// ```
    /// use qfall_persist::scheme::{CryptoContext, Feature, Mode, SchemeParameters, SecurityLevel};
    ///
    /// let params = SchemeParameters::new(257, 3.2, SecurityLevel::NotSet, 1, Mode::Optimized)
    ///     .with_ring_dimension(16);
    /// let mut cc = CryptoContext::new(&params).unwrap();
    /// cc.enable(Feature::Encryption);
    ///
    /// let key_pair = cc.key_gen().unwrap();
    /// assert_eq!(cc.fingerprint(), key_pair.public_key.context_fingerprint());
    /// ```
    ///
    /// # Errors and Failures
    /// - Returns a [`ContextError`] of type
    /// [`FeatureNotEnabled`](ContextError::FeatureNotEnabled) if
    /// [`Feature::Encryption`] is not enabled.
    pub fn key_gen(&self) -> Result<KeyPair, ContextError> {
        self.require(Feature::Encryption)?;

        let a = PolynomialRingZq::sample_uniform(&self.q);
        let s = self.sample_secret()?;
        let e = self.sample_error()?;

        let b = &a * &s + e;

        Ok(KeyPair {
            public_key: PublicKey {
                context: self.fingerprint.clone(),
                a,
                b,
            },
            secret_key: SecretKey {
                context: self.fingerprint.clone(),
                s,
            },
        })
    }

    /// Encrypts `plaintext` under `pk` by following these steps:
    /// - r <- secret distribution, e1 <- χ, e2 <- χ
    /// - u = a * r + e1
    /// - v = b * r + e2 + ⌊q/t⌋ * m
    ///
    /// where `m` holds the plaintext values as coefficients.
    ///
    /// # Errors and Failures
    /// - Returns a [`ContextError`] of type
    /// [`FeatureNotEnabled`](ContextError::FeatureNotEnabled) if
    /// [`Feature::Encryption`] is not enabled.
    /// - Returns a [`ContextError`] of type [`ForeignObject`](ContextError::ForeignObject)
    /// if `pk` was generated by another context or lives in another ring.
    /// - Returns a [`ContextError`] of type [`InvalidPlaintext`](ContextError::InvalidPlaintext)
    /// if the plaintext holds more than `n` values or a value is not smaller than `t`.
    pub fn encrypt(
        &self,
        pk: &PublicKey,
        plaintext: &Plaintext,
    ) -> Result<Ciphertext, ContextError> {
        self.require(Feature::Encryption)?;
        self.check_origin(&pk.context, &[&pk.a, &pk.b], "public key")?;
        self.check_plaintext(plaintext)?;

        let t = Z::from(self.params.plaintext_modulus);
        let delta = self.q.get_q().div_floor(&t);
        let mut m_delta = PolynomialRingZq::from((&PolyOverZ::default(), &self.q));
        for (i, value) in plaintext.values().iter().enumerate() {
            if *value != 0 {
                m_delta.set_coeff(i, &(&delta * Z::from(*value)))?;
            }
        }

        let r = self.sample_secret()?;
        let e1 = self.sample_error()?;
        let e2 = self.sample_error()?;

        let u = &pk.a * &r + e1;
        let v = &pk.b * &r + e2 + m_delta;

        Ok(Ciphertext {
            context: self.fingerprint.clone(),
            u,
            v,
            len: plaintext.len(),
        })
    }

    fn check_plaintext(&self, plaintext: &Plaintext) -> Result<(), ContextError> {
        if plaintext.len() > self.dimension as usize {
            return Err(ContextError::InvalidPlaintext(format!(
                "{} values do not fit into ring dimension {}",
                plaintext.len(),
                self.dimension
            )));
        }
        let t = self.params.plaintext_modulus;
        if let Some(value) = plaintext.values().iter().find(|value| **value >= t) {
            return Err(ContextError::InvalidPlaintext(format!(
                "{value} is not smaller than the plaintext modulus {t}"
            )));
        }
        Ok(())
    }

    /// Decrypts `cipher` with `sk`: every coefficient `c` of `v - s * u`
    /// is mapped to `⌊t * c / q⌉ mod t`.
    ///
    /// # Errors and Failures
    /// - Returns a [`ContextError`] of type
    /// [`FeatureNotEnabled`](ContextError::FeatureNotEnabled) if
    /// [`Feature::Encryption`] is not enabled.
    /// - Returns a [`ContextError`] of type [`ForeignObject`](ContextError::ForeignObject)
    /// if `sk` or `cipher` stem from another context.
    pub fn decrypt(&self, sk: &SecretKey, cipher: &Ciphertext) -> Result<Plaintext, ContextError> {
        self.require(Feature::Encryption)?;
        self.check_origin(&sk.context, &[&sk.s], "secret key")?;
        self.check_origin(&cipher.context, &[&cipher.u, &cipher.v], "ciphertext")?;

        // res = v - s * u
        let result = &cipher.v - &sk.s * &cipher.u;

        let q = self.q.get_q();
        let t = Z::from(self.params.plaintext_modulus);
        let two_q = &q + &q;
        let two_t = &t + &t;

        let mut values = Vec::with_capacity(cipher.len);
        for i in 0..cipher.len {
            let coeff: Z = result.get_coeff(i)?;
            let coeff = if coeff < Z::ZERO { coeff + &q } else { coeff };

            // round(t * c / q) = ⌊(2tc + q) / 2q⌋
            let value = (&two_t * &coeff + &q).div_floor(&two_q);
            let value = if value == t { Z::ZERO } else { value };
            values.push(u64::try_from(&value)?);
        }

        Ok(Plaintext::new(values))
    }

    /// Adds two ciphertexts such that the result decrypts to the
    /// coefficient-wise sum of both plaintexts modulo `t`.
    ///
    /// # Errors and Failures
    /// - Returns a [`ContextError`] of type
    /// [`FeatureNotEnabled`](ContextError::FeatureNotEnabled) if [`Feature::She`] is not enabled.
    /// - Returns a [`ContextError`] of type [`ForeignObject`](ContextError::ForeignObject)
    /// if a ciphertext stems from another context.
    pub fn eval_add(&self, lhs: &Ciphertext, rhs: &Ciphertext) -> Result<Ciphertext, ContextError> {
        self.require(Feature::She)?;
        self.check_origin(&lhs.context, &[&lhs.u, &lhs.v], "ciphertext")?;
        self.check_origin(&rhs.context, &[&rhs.u, &rhs.v], "ciphertext")?;

        Ok(Ciphertext {
            context: self.fingerprint.clone(),
            u: &lhs.u + &rhs.u,
            v: &lhs.v + &rhs.v,
            len: lhs.len.max(rhs.len),
        })
    }
}

impl PartialEq for CryptoContext {
    /// Two contexts are equal if they share parameters, ring and features.
    fn eq(&self, other: &Self) -> bool {
        self.fingerprint == other.fingerprint
            && self.params == other.params
            && self.features == other.features
    }
}

/// The stored form of a [`CryptoContext`]. The fingerprint and the
/// Gaussian parameter are derived again on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextRepr {
    pub parameters: SchemeParameters,
    pub ring: RingRepr,
    pub features: BTreeSet<Feature>,
}

impl Serializable for CryptoContext {
    const KIND: ObjectKind = ObjectKind::CryptoContext;
    type Repr = ContextRepr;

    fn to_repr(&self) -> Result<Self::Repr, SerialError> {
        Ok(ContextRepr {
            parameters: self.params.clone(),
            ring: RingRepr::of(&self.q, Self::KIND)?,
            features: self.features.clone(),
        })
    }

    fn from_repr(repr: Self::Repr) -> Result<Self, SerialError> {
        let q = repr.ring.parse(Self::KIND)?;
        Self::from_ring(repr.parameters, repr.ring.dimension, q, repr.features).map_err(|e| {
            SerialError::InvalidRepr {
                kind: Self::KIND,
                reason: e.to_string(),
            }
        })
    }
}


#[cfg(test)]
mod test_context_serialization {
    use super::{CryptoContext, Feature};
    use crate::{
        error::SerialError,
        scheme::{Mode, Plaintext, SchemeParameters, SecurityLevel},
        serial::{deserialize_from_bytes, serialize_to_bytes, SerFormat, Serializable},
    };

    fn context() -> CryptoContext {
        let params = SchemeParameters::new(65537, 3.2, SecurityLevel::NotSet, 2, Mode::Optimized)
            .with_ring_dimension(64);
        let mut cc = CryptoContext::new(&params).unwrap();
        cc.enable(Feature::Encryption);
        cc.enable(Feature::She);
        cc
    }

    /// Ensures a context survives the round-trip including its features.
    #[test]
    fn round_trip() {
        let cc = context();

        for format in [SerFormat::Binary, SerFormat::Json] {
            let bytes = serialize_to_bytes(&cc, format).unwrap();
            let restored: CryptoContext = deserialize_from_bytes(&bytes, format).unwrap();

            assert_eq!(cc, restored);
            assert_eq!(cc.modulus(), restored.modulus());
            assert!(restored.is_enabled(Feature::She));
        }
    }

    /// Ensures a reloaded context generates keys that work with the original one.
    #[test]
    fn reloaded_generates_keys() {
        let cc = context();
        let bytes = serialize_to_bytes(&cc, SerFormat::Binary).unwrap();
        let restored: CryptoContext = deserialize_from_bytes(&bytes, SerFormat::Binary).unwrap();

        let key_pair = restored.key_gen().unwrap();
        let plaintext = Plaintext::new(vec![4, 8, 15, 16, 23, 42]);
        let cipher = cc.encrypt(&key_pair.public_key, &plaintext).unwrap();

        assert_eq!(plaintext, restored.decrypt(&key_pair.secret_key, &cipher).unwrap());
    }

    /// Ensures a context artifact is not accepted as a string and vice versa.
    #[test]
    fn kind_mismatch() {
        let cc = context();
        let cc_bytes = serialize_to_bytes(&cc, SerFormat::Json).unwrap();
        let str_bytes = serialize_to_bytes(&String::from("TESTING"), SerFormat::Json).unwrap();

        assert!(matches!(
            deserialize_from_bytes::<String>(&cc_bytes, SerFormat::Json),
            Err(SerialError::KindMismatch { .. })
        ));
        assert!(matches!(
            deserialize_from_bytes::<CryptoContext>(&str_bytes, SerFormat::Json),
            Err(SerialError::KindMismatch { .. })
        ));
    }

    /// Ensures a stored context with inconsistent parameters is rejected.
    #[test]
    fn invalid_parameters() {
        let cc = context();
        let mut repr = cc.to_repr().unwrap();
        repr.ring.modulus = String::from("17");

        assert!(matches!(
            CryptoContext::from_repr(repr),
            Err(SerialError::InvalidRepr { .. })
        ));
    }
}
