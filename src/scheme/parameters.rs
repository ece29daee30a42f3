// Copyright © 2024 The qFALL-persist Authors
//
// This file is part of qFALL-persist.
//
// qFALL-persist is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains the public parameters a [`CryptoContext`](super::CryptoContext)
//! is constructed from and the selection of the ring dimension and the
//! bit length of the ciphertext modulus.
//!
//! The maximal sizes of the ciphertext modulus per security level are taken from
//! - \[1\] Albrecht, Martin et al. (2018).
//! Homomorphic Encryption Security Standard.
//! <https://homomorphicencryption.org/standard/>

use crate::error::ContextError;
use serde::{Deserialize, Serialize};

/// Smallest ring dimension selected if no ring dimension is specified.
pub const MIN_RING_DIMENSION: u32 = 1024;
/// Largest ring dimension covered by the security table.
pub const MAX_RING_DIMENSION: u32 = 32768;

/// The targeted security level of a parameter set.
///
/// [`SecurityLevel::NotSet`] disables the bound on the modulus size and
/// is only meant for testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityLevel {
    HEStd128Classic,
    HEStd192Classic,
    HEStd256Classic,
    NotSet,
}

impl SecurityLevel {
    /// Returns the maximal bit length of `q` for ring dimension `n`
    /// according to Table 1 of [\[1\]](<index.html#:~:text=[1]>), or `None` if
    /// no bound applies.
    ///
    /// Parameters:
    /// - `n`: specifies the ring dimension, a power of two in `[1024, 32768]`
    ///
    /// # Examples
    /// ```
    /// use qfall_persist::scheme::SecurityLevel;
    ///
    /// assert_eq!(Some(109), SecurityLevel::HEStd128Classic.max_modulus_bits(4096));
    /// assert_eq!(None, SecurityLevel::NotSet.max_modulus_bits(4096));
    /// ```
    pub fn max_modulus_bits(&self, n: u32) -> Option<u32> {
        let row: [u32; 6] = match self {
            SecurityLevel::HEStd128Classic => [27, 54, 109, 218, 438, 881],
            SecurityLevel::HEStd192Classic => [19, 37, 75, 152, 305, 611],
            SecurityLevel::HEStd256Classic => [14, 29, 58, 118, 237, 476],
            SecurityLevel::NotSet => return None,
        };
        // dimensions outside of the table admit no modulus at all
        let column = match n {
            1024 => 0,
            2048 => 1,
            4096 => 2,
            8192 => 3,
            16384 => 4,
            32768 => 5,
            _ => return Some(0),
        };
        Some(row[column])
    }
}

/// Determines the distribution the secret key is sampled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Secret key coefficients are uniform in `{-1, 0, 1}`.
    Optimized,
    /// Secret key coefficients follow the error distribution.
    Rlwe,
}

/// The public parameters of a scheme instance.
///
/// Attributes:
/// - `plaintext_modulus`: specifies the modulus `t` of the plaintext space
/// - `sigma`: specifies the standard deviation of the error distribution
/// - `security_level`: specifies the targeted [`SecurityLevel`]
/// - `depth`: specifies the multiplicative depth the modulus is sized for
/// - `mode`: specifies the secret key distribution
/// - `ring_dimension`: optionally fixes the ring dimension `n` instead of
/// choosing the smallest admissible one
///
/// # Examples
/// ```
/// use qfall_persist::scheme::{Mode, SchemeParameters, SecurityLevel};
///
/// let params = SchemeParameters::new(65537, 3.2, SecurityLevel::HEStd128Classic, 2, Mode::Optimized);
/// assert_eq!(params, SchemeParameters::default());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeParameters {
    pub plaintext_modulus: u64,
    pub sigma: f64,
    pub security_level: SecurityLevel,
    pub depth: u32,
    pub mode: Mode,
    #[serde(default)]
    pub ring_dimension: Option<u32>,
}

impl SchemeParameters {
    /// Instantiates a new parameter set. The parameters are only checked
    /// once a context is constructed from them.
    pub fn new(
        plaintext_modulus: u64,
        sigma: f64,
        security_level: SecurityLevel,
        depth: u32,
        mode: Mode,
    ) -> Self {
        Self {
            plaintext_modulus,
            sigma,
            security_level,
            depth,
            mode,
            ring_dimension: None,
        }
    }

    /// Fixes the ring dimension to `n`, which must be a power of two.
    pub fn with_ring_dimension(mut self, n: u32) -> Self {
        self.ring_dimension = Some(n);
        self
    }

    /// Returns the number of bits the ciphertext modulus needs for ring
    /// dimension `n` such that a ciphertext of the given depth still decrypts.
    ///
    /// The estimate is `(depth + 1) * (⌈log t⌉ + log n) + ⌈log(6 * sigma * n)⌉`,
    /// where the last summand bounds a fresh error coefficient.
    ///
    /// Returns `None` if the estimate does not fit into a [`u32`].
    pub fn required_modulus_bits(&self, n: u32) -> Option<u32> {
        let log_t = 64 - self.plaintext_modulus.saturating_sub(1).leading_zeros();
        let log_n = n.trailing_zeros();
        let error_bits = (6.0 * self.sigma * f64::from(n)).log2().ceil().max(1.0) as u32;

        self.depth
            .checked_add(1)?
            .checked_mul(log_t + log_n)?
            .checked_add(error_bits)
    }

    fn modulus_bits_or_infeasible(&self, n: u32) -> Result<u32, ContextError> {
        self.required_modulus_bits(n).ok_or_else(|| {
            ContextError::InfeasibleParameters(format!(
                "depth {} requires more modulus bits than can be represented",
                self.depth
            ))
        })
    }

    /// Selects the ring dimension `n` and the bit length of `q`.
    ///
    /// Returns `(n, bits)` or a [`ContextError`] if the parameters are
    /// infeasible for the requested [`SecurityLevel`].
    ///
    /// # Examples
    /// ```
    /// use qfall_persist::scheme::SchemeParameters;
    ///
    /// let (n, bits) = SchemeParameters::default().select_ring().unwrap();
    /// assert_eq!(4096, n);
    /// assert!(bits <= 109);
    /// ```
    ///
    /// # Errors and Failures
    /// - Returns a [`ContextError`] of type
    /// [`InfeasibleParameters`](ContextError::InfeasibleParameters) if
    /// `plaintext_modulus <= 1`, `sigma` is not positive, the ring dimension
    /// is not a power of two, or no ring dimension admits the required modulus.
    pub fn select_ring(&self) -> Result<(u32, u32), ContextError> {
        if self.plaintext_modulus <= 1 {
            return Err(ContextError::InfeasibleParameters(String::from(
                "the plaintext modulus must be larger than 1",
            )));
        }
        if !(self.sigma > 0.0 && self.sigma.is_finite()) {
            return Err(ContextError::InfeasibleParameters(format!(
                "sigma must be positive, but is {}",
                self.sigma
            )));
        }

        if let Some(n) = self.ring_dimension {
            if n < 2 || !n.is_power_of_two() {
                return Err(ContextError::InfeasibleParameters(format!(
                    "the ring dimension must be a power of two, but is {n}"
                )));
            }
            let bits = self.modulus_bits_or_infeasible(n)?;
            return match self.security_level.max_modulus_bits(n) {
                Some(max) if bits > max => Err(ContextError::InfeasibleParameters(format!(
                    "{bits} modulus bits are required, but {:?} allows at most {max} for n = {n}",
                    self.security_level
                ))),
                _ => Ok((n, bits)),
            };
        }

        let mut n = MIN_RING_DIMENSION;
        while n <= MAX_RING_DIMENSION {
            let bits = self.modulus_bits_or_infeasible(n)?;
            match self.security_level.max_modulus_bits(n) {
                Some(max) if bits > max => n *= 2,
                _ => return Ok((n, bits)),
            }
        }

        Err(ContextError::InfeasibleParameters(format!(
            "depth {} with plaintext modulus {} does not fit into any ring dimension up to {MAX_RING_DIMENSION} for {:?}",
            self.depth, self.plaintext_modulus, self.security_level
        )))
    }
}

impl Default for SchemeParameters {
    /// Returns the parameters of the reference run:
    /// `t = 65537`, `sigma = 3.2`, 128-bit classical security, depth 2.
    fn default() -> Self {
        Self::new(
            65537,
            3.2,
            SecurityLevel::HEStd128Classic,
            2,
            Mode::Optimized,
        )
    }
}

#[cfg(test)]
mod test_select_ring {
    use super::{Mode, SchemeParameters, SecurityLevel};
    use crate::error::ContextError;

    /// Ensures the reference parameters end up in ring dimension 4096.
    #[test]
    fn reference_parameters() {
        let (n, bits) = SchemeParameters::default().select_ring().unwrap();

        assert_eq!(4096, n);
        assert_eq!(104, bits);
    }

    /// Ensures that higher security levels require larger rings.
    #[test]
    fn security_levels_monotone() {
        let levels = [
            SecurityLevel::HEStd128Classic,
            SecurityLevel::HEStd192Classic,
            SecurityLevel::HEStd256Classic,
        ];
        let mut last = 0;

        for level in levels {
            let params = SchemeParameters::new(65537, 3.2, level, 2, Mode::Optimized);
            let (n, _) = params.select_ring().unwrap();

            assert!(n >= last);
            last = n;
        }
        assert_eq!(8192, last);
    }

    /// Ensures a larger depth requires more modulus bits.
    #[test]
    fn depth_increases_bits() {
        let shallow = SchemeParameters::new(65537, 3.2, SecurityLevel::NotSet, 1, Mode::Rlwe);
        let deep = SchemeParameters::new(65537, 3.2, SecurityLevel::NotSet, 5, Mode::Rlwe);

        assert!(
            shallow.required_modulus_bits(1024).unwrap() < deep.required_modulus_bits(1024).unwrap()
        );
    }

    /// Ensures an explicit ring dimension is taken as is without a security bound.
    #[test]
    fn explicit_ring_dimension() {
        let params = SchemeParameters::new(257, 3.2, SecurityLevel::NotSet, 1, Mode::Optimized)
            .with_ring_dimension(16);

        let (n, bits) = params.select_ring().unwrap();

        assert_eq!(16, n);
        assert_eq!(Some(bits), params.required_modulus_bits(16));
    }

    /// Ensures an explicit ring dimension is still checked against the security level.
    #[test]
    fn explicit_ring_dimension_too_small() {
        let params = SchemeParameters::default().with_ring_dimension(1024);

        assert!(matches!(
            params.select_ring(),
            Err(ContextError::InfeasibleParameters(_))
        ));
    }

    /// Ensures that invalid inputs are rejected.
    #[test]
    fn invalid_inputs() {
        let mut params = SchemeParameters::default();
        params.plaintext_modulus = 1;
        assert!(params.select_ring().is_err());

        let mut params = SchemeParameters::default();
        params.sigma = 0.0;
        assert!(params.select_ring().is_err());

        let params = SchemeParameters::default().with_ring_dimension(1000);
        assert!(params.select_ring().is_err());
    }

    /// Ensures a depth no ring can hold is reported as infeasible.
    #[test]
    fn depth_too_large() {
        let params = SchemeParameters::new(
            65537,
            3.2,
            SecurityLevel::HEStd256Classic,
            40,
            Mode::Optimized,
        );

        assert!(matches!(
            params.select_ring(),
            Err(ContextError::InfeasibleParameters(_))
        ));
    }

    /// Ensures a depth whose modulus estimate overflows is infeasible instead of a panic.
    #[test]
    fn depth_overflows_estimate() {
        for depth in [u32::MAX, 1 << 28] {
            for ring_dimension in [None, Some(1024)] {
                let mut params = SchemeParameters::new(
                    65537,
                    3.2,
                    SecurityLevel::NotSet,
                    depth,
                    Mode::Optimized,
                );
                params.ring_dimension = ring_dimension;

                assert_eq!(None, params.required_modulus_bits(1024));
                assert!(matches!(
                    params.select_ring(),
                    Err(ContextError::InfeasibleParameters(_))
                ));
            }
        }
    }
}
