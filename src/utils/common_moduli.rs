// Copyright © 2024 The qFALL-persist Authors
//
// This file is part of qFALL-persist.
//
// qFALL-persist is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains functions to instantiate the modulus polynomial
//! of the ring `Z_q[X]/(X^n + 1)` every scheme object lives in.

use qfall_math::{
    error::MathError,
    integer::Z,
    integer_mod_q::{Modulus, ModulusPolynomialRingZq, PolyOverZq},
    traits::SetCoefficient,
};
use std::fmt::Display;

/// Outputs a [`ModulusPolynomialRingZq`] of the form `X^n + 1 mod modulus`.
///
/// Parameters:
/// - `n`: specifies the degree of the modulus polynomial
/// - `modulus`: specifies the modulus of the modulus polynomial
///
/// Returns a [`ModulusPolynomialRingZq`] of the form `X^n + 1 mod modulus` or
/// a [`MathError`] if `n < 0`, or `n` does not into an [`i64`].
///
/// # Examples
/// ```
/// use qfall_persist::utils::common_moduli::new_anticyclic;
///
/// let poly_mod = new_anticyclic(8, 17);
/// ```
///
/// # Errors and Failures
/// - Returns a [`MathError`] of type [`OutOfBounds`](MathError::OutOfBounds) if
/// the `n` is negative or it does not fit into an [`i64`].
///
/// # Panics ...
/// - if the `modulus` is not larger than `1`.
pub fn new_anticyclic(
    n: impl TryInto<i64> + Display,
    modulus: impl Into<Modulus>,
) -> Result<ModulusPolynomialRingZq, MathError> {
    let mut poly = PolyOverZq::from((1, modulus));
    poly.set_coeff(n, 1)?;
    Ok(ModulusPolynomialRingZq::from(&poly))
}

/// Parses a decimal modulus `q` and outputs `X^n + 1 mod q` together with `q`.
///
/// In contrast to [`new_anticyclic`], this function never panics and
/// is meant for untrusted input such as deserialized artifacts.
///
/// Parameters:
/// - `n`: specifies the ring dimension, a power of two
/// - `q`: specifies the decimal representation of the modulus
///
/// Returns the modulus polynomial and `q`, or a description of the
/// invalid input.
///
/// # Examples
/// ```
/// use qfall_persist::utils::common_moduli::parse_anticyclic;
///
/// let (poly_mod, q) = parse_anticyclic(16, "12289").unwrap();
/// assert_eq!(q, poly_mod.get_q());
/// ```
///
/// # Errors and Failures
/// - Returns a [`String`] describing the failure if `n` is not a power of two,
/// `q` is not a decimal integer, or `q <= 1`.
pub fn parse_anticyclic(n: u32, q: &str) -> Result<(ModulusPolynomialRingZq, Z), String> {
    if n < 2 || !n.is_power_of_two() {
        return Err(format!("ring dimension {n} is not a power of two"));
    }
    let q = Z::from_str_b(q, 10).map_err(|e| e.to_string())?;
    if q <= Z::ONE {
        return Err(format!("modulus {q} is not larger than 1"));
    }

    let poly_mod = new_anticyclic(n, q.clone()).map_err(|e| e.to_string())?;
    Ok((poly_mod, q))
}
