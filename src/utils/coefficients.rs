// Copyright © 2024 The qFALL-persist Authors
//
// This file is part of qFALL-persist.
//
// qFALL-persist is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module converts elements of `Z_q[X]/(X^n + 1)` into a list of
//! decimal coefficients and back.
//!
//! The list is what artifacts store for every ring element, such that the
//! stored bytes do not depend on the in-memory layout of [`PolynomialRingZq`].

use qfall_math::{
    error::MathError,
    integer::{PolyOverZ, Z},
    integer_mod_q::{ModulusPolynomialRingZq, PolynomialRingZq},
    traits::{GetCoefficient, SetCoefficient},
};

/// Returns the coefficients of `element`, least significant first,
/// as decimal strings. Trailing zero coefficients are omitted.
///
/// # Examples
/// ```
/// use qfall_persist::utils::{coefficients::to_coefficients, common_moduli::new_anticyclic};
/// use qfall_math::{integer::PolyOverZ, integer_mod_q::PolynomialRingZq};
/// use std::str::FromStr;
///
/// let modulus = new_anticyclic(4, 17).unwrap();
/// let poly = PolyOverZ::from_str("3  1 0 5").unwrap();
/// let element = PolynomialRingZq::from((&poly, &modulus));
///
/// assert_eq!(vec!["1", "0", "5"], to_coefficients(&element).unwrap());
/// ```
pub fn to_coefficients(element: &PolynomialRingZq) -> Result<Vec<String>, MathError> {
    let poly = element.get_poly();
    let degree = poly.get_degree();

    let mut coefficients = Vec::new();
    for i in 0..=degree {
        let coeff: Z = poly.get_coeff(i)?;
        coefficients.push(coeff.to_string());
    }
    Ok(coefficients)
}

/// Rebuilds a ring element from decimal coefficients, least significant first.
///
/// Parameters:
/// - `coefficients`: specifies the coefficients of the element
/// - `modulus`: specifies the ring the element lives in
///
/// Returns the element reduced into the ring or a [`MathError`].
///
/// # Errors and Failures
/// - Returns a [`MathError`] of type
/// [`InvalidIntegerInput`](MathError::InvalidIntegerInput) if there are more
/// coefficients than the ring dimension.
/// - Returns a [`MathError`] if a coefficient is not a decimal integer.
pub fn from_coefficients(
    coefficients: &[String],
    modulus: &ModulusPolynomialRingZq,
) -> Result<PolynomialRingZq, MathError> {
    let dimension = modulus.get_degree();
    if coefficients.len() as i64 > dimension {
        return Err(MathError::InvalidIntegerInput(format!(
            "{} coefficients do not fit into a ring of dimension {dimension}",
            coefficients.len()
        )));
    }

    let mut poly = PolyOverZ::default();
    for (i, coeff) in coefficients.iter().enumerate() {
        let coeff = Z::from_str_b(coeff, 10)?;
        poly.set_coeff(i, &coeff)?;
    }
    Ok(PolynomialRingZq::from((&poly, modulus)))
}

#[cfg(test)]
mod test_coefficients {
    use super::{from_coefficients, to_coefficients};
    use crate::utils::common_moduli::new_anticyclic;
    use qfall_math::{integer::PolyOverZ, integer_mod_q::PolynomialRingZq};
    use std::str::FromStr;

    /// Ensures a sampled element survives the conversion.
    #[test]
    fn reversible() {
        let modulus = new_anticyclic(64, 1_000_000_007).unwrap();
        let element = PolynomialRingZq::sample_uniform(&modulus);

        let coefficients = to_coefficients(&element).unwrap();
        let restored = from_coefficients(&coefficients, &modulus).unwrap();

        assert_eq!(element, restored);
    }

    /// Ensures the zero element is stored as an empty list.
    #[test]
    fn zero() {
        let modulus = new_anticyclic(8, 17).unwrap();
        let zero = PolynomialRingZq::from((&PolyOverZ::default(), &modulus));

        let coefficients = to_coefficients(&zero).unwrap();

        assert!(coefficients.is_empty());
        assert_eq!(zero, from_coefficients(&coefficients, &modulus).unwrap());
    }

    /// Ensures coefficients are reduced into the ring when rebuilding.
    #[test]
    fn reduction() {
        let modulus = new_anticyclic(4, 17).unwrap();
        let coefficients = vec![String::from("18"), String::from("-1")];

        let element = from_coefficients(&coefficients, &modulus).unwrap();
        let expected = PolyOverZ::from_str("2  1 16").unwrap();

        assert_eq!(PolynomialRingZq::from((&expected, &modulus)), element);
    }

    /// Ensures too many coefficients are rejected.
    #[test]
    fn too_many_coefficients() {
        let modulus = new_anticyclic(4, 17).unwrap();
        let coefficients = vec![String::from("1"); 5];

        assert!(from_coefficients(&coefficients, &modulus).is_err());
    }

    /// Ensures non-numeric coefficients are rejected.
    #[test]
    fn invalid_coefficient() {
        let modulus = new_anticyclic(4, 17).unwrap();
        let coefficients = vec![String::from("1"), String::from("x")];

        assert!(from_coefficients(&coefficients, &modulus).is_err());
    }
}
