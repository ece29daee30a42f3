// Copyright © 2024 The qFALL-persist Authors
//
// This file is part of qFALL-persist.
//
// qFALL-persist is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains the RLWE-based scheme whose objects are persisted,
//! i.e. a [`CryptoContext`] built from [`SchemeParameters`], the [`KeyPair`]
//! it generates, and [`Ciphertext`]s.
//!
//! The scheme follows the construction of Lindner and Peikert over the ring
//! `Z_q[X]/(X^n + 1)` with messages encoded into the coefficients scaled by
//! `⌊q/t⌋`, cf.
//! - \[1\] Lindner, R., and C. Peikert (2011).
//! Better key sizes (and attacks) for LWE-based encryption.
//! In: Topics in Cryptology -  RSA Conference 2011, Springer.
//! <https://eprint.iacr.org/2010/613.pdf>
//! - \[2\] Fan, J. and Vercauteren, F. (2012).
//! Somewhat Practical Fully Homomorphic Encryption.
//! <https://eprint.iacr.org/2012/144.pdf>
//!
//! # Examples
//! ```
//! use qfall_persist::scheme::{CryptoContext, Feature, Mode, Plaintext, SchemeParameters, SecurityLevel};
//!
//! let params = SchemeParameters::new(257, 3.2, SecurityLevel::NotSet, 1, Mode::Optimized)
//!     .with_ring_dimension(16);
//! let mut cc = CryptoContext::new(&params).unwrap();
//! cc.enable(Feature::Encryption);
//!
//! let key_pair = cc.key_gen().unwrap();
//! let plaintext = Plaintext::new(vec![1, 2, 3]);
//! let cipher = cc.encrypt(&key_pair.public_key, &plaintext).unwrap();
//!
//! assert_eq!(plaintext, cc.decrypt(&key_pair.secret_key, &cipher).unwrap());
//! ```

mod ciphertext;
mod context;
mod keys;
mod parameters;

pub use ciphertext::{Ciphertext, CiphertextRepr, Plaintext};
pub use context::{ContextRepr, CryptoContext, Feature};
pub use keys::{KeyPair, PublicKey, PublicKeyRepr, RingRepr, SecretKey, SecretKeyRepr};
pub use parameters::{
    Mode, SchemeParameters, SecurityLevel, MAX_RING_DIMENSION, MIN_RING_DIMENSION,
};
