// Copyright © 2024 The qFALL-persist Authors
//
// This file is part of qFALL-persist.
//
// qFALL-persist is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This crate persists the objects of a lattice-based public key scheme and
//! restores them, i.e. a crypto context, its key pair and ciphertexts are
//! written to self-describing artifacts and read back.
//!
//! - [`scheme`] provides the crypto context, keys and ciphertexts.
//! - [`serial`] turns any [`Serializable`](serial::Serializable) object
//! into bytes or files and back.
//! - [`verify`] tracks each file through its write, inspect and reload steps.
//! - [`harness`] runs the whole lifecycle for one context.

pub mod error;
pub mod harness;
pub mod scheme;
pub mod serial;
pub mod utils;
pub mod verify;
