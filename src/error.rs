// Copyright © 2024 The qFALL-persist Authors
//
// This file is part of qFALL-persist.
//
// qFALL-persist is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains the error types of this crate.
//!
//! - [`ContextError`] is returned by the scheme, i.e. context construction,
//! key generation, encryption and homomorphic evaluation.
//! - [`SerialError`] is returned by the serialization gateway and the
//! round-trip verifier.
//! - [`HarnessError`] wraps both and names the artifact and operation
//! that failed during a demo run.

use crate::{scheme::Feature, serial::ObjectKind, verify::ArtifactState};
use qfall_math::error::MathError;
use std::{fmt, io, path::PathBuf};
use thiserror::Error;

/// Errors raised while constructing or using a [`CryptoContext`](crate::scheme::CryptoContext).
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("infeasible scheme parameters: {0}")]
    InfeasibleParameters(String),

    #[error("feature {0} has not been enabled on this context")]
    FeatureNotEnabled(Feature),

    #[error("{0} was generated by a different crypto context")]
    ForeignObject(&'static str),

    #[error("invalid plaintext: {0}")]
    InvalidPlaintext(String),

    #[error(transparent)]
    Math(#[from] MathError),
}

/// Errors raised while persisting or restoring an artifact.
#[derive(Debug, Error)]
pub enum SerialError {
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to encode {kind}: {reason}")]
    Encode { kind: ObjectKind, reason: String },

    #[error("unable to decode {kind}: {reason}")]
    Decode { kind: ObjectKind, reason: String },

    #[error("artifact holds a {found}, but a {expected} was requested")]
    KindMismatch {
        expected: ObjectKind,
        found: ObjectKind,
    },

    #[error("serialization version mismatch for {kind}: expected {expected}, found {found}")]
    VersionMismatch {
        kind: ObjectKind,
        expected: u16,
        found: u16,
    },

    #[error("payload of {kind} is truncated: expected {expected} bytes, found {found}")]
    Truncated {
        kind: ObjectKind,
        expected: u64,
        found: u64,
    },

    #[error("payload digest of {0} does not match its header")]
    DigestMismatch(ObjectKind),

    #[error("{kind} payload is not a valid object: {reason}")]
    InvalidRepr { kind: ObjectKind, reason: String },

    #[error("artifact {artifact} cannot go from {from:?} to {to}")]
    InvalidTransition {
        artifact: &'static str,
        from: ArtifactState,
        to: &'static str,
    },
}

impl SerialError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// The lifecycle step an artifact failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Write,
    Inspect,
    Read,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Write => f.write_str("writing serialization of"),
            Operation::Inspect => f.write_str("inspecting the serialization of"),
            Operation::Read => f.write_str("reading serialization of"),
        }
    }
}

/// Errors that end a demo run. Each one identifies the failing stage.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("error {operation} {label} ({file}): {source}")]
    Artifact {
        operation: Operation,
        label: &'static str,
        file: &'static str,
        #[source]
        source: SerialError,
    },

    #[error("crypto context failure: {0}")]
    Context(#[from] ContextError),

    #[error("the reloaded {label} does not match what was written")]
    Mismatch { label: &'static str },

    #[error("unable to write the run report: {0}")]
    Report(#[from] io::Error),
}
