// Copyright © 2024 The qFALL-persist Authors
//
// This file is part of qFALL-persist.
//
// qFALL-persist is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains the header written in front of every payload.
//!
//! The header makes artifacts self-describing: it names the kind of object,
//! the version of the kind's representation, and the length and digest of the
//! payload, such that wrong-kind, truncated and corrupted artifacts are
//! detected before the payload is decoded.

use super::ObjectKind;
use crate::{error::SerialError, utils::digest::sha256};
use serde::{Deserialize, Serialize};

/// Identifies a file as an artifact of this crate.
pub const MAGIC: [u8; 4] = *b"QFPS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ArtifactHeader {
    pub magic: [u8; 4],
    pub kind: ObjectKind,
    pub version: u16,
    pub payload_len: u64,
    pub digest: String,
}

impl ArtifactHeader {
    pub fn new(kind: ObjectKind, version: u16, payload: &[u8]) -> Self {
        Self {
            magic: MAGIC,
            kind,
            version,
            payload_len: payload.len() as u64,
            digest: sha256(payload),
        }
    }

    /// Checks that the header announces an object of kind `expected`
    /// in representation `version`.
    pub fn expect(&self, expected: ObjectKind, version: u16) -> Result<(), SerialError> {
        if self.magic != MAGIC {
            return Err(SerialError::Decode {
                kind: expected,
                reason: String::from("the file is not an artifact"),
            });
        }
        if self.kind != expected {
            return Err(SerialError::KindMismatch {
                expected,
                found: self.kind,
            });
        }
        if self.version != version {
            return Err(SerialError::VersionMismatch {
                kind: expected,
                expected: version,
                found: self.version,
            });
        }
        Ok(())
    }

    /// Checks that `payload` is exactly the payload the header was written for.
    pub fn verify_payload(&self, payload: &[u8]) -> Result<(), SerialError> {
        let found = payload.len() as u64;
        if found < self.payload_len {
            return Err(SerialError::Truncated {
                kind: self.kind,
                expected: self.payload_len,
                found,
            });
        }
        if found > self.payload_len {
            return Err(SerialError::Decode {
                kind: self.kind,
                reason: format!("{} trailing bytes", found - self.payload_len),
            });
        }
        if sha256(payload) != self.digest {
            return Err(SerialError::DigestMismatch(self.kind));
        }
        Ok(())
    }
}
