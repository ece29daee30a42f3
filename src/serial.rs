// Copyright © 2024 The qFALL-persist Authors
//
// This file is part of qFALL-persist.
//
// qFALL-persist is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains the serialization gateway: one pair of operations,
//! [`serialize_to_file`] and [`deserialize_from_file`], that persists any
//! object implementing [`Serializable`].
//!
//! An artifact consists of an [`ArtifactHeader`](header::ArtifactHeader)
//! followed by the payload, both encoded in the chosen [`SerFormat`].
//! The payload is the object's [`Serializable::Repr`].
//!
//! # Examples
//! ```
//! use qfall_persist::serial::{deserialize_from_bytes, serialize_to_bytes, SerFormat};
//!
//! let bytes = serialize_to_bytes(&String::from("TESTING"), SerFormat::Binary).unwrap();
//! let value: String = deserialize_from_bytes(&bytes, SerFormat::Binary).unwrap();
//!
//! assert_eq!("TESTING", value);
//! ```

mod format;
mod header;

pub use format::SerFormat;
pub use header::MAGIC;

use crate::error::SerialError;
use header::ArtifactHeader;
use log::debug;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fmt, fs,
    io::{self, Write},
    path::Path,
};

/// The kinds of objects an artifact can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Text,
    CryptoContext,
    PublicKey,
    SecretKey,
    Ciphertext,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Text => f.write_str("string"),
            ObjectKind::CryptoContext => f.write_str("crypto context"),
            ObjectKind::PublicKey => f.write_str("public key"),
            ObjectKind::SecretKey => f.write_str("secret key"),
            ObjectKind::Ciphertext => f.write_str("ciphertext"),
        }
    }
}

/// This trait should be implemented by every object that can be persisted
/// through the gateway.
///
/// Objects are not serialized directly. Instead, each object names a
/// representation [`Serializable::Repr`] consisting of plain data, which is
/// what the codec writes. Restoring an object from its representation may
/// fail, e.g. if a stored modulus is invalid.
pub trait Serializable: Sized {
    /// The kind written into the artifact header.
    const KIND: ObjectKind;
    /// The version of [`Serializable::Repr`]. Artifacts with another version are rejected.
    const VERSION: u16 = 1;

    /// The plain-data representation of the object.
    type Repr: Serialize + DeserializeOwned;

    /// Converts the object into its representation.
    fn to_repr(&self) -> Result<Self::Repr, SerialError>;

    /// Restores an object from its representation.
    fn from_repr(repr: Self::Repr) -> Result<Self, SerialError>;
}

impl Serializable for String {
    const KIND: ObjectKind = ObjectKind::Text;
    type Repr = String;

    fn to_repr(&self) -> Result<Self::Repr, SerialError> {
        Ok(self.clone())
    }

    fn from_repr(repr: Self::Repr) -> Result<Self, SerialError> {
        Ok(repr)
    }
}

/// Encodes `object` into an artifact.
///
/// Parameters:
/// - `object`: specifies the object to encode
/// - `format`: specifies the encoding
///
/// Returns the bytes of the artifact or a [`SerialError`] if the object
/// cannot be represented.
pub fn serialize_to_bytes<T: Serializable>(
    object: &T,
    format: SerFormat,
) -> Result<Vec<u8>, SerialError> {
    let repr = object.to_repr()?;
    let payload = format.encode(&repr).map_err(|reason| SerialError::Encode {
        kind: T::KIND,
        reason,
    })?;

    let header = ArtifactHeader::new(T::KIND, T::VERSION, &payload);
    let mut bytes = format.encode(&header).map_err(|reason| SerialError::Encode {
        kind: T::KIND,
        reason,
    })?;
    bytes.extend_from_slice(format.separator());
    bytes.extend_from_slice(&payload);

    Ok(bytes)
}

/// Decodes an artifact holding an object of type `T`.
///
/// Parameters:
/// - `bytes`: specifies the artifact
/// - `format`: specifies the encoding the artifact was written with
///
/// Returns the restored object or a [`SerialError`].
///
/// # Errors and Failures
/// - Returns a [`SerialError`] of type [`Decode`](SerialError::Decode) if
/// the header or payload cannot be decoded.
/// - Returns a [`SerialError`] of type [`KindMismatch`](SerialError::KindMismatch)
/// if the artifact holds another kind of object.
/// - Returns a [`SerialError`] of type [`VersionMismatch`](SerialError::VersionMismatch)
/// if the artifact was written with another representation version.
/// - Returns a [`SerialError`] of type [`Truncated`](SerialError::Truncated) or
/// [`DigestMismatch`](SerialError::DigestMismatch) if the payload was cut or altered.
/// - Returns a [`SerialError`] of type [`InvalidRepr`](SerialError::InvalidRepr)
/// if the payload does not describe a valid object.
pub fn deserialize_from_bytes<T: Serializable>(
    bytes: &[u8],
    format: SerFormat,
) -> Result<T, SerialError> {
    let (header, offset): (ArtifactHeader, usize) =
        format
            .decode_prefix(bytes)
            .map_err(|reason| SerialError::Decode {
                kind: T::KIND,
                reason,
            })?;
    header.expect(T::KIND, T::VERSION)?;

    let rest = &bytes[offset..];
    let payload = rest.strip_prefix(format.separator()).unwrap_or(rest);
    header.verify_payload(payload)?;

    let repr = format.decode(payload).map_err(|reason| SerialError::Decode {
        kind: T::KIND,
        reason,
    })?;
    T::from_repr(repr)
}

/// Writes `object` to `path` using the given format.
///
/// The artifact is first written to a uniquely named hidden sibling file,
/// which is then renamed to `path`. Hence, a failed write never leaves a partial artifact at `path`.
///
/// Parameters:
/// - `path`: specifies the destination
/// - `object`: specifies the object to persist
/// - `format`: specifies the encoding
///
/// Returns an empty result or a [`SerialError`].
///
/// # Examples
/// ```no_run
/// use qfall_persist::serial::{serialize_to_file, SerFormat};
///
/// serialize_to_file("demoData/testing.txt", &String::from("TESTING"), SerFormat::Binary).unwrap();
/// ```
///
/// # Errors and Failures
/// - Returns a [`SerialError`] of type [`Io`](SerialError::Io) if the
/// destination is not writable, e.g. since its parent directory does not exist.
/// - Returns a [`SerialError`] of type [`Encode`](SerialError::Encode)
/// if the object cannot be encoded.
pub fn serialize_to_file<T: Serializable>(
    path: impl AsRef<Path>,
    object: &T,
    format: SerFormat,
) -> Result<(), SerialError> {
    let path = path.as_ref();
    let bytes = serialize_to_bytes(object, format)?;

    write_then_rename(path, &bytes).map_err(|source| SerialError::io(path, source))?;

    debug!(
        "wrote {} ({} bytes, {format}) to {}",
        T::KIND,
        bytes.len(),
        path.display()
    );
    Ok(())
}

/// Reads an object of type `T` from `path`.
///
/// Parameters:
/// - `path`: specifies the artifact to read
/// - `format`: specifies the encoding the artifact was written with
///
/// Returns the restored object or a [`SerialError`].
///
/// # Examples
/// ```no_run
/// use qfall_persist::serial::{deserialize_from_file, SerFormat};
///
/// let value: String = deserialize_from_file("demoData/testing.txt", SerFormat::Binary).unwrap();
/// ```
///
/// # Errors and Failures
/// - Returns a [`SerialError`] of type [`Io`](SerialError::Io) if the
/// file does not exist or is not readable.
/// - Returns any error of [`deserialize_from_bytes`].
pub fn deserialize_from_file<T: Serializable>(
    path: impl AsRef<Path>,
    format: SerFormat,
) -> Result<T, SerialError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| SerialError::io(path, source))?;

    let object = deserialize_from_bytes(&bytes, format)?;
    debug!("read {} from {}", T::KIND, path.display());
    Ok(object)
}

/// Writes `bytes` to a uniquely named hidden file next to `path` and
/// renames it to `path`. The staging file is removed if any step fails.
fn write_then_rename(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if path.file_name().is_none() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "the destination does not name a file",
        ));
    }
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut staging = tempfile::Builder::new()
        .prefix(".qfps-")
        .suffix(".partial")
        .tempfile_in(parent)?;
    staging.write_all(bytes)?;
    staging.as_file().sync_all()?;
    staging.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod test_bytes {
    use super::{deserialize_from_bytes, serialize_to_bytes, ObjectKind, SerFormat, MAGIC};
    use crate::error::SerialError;

    /// Ensures that strings survive the round-trip in both formats.
    #[test]
    fn round_trip_string() {
        for format in [SerFormat::Binary, SerFormat::Json] {
            let value = String::from("TESTING");

            let bytes = serialize_to_bytes(&value, format).unwrap();
            let restored: String = deserialize_from_bytes(&bytes, format).unwrap();

            assert_eq!(value, restored);
        }
    }

    /// Ensures that a truncated artifact is rejected.
    #[test]
    fn truncated() {
        for format in [SerFormat::Binary, SerFormat::Json] {
            let bytes = serialize_to_bytes(&String::from("TESTING"), format).unwrap();

            let res = deserialize_from_bytes::<String>(&bytes[..bytes.len() - 3], format);

            assert!(matches!(res, Err(SerialError::Truncated { .. })));
        }
    }

    /// Ensures that a flipped payload byte is detected.
    #[test]
    fn corrupted() {
        let mut bytes = serialize_to_bytes(&String::from("TESTING"), SerFormat::Binary).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;

        let res = deserialize_from_bytes::<String>(&bytes, SerFormat::Binary);

        assert!(matches!(
            res,
            Err(SerialError::DigestMismatch(ObjectKind::Text))
        ));
    }

    /// Ensures that garbage and empty input are rejected.
    #[test]
    fn garbage() {
        for format in [SerFormat::Binary, SerFormat::Json] {
            assert!(deserialize_from_bytes::<String>(&[], format).is_err());
            assert!(deserialize_from_bytes::<String>(b"no artifact at all", format).is_err());
        }
    }

    /// Ensures that a header whose digest claims a huge length is an error, not an abort.
    #[test]
    fn forged_digest_length() {
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&0u64.to_le_bytes());
        bytes.extend_from_slice(&(1u64 << 40).to_le_bytes());

        let res = deserialize_from_bytes::<String>(&bytes, SerFormat::Binary);

        assert!(matches!(res, Err(SerialError::Decode { .. })));
    }

    /// Ensures that an artifact written in one format is not read in the other.
    #[test]
    fn wrong_format() {
        let bytes = serialize_to_bytes(&String::from("TESTING"), SerFormat::Json).unwrap();

        assert!(deserialize_from_bytes::<String>(&bytes, SerFormat::Binary).is_err());
    }
}
