// Copyright © 2024 The qFALL-persist Authors
//
// This file is part of qFALL-persist.
//
// qFALL-persist is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains the byte-stream codecs an artifact can be written with.

use bincode::Options;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{fmt, io::Cursor, str::FromStr};

/// The bincode configuration of [`SerFormat::Binary`]: fixed-size integers
/// and trailing bytes allowed, as `bincode::serialize` writes them.
fn binary_codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .allow_trailing_bytes()
}

/// The encoding of an artifact.
///
/// - [`SerFormat::Binary`] uses `bincode` and is what the demo writes.
/// - [`SerFormat::Json`] uses `serde_json` and is meant for inspection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerFormat {
    #[default]
    Binary,
    Json,
}

impl SerFormat {
    /// Bytes written between the header and the payload.
    pub(crate) fn separator(&self) -> &'static [u8] {
        match self {
            SerFormat::Binary => b"",
            SerFormat::Json => b"\n",
        }
    }

    pub(crate) fn encode<V: Serialize>(&self, value: &V) -> Result<Vec<u8>, String> {
        match self {
            SerFormat::Binary => binary_codec().serialize(value).map_err(|e| e.to_string()),
            SerFormat::Json => serde_json::to_vec(value).map_err(|e| e.to_string()),
        }
    }

    pub(crate) fn decode<V: DeserializeOwned>(&self, bytes: &[u8]) -> Result<V, String> {
        match self {
            // no length prefix may claim more than the input holds
            SerFormat::Binary => binary_codec()
                .with_limit(bytes.len() as u64)
                .deserialize(bytes)
                .map_err(|e| e.to_string()),
            SerFormat::Json => serde_json::from_slice(bytes).map_err(|e| e.to_string()),
        }
    }

    /// Decodes one value from the start of `bytes` and returns it together
    /// with the number of bytes it occupied.
    pub(crate) fn decode_prefix<V: DeserializeOwned>(
        &self,
        bytes: &[u8],
    ) -> Result<(V, usize), String> {
        match self {
            SerFormat::Binary => {
                let mut cursor = Cursor::new(bytes);
                let value = binary_codec()
                    .with_limit(bytes.len() as u64)
                    .deserialize_from(&mut cursor)
                    .map_err(|e| e.to_string())?;
                Ok((value, cursor.position() as usize))
            }
            SerFormat::Json => {
                let mut stream = serde_json::Deserializer::from_slice(bytes).into_iter::<V>();
                match stream.next() {
                    Some(Ok(value)) => Ok((value, stream.byte_offset())),
                    Some(Err(e)) => Err(e.to_string()),
                    None => Err(String::from("the artifact is empty")),
                }
            }
        }
    }
}

impl fmt::Display for SerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerFormat::Binary => f.write_str("binary"),
            SerFormat::Json => f.write_str("json"),
        }
    }
}

impl FromStr for SerFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "binary" | "bin" => Ok(SerFormat::Binary),
            "json" => Ok(SerFormat::Json),
            other => Err(format!("unknown serialization format '{other}'")),
        }
    }
}

#[cfg(test)]
mod test_ser_format {
    use super::SerFormat;
    use std::str::FromStr;

    /// Ensures a prefix is split off correctly for both formats.
    #[test]
    fn decode_prefix() {
        for format in [SerFormat::Binary, SerFormat::Json] {
            let mut bytes = format.encode(&(7u16, String::from("kind"))).unwrap();
            let prefix_len = bytes.len();
            bytes.extend_from_slice(format.separator());
            bytes.extend_from_slice(b"rest");

            let ((number, text), offset): ((u16, String), usize) =
                format.decode_prefix(&bytes).unwrap();

            assert_eq!(7, number);
            assert_eq!("kind", text);
            assert_eq!(prefix_len, offset);
        }
    }

    /// Ensures empty input is an error rather than a panic.
    #[test]
    fn decode_prefix_empty() {
        for format in [SerFormat::Binary, SerFormat::Json] {
            assert!(format.decode_prefix::<(u16, String)>(&[]).is_err());
        }
    }

    /// Ensures a length prefix larger than the input is rejected before allocating.
    #[test]
    fn oversized_length_prefix() {
        let mut bytes = 1u16.to_le_bytes().to_vec();
        bytes.extend_from_slice(&(1u64 << 40).to_le_bytes());
        bytes.extend_from_slice(b"kind");

        assert!(SerFormat::Binary
            .decode_prefix::<(u16, String)>(&bytes)
            .is_err());
        assert!(SerFormat::Binary.decode::<(u16, String)>(&bytes).is_err());
    }

    /// Ensures the binary codec matches the layout of `bincode::serialize`.
    #[test]
    fn binary_layout() {
        let value = (7u16, String::from("kind"));

        assert_eq!(
            bincode::serialize(&value).unwrap(),
            SerFormat::Binary.encode(&value).unwrap()
        );
    }

    /// Ensures formats are parsed from their names.
    #[test]
    fn from_str() {
        assert_eq!(SerFormat::Binary, SerFormat::from_str("BINARY").unwrap());
        assert_eq!(SerFormat::Json, SerFormat::from_str("json").unwrap());
        assert!(SerFormat::from_str("xml").is_err());
        assert_eq!("binary", SerFormat::default().to_string());
    }
}
