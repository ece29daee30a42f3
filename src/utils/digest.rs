// Copyright © 2024 The qFALL-persist Authors
//
// This file is part of qFALL-persist.
//
// qFALL-persist is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains the digests used to identify rings and to detect
//! corrupted artifacts.

use sha2::{Digest, Sha256};

/// Computes the sha256 hash value of the given bytes.
///
/// Parameters:
/// - `data`: specifies the value that is hashed.
///
/// Returns the sha256 value of the given bytes as a hex string.
///
/// # Examples
/// ```
/// use qfall_persist::utils::digest::sha256;
///
/// let hash = sha256("Hello World!");
/// assert_eq!("7f83b1657ff1fc53b92dc18148a1d65dfc2d4b1fa3d677284addd200126d9069", hash);
/// ```
pub fn sha256(data: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    format!("{:x}", result)
}

#[cfg(test)]
mod test_sha256 {
    use super::sha256;

    /// Ensure sha256 works for strings and byte slices alike.
    #[test]
    fn known_values() {
        let hash1 = sha256("Hello World!");
        let hash2 = sha256(b"qfall".as_slice());

        assert_eq!(
            "7f83b1657ff1fc53b92dc18148a1d65dfc2d4b1fa3d677284addd200126d9069",
            hash1
        );
        assert_eq!(
            "eb6ed1369a670050bd04b24036e8c29144b0f6b10166dc9c8b4987a6026c715f",
            hash2
        );
    }

    /// Ensures the empty input hashes to the well-known value.
    #[test]
    fn empty() {
        assert_eq!(
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
            sha256(b"")
        );
    }
}
