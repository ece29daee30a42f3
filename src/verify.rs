// Copyright © 2024 The qFALL-persist Authors
//
// This file is part of qFALL-persist.
//
// qFALL-persist is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains the round-trip verifier.
//!
//! An [`Artifact`] is a named file beneath the data directory. It moves
//! through the states
//! `Unwritten -> Written -> SizeReported -> Reloaded`, or ends up in `Failed`
//! as soon as one step fails. The size of the file on disk is observed by
//! [`artifact_size`] after writing and again after reloading.
//!
//! The success of a reload is the only correctness signal, i.e. the
//! verifier does not compare the reloaded object to the written one.

use crate::{
    error::SerialError,
    serial::{deserialize_from_file, serialize_to_file, SerFormat, Serializable},
};
use log::{debug, info};
use std::{
    fs::File,
    io::{Seek, SeekFrom},
    path::{Path, PathBuf},
};

/// Returns the size in bytes of the file at `path` by seeking to its end.
/// The file handle is closed before this function returns.
///
/// # Examples
/// ```no_run
/// use qfall_persist::verify::artifact_size;
///
/// let size = artifact_size("demoData/testing.txt").unwrap();
/// ```
///
/// # Errors and Failures
/// - Returns a [`SerialError`] of type [`Io`](SerialError::Io) if the file
/// cannot be opened.
pub fn artifact_size(path: impl AsRef<Path>) -> Result<u64, SerialError> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|source| SerialError::io(path, source))?;

    file.seek(SeekFrom::End(0))
        .map_err(|source| SerialError::io(path, source))
}

/// The lifecycle position of an [`Artifact`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactState {
    Unwritten,
    Written,
    /// The file was written and measured to have the given size.
    SizeReported(u64),
    /// The file was read back successfully and measured again.
    Reloaded(u64),
    Failed,
}

/// A file beneath the data directory holding one serialized object.
///
/// Attributes:
/// - `label`: a human readable name, e.g. `"public key"`
/// - `file`: the file name below the data directory
/// - `path`: the full path of the file
/// - `state`: the current [`ArtifactState`]
///
/// # Examples
/// ```
/// use qfall_persist::{serial::SerFormat, verify::{Artifact, ArtifactState}};
///
/// let dir = tempfile::tempdir().unwrap();
/// let mut artifact = Artifact::new(dir.path(), "testing.txt", "testing string");
///
/// artifact.write(&String::from("TESTING"), SerFormat::Binary).unwrap();
/// let size = artifact.report_size().unwrap();
/// let value: String = artifact.reload(SerFormat::Binary).unwrap();
///
/// assert_eq!("TESTING", value);
/// assert_eq!(ArtifactState::Reloaded(size), artifact.state());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    label: &'static str,
    file: &'static str,
    path: PathBuf,
    state: ArtifactState,
}

impl Artifact {
    pub fn new(dir: impl AsRef<Path>, file: &'static str, label: &'static str) -> Self {
        Self {
            label,
            file,
            path: dir.as_ref().join(file),
            state: ArtifactState::Unwritten,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn file(&self) -> &'static str {
        self.file
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> ArtifactState {
        self.state
    }

    /// Returns the last observed size of the file, if any.
    pub fn size(&self) -> Option<u64> {
        match self.state {
            ArtifactState::SizeReported(size) | ArtifactState::Reloaded(size) => Some(size),
            _ => None,
        }
    }

    fn transition(&self, to: &'static str) -> SerialError {
        SerialError::InvalidTransition {
            artifact: self.file,
            from: self.state,
            to,
        }
    }

    fn settle<T>(&mut self, res: Result<T, SerialError>) -> Result<T, SerialError> {
        if res.is_err() {
            self.state = ArtifactState::Failed;
        }
        res
    }

    /// Serializes `object` into the file of this artifact.
    ///
    /// # Errors and Failures
    /// - Returns a [`SerialError`] of type
    /// [`InvalidTransition`](SerialError::InvalidTransition) if the artifact
    /// was written before.
    /// - Returns any error of [`serialize_to_file`], after which the artifact is `Failed`.
    pub fn write<T: Serializable>(&mut self, object: &T, format: SerFormat) -> Result<(), SerialError> {
        if self.state != ArtifactState::Unwritten {
            return Err(self.transition("written"));
        }

        let res = serialize_to_file(&self.path, object, format);
        self.settle(res)?;
        self.state = ArtifactState::Written;
        Ok(())
    }

    /// Measures the size of the written file.
    ///
    /// # Errors and Failures
    /// - Returns a [`SerialError`] of type
    /// [`InvalidTransition`](SerialError::InvalidTransition) if the artifact
    /// is not in state `Written`.
    /// - Returns any error of [`artifact_size`], after which the artifact is `Failed`.
    pub fn report_size(&mut self) -> Result<u64, SerialError> {
        if self.state != ArtifactState::Written {
            return Err(self.transition("size reported"));
        }

        let res = artifact_size(&self.path);
        let size = self.settle(res)?;
        debug!("{} ({}) holds {size} bytes", self.label, self.file);
        self.state = ArtifactState::SizeReported(size);
        Ok(size)
    }

    /// Deserializes the object stored in the file of this artifact and
    /// measures the file again.
    ///
    /// # Errors and Failures
    /// - Returns a [`SerialError`] of type
    /// [`InvalidTransition`](SerialError::InvalidTransition) if the artifact
    /// was not written or already reloaded.
    /// - Returns any error of [`deserialize_from_file`] or [`artifact_size`],
    /// after which the artifact is `Failed`.
    pub fn reload<T: Serializable>(&mut self, format: SerFormat) -> Result<T, SerialError> {
        if !matches!(
            self.state,
            ArtifactState::Written | ArtifactState::SizeReported(_)
        ) {
            return Err(self.transition("reloaded"));
        }

        let res = deserialize_from_file(&self.path, format)
            .and_then(|object| Ok((object, artifact_size(&self.path)?)));
        let (object, size) = self.settle(res)?;
        info!("reloaded {} from {} ({size} bytes)", self.label, self.file);
        self.state = ArtifactState::Reloaded(size);
        Ok(object)
    }
}

#[cfg(test)]
mod test_artifact_size {
    use super::artifact_size;
    use crate::error::SerialError;
    use std::fs;
    use tempfile::tempdir;

    /// Ensures the size equals the number of bytes written.
    #[test]
    fn size() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("seven"), b"1234567").unwrap();
        fs::write(dir.path().join("empty"), b"").unwrap();

        assert_eq!(7, artifact_size(dir.path().join("seven")).unwrap());
        assert_eq!(0, artifact_size(dir.path().join("empty")).unwrap());
    }

    /// Ensures a missing file results in an error.
    #[test]
    fn missing() {
        let dir = tempdir().unwrap();

        assert!(matches!(
            artifact_size(dir.path().join("nothing.txt")),
            Err(SerialError::Io { .. })
        ));
    }
}
