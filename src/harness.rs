// Copyright © 2024 The qFALL-persist Authors
//
// This file is part of qFALL-persist.
//
// qFALL-persist is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains the serialization lifecycle run.
//!
//! A run provisions one [`CryptoContext`], persists a test string, the
//! context and a freshly generated key pair beneath the data directory,
//! and reads every artifact back. Each stage either completes or ends the
//! run with a [`HarnessError`] naming the artifact and operation that failed.

use crate::{
    error::{HarnessError, Operation, SerialError},
    scheme::{
        Ciphertext, CryptoContext, Feature, Plaintext, PublicKey, SchemeParameters, SecretKey,
    },
    serial::SerFormat,
    verify::Artifact,
};
use log::info;
use serde::{Deserialize, Serialize};
use std::{io::Write, path::PathBuf};

pub const TESTING_FILE: &str = "testing.txt";
pub const CONTEXT_FILE: &str = "cryptocontext.txt";
pub const PUBLIC_KEY_FILE: &str = "key-public.txt";
pub const SECRET_KEY_FILE: &str = "key-private.txt";
pub const CIPHERTEXT_FILE: &str = "ciphertext.txt";

/// The string persisted first to check the data directory is usable.
pub const TESTING_VALUE: &str = "TESTING";

/// Configuration of a run. Missing fields in a configuration file
/// take the values of [`DemoConfig::default`].
///
/// Attributes:
/// - `data_dir`: the directory all artifacts are written to
/// - `format`: the [`SerFormat`] of all artifacts
/// - `parameters`: the [`SchemeParameters`] of the context
/// - `ciphertext`: additionally persists and reloads a ciphertext
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub data_dir: PathBuf,
    pub format: SerFormat,
    pub parameters: SchemeParameters,
    pub ciphertext: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("demoData"),
            format: SerFormat::Binary,
            parameters: SchemeParameters::default(),
            ciphertext: false,
        }
    }
}

/// The artifacts of a successful run in the order they were written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoReport {
    pub artifacts: Vec<Artifact>,
}

impl DemoReport {
    /// Returns the artifact stored in `file`, if the run produced one.
    pub fn artifact(&self, file: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|artifact| artifact.file() == file)
    }
}

fn failed(artifact: &Artifact, operation: Operation) -> impl FnOnce(SerialError) -> HarnessError {
    let (label, file) = (artifact.label(), artifact.file());
    move |source| HarnessError::Artifact {
        operation,
        label,
        file,
        source,
    }
}

/// Executes the serialization lifecycle and writes a line per completed
/// step to `out`.
///
/// The data directory has to exist.
///
/// Parameters:
/// - `config`: specifies the parameters, data directory and format
/// - `out`: specifies where progress is reported
///
/// Returns a [`DemoReport`] of all artifacts or the first [`HarnessError`].
///
/// # Examples
/// ```
/// use qfall_persist::{harness::{run, DemoConfig}, scheme::{Mode, SchemeParameters, SecurityLevel}};
///
/// let data_dir = tempfile::tempdir().unwrap();
/// let config = DemoConfig {
///     data_dir: data_dir.path().to_path_buf(),
///     parameters: SchemeParameters::new(65537, 3.2, SecurityLevel::NotSet, 2, Mode::Optimized)
///         .with_ring_dimension(64),
///     ..Default::default()
/// };
///
/// let report = run(&config, &mut std::io::sink()).unwrap();
/// assert_eq!(4, report.artifacts.len());
/// ```
///
/// # Errors and Failures
/// - Returns a [`HarnessError`] of type [`Context`](HarnessError::Context)
/// if the parameters are infeasible.
/// - Returns a [`HarnessError`] of type [`Artifact`](HarnessError::Artifact)
/// if writing, measuring or reading an artifact fails.
/// - Returns a [`HarnessError`] of type [`Mismatch`](HarnessError::Mismatch)
/// if a reloaded value differs from the written one.
/// - Returns a [`HarnessError`] of type [`Report`](HarnessError::Report)
/// if writing to `out` fails.
pub fn run<W: Write>(config: &DemoConfig, out: &mut W) -> Result<DemoReport, HarnessError> {
    let dir = &config.data_dir;
    let format = config.format;
    info!(
        "starting run in {} with {format} artifacts",
        dir.display()
    );

    let mut cc = CryptoContext::new(&config.parameters)?;
    cc.enable(Feature::Encryption);
    cc.enable(Feature::She);
    writeln!(out, "\nThe cryptocontext has been generated.")?;

    let mut testing = Artifact::new(dir, TESTING_FILE, "the word \"TESTING\"");
    testing
        .write(&String::from(TESTING_VALUE), format)
        .map_err(failed(&testing, Operation::Write))?;
    let size = testing
        .report_size()
        .map_err(failed(&testing, Operation::Inspect))?;
    writeln!(
        out,
        "\nThe word \"{TESTING_VALUE}\" has been serialized into {TESTING_FILE}"
    )?;
    writeln!(out, "The file size of the word \"{TESTING_VALUE}\" is {size} bytes")?;
    let reloaded: String = testing
        .reload(format)
        .map_err(failed(&testing, Operation::Read))?;
    if reloaded != TESTING_VALUE {
        return Err(HarnessError::Mismatch {
            label: testing.label(),
        });
    }

    let mut context = Artifact::new(dir, CONTEXT_FILE, "the crypto context");
    context
        .write(&cc, format)
        .map_err(failed(&context, Operation::Write))?;
    let size = context
        .report_size()
        .map_err(failed(&context, Operation::Inspect))?;
    writeln!(out, "\nThe cryptocontext has been serialized.")?;
    writeln!(out, "The file size of the cryptocontext is {size} bytes")?;
    let cc: CryptoContext = context
        .reload(format)
        .map_err(failed(&context, Operation::Read))?;
    writeln!(out, "\nThe cryptocontext has been deserialized.")?;

    let key_pair = cc.key_gen()?;
    writeln!(out, "\nThe key pair has been generated.")?;
    writeln!(
        out,
        "The key pair belongs to the context {}",
        key_pair.public_key.context_fingerprint()
    )?;

    let mut public_key = Artifact::new(dir, PUBLIC_KEY_FILE, "the public key");
    public_key
        .write(&key_pair.public_key, format)
        .map_err(failed(&public_key, Operation::Write))?;
    let size = public_key
        .report_size()
        .map_err(failed(&public_key, Operation::Inspect))?;
    writeln!(out, "\nThe public key has been serialized.")?;
    writeln!(out, "The file size of the serialized public key is {size} bytes")?;

    let mut secret_key = Artifact::new(dir, SECRET_KEY_FILE, "the secret key");
    secret_key
        .write(&key_pair.secret_key, format)
        .map_err(failed(&secret_key, Operation::Write))?;
    let size = secret_key
        .report_size()
        .map_err(failed(&secret_key, Operation::Inspect))?;
    writeln!(out, "\nThe secret key has been serialized.")?;
    writeln!(out, "The file size of the serialized secret key is {size} bytes")?;

    let pk: PublicKey = public_key
        .reload(format)
        .map_err(failed(&public_key, Operation::Read))?;
    writeln!(out, "\nThe public key has been deserialized.")?;
    if let Some(size) = public_key.size() {
        writeln!(out, "The file size of the deserialized public key is {size} bytes")?;
    }

    let sk: SecretKey = secret_key
        .reload(format)
        .map_err(failed(&secret_key, Operation::Read))?;
    writeln!(out, "\nThe secret key has been deserialized.")?;
    if let Some(size) = secret_key.size() {
        writeln!(out, "The file size of the deserialized private key is {size} bytes")?;
    }

    let mut artifacts = vec![testing, context, public_key, secret_key];

    if config.ciphertext {
        let plaintext = Plaintext::new(TESTING_VALUE.bytes().map(u64::from).collect());
        let cipher = cc.encrypt(&pk, &plaintext)?;

        let mut ciphertext = Artifact::new(dir, CIPHERTEXT_FILE, "the ciphertext");
        ciphertext
            .write(&cipher, format)
            .map_err(failed(&ciphertext, Operation::Write))?;
        let size = ciphertext
            .report_size()
            .map_err(failed(&ciphertext, Operation::Inspect))?;
        writeln!(out, "\nThe ciphertext has been serialized.")?;
        writeln!(out, "The file size of the ciphertext is {size} bytes")?;

        let cipher: Ciphertext = ciphertext
            .reload(format)
            .map_err(failed(&ciphertext, Operation::Read))?;
        if cc.decrypt(&sk, &cipher)? != plaintext {
            return Err(HarnessError::Mismatch {
                label: ciphertext.label(),
            });
        }
        writeln!(
            out,
            "\nThe ciphertext has been deserialized and decrypts to \"{TESTING_VALUE}\"."
        )?;
        artifacts.push(ciphertext);
    }

    info!("all {} artifacts passed the round-trip", artifacts.len());
    Ok(DemoReport { artifacts })
}
