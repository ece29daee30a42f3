// Copyright © 2024 The qFALL-persist Authors
//
// This file is part of qFALL-persist.
//
// qFALL-persist is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use env_logger::Env;
use log::{debug, LevelFilter};
use qfall_persist::{
    harness::{run, DemoConfig},
    scheme::{Mode, SecurityLevel},
    serial::SerFormat,
};
use serde::de::DeserializeOwned;
use std::{
    fs, io,
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(
    name = "qfall-persist",
    author,
    version,
    about = "Persists a crypto context and its key pair and reads them back"
)]
struct Cli {
    #[arg(long)]
    debug: bool,
    /// JSON file with a run configuration; flags override its values.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,
    #[arg(long, value_enum)]
    format: Option<FormatArg>,
    #[arg(long, value_name = "T")]
    plaintext_modulus: Option<u64>,
    #[arg(long)]
    sigma: Option<f64>,
    #[arg(long, value_enum)]
    security_level: Option<SecurityLevelArg>,
    #[arg(long)]
    depth: Option<u32>,
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
    /// Fixes the ring dimension instead of choosing the smallest secure one.
    #[arg(long, value_name = "N")]
    ring_dimension: Option<u32>,
    /// Additionally persists and reloads a ciphertext.
    #[arg(long)]
    ciphertext: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Binary,
    Json,
}

impl From<FormatArg> for SerFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Binary => SerFormat::Binary,
            FormatArg::Json => SerFormat::Json,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SecurityLevelArg {
    #[value(name = "128")]
    Classic128,
    #[value(name = "192")]
    Classic192,
    #[value(name = "256")]
    Classic256,
    None,
}

impl From<SecurityLevelArg> for SecurityLevel {
    fn from(arg: SecurityLevelArg) -> Self {
        match arg {
            SecurityLevelArg::Classic128 => SecurityLevel::HEStd128Classic,
            SecurityLevelArg::Classic192 => SecurityLevel::HEStd192Classic,
            SecurityLevelArg::Classic256 => SecurityLevel::HEStd256Classic,
            SecurityLevelArg::None => SecurityLevel::NotSet,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Optimized,
    Rlwe,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Optimized => Mode::Optimized,
            ModeArg::Rlwe => Mode::Rlwe,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let config = build_config(&cli)?;
    debug!("run configuration: {config:?}");

    fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("creating data directory {}", config.data_dir.display()))?;

    let report = run(&config, &mut io::stdout().lock())?;
    debug!("finished with {} artifacts", report.artifacts.len());
    Ok(())
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or(default));
    builder.format_timestamp(None);
    if debug {
        builder.filter_level(LevelFilter::Debug);
    }
    let _ = builder.try_init();
}

fn build_config(cli: &Cli) -> Result<DemoConfig> {
    let mut config: DemoConfig = match &cli.config {
        Some(path) => load_json(path, "run configuration")?,
        None => DemoConfig::default(),
    };

    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(format) = cli.format {
        config.format = format.into();
    }
    let params = &mut config.parameters;
    if let Some(t) = cli.plaintext_modulus {
        params.plaintext_modulus = t;
    }
    if let Some(sigma) = cli.sigma {
        params.sigma = sigma;
    }
    if let Some(level) = cli.security_level {
        params.security_level = level.into();
    }
    if let Some(depth) = cli.depth {
        params.depth = depth;
    }
    if let Some(mode) = cli.mode {
        params.mode = mode.into();
    }
    if cli.ring_dimension.is_some() {
        params.ring_dimension = cli.ring_dimension;
    }
    config.ciphertext |= cli.ciphertext;

    Ok(config)
}

fn load_json<T: DeserializeOwned>(path: &Path, label: &str) -> Result<T> {
    let data =
        fs::read(path).with_context(|| format!("reading {} from {}", label, path.display()))?;
    let value = serde_json::from_slice(&data)
        .with_context(|| format!("parsing {} from {}", label, path.display()))?;
    Ok(value)
}

#[cfg(test)]
mod test_cli {
    use super::{build_config, Cli};
    use clap::{CommandFactory, Parser};
    use qfall_persist::{
        harness::DemoConfig,
        scheme::{Mode, SchemeParameters, SecurityLevel},
        serial::SerFormat,
    };
    use std::{fs, path::PathBuf};
    use tempfile::tempdir;

    /// Ensures the argument definitions are consistent.
    #[test]
    fn command_definition() {
        Cli::command().debug_assert();
    }

    /// Ensures that without flags or configuration file the defaults apply.
    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["qfall-persist"]).unwrap();

        assert_eq!(DemoConfig::default(), build_config(&cli).unwrap());
    }

    /// Ensures each flag overrides the value loaded from the configuration file.
    #[test]
    fn flags_override_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("run.json");
        let loaded = DemoConfig {
            data_dir: PathBuf::from("from-file"),
            format: SerFormat::Json,
            parameters: SchemeParameters::new(
                257,
                2.0,
                SecurityLevel::HEStd192Classic,
                1,
                Mode::Rlwe,
            ),
            ciphertext: false,
        };
        fs::write(&config_path, serde_json::to_vec(&loaded).unwrap()).unwrap();
        let config_arg = config_path.to_str().unwrap();

        let cli = Cli::try_parse_from(["qfall-persist", "--config", config_arg]).unwrap();
        assert_eq!(loaded, build_config(&cli).unwrap());

        let cli = Cli::try_parse_from([
            "qfall-persist",
            "--config",
            config_arg,
            "--data-dir",
            "from-flag",
            "--format",
            "binary",
            "--plaintext-modulus",
            "65537",
            "--sigma",
            "3.2",
            "--security-level",
            "256",
            "--depth",
            "3",
            "--mode",
            "optimized",
            "--ring-dimension",
            "64",
            "--ciphertext",
        ])
        .unwrap();
        let config = build_config(&cli).unwrap();

        assert_eq!(PathBuf::from("from-flag"), config.data_dir);
        assert_eq!(SerFormat::Binary, config.format);
        assert_eq!(65537, config.parameters.plaintext_modulus);
        assert_eq!(3.2, config.parameters.sigma);
        assert_eq!(SecurityLevel::HEStd256Classic, config.parameters.security_level);
        assert_eq!(3, config.parameters.depth);
        assert_eq!(Mode::Optimized, config.parameters.mode);
        assert_eq!(Some(64), config.parameters.ring_dimension);
        assert!(config.ciphertext);
    }

    /// Ensures flags that are not given keep the values of the configuration file.
    #[test]
    fn single_flag_keeps_rest() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("run.json");
        fs::write(&config_path, r#"{ "data_dir": "from-file", "format": "json" }"#).unwrap();

        let cli = Cli::try_parse_from([
            "qfall-persist",
            "--config",
            config_path.to_str().unwrap(),
            "--security-level",
            "none",
        ])
        .unwrap();
        let config = build_config(&cli).unwrap();

        assert_eq!(PathBuf::from("from-file"), config.data_dir);
        assert_eq!(SerFormat::Json, config.format);
        assert_eq!(SecurityLevel::NotSet, config.parameters.security_level);
        assert_eq!(SchemeParameters::default().depth, config.parameters.depth);
    }

    /// Ensures a missing or malformed configuration file is an error.
    #[test]
    fn broken_config() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let malformed = dir.path().join("malformed.json");
        fs::write(&malformed, b"{ not json").unwrap();

        for path in [missing, malformed] {
            let cli =
                Cli::try_parse_from(["qfall-persist", "--config", path.to_str().unwrap()]).unwrap();
            assert!(build_config(&cli).is_err());
        }
    }

    /// Ensures unknown values are rejected while parsing.
    #[test]
    fn invalid_values() {
        assert!(Cli::try_parse_from(["qfall-persist", "--security-level", "64"]).is_err());
        assert!(Cli::try_parse_from(["qfall-persist", "--format", "xml"]).is_err());
        assert!(Cli::try_parse_from(["qfall-persist", "--depth", "-1"]).is_err());
    }
}
