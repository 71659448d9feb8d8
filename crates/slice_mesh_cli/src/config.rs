//! Configuration file for slice meshing runs.
//!
//! Every field is optional. Command-line flags override the file, and the
//! file overrides the built-in defaults.

use anyhow::{Context, Result};
use log::LevelFilter;
use serde::Deserialize;
use std::path::Path;

/// Defaults loaded from a TOML file.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	/// Isolevel separating inside from outside samples.
	pub isolevel: Option<i32>,
	/// Write binary STL instead of text.
	pub binary: Option<bool>,
	/// Slice file extension for directory input.
	pub extension: Option<String>,
	/// Worker threads for cell building.
	pub threads: Option<usize>,
	/// `error`, `warn`, `info`, `debug`, `trace` or `off`.
	pub log_level: Option<String>,
	/// Ask before meshing once the estimate is known.
	pub confirm: Option<bool>,
}

impl Config {
	/// Load configuration from a TOML file.
	pub fn load(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path)
			.with_context(|| format!("Failed to read config file: {}", path.display()))?;
		Self::parse(&content).with_context(|| format!("Invalid config file: {}", path.display()))
	}

	pub fn parse(content: &str) -> Result<Self> {
		let config: Config = toml::from_str(content).context("Failed to parse config TOML")?;

		if config.threads == Some(0) {
			anyhow::bail!("threads must be at least 1");
		}
		if let Some(extension) = &config.extension {
			if extension.trim_start_matches('.').is_empty() {
				anyhow::bail!("extension must not be empty");
			}
		}
		if let Some(level) = &config.log_level {
			parse_level(level)?;
		}

		Ok(config)
	}

	/// Configured log level, already validated by [`Config::parse`].
	pub fn level(&self) -> Option<LevelFilter> {
		self.log_level.as_deref().and_then(|l| parse_level(l).ok())
	}
}

pub fn parse_level(level: &str) -> Result<LevelFilter> {
	level
		.parse::<LevelFilter>()
		.map_err(|_| anyhow::anyhow!("unknown log level '{}'", level))
}
