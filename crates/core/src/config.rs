//! Driver configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::caps::Constraints;
use crate::error::Result;
use crate::options::Options;
use crate::timeouts::DEFAULT_NEW_COMMAND_TIMEOUT_MS;

fn default_strict_caps() -> bool {
	true
}

fn default_new_command_timeout_ms() -> u64 {
	DEFAULT_NEW_COMMAND_TIMEOUT_MS
}

fn default_constraints() -> Constraints {
	Constraints::base()
}

/// Static configuration supplied by a concrete driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverConfig {
	/// Options every session starts from before capabilities are applied.
	#[serde(default)]
	pub default_options: Options,

	/// Capability constraints. Defaults to [`Constraints::base`].
	#[serde(default = "default_constraints")]
	pub constraints: Constraints,

	/// Whether W3C capability matching enforces constraints.
	#[serde(default = "default_strict_caps")]
	pub strict_caps: bool,

	/// New-command timeout used until a session or client overrides it.
	#[serde(default = "default_new_command_timeout_ms")]
	pub new_command_timeout_ms: u64,
}

impl Default for DriverConfig {
	fn default() -> Self {
		Self {
			default_options: Options::new(),
			constraints: default_constraints(),
			strict_caps: default_strict_caps(),
			new_command_timeout_ms: default_new_command_timeout_ms(),
		}
	}
}

impl DriverConfig {
	/// Loads a JSON config file. Missing fields take their defaults.
	pub fn load(path: &Path) -> Result<Self> {
		let content = fs::read_to_string(path)?;
		Ok(serde_json::from_str(&content)?)
	}

	/// Adds driver-specific constraints on top of the current table.
	pub fn with_constraints(mut self, extra: Constraints) -> Self {
		self.constraints = self.constraints.extend(extra);
		self
	}

	pub fn with_default_options(mut self, options: Options) -> Self {
		self.default_options = options;
		self
	}

	pub fn with_strict_caps(mut self, strict: bool) -> Self {
		self.strict_caps = strict;
		self
	}

	pub fn with_new_command_timeout_ms(mut self, ms: u64) -> Self {
		self.new_command_timeout_ms = ms;
		self
	}
}
