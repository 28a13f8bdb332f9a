//! Capability validation and W3C capability matching.

use async_trait::async_trait;
use drivekit_protocol::{Capabilities, W3cCapabilities};
use tracing::debug;

use super::constraints::Constraints;
use super::normalize::normalize;
use crate::error::{Error, Result};

/// Validates capabilities against a constraint table.
///
/// Drivers that delegate to an external schema service implement this
/// trait; [`ConstraintValidator`] is the built-in implementation.
#[async_trait]
pub trait CapabilityValidator: Send + Sync {
	/// Resolves a W3C envelope into one flat capability map.
	///
	/// With `strict` unset, the first merged candidate is accepted without
	/// constraint checks. Candidates are returned as sent; coercion is left to
	/// the caller.
	async fn process_w3c(&self, caps: &W3cCapabilities, constraints: &Constraints, strict: bool) -> Result<Capabilities>;

	/// Checks a flat capability map against `constraints`.
	async fn validate(&self, caps: &Capabilities, constraints: &Constraints) -> Result<()>;
}

/// Constraint-table validator implementing the W3C matching algorithm.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstraintValidator;

#[async_trait]
impl CapabilityValidator for ConstraintValidator {
	async fn process_w3c(&self, caps: &W3cCapabilities, constraints: &Constraints, strict: bool) -> Result<Capabilities> {
		let candidates = merge_candidates(caps)?;

		if !strict {
			return Ok(candidates.into_iter().next().unwrap_or_default());
		}

		let mut rejections = Vec::new();
		// Wire strings such as "true" or "60" must not disqualify a candidate.
		for (index, candidate) in candidates.into_iter().enumerate() {
			match check_caps(&normalize(&candidate, constraints).caps, constraints) {
				Ok(()) => {
					debug!(target = "drivekit.caps", candidate = index, "matched W3C capabilities");
					return Ok(candidate);
				}
				Err(failures) => rejections.push(format!("[{index}] {}", failures.join("; "))),
			}
		}

		Err(Error::CapabilityValidation(format!(
			"could not find matching capabilities from {}",
			rejections.join(", ")
		)))
	}

	async fn validate(&self, caps: &Capabilities, constraints: &Constraints) -> Result<()> {
		check_caps(caps, constraints).map_err(|failures| Error::CapabilityValidation(failures.join("; ")))
	}
}

/// Checks every constraint, collecting all failures.
pub fn check_caps(caps: &Capabilities, constraints: &Constraints) -> std::result::Result<(), Vec<String>> {
	let failures: Vec<String> = constraints
		.iter()
		.flat_map(|(name, constraint)| constraint.check(name, caps.get(name)))
		.collect();

	if failures.is_empty() { Ok(()) } else { Err(failures) }
}

/// Merges `alwaysMatch` onto every `firstMatch` entry.
///
/// Missing `alwaysMatch` is `{}`; missing or empty `firstMatch` is `[{}]`.
/// A name present in both halves is rejected.
pub fn merge_candidates(caps: &W3cCapabilities) -> Result<Vec<Capabilities>> {
	let always = caps.always_match.clone().unwrap_or_default();
	let first_match = match caps.first_match.as_deref() {
		Some(entries) if !entries.is_empty() => entries,
		_ => return Ok(vec![always]),
	};

	first_match
		.iter()
		.map(|entry| {
			let mut merged = always.clone();
			for (name, value) in entry {
				if always.contains_key(name) {
					return Err(Error::CapabilityValidation(format!(
						"firstMatch key '{name}' shadows a key in alwaysMatch"
					)));
				}
				merged.insert(name.clone(), value.clone());
			}
			Ok(merged)
		})
		.collect()
}
