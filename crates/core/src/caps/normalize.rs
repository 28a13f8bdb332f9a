//! Wire-string coercion for typed capabilities.
//!
//! Client libraries frequently send `"true"` or `"60"` where a boolean or a
//! number is expected. Normalization rewrites those values according to the
//! constraint table and never fails; values it cannot interpret are left for
//! validation to reject.

use drivekit_protocol::{CapValue, Capabilities};
use tracing::warn;

use super::constraints::Constraints;

/// One string value rewritten into a typed value.
#[derive(Debug, Clone, PartialEq)]
pub struct Coercion {
	pub name: String,
	pub from: String,
	pub to: CapValue,
}

/// Result of [`normalize`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
	/// Coerced copy of the input capabilities
	pub caps: Capabilities,
	/// Every rewrite that was applied, in application order
	pub coercions: Vec<Coercion>,
}

/// Coerces string values of boolean and numeric capabilities.
///
/// Returns a new map; `original` is never aliased. Key order is preserved.
pub fn normalize(original: &Capabilities, constraints: &Constraints) -> Normalized {
	let mut caps = original.clone();
	let mut coercions = Vec::new();

	for name in constraints.boolean_caps() {
		let Some(CapValue::Str(raw)) = original.get(name) else {
			continue;
		};
		let coerced = match raw.to_lowercase().as_str() {
			"true" => true,
			"false" => false,
			_ => continue,
		};
		warn!(
			target = "drivekit.caps",
			capability = name,
			from = %raw,
			to = coerced,
			"capability changed from string to boolean; this may cause unexpected behavior"
		);
		caps.insert(name.to_string(), CapValue::Bool(coerced));
		coercions.push(Coercion {
			name: name.to_string(),
			from: raw.clone(),
			to: CapValue::Bool(coerced),
		});
	}

	for name in constraints.numeric_caps() {
		let Some(CapValue::Str(raw)) = original.get(name) else {
			continue;
		};
		let Some(coerced) = parse_number(raw) else {
			warn!(
				target = "drivekit.caps",
				capability = name,
				value = %raw,
				"capability expects a number but could not be parsed; leaving it unchanged"
			);
			continue;
		};
		warn!(
			target = "drivekit.caps",
			capability = name,
			from = %raw,
			to = %coerced,
			"capability changed from string to number; this may cause unexpected behavior"
		);
		caps.insert(name.to_string(), coerced.clone());
		coercions.push(Coercion {
			name: name.to_string(),
			from: raw.clone(),
			to: coerced,
		});
	}

	Normalized { caps, coercions }
}

/// Parses an integer, or a float when the text contains a decimal point.
///
/// The whole trimmed string must be a number: exponents, unit suffixes and
/// trailing garbage (`"1e3"`, `"42px"`, `"4.2.1"`) are not truncated to a
/// numeric prefix and stay strings.
fn parse_number(raw: &str) -> Option<CapValue> {
	let trimmed = raw.trim();
	if trimmed.contains('.') {
		trimmed.parse::<f64>().ok().filter(|f| f.is_finite()).map(CapValue::Float)
	} else {
		trimmed.parse::<i64>().ok().map(CapValue::Int)
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::caps::Constraint;

	fn table() -> Constraints {
		Constraints::new()
			.with("noReset", Constraint::boolean())
			.with("fullReset", Constraint::boolean())
			.with("newCommandTimeout", Constraint::number())
			.with("interKeyDelay", Constraint::number())
			.with("deviceName", Constraint::string())
	}

	fn caps(value: serde_json::Value) -> Capabilities {
		serde_json::from_value(value).unwrap()
	}

	#[test]
	fn boolean_strings_in_any_case() {
		let out = normalize(&caps(json!({"noReset": "TRUE", "fullReset": "fAlSe"})), &table());
		assert_eq!(out.caps["noReset"], CapValue::Bool(true));
		assert_eq!(out.caps["fullReset"], CapValue::Bool(false));
		assert_eq!(out.coercions.len(), 2);
	}

	#[test]
	fn other_boolean_strings_untouched() {
		let out = normalize(&caps(json!({"noReset": "yes"})), &table());
		assert_eq!(out.caps["noReset"], CapValue::from("yes"));
		assert!(out.coercions.is_empty());
	}

	#[test]
	fn integers_and_floats() {
		let out = normalize(&caps(json!({"newCommandTimeout": "42", "interKeyDelay": "4.2"})), &table());
		assert_eq!(out.caps["newCommandTimeout"], CapValue::Int(42));
		assert_eq!(out.caps["interKeyDelay"], CapValue::Float(4.2));
	}

	#[test]
	fn unparseable_number_passes_through() {
		let out = normalize(&caps(json!({"newCommandTimeout": "soon"})), &table());
		assert_eq!(out.caps["newCommandTimeout"], CapValue::from("soon"));
		assert!(out.coercions.is_empty());
	}

	#[test]
	fn partial_numbers_are_not_truncated() {
		for raw in ["1e3", "42px", "4.2.1", ""] {
			let out = normalize(&caps(json!({"newCommandTimeout": raw})), &table());
			assert_eq!(out.caps["newCommandTimeout"], CapValue::from(raw), "{raw}");
			assert!(out.coercions.is_empty(), "{raw}");
		}
		let out = normalize(&caps(json!({"newCommandTimeout": " 7 "})), &table());
		assert_eq!(out.caps["newCommandTimeout"], CapValue::Int(7));
	}

	#[test]
	fn unconstrained_and_typed_values_pass_through() {
		let input = caps(json!({"deviceName": "true", "noReset": true, "newCommandTimeout": 10, "extra": "1"}));
		let out = normalize(&input, &table());
		assert_eq!(out.caps, input);
	}

	#[test]
	fn key_order_survives_coercion() {
		let out = normalize(&caps(json!({"a": 1, "noReset": "true", "z": 2})), &table());
		let keys: Vec<_> = out.caps.keys().map(String::as_str).collect();
		assert_eq!(keys, ["a", "noReset", "z"]);
	}
}
