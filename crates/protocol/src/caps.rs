//! Capability values and capability maps.
//!
//! Capability values arrive from the wire as arbitrary JSON, but a driver only
//! ever reasons about a closed set of shapes. [`CapValue`] is that set, with
//! nested lists and maps kept for vendor-specific option blocks.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered capability name to value mapping.
///
/// Insertion order is preserved so that capabilities echo back to clients in
/// the order they were sent.
pub type Capabilities = IndexMap<String, CapValue>;

/// A single capability value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CapValue {
	/// Explicit `null`, also used for "cleared" values such as a blank `app`.
	#[default]
	Absent,
	/// Boolean value
	Bool(bool),
	/// Integral number
	Int(i64),
	/// Non-integral (or out of `i64` range) number
	Float(f64),
	/// String value
	Str(String),
	/// Array value
	List(Vec<CapValue>),
	/// Nested object value
	Map(IndexMap<String, CapValue>),
}

impl CapValue {
	/// Returns `true` for [`CapValue::Absent`].
	pub fn is_absent(&self) -> bool {
		matches!(self, CapValue::Absent)
	}

	/// Returns the boolean if this is a [`CapValue::Bool`].
	pub fn as_bool(&self) -> Option<bool> {
		match self {
			CapValue::Bool(b) => Some(*b),
			_ => None,
		}
	}

	/// Returns the string slice if this is a [`CapValue::Str`].
	pub fn as_str(&self) -> Option<&str> {
		match self {
			CapValue::Str(s) => Some(s),
			_ => None,
		}
	}

	/// Returns the numeric value of an [`Int`](Self::Int) or [`Float`](Self::Float).
	pub fn as_f64(&self) -> Option<f64> {
		match self {
			CapValue::Int(n) => Some(*n as f64),
			CapValue::Float(f) => Some(*f),
			_ => None,
		}
	}

	/// Returns `true` for numeric values.
	pub fn is_number(&self) -> bool {
		matches!(self, CapValue::Int(_) | CapValue::Float(_))
	}

	/// Loose truthiness used for flag-like capabilities.
	///
	/// `Absent`, `false`, zero, NaN and the empty string are falsy; everything
	/// else (including empty lists and maps) is truthy.
	pub fn is_truthy(&self) -> bool {
		match self {
			CapValue::Absent => false,
			CapValue::Bool(b) => *b,
			CapValue::Int(n) => *n != 0,
			CapValue::Float(f) => *f != 0.0 && !f.is_nan(),
			CapValue::Str(s) => !s.is_empty(),
			CapValue::List(_) | CapValue::Map(_) => true,
		}
	}

	/// Short name of the value's shape, for diagnostics.
	pub fn type_name(&self) -> &'static str {
		match self {
			CapValue::Absent => "null",
			CapValue::Bool(_) => "boolean",
			CapValue::Int(_) | CapValue::Float(_) => "number",
			CapValue::Str(_) => "string",
			CapValue::List(_) => "array",
			CapValue::Map(_) => "object",
		}
	}
}

impl fmt::Display for CapValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			CapValue::Absent => f.write_str("null"),
			CapValue::Bool(b) => write!(f, "{b}"),
			CapValue::Int(n) => write!(f, "{n}"),
			CapValue::Float(x) => write!(f, "{x}"),
			CapValue::Str(s) => write!(f, "'{s}'"),
			other => match serde_json::to_string(other) {
				Ok(json) => f.write_str(&json),
				Err(_) => f.write_str(other.type_name()),
			},
		}
	}
}

impl From<bool> for CapValue {
	fn from(value: bool) -> Self {
		CapValue::Bool(value)
	}
}

impl From<i64> for CapValue {
	fn from(value: i64) -> Self {
		CapValue::Int(value)
	}
}

impl From<i32> for CapValue {
	fn from(value: i32) -> Self {
		CapValue::Int(value.into())
	}
}

impl From<f64> for CapValue {
	fn from(value: f64) -> Self {
		CapValue::Float(value)
	}
}

impl From<&str> for CapValue {
	fn from(value: &str) -> Self {
		CapValue::Str(value.to_string())
	}
}

impl From<String> for CapValue {
	fn from(value: String) -> Self {
		CapValue::Str(value)
	}
}

/// W3C capability envelope.
///
/// The effective capabilities are `alwaysMatch` merged with whichever
/// `firstMatch` entry the driver accepts first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct W3cCapabilities {
	/// Capabilities every candidate must carry
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub always_match: Option<Capabilities>,

	/// Ordered alternatives merged onto `alwaysMatch`
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub first_match: Option<Vec<Capabilities>>,
}

impl W3cCapabilities {
	/// Creates an envelope with only `alwaysMatch` set.
	pub fn always(caps: Capabilities) -> Self {
		Self {
			always_match: Some(caps),
			first_match: None,
		}
	}

	/// Sets the `firstMatch` alternatives.
	pub fn first_match(mut self, candidates: Vec<Capabilities>) -> Self {
		self.first_match = Some(candidates);
		self
	}
}
