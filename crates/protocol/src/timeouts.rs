//! Timeout command payloads.
//!
//! Durations are kept as raw JSON because clients routinely send numbers as
//! strings; coercion and range checks happen in the driver.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol generation a request was received with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Protocol {
	/// Legacy JSON wire protocol
	#[default]
	#[serde(rename = "MJSONWP")]
	Mjsonwp,
	/// W3C WebDriver protocol
	#[serde(rename = "W3C")]
	W3c,
}

/// Legacy `{type, ms}` timeout payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyTimeouts {
	/// Timeout kind, e.g. `"implicit"` or `"page load"`
	#[serde(rename = "type")]
	pub kind: String,
	/// Duration in milliseconds, number or numeric string
	pub ms: Value,
}

/// W3C `{script, pageLoad, implicit}` timeout payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct W3cTimeouts {
	/// Script timeout in milliseconds
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub script: Option<Value>,
	/// Page load timeout in milliseconds
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub page_load: Option<Value>,
	/// Implicit wait in milliseconds
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub implicit: Option<Value>,
}

/// Body of a `timeouts` command in either dialect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeoutsRequest {
	/// `{type, ms}`
	Legacy(LegacyTimeouts),
	/// `{script, pageLoad, implicit}`
	W3c(W3cTimeouts),
}

impl TimeoutsRequest {
	/// Builds a legacy payload.
	pub fn legacy(kind: impl Into<String>, ms: impl Into<Value>) -> Self {
		TimeoutsRequest::Legacy(LegacyTimeouts {
			kind: kind.into(),
			ms: ms.into(),
		})
	}

	/// Returns the dialect this payload belongs to.
	pub fn protocol(&self) -> Protocol {
		match self {
			TimeoutsRequest::Legacy(_) => Protocol::Mjsonwp,
			TimeoutsRequest::W3c(_) => Protocol::W3c,
		}
	}
}
