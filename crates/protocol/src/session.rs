//! Session request and descriptor shapes.

use serde::{Deserialize, Serialize};

use crate::caps::{Capabilities, W3cCapabilities};

/// Body of a create-session request.
///
/// Legacy clients send `desiredCapabilities` (and optionally
/// `requiredCapabilities`); W3C clients send `capabilities`. Clients that
/// speak both send all of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSessionRequest {
	/// Legacy flat capabilities
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub desired_capabilities: Option<Capabilities>,

	/// Legacy capabilities the client insists on
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub required_capabilities: Option<Capabilities>,

	/// W3C capability envelope
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub capabilities: Option<W3cCapabilities>,
}

/// One entry of a get-sessions response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDescriptor {
	/// Opaque session identifier
	pub id: String,
	/// Capabilities the session was created with
	pub capabilities: Capabilities,
}
