//! Single-session state and its per-session resources.

mod events;
mod shutdown;
mod timer;

pub use events::{CommandTiming, EventHistory, now_ms};
pub use shutdown::{ShutdownReason, ShutdownReceiver, ShutdownSignal};
pub use timer::NewCommandTimer;

use drivekit_protocol::{Capabilities, Protocol, SessionDescriptor};

use crate::options::{Options, ResetPolicy};

/// A fully created session.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSession {
	/// Opaque unique identifier
	pub id: String,
	/// Validated, normalized capabilities returned to the client
	pub capabilities: Capabilities,
	/// Driver defaults overlaid with capabilities and reset flags
	pub options: Options,
	/// Reset behaviour resolved at creation
	pub reset: ResetPolicy,
	/// Dialect the session was requested with
	pub protocol: Protocol,
}

/// Whether the driver currently holds a session.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionState {
	#[default]
	NoSession,
	Active(ActiveSession),
}

impl SessionState {
	pub fn is_active(&self) -> bool {
		matches!(self, SessionState::Active(_))
	}

	pub fn active(&self) -> Option<&ActiveSession> {
		match self {
			SessionState::Active(session) => Some(session),
			SessionState::NoSession => None,
		}
	}

	pub fn id(&self) -> Option<&str> {
		self.active().map(|s| s.id.as_str())
	}

	pub fn descriptor(&self) -> Option<SessionDescriptor> {
		self.active().map(|s| SessionDescriptor {
			id: s.id.clone(),
			capabilities: s.capabilities.clone(),
		})
	}
}
