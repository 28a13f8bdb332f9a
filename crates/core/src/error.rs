//! Error types for driver session and timeout commands.

use thiserror::Error;

/// Result type alias for driver operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the session and timeout command surface.
///
/// Each variant maps to exactly one W3C error code so the dispatch layer can
/// build a protocol-correct response without inspecting messages.
#[derive(Debug, Error)]
pub enum Error {
	/// A session could not be created, e.g. because one is already active.
	#[error("Session not created: {0}")]
	SessionNotCreated(String),

	/// Requested capabilities failed constraint validation.
	#[error("Invalid capabilities: {0}")]
	CapabilityValidation(String),

	/// Invalid argument provided to a command.
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),

	/// The driver does not implement this command.
	#[error("Not yet implemented: {0}")]
	NotYetImplemented(&'static str),

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	/// Returns the W3C error code for this error.
	pub fn w3c_code(&self) -> &'static str {
		match self {
			Error::SessionNotCreated(_) => "session not created",
			Error::CapabilityValidation(_) | Error::InvalidArgument(_) => "invalid argument",
			Error::NotYetImplemented(_) => "unsupported operation",
			Error::Io(_) | Error::Json(_) => "unknown error",
		}
	}

	/// Returns true if a session was already active.
	pub fn is_session_not_created(&self) -> bool {
		matches!(self, Error::SessionNotCreated(_))
	}

	/// Returns true if capabilities were rejected.
	pub fn is_capability_validation(&self) -> bool {
		matches!(self, Error::CapabilityValidation(_))
	}

	/// Returns true if a command argument was rejected.
	pub fn is_invalid_argument(&self) -> bool {
		matches!(self, Error::InvalidArgument(_))
	}

	/// Returns true if the command is not supported by this driver.
	pub fn is_not_implemented(&self) -> bool {
		matches!(self, Error::NotYetImplemented(_))
	}
}
