//! Per-session unexpected-shutdown signalling.
//!
//! Each session owns a fresh channel. A subscriber taken during one session
//! never observes a shutdown fired for another.

use std::fmt;

use tokio::sync::watch;

/// Why a session ended without a delete-session command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
	/// No command arrived within the new-command timeout.
	NewCommandTimeout { timeout_ms: u64 },
	/// The automation backend went away.
	Crashed(String),
}

impl fmt::Display for ShutdownReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ShutdownReason::NewCommandTimeout { timeout_ms } => {
				write!(f, "no new command received within {timeout_ms}ms")
			}
			ShutdownReason::Crashed(reason) => write!(f, "backend crashed: {reason}"),
		}
	}
}

/// Receiver side of a session's shutdown signal.
pub type ShutdownReceiver = watch::Receiver<Option<ShutdownReason>>;

/// Sender side of a session's shutdown signal.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
	tx: watch::Sender<Option<ShutdownReason>>,
}

impl Default for ShutdownSignal {
	fn default() -> Self {
		Self::new()
	}
}

impl ShutdownSignal {
	pub fn new() -> Self {
		let (tx, _) = watch::channel(None);
		Self { tx }
	}

	pub fn subscribe(&self) -> ShutdownReceiver {
		self.tx.subscribe()
	}

	/// Fires the signal. Only the first reason is kept.
	pub fn trigger(&self, reason: ShutdownReason) {
		self.tx.send_if_modified(|current| {
			if current.is_some() {
				return false;
			}
			*current = Some(reason);
			true
		});
	}

	pub fn reason(&self) -> Option<ShutdownReason> {
		self.tx.borrow().clone()
	}
}
