//! New-command timeout timer.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::warn;

use super::shutdown::{ShutdownReason, ShutdownSignal};

/// Fires a session's shutdown signal when no command arrives in time.
///
/// Starting the timer requires a tokio runtime. Clearing is idempotent and
/// safe with nothing pending.
#[derive(Debug, Default)]
pub struct NewCommandTimer {
	handle: Option<JoinHandle<()>>,
}

impl NewCommandTimer {
	/// Restarts the countdown. A timeout of zero disables it.
	pub fn start(&mut self, timeout_ms: u64, signal: ShutdownSignal) {
		self.clear();
		if timeout_ms == 0 {
			return;
		}
		self.handle = Some(tokio::spawn(async move {
			tokio::time::sleep(Duration::from_millis(timeout_ms)).await;
			warn!(
				target = "drivekit.session",
				timeout_ms, "shutting down session: no new command received within the new command timeout"
			);
			signal.trigger(ShutdownReason::NewCommandTimeout { timeout_ms });
		}));
	}

	pub fn clear(&mut self) {
		if let Some(handle) = self.handle.take() {
			handle.abort();
		}
	}

	pub fn is_pending(&self) -> bool {
		self.handle.as_ref().is_some_and(|h| !h.is_finished())
	}
}

impl Drop for NewCommandTimer {
	fn drop(&mut self) {
		self.clear();
	}
}
