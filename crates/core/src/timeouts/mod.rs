//! Implicit-wait and new-command timeout state.
//!
//! Every driver owns a [`TimeoutHandle`]. Handles of managed drivers are
//! registered on their parent, and every setter fans out across that graph,
//! so a sub-session spawned by a driver always waits the same way its parent
//! does.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use drivekit_protocol::{LegacyTimeouts, TimeoutsRequest, W3cTimeouts};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};


/// New-command timeout used when the driver config does not set one.
pub const DEFAULT_NEW_COMMAND_TIMEOUT_MS: u64 = 60_000;

/// Snapshot of one driver's timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutState {
	pub implicit_wait_ms: u64,
	pub new_command_timeout_ms: u64,
}

impl Default for TimeoutState {
	fn default() -> Self {
		Self {
			implicit_wait_ms: 0,
			new_command_timeout_ms: DEFAULT_NEW_COMMAND_TIMEOUT_MS,
		}
	}
}

struct TimeoutCell {
	state: TimeoutState,
	managed: Vec<TimeoutHandle>,
}

/// Shared handle to a driver's timeout state and its managed drivers.
#[derive(Clone)]
pub struct TimeoutHandle(Arc<Mutex<TimeoutCell>>);

impl fmt::Debug for TimeoutHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let cell = self.0.lock();
		f.debug_struct("TimeoutHandle")
			.field("state", &cell.state)
			.field("managed", &cell.managed.len())
			.finish()
	}
}

impl Default for TimeoutHandle {
	fn default() -> Self {
		Self::new(TimeoutState::default())
	}
}

impl TimeoutHandle {
	pub fn new(state: TimeoutState) -> Self {
		Self(Arc::new(Mutex::new(TimeoutCell {
			state,
			managed: Vec::new(),
		})))
	}

	pub fn state(&self) -> TimeoutState {
		self.0.lock().state
	}

	pub fn implicit_wait_ms(&self) -> u64 {
		self.state().implicit_wait_ms
	}

	pub fn new_command_timeout_ms(&self) -> u64 {
		self.state().new_command_timeout_ms
	}

	/// Returns true if both handles point at the same driver.
	pub fn same_driver(&self, other: &TimeoutHandle) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}

	/// Registers `other` as managed. Registering a driver on itself is ignored.
	pub fn add_managed(&self, other: TimeoutHandle) {
		if self.same_driver(&other) {
			debug!(target = "drivekit.timeouts", "ignoring attempt to manage a driver from itself");
			return;
		}
		self.0.lock().managed.push(other);
	}

	pub fn clear_managed(&self) {
		self.0.lock().managed.clear();
	}

	pub fn managed_count(&self) -> usize {
		self.0.lock().managed.len()
	}

	/// Sets the implicit wait here and on every reachable managed driver.
	pub fn set_implicit_wait(&self, ms: u64) {
		self.apply(|state| state.implicit_wait_ms = ms);
	}

	/// Sets the new-command timeout here and on every reachable managed driver.
	pub fn set_new_command_timeout(&self, ms: u64) {
		self.apply(|state| state.new_command_timeout_ms = ms);
	}

	/// Sets only this driver's new-command timeout.
	pub(crate) fn set_local_new_command_timeout(&self, ms: u64) {
		self.0.lock().state.new_command_timeout_ms = ms;
	}

	// Each node is visited once, so cycles between managed drivers terminate.
	fn apply(&self, update: impl Fn(&mut TimeoutState)) {
		let mut visited = HashSet::new();
		let mut pending = vec![self.clone()];
		while let Some(handle) = pending.pop() {
			if !visited.insert(Arc::as_ptr(&handle.0)) {
				continue;
			}
			let mut cell = handle.0.lock();
			update(&mut cell.state);
			pending.extend(cell.managed.iter().rev().cloned());
		}
	}
}

/// Timeouts the base driver cannot apply itself.
///
/// Concrete drivers that can bound script execution or page loads override
/// these; the defaults reject the command.
pub trait TimeoutBackend: Send + Sync {
	fn set_script_timeout(&self, ms: u64) -> Result<()> {
		let _ = ms;
		Err(Error::NotYetImplemented("script timeout"))
	}

	fn set_page_load_timeout(&self, ms: u64) -> Result<()> {
		let _ = ms;
		Err(Error::NotYetImplemented("page load timeout"))
	}
}

/// Backend with no script or page-load support.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedTimeouts;

impl TimeoutBackend for UnsupportedTimeouts {}

/// Legacy `type` of a timeouts command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutKind {
	Implicit,
	Command,
	Script,
	PageLoad,
}

impl TimeoutKind {
	pub fn parse(kind: &str) -> Result<Self> {
		match kind {
			"implicit" => Ok(TimeoutKind::Implicit),
			"command" => Ok(TimeoutKind::Command),
			"script" => Ok(TimeoutKind::Script),
			"page load" | "pageLoad" => Ok(TimeoutKind::PageLoad),
			other => Err(Error::InvalidArgument(format!("'{other}' is not a known timeout type"))),
		}
	}
}

/// Coerces a wire duration to whole milliseconds.
///
/// Numbers and numeric strings are accepted and truncated; negative,
/// non-finite and non-numeric input is rejected.
pub fn parse_ms(value: &Value) -> Result<u64> {
	let parsed = match value {
		Value::Number(n) => n.as_f64(),
		Value::String(s) => s.trim().parse::<f64>().ok(),
		_ => None,
	};
	match parsed {
		Some(ms) if ms.is_finite() && ms >= 0.0 => Ok(ms.trunc() as u64),
		Some(ms) if ms < 0.0 => Err(Error::InvalidArgument(format!("timeout must not be negative, got {ms}"))),
		_ => Err(Error::InvalidArgument(format!("'{value}' is not a valid timeout in milliseconds"))),
	}
}

/// Validates timeout input and applies it through a [`TimeoutHandle`].
pub struct TimeoutManager {
	handle: TimeoutHandle,
	backend: Arc<dyn TimeoutBackend>,
}

impl fmt::Debug for TimeoutManager {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TimeoutManager").field("handle", &self.handle).finish_non_exhaustive()
	}
}

impl TimeoutManager {
	pub fn new(state: TimeoutState, backend: Arc<dyn TimeoutBackend>) -> Self {
		Self {
			handle: TimeoutHandle::new(state),
			backend,
		}
	}

	/// Replaces the backend, keeping the current state and managed drivers.
	pub fn with_backend(mut self, backend: Arc<dyn TimeoutBackend>) -> Self {
		self.backend = backend;
		self
	}

	pub fn handle(&self) -> &TimeoutHandle {
		&self.handle
	}

	pub fn set_implicit_wait(&self, ms: impl Into<Value>) -> Result<()> {
		let ms = parse_ms(&ms.into())?;
		debug!(target = "drivekit.timeouts", ms, managed = self.handle.managed_count(), "set implicit wait");
		self.handle.set_implicit_wait(ms);
		Ok(())
	}

	pub fn set_new_command_timeout(&self, ms: impl Into<Value>) -> Result<()> {
		let ms = parse_ms(&ms.into())?;
		debug!(target = "drivekit.timeouts", ms, managed = self.handle.managed_count(), "set new command timeout");
		self.handle.set_new_command_timeout(ms);
		Ok(())
	}

	pub fn set_script_timeout(&self, ms: impl Into<Value>) -> Result<()> {
		let ms = parse_ms(&ms.into())?;
		self.backend.set_script_timeout(ms)
	}

	pub fn set_page_load_timeout(&self, ms: impl Into<Value>) -> Result<()> {
		let ms = parse_ms(&ms.into())?;
		self.backend.set_page_load_timeout(ms)
	}

	/// Applies a `timeouts` command in either dialect.
	pub fn timeouts(&self, request: &TimeoutsRequest) -> Result<()> {
		match request {
			TimeoutsRequest::Legacy(legacy) => self.legacy_timeouts(legacy),
			TimeoutsRequest::W3c(w3c) => self.w3c_timeouts(w3c),
		}
	}

	fn legacy_timeouts(&self, request: &LegacyTimeouts) -> Result<()> {
		let kind = TimeoutKind::parse(&request.kind)?;
		let ms = parse_ms(&request.ms)?;
		match kind {
			TimeoutKind::Implicit => self.set_implicit_wait(ms),
			TimeoutKind::Command => self.set_new_command_timeout(ms),
			TimeoutKind::Script => self.backend.set_script_timeout(ms),
			TimeoutKind::PageLoad => self.backend.set_page_load_timeout(ms),
		}
	}

	// Every present value is checked before any is applied.
	fn w3c_timeouts(&self, request: &W3cTimeouts) -> Result<()> {
		if request.script.is_none() && request.page_load.is_none() && request.implicit.is_none() {
			return Err(Error::InvalidArgument(
				"W3C protocol expects any of script, pageLoad or implicit to be set".to_string(),
			));
		}
		let script = request.script.as_ref().map(parse_ms).transpose()?;
		let page_load = request.page_load.as_ref().map(parse_ms).transpose()?;
		let implicit = request.implicit.as_ref().map(parse_ms).transpose()?;

		if let Some(ms) = script {
			self.backend.set_script_timeout(ms)?;
		}
		if let Some(ms) = page_load {
			self.backend.set_page_load_timeout(ms)?;
		}
		if let Some(ms) = implicit {
			self.set_implicit_wait(ms)?;
		}
		Ok(())
	}
}
