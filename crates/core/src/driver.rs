//! The base driver: session lifecycle and timeout commands.
//!
//! [`BaseDriver`] models exactly one session at a time. Commands are expected
//! to be serialized by the dispatch layer; nothing here locks against two
//! concurrent create-session calls.

use std::sync::Arc;

use drivekit_protocol::{CapValue, Capabilities, SessionDescriptor, TimeoutsRequest, W3cCapabilities};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use crate::caps::{CapabilityValidator, ConstraintValidator, ResolvedCaps, resolve_caps};
use crate::config::DriverConfig;
use crate::error::{Error, Result};
use crate::options::{Options, build_options};
use crate::session::{
	ActiveSession, EventHistory, NewCommandTimer, SessionState, ShutdownReason, ShutdownReceiver, ShutdownSignal,
};
use crate::timeouts::{TimeoutBackend, TimeoutHandle, TimeoutManager, TimeoutState, UnsupportedTimeouts};

const NEW_COMMAND_TIMEOUT: &str = "newCommandTimeout";
const EVENT_TIMINGS: &str = "eventTimings";

/// Session lifecycle and timeout state for one automation driver.
pub struct BaseDriver {
	config: DriverConfig,
	validator: Arc<dyn CapabilityValidator>,
	session: SessionState,
	timeouts: TimeoutManager,
	event_history: EventHistory,
	shutdown: ShutdownSignal,
	new_command_timer: NewCommandTimer,
}

impl Default for BaseDriver {
	fn default() -> Self {
		Self::new(DriverConfig::default())
	}
}

impl BaseDriver {
	pub fn new(config: DriverConfig) -> Self {
		let timeouts = TimeoutManager::new(
			TimeoutState {
				implicit_wait_ms: 0,
				new_command_timeout_ms: config.new_command_timeout_ms,
			},
			Arc::new(UnsupportedTimeouts),
		);
		Self {
			config,
			validator: Arc::new(ConstraintValidator),
			session: SessionState::NoSession,
			timeouts,
			event_history: EventHistory::default(),
			shutdown: ShutdownSignal::new(),
			new_command_timer: NewCommandTimer::default(),
		}
	}

	/// Uses `validator` instead of the built-in [`ConstraintValidator`].
	pub fn with_validator(mut self, validator: Arc<dyn CapabilityValidator>) -> Self {
		self.validator = validator;
		self
	}

	/// Routes script and page-load timeouts to `backend`.
	pub fn with_timeout_backend(mut self, backend: Arc<dyn TimeoutBackend>) -> Self {
		self.timeouts = self.timeouts.with_backend(backend);
		self
	}

	pub fn config(&self) -> &DriverConfig {
		&self.config
	}

	/// Creates the driver's single session.
	///
	/// W3C `capabilities` take precedence over the legacy maps. Nothing is
	/// assigned until every check has passed, so a failed call leaves the
	/// driver without a session and with its event history untouched.
	pub async fn create_session(
		&mut self,
		desired: Option<Capabilities>,
		required: Option<Capabilities>,
		capabilities: Option<W3cCapabilities>,
	) -> Result<(String, Capabilities)> {
		if self.session.is_active() {
			return Err(Error::SessionNotCreated(
				"Cannot create a new session while one is in progress".to_string(),
			));
		}

		let mut history = EventHistory::default();
		history.log_event("newSessionRequested");

		let ResolvedCaps {
			caps,
			protocol,
			coercions,
		} = resolve_caps(
			self.validator.as_ref(),
			desired.as_ref(),
			required.as_ref(),
			capabilities.as_ref(),
			&self.config.constraints,
			self.config.strict_caps,
		)
		.await?;
		if !coercions.is_empty() {
			debug!(target = "drivekit.session", count = coercions.len(), "coerced capability values");
		}

		let (options, reset) = build_options(&self.config.default_options, &caps)?;
		let new_command_timeout_ms = caps
			.get(NEW_COMMAND_TIMEOUT)
			.filter(|value| !value.is_absent())
			.map(seconds_to_ms)
			.transpose()?;

		let id = Uuid::new_v4().to_string();
		if let Some(ms) = new_command_timeout_ms {
			self.timeouts.handle().set_local_new_command_timeout(ms);
		}
		self.new_command_timer.clear();
		self.shutdown = ShutdownSignal::new();
		self.session = SessionState::Active(ActiveSession {
			id: id.clone(),
			capabilities: caps.clone(),
			options,
			reset,
			protocol,
		});
		self.event_history = history;
		self.event_history.log_event("newSessionStarted");

		info!(target = "drivekit.session", session_id = %id, ?protocol, "session created");
		Ok((id, caps))
	}

	/// Lists active sessions: empty, or exactly one.
	pub fn get_sessions(&self) -> Vec<SessionDescriptor> {
		self.session.descriptor().into_iter().collect()
	}

	/// Capabilities of the active session, or `None` without one.
	///
	/// When `eventTimings` is truthy the event history is attached as `events`.
	pub fn get_session(&self) -> Option<Capabilities> {
		let session = self.session.active()?;
		let mut caps = session.capabilities.clone();
		if caps.get(EVENT_TIMINGS).is_some_and(CapValue::is_truthy) {
			caps.insert("events".to_string(), self.event_history.to_cap_value());
		}
		Some(caps)
	}

	/// Ends the active session. Calling it without one is a no-op.
	pub fn delete_session(&mut self) {
		self.clear_new_command_timeout();
		if let Some(id) = self.session.id() {
			info!(target = "drivekit.session", session_id = %id, "deleting session");
		}
		self.session = SessionState::NoSession;
	}

	pub fn session(&self) -> &SessionState {
		&self.session
	}

	pub fn session_id(&self) -> Option<&str> {
		self.session.id()
	}

	pub fn capabilities(&self) -> Option<&Capabilities> {
		self.session.active().map(|s| &s.capabilities)
	}

	pub fn options(&self) -> Option<&Options> {
		self.session.active().map(|s| &s.options)
	}

	/// Applies a `timeouts` command in either dialect.
	pub fn timeouts(&self, request: &TimeoutsRequest) -> Result<()> {
		self.timeouts.timeouts(request)
	}

	pub fn set_implicit_wait(&self, ms: impl Into<Value>) -> Result<()> {
		self.timeouts.set_implicit_wait(ms)
	}

	/// Legacy alias of [`set_implicit_wait`](Self::set_implicit_wait).
	pub fn implicit_wait(&self, ms: impl Into<Value>) -> Result<()> {
		self.set_implicit_wait(ms)
	}

	pub fn set_new_command_timeout(&self, ms: impl Into<Value>) -> Result<()> {
		self.timeouts.set_new_command_timeout(ms)
	}

	pub fn implicit_wait_ms(&self) -> u64 {
		self.timeouts.handle().implicit_wait_ms()
	}

	pub fn new_command_timeout_ms(&self) -> u64 {
		self.timeouts.handle().new_command_timeout_ms()
	}

	/// Shared handle to this driver's timeout state.
	pub fn timeout_handle(&self) -> TimeoutHandle {
		self.timeouts.handle().clone()
	}

	/// Keeps `driver`'s timeouts in sync with this driver's from now on.
	pub fn add_managed_driver(&self, driver: &BaseDriver) {
		self.timeouts.handle().add_managed(driver.timeout_handle());
	}

	pub fn clear_managed_drivers(&self) {
		self.timeouts.handle().clear_managed();
	}

	pub fn managed_driver_count(&self) -> usize {
		self.timeouts.handle().managed_count()
	}

	pub fn log_event(&mut self, name: &str) {
		self.event_history.log_event(name);
	}

	pub fn event_history(&self) -> &EventHistory {
		&self.event_history
	}

	/// Subscribes to the current session's unexpected-shutdown signal.
	pub fn on_unexpected_shutdown(&self) -> ShutdownReceiver {
		self.shutdown.subscribe()
	}

	pub fn trigger_unexpected_shutdown(&self, reason: ShutdownReason) {
		self.shutdown.trigger(reason);
	}

	/// (Re)starts the new-command countdown for the active session.
	///
	/// Does nothing without a session. Must run inside a tokio runtime.
	pub fn start_new_command_timeout(&mut self) {
		if !self.session.is_active() {
			return;
		}
		let timeout_ms = self.new_command_timeout_ms();
		self.new_command_timer.start(timeout_ms, self.shutdown.clone());
	}

	pub fn clear_new_command_timeout(&mut self) {
		self.new_command_timer.clear();
	}

	pub fn new_command_timeout_pending(&self) -> bool {
		self.new_command_timer.is_pending()
	}
}

/// Converts a `newCommandTimeout` capability (seconds) to milliseconds.
fn seconds_to_ms(value: &CapValue) -> Result<u64> {
	match value.as_f64() {
		Some(secs) if secs.is_finite() && secs >= 0.0 => Ok((secs * 1000.0).round() as u64),
		_ => Err(Error::InvalidArgument(format!(
			"'{NEW_COMMAND_TIMEOUT}' must be a non-negative number of seconds, got {value}"
		))),
	}
}
