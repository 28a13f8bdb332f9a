//! Event timing history reported through `eventTimings`.

use drivekit_protocol::CapValue;
use indexmap::IndexMap;
use serde::Serialize;

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
	std::time::SystemTime::now()
		.duration_since(std::time::UNIX_EPOCH)
		.unwrap_or_default()
		.as_millis() as u64
}

/// Start/end timestamps of one dispatched command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandTiming {
	pub cmd: String,
	pub start_time: u64,
	pub end_time: u64,
}

/// Accumulated event timestamps, keyed by event name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EventHistory {
	commands: Vec<CommandTiming>,
	#[serde(flatten)]
	events: IndexMap<String, Vec<u64>>,
}

impl EventHistory {
	/// Records `name` at the current time.
	pub fn log_event(&mut self, name: &str) {
		self.log_event_at(name, now_ms());
	}

	pub fn log_event_at(&mut self, name: &str, timestamp: u64) {
		self.events.entry(name.to_string()).or_default().push(timestamp);
	}

	/// Records a completed command.
	pub fn log_command(&mut self, cmd: impl Into<String>, start_time: u64, end_time: u64) {
		self.commands.push(CommandTiming {
			cmd: cmd.into(),
			start_time,
			end_time,
		});
	}

	pub fn events(&self, name: &str) -> &[u64] {
		self.events.get(name).map(Vec::as_slice).unwrap_or_default()
	}

	pub fn commands(&self) -> &[CommandTiming] {
		&self.commands
	}

	/// History as a capability value for the `events` field of get-session.
	pub fn to_cap_value(&self) -> CapValue {
		serde_json::to_value(self)
			.and_then(serde_json::from_value)
			.unwrap_or_default()
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn events_flatten_next_to_commands() {
		let mut history = EventHistory::default();
		history.log_event_at("newSessionStarted", 10);
		history.log_event_at("newSessionStarted", 20);
		history.log_command("findElement", 30, 35);

		assert_eq!(history.events("newSessionStarted"), [10, 20]);
		assert_eq!(
			serde_json::to_value(&history).unwrap(),
			json!({
				"commands": [{"cmd": "findElement", "startTime": 30, "endTime": 35}],
				"newSessionStarted": [10, 20]
			})
		);
	}

	#[test]
	fn unknown_event_is_empty() {
		assert!(EventHistory::default().events("missing").is_empty());
	}
}
