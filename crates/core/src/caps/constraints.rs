//! Capability constraint tables.

use drivekit_protocol::CapValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Expected shape of a capability value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
	Boolean,
	Number,
	String,
	Object,
	Array,
}

impl ValueKind {
	fn matches(self, value: &CapValue) -> bool {
		match (self, value) {
			(ValueKind::Boolean, CapValue::Bool(_)) => true,
			(ValueKind::Number, CapValue::Int(_)) => true,
			(ValueKind::Number, CapValue::Float(f)) => f.is_finite(),
			(ValueKind::String, CapValue::Str(_)) => true,
			(ValueKind::Object, CapValue::Map(_)) => true,
			(ValueKind::Array, CapValue::List(_)) => true,
			_ => false,
		}
	}

	fn name(self) -> &'static str {
		match self {
			ValueKind::Boolean => "boolean",
			ValueKind::Number => "number",
			ValueKind::String => "string",
			ValueKind::Object => "object",
			ValueKind::Array => "array",
		}
	}
}

fn is_false(value: &bool) -> bool {
	!*value
}

/// Rules a single capability value must satisfy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
	/// Required value shape
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub kind: Option<ValueKind>,

	/// Capability must be present and non-null
	#[serde(default, skip_serializing_if = "is_false")]
	pub presence: bool,

	/// Allowed values, compared exactly
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub inclusion: Vec<String>,

	/// Allowed values, compared ignoring ASCII case
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub inclusion_case_insensitive: Vec<String>,
}

impl Constraint {
	fn of(kind: ValueKind) -> Self {
		Self {
			kind: Some(kind),
			..Self::default()
		}
	}

	/// Boolean-typed capability.
	pub fn boolean() -> Self {
		Self::of(ValueKind::Boolean)
	}

	/// Numeric capability.
	pub fn number() -> Self {
		Self::of(ValueKind::Number)
	}

	/// String capability.
	pub fn string() -> Self {
		Self::of(ValueKind::String)
	}

	/// Object capability.
	pub fn object() -> Self {
		Self::of(ValueKind::Object)
	}

	/// Array capability.
	pub fn array() -> Self {
		Self::of(ValueKind::Array)
	}

	/// Marks the capability as required.
	pub fn required(mut self) -> Self {
		self.presence = true;
		self
	}

	/// Restricts the value to one of `values`.
	pub fn one_of<I, S>(mut self, values: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.inclusion = values.into_iter().map(Into::into).collect();
		self
	}

	/// Restricts the value to one of `values`, ignoring case.
	pub fn one_of_ignore_case<I, S>(mut self, values: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.inclusion_case_insensitive = values.into_iter().map(Into::into).collect();
		self
	}

	pub fn is_boolean(&self) -> bool {
		self.kind == Some(ValueKind::Boolean)
	}

	pub fn is_number(&self) -> bool {
		self.kind == Some(ValueKind::Number)
	}

	/// Checks `value` against this constraint, returning a message per failure.
	pub fn check(&self, name: &str, value: Option<&CapValue>) -> Vec<String> {
		let mut failures = Vec::new();
		let value = match value {
			Some(v) if !v.is_absent() => v,
			_ => {
				if self.presence {
					failures.push(format!("'{name}' can't be blank"));
				}
				return failures;
			}
		};

		if let Some(kind) = self.kind {
			if !kind.matches(value) {
				failures.push(format!(
					"'{name}' must be of type {}, got {} {value}",
					kind.name(),
					value.type_name()
				));
			}
		}

		if !self.inclusion.is_empty() {
			let ok = value.as_str().is_some_and(|s| self.inclusion.iter().any(|allowed| allowed == s));
			if !ok {
				failures.push(format!("'{name}' {value} is not included in the list {:?}", self.inclusion));
			}
		}

		if !self.inclusion_case_insensitive.is_empty() {
			let ok = value.as_str().is_some_and(|s| {
				self.inclusion_case_insensitive
					.iter()
					.any(|allowed| allowed.eq_ignore_ascii_case(s))
			});
			if !ok {
				failures.push(format!(
					"'{name}' {value} is not included in the list {:?}",
					self.inclusion_case_insensitive
				));
			}
		}

		failures
	}
}

/// Constraint table keyed by capability name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Constraints(IndexMap<String, Constraint>);

impl Constraints {
	pub fn new() -> Self {
		Self::default()
	}

	/// Constraints every driver inherits.
	pub fn base() -> Self {
		Self::new()
			.with("platformName", Constraint::string().required())
			.with("deviceName", Constraint::string().required())
			.with("platformVersion", Constraint::string())
			.with("newCommandTimeout", Constraint::number())
			.with("automationName", Constraint::string())
			.with("autoLaunch", Constraint::boolean())
			.with("app", Constraint::string())
			.with("udid", Constraint::string())
			.with("orientation", Constraint::default().one_of(["LANDSCAPE", "PORTRAIT"]))
			.with("autoWebview", Constraint::boolean())
			.with("noReset", Constraint::boolean())
			.with("fullReset", Constraint::boolean())
			.with("language", Constraint::string())
			.with("locale", Constraint::string())
			.with("eventTimings", Constraint::boolean())
			.with("printPageSourceOnFindFailure", Constraint::boolean())
	}

	/// Adds or replaces the constraint for `name`.
	pub fn with(mut self, name: impl Into<String>, constraint: Constraint) -> Self {
		self.0.insert(name.into(), constraint);
		self
	}

	/// Overlays `other` onto this table; entries in `other` win.
	pub fn extend(mut self, other: Constraints) -> Self {
		self.0.extend(other.0);
		self
	}

	pub fn get(&self, name: &str) -> Option<&Constraint> {
		self.0.get(name)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&String, &Constraint)> {
		self.0.iter()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Names of boolean-typed capabilities.
	pub fn boolean_caps(&self) -> impl Iterator<Item = &str> {
		self.0.iter().filter(|(_, c)| c.is_boolean()).map(|(name, _)| name.as_str())
	}

	/// Names of numeric capabilities.
	pub fn numeric_caps(&self) -> impl Iterator<Item = &str> {
		self.0.iter().filter(|(_, c)| c.is_number()).map(|(name, _)| name.as_str())
	}
}
