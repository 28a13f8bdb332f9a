use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use drivekit::caps::check_caps;
use drivekit::{
	BaseDriver, CapValue, Capabilities, CapabilityValidator, Constraint, Constraints, DriverConfig, Error, Protocol,
	Result, SessionState, ShutdownReason, W3cCapabilities,
};
use serde_json::json;

fn caps(value: serde_json::Value) -> Capabilities {
	serde_json::from_value(value).unwrap()
}

fn base_caps() -> Capabilities {
	caps(json!({"platformName": "iOS", "deviceName": "iPhone 15"}))
}

#[tokio::test]
async fn create_then_get_sessions_reports_one() {
	let mut driver = BaseDriver::default();
	let (id, returned) = driver.create_session(Some(base_caps()), None, None).await.unwrap();

	let sessions = driver.get_sessions();
	assert_eq!(sessions.len(), 1);
	assert_eq!(sessions[0].id, id);
	assert_eq!(sessions[0].capabilities, returned);
	assert_eq!(driver.session_id(), Some(id.as_str()));
}

#[tokio::test]
async fn second_create_fails_and_keeps_first_session() {
	let mut driver = BaseDriver::default();
	let (id, returned) = driver.create_session(Some(base_caps()), None, None).await.unwrap();

	let other = caps(json!({"platformName": "Android", "deviceName": "Pixel"}));
	let err = driver.create_session(Some(other), None, None).await.unwrap_err();

	assert!(err.is_session_not_created());
	assert_eq!(err.w3c_code(), "session not created");
	assert_eq!(driver.session_id(), Some(id.as_str()));
	assert_eq!(driver.capabilities(), Some(&returned));
}

#[tokio::test]
async fn delete_then_get_sessions_is_empty() {
	let mut driver = BaseDriver::default();
	driver.create_session(Some(base_caps()), None, None).await.unwrap();

	driver.delete_session();

	assert!(driver.get_sessions().is_empty());
	assert!(driver.get_session().is_none());
	assert!(driver.capabilities().is_none());
	assert_eq!(driver.session(), &SessionState::NoSession);
}

#[tokio::test]
async fn delete_without_session_is_noop() {
	let mut driver = BaseDriver::default();
	driver.delete_session();
	driver.delete_session();
	assert!(driver.get_sessions().is_empty());
}

#[tokio::test]
async fn sessions_get_fresh_ids() {
	let mut driver = BaseDriver::default();
	let (first, _) = driver.create_session(Some(base_caps()), None, None).await.unwrap();
	driver.delete_session();
	let (second, _) = driver.create_session(Some(base_caps()), None, None).await.unwrap();
	assert_ne!(first, second);
}

#[tokio::test]
async fn get_session_without_session_is_absent() {
	assert!(BaseDriver::default().get_session().is_none());
}

#[tokio::test]
async fn string_flags_are_coerced_and_returned_typed() {
	let mut driver = BaseDriver::default();
	let mut requested = base_caps();
	requested.insert("noReset".into(), "True".into());
	requested.insert("newCommandTimeout".into(), "120".into());

	let (_, returned) = driver.create_session(Some(requested), None, None).await.unwrap();

	assert_eq!(returned["noReset"], CapValue::Bool(true));
	assert_eq!(returned["newCommandTimeout"], CapValue::Int(120));
	assert_eq!(driver.new_command_timeout_ms(), 120_000);
}

#[tokio::test]
async fn fractional_new_command_timeout_in_seconds() {
	let mut driver = BaseDriver::default();
	let mut requested = base_caps();
	requested.insert("newCommandTimeout".into(), "2.5".into());

	driver.create_session(Some(requested), None, None).await.unwrap();

	assert_eq!(driver.new_command_timeout_ms(), 2_500);
}

#[tokio::test]
async fn conflicting_resets_fail_without_session() {
	let mut driver = BaseDriver::default();
	let mut requested = base_caps();
	requested.insert("noReset".into(), true.into());
	requested.insert("fullReset".into(), "true".into());

	let err = driver.create_session(Some(requested), None, None).await.unwrap_err();

	assert!(err.is_invalid_argument());
	assert!(driver.get_sessions().is_empty());
	assert!(driver.session_id().is_none());
}

#[tokio::test]
async fn invalid_caps_fail_without_session() {
	let mut driver = BaseDriver::default();
	let err = driver
		.create_session(Some(caps(json!({"platformName": "iOS"}))), None, None)
		.await
		.unwrap_err();

	assert!(err.is_capability_validation());
	assert!(driver.session_id().is_none());
}

#[tokio::test]
async fn options_merge_defaults_caps_and_reset_flags() {
	let config = DriverConfig::default().with_default_options(caps(json!({
		"tmpDir": "/var/tmp",
		"platformName": "default",
		"skipUninstall": false
	})));
	let mut driver = BaseDriver::new(config);
	let mut requested = base_caps();
	requested.insert("app".into(), "   ".into());

	driver.create_session(Some(requested), None, None).await.unwrap();
	let options = driver.options().unwrap();

	assert_eq!(options["tmpDir"].as_str(), Some("/var/tmp"));
	assert_eq!(options["platformName"].as_str(), Some("iOS"));
	assert_eq!(options["fastReset"], CapValue::Bool(true));
	assert_eq!(options["skipUninstall"], CapValue::Bool(true));
	assert!(options["app"].is_absent());
	assert_eq!(driver.capabilities().unwrap()["app"].as_str(), Some("   "));
}

#[tokio::test]
async fn defaults_are_cloned_per_session() {
	let config = DriverConfig::default().with_default_options(caps(json!({"tmpDir": "/var/tmp"})));
	let mut driver = BaseDriver::new(config);
	let mut requested = base_caps();
	requested.insert("tmpDir".into(), "/custom".into());

	driver.create_session(Some(requested), None, None).await.unwrap();
	driver.delete_session();
	driver.create_session(Some(base_caps()), None, None).await.unwrap();

	assert_eq!(driver.options().unwrap()["tmpDir"].as_str(), Some("/var/tmp"));
	assert_eq!(driver.config().default_options["tmpDir"].as_str(), Some("/var/tmp"));
}

#[tokio::test]
async fn w3c_capabilities_select_modern_dialect() {
	let mut driver = BaseDriver::default();
	let envelope = W3cCapabilities::always(caps(json!({"platformName": "Android"})))
		.first_match(vec![caps(json!({"automationName": "x"})), caps(json!({"deviceName": "Pixel"}))]);

	let (_, returned) = driver
		.create_session(Some(base_caps()), None, Some(envelope))
		.await
		.unwrap();

	assert_eq!(returned["platformName"].as_str(), Some("Android"));
	assert_eq!(returned["deviceName"].as_str(), Some("Pixel"));
	assert_eq!(driver.session().active().unwrap().protocol, Protocol::W3c);
}

#[tokio::test]
async fn lenient_w3c_strings_are_coerced_after_matching() {
	let mut driver = BaseDriver::new(DriverConfig::default().with_strict_caps(false));
	let envelope = W3cCapabilities::always(caps(json!({
		"platformName": "Android",
		"deviceName": "Pixel",
		"noReset": "false"
	})));

	let (_, returned) = driver.create_session(None, None, Some(envelope)).await.unwrap();

	assert_eq!(returned["noReset"], CapValue::Bool(false));
}

#[tokio::test]
async fn strict_w3c_accepts_wire_strings_and_coerces_them() {
	let mut driver = BaseDriver::default();
	let envelope = W3cCapabilities::always(caps(json!({
		"platformName": "Android",
		"deviceName": "Pixel",
		"noReset": "true",
		"newCommandTimeout": "60"
	})));

	let (_, returned) = driver.create_session(None, None, Some(envelope)).await.unwrap();

	assert_eq!(returned["noReset"], CapValue::Bool(true));
	assert_eq!(returned["newCommandTimeout"], CapValue::Int(60));
	assert_eq!(driver.new_command_timeout_ms(), 60_000);
}

#[tokio::test]
async fn strict_w3c_rejects_uncoercible_strings() {
	let mut driver = BaseDriver::default();
	let envelope = W3cCapabilities::always(caps(json!({
		"platformName": "Android",
		"deviceName": "Pixel",
		"noReset": "maybe"
	})));

	let err = driver.create_session(None, None, Some(envelope)).await.unwrap_err();

	assert!(err.is_capability_validation());
	assert!(driver.session_id().is_none());
}

#[tokio::test]
async fn non_string_app_is_rejected() {
	let mut driver = BaseDriver::default();
	let mut requested = base_caps();
	requested.insert("app".into(), CapValue::Int(42));

	let err = driver.create_session(Some(requested), None, None).await.unwrap_err();

	assert!(err.is_capability_validation(), "{err}");
	assert!(err.to_string().contains("app"));
	assert!(driver.session_id().is_none());
}

#[tokio::test]
async fn legacy_caps_select_legacy_dialect() {
	let mut driver = BaseDriver::default();
	driver.create_session(Some(base_caps()), None, None).await.unwrap();
	assert_eq!(driver.session().active().unwrap().protocol, Protocol::Mjsonwp);
}

#[tokio::test]
async fn driver_specific_constraints_apply() {
	let config = DriverConfig::default().with_constraints(Constraints::new().with("wdaLocalPort", Constraint::number()));
	let mut driver = BaseDriver::new(config);
	let mut requested = base_caps();
	requested.insert("wdaLocalPort".into(), "8100".into());

	let (_, returned) = driver.create_session(Some(requested), None, None).await.unwrap();

	assert_eq!(returned["wdaLocalPort"], CapValue::Int(8100));
}

#[tokio::test]
async fn event_timings_attach_history() {
	let mut driver = BaseDriver::default();
	let mut requested = base_caps();
	requested.insert("eventTimings".into(), true.into());
	driver.create_session(Some(requested), None, None).await.unwrap();
	driver.log_event("appLaunched");

	let session = driver.get_session().unwrap();
	let CapValue::Map(events) = &session["events"] else {
		panic!("expected events map, got {:?}", session.get("events"));
	};
	assert!(events.contains_key("newSessionRequested"));
	assert!(events.contains_key("newSessionStarted"));
	assert!(events.contains_key("appLaunched"));
	assert!(!driver.capabilities().unwrap().contains_key("events"));
}

#[tokio::test]
async fn no_event_timings_returns_plain_caps() {
	let mut driver = BaseDriver::default();
	let (_, returned) = driver.create_session(Some(base_caps()), None, None).await.unwrap();
	assert_eq!(driver.get_session(), Some(returned));
}

#[tokio::test]
async fn shutdown_signal_is_scoped_to_session() {
	let mut driver = BaseDriver::default();
	driver.create_session(Some(base_caps()), None, None).await.unwrap();
	let first = driver.on_unexpected_shutdown();
	driver.trigger_unexpected_shutdown(ShutdownReason::Crashed("instruments exited".into()));
	assert!(first.borrow().is_some());

	driver.delete_session();
	driver.create_session(Some(base_caps()), None, None).await.unwrap();
	let second = driver.on_unexpected_shutdown();

	assert!(second.borrow().is_none());
}

#[tokio::test]
async fn new_command_timeout_fires_shutdown() {
	let mut driver = BaseDriver::default();
	let mut requested = base_caps();
	requested.insert("newCommandTimeout".into(), CapValue::Float(0.01));
	driver.create_session(Some(requested), None, None).await.unwrap();
	let mut rx = driver.on_unexpected_shutdown();

	driver.start_new_command_timeout();
	tokio::time::timeout(Duration::from_secs(5), rx.changed())
		.await
		.unwrap()
		.unwrap();

	assert_eq!(*rx.borrow(), Some(ShutdownReason::NewCommandTimeout { timeout_ms: 10 }));
}

#[tokio::test]
async fn delete_session_clears_pending_timer() {
	let mut driver = BaseDriver::default();
	driver.create_session(Some(base_caps()), None, None).await.unwrap();
	driver.start_new_command_timeout();
	assert!(driver.new_command_timeout_pending());

	driver.delete_session();

	assert!(!driver.new_command_timeout_pending());
}

#[tokio::test]
async fn timer_does_not_start_without_session() {
	let mut driver = BaseDriver::default();
	driver.start_new_command_timeout();
	assert!(!driver.new_command_timeout_pending());
}

struct PickyValidator;

#[async_trait]
impl CapabilityValidator for PickyValidator {
	async fn process_w3c(&self, _caps: &W3cCapabilities, _constraints: &Constraints, _strict: bool) -> Result<Capabilities> {
		Err(Error::CapabilityValidation("w3c disabled".into()))
	}

	async fn validate(&self, caps: &Capabilities, constraints: &Constraints) -> Result<()> {
		check_caps(caps, constraints).map_err(|f| Error::CapabilityValidation(f.join("; ")))?;
		if caps.contains_key("forbidden") {
			return Err(Error::CapabilityValidation("forbidden capability".into()));
		}
		Ok(())
	}
}

#[tokio::test]
async fn custom_validator_is_consulted() {
	let mut driver = BaseDriver::default().with_validator(Arc::new(PickyValidator));

	let mut requested = base_caps();
	requested.insert("forbidden".into(), true.into());
	assert!(driver.create_session(Some(requested), None, None).await.is_err());

	let envelope = W3cCapabilities::always(base_caps());
	let err = driver.create_session(None, None, Some(envelope)).await.unwrap_err();
	assert!(err.to_string().contains("w3c disabled"));

	assert!(driver.create_session(Some(base_caps()), None, None).await.is_ok());
}
