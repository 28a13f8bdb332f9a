use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use drivekit::{BaseDriver, Capabilities, DriverConfig, NewSessionRequest, Options, Protocol, ResetPolicy};
use serde::Serialize;
use tracing::debug;

use crate::cli::{Cli, Command};

/// What `drivekit session` prints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionReport<'a> {
	session_id: &'a str,
	protocol: Protocol,
	capabilities: &'a Capabilities,
	options: &'a Options,
	reset: ResetPolicy,
}

pub async fn dispatch(cli: Cli) -> Result<()> {
	let config = load_config(cli.config.as_deref())?;
	match cli.command {
		Command::Session { request } => session(config, &request).await,
		Command::Constraints => {
			println!("{}", serde_json::to_string_pretty(&config.constraints)?);
			Ok(())
		}
	}
}

async fn session(config: DriverConfig, request_path: &Path) -> Result<()> {
	let body = read_body(request_path)?;
	let request = parse_request(&body)?;

	let mut driver = BaseDriver::new(config);
	driver
		.create_session(
			request.desired_capabilities,
			request.required_capabilities,
			request.capabilities,
		)
		.await?;

	let Some(session) = driver.session().active() else {
		anyhow::bail!("driver reported success without an active session");
	};
	let report = SessionReport {
		session_id: &session.id,
		protocol: session.protocol,
		capabilities: &session.capabilities,
		options: &session.options,
		reset: session.reset,
	};
	println!("{}", serde_json::to_string_pretty(&report)?);

	driver.delete_session();
	Ok(())
}

fn load_config(path: Option<&Path>) -> Result<DriverConfig> {
	match path {
		Some(path) => {
			debug!(target = "drivekit.cli", path = %path.display(), "loading driver config");
			DriverConfig::load(path).with_context(|| format!("Failed to load driver config: {}", path.display()))
		}
		None => Ok(DriverConfig::default()),
	}
}

fn read_body(path: &Path) -> Result<String> {
	if path == Path::new("-") {
		let mut body = String::new();
		std::io::stdin().read_to_string(&mut body).context("Failed to read request from stdin")?;
		return Ok(body);
	}
	std::fs::read_to_string(path).with_context(|| format!("Failed to read request: {}", path.display()))
}

/// Accepts a full create-session body, or a bare legacy capability map.
fn parse_request(body: &str) -> Result<NewSessionRequest> {
	let request: NewSessionRequest = serde_json::from_str(body).context("Request is not a JSON object")?;
	if request.desired_capabilities.is_some() || request.required_capabilities.is_some() || request.capabilities.is_some()
	{
		return Ok(request);
	}

	let caps: Capabilities = serde_json::from_str(body)?;
	Ok(NewSessionRequest {
		desired_capabilities: Some(caps),
		..NewSessionRequest::default()
	})
}
