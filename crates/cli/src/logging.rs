use tracing_subscriber::EnvFilter;

/// Overrides the `-v` derived filter when set, e.g. `DRIVEKIT_LOG=drivekit.caps=debug`.
pub const LOG_ENV: &str = "DRIVEKIT_LOG";

/// Filter directives for a `-v` count.
///
/// Capability coercions are logged as warnings, so the quietest level still
/// shows them.
pub fn directives(verbosity: u8) -> &'static str {
	match verbosity {
		0 => "warn",
		1 => "warn,drivekit=info",
		2 => "warn,drivekit=debug",
		_ => "debug",
	}
}

pub fn init_logging(verbosity: u8) {
	let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(directives(verbosity)));

	// stdout carries the JSON report
	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(verbosity > 0)
		.without_time()
		.compact()
		.try_init();
}
