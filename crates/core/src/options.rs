//! Session options and reset policy resolution.
//!
//! Options are the driver's internal view of a session: driver defaults,
//! overlaid with the validated capabilities, overlaid with reset flags derived
//! by [`resolve_reset_policy`]. [`build_options`] applies those layers in that
//! order.

use drivekit_protocol::{CapValue, Capabilities};
use serde::Serialize;

use crate::error::{Error, Result};

/// Internal session options. Same shape as capabilities, superset of keys.
pub type Options = Capabilities;

pub const NO_RESET: &str = "noReset";
pub const FULL_RESET: &str = "fullReset";
pub const FAST_RESET: &str = "fastReset";
pub const SKIP_UNINSTALL: &str = "skipUninstall";
pub const APP: &str = "app";

/// Reset behaviour derived from the user's reset flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPolicy {
	pub no_reset: bool,
	pub full_reset: bool,
	pub fast_reset: bool,
	pub skip_uninstall: bool,
}

/// Clones `defaults` and overlays `caps` onto it.
pub fn merge_options(defaults: &Options, caps: &Capabilities) -> Options {
	let mut opts = defaults.clone();
	for (name, value) in caps {
		opts.insert(name.clone(), value.clone());
	}
	opts
}

/// Full option pipeline: defaults, then capabilities, then reset flags and `app` cleanup.
pub fn build_options(defaults: &Options, caps: &Capabilities) -> Result<(Options, ResetPolicy)> {
	let mut opts = merge_options(defaults, caps);
	let policy = resolve_reset_policy(&mut opts)?;
	clear_blank_app(&mut opts);
	Ok((opts, policy))
}

fn flag(opts: &Options, name: &str) -> bool {
	opts.get(name).and_then(CapValue::as_bool) == Some(true)
}

/// Derives `fastReset`/`skipUninstall` and settles `noReset`/`fullReset`.
///
/// Writes exactly the four reset keys into `opts`. Both `noReset` and
/// `fullReset` set to `true` is rejected before anything is written.
pub fn resolve_reset_policy(opts: &mut Options) -> Result<ResetPolicy> {
	let mut no_reset = flag(opts, NO_RESET);
	let mut full_reset = flag(opts, FULL_RESET);

	if no_reset && full_reset {
		return Err(Error::InvalidArgument(
			"The 'noReset' and 'fullReset' capabilities are mutually exclusive and should not both be set to true. \
			 You probably meant to just use 'fullReset' on its own"
				.to_string(),
		));
	}

	if no_reset {
		full_reset = false;
	} else if full_reset {
		no_reset = false;
	}
	let fast_reset = !full_reset && !no_reset;
	let skip_uninstall = fast_reset || no_reset;

	opts.insert(NO_RESET.to_string(), CapValue::Bool(no_reset));
	opts.insert(FULL_RESET.to_string(), CapValue::Bool(full_reset));
	opts.insert(FAST_RESET.to_string(), CapValue::Bool(fast_reset));
	opts.insert(SKIP_UNINSTALL.to_string(), CapValue::Bool(skip_uninstall));

	Ok(ResetPolicy {
		no_reset,
		full_reset,
		fast_reset,
		skip_uninstall,
	})
}

/// Replaces a whitespace-only `app` with [`CapValue::Absent`].
pub fn clear_blank_app(opts: &mut Options) {
	if let Some(value) = opts.get_mut(APP) {
		if value.as_str().is_some_and(|app| app.trim().is_empty()) {
			*value = CapValue::Absent;
		}
	}
}
