//! Capability parsing, coercion and validation.
//!
//! A create-session request passes through three stages:
//!
//! 1. **Dialect resolution**: W3C envelopes go through [`CapabilityValidator::process_w3c`];
//!    legacy maps are taken as sent
//! 2. **Normalization**: wire strings are coerced per the constraint table ([`normalize`])
//! 3. **Driver validation**: the coerced map is checked again, since coercion
//!    changes which constraints hold

mod constraints;
mod normalize;
mod validate;

pub use constraints::{Constraint, Constraints, ValueKind};
pub use normalize::{Coercion, Normalized, normalize};
pub use validate::{CapabilityValidator, ConstraintValidator, check_caps, merge_candidates};

use drivekit_protocol::{Capabilities, Protocol, W3cCapabilities};

use crate::error::Result;

/// Capabilities ready to be merged into session options.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCaps {
	pub caps: Capabilities,
	pub protocol: Protocol,
	pub coercions: Vec<Coercion>,
}

/// Runs the dialect-appropriate validation path, then normalizes and revalidates.
///
/// The modern path is taken whenever `w3c` is supplied. On the legacy path
/// `required` entries are overlaid on `desired`.
pub async fn resolve_caps(
	validator: &dyn CapabilityValidator,
	desired: Option<&Capabilities>,
	required: Option<&Capabilities>,
	w3c: Option<&W3cCapabilities>,
	constraints: &Constraints,
	strict: bool,
) -> Result<ResolvedCaps> {
	let (raw, protocol) = match w3c {
		Some(envelope) => (validator.process_w3c(envelope, constraints, strict).await?, Protocol::W3c),
		None => {
			let mut caps = desired.cloned().unwrap_or_default();
			if let Some(required) = required {
				caps.extend(required.iter().map(|(k, v)| (k.clone(), v.clone())));
			}
			(caps, Protocol::Mjsonwp)
		}
	};

	let Normalized { caps, coercions } = normalize(&raw, constraints);
	validator.validate(&caps, constraints).await?;

	Ok(ResolvedCaps {
		caps,
		protocol,
		coercions,
	})
}
