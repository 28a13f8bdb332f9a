//! Wire types for automation session protocols.
//!
//! This crate contains the serde-serializable types a driver receives from
//! and returns to its clients. Two protocol generations share these types:
//!
//! - **Legacy** (JSON wire protocol): flat `desiredCapabilities` maps and
//!   `{type, ms}` timeout payloads
//! - **W3C**: `{alwaysMatch, firstMatch}` capability envelopes and
//!   `{script, pageLoad, implicit}` timeout payloads
//!
//! Types here are pure data. Coercion, validation and session policy live in
//! `drivekit`.

pub mod caps;
pub mod session;
pub mod timeouts;

pub use caps::*;
pub use session::*;
pub use timeouts::*;
