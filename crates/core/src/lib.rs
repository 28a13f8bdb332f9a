//! Session lifecycle and capability negotiation for remote automation drivers.
//!
//! This crate is the part of a driver that sits between command dispatch and
//! the automation backend:
//!
//! - **Capabilities**: coercing wire strings, W3C capability matching and
//!   constraint validation ([`caps`])
//! - **Options**: merging driver defaults with capabilities and resolving
//!   reset flags ([`options`])
//! - **Sessions**: the single-session state machine ([`BaseDriver`])
//! - **Timeouts**: implicit wait and new-command timeout, propagated to
//!   managed drivers ([`timeouts`])
//!
//! # Architecture
//!
//! ```text
//! create-session ─▶ resolve_caps ─▶ normalize ─▶ validate ─▶ build_options ─▶ ActiveSession
//!                   (W3C / legacy)                           (reset policy)
//!
//! timeouts ─▶ TimeoutManager ─▶ TimeoutHandle ─┬─▶ managed driver
//!                                               └─▶ managed driver ─▶ ...
//! ```
//!
//! Wire transport, command routing and the backend itself live elsewhere.

pub mod caps;
pub mod config;
pub mod driver;
pub mod error;
pub mod options;
pub mod session;
pub mod timeouts;

pub use caps::{CapabilityValidator, Constraint, ConstraintValidator, Constraints, ValueKind};
pub use config::DriverConfig;
pub use driver::BaseDriver;
pub use drivekit_protocol::{
	CapValue, Capabilities, NewSessionRequest, Protocol, SessionDescriptor, TimeoutsRequest, W3cCapabilities,
};
pub use error::{Error, Result};
pub use options::{Options, ResetPolicy};
pub use session::{SessionState, ShutdownReason};
pub use timeouts::{TimeoutBackend, TimeoutHandle, TimeoutState};
