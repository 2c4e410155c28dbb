//! Typed command structs for the base-protocol commands (capabilities
//! exchange, watchdog, disconnect, re-auth, abort-session, session-
//! terminate) and for Credit-Control (RFC 4006), the worked application
//! example. Everything else is handled as a `GenericMessage` -- see
//! `diameter::GenericMessage`.
//!
//! Each struct converts to and from a `DiameterMessage` via `TryFrom`/
//! `From`; AVPs the struct doesn't model are preserved in
//! `additional_avps` so a relay that only cares about a handful of fields
//! doesn't silently drop the rest.

pub mod abort_session;
pub mod capabilities_exchange;
pub mod credit_control;
pub mod device_watchdog;
pub mod disconnect_peer;
pub mod re_auth;
pub mod schema;
pub mod session_terminate;

pub use abort_session::{AbortSessionAnswer, AbortSessionRequest};
pub use capabilities_exchange::{CapabilitiesExchangeAnswer, CapabilitiesExchangeRequest};
pub use credit_control::{CreditControlAnswer, CreditControlRequest};
pub use device_watchdog::{DeviceWatchdogAnswer, DeviceWatchdogRequest};
pub use disconnect_peer::{DisconnectPeerAnswer, DisconnectPeerRequest};
pub use re_auth::{ReAuthAnswer, ReAuthRequest};
pub use session_terminate::{SessionTerminateAnswer, SessionTerminateRequest};
