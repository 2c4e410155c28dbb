//! # Diameter
//!
//! Rust implementation of the Diameter base protocol ([RFC 6733]) and its
//! watchdog extension ([RFC 3539]): AVP and message codec, peer state
//! machine, connection manager, application router and a Credit-Control
//! ([RFC 4006]) application as a worked example.
//!
//! [RFC 6733]: https://tools.ietf.org/html/rfc6733
//! [RFC 3539]: https://tools.ietf.org/html/rfc3539
//! [RFC 4006]: https://tools.ietf.org/html/rfc4006
//!
//! ## Examples
//! * `demos/client.rs` - connects to a peer, sends a request, prints the answer.
//! * `demos/server.rs` - listens for peers and answers requests.
//! * `demos/load_generator.rs` - drives a batch of concurrent CCR-I/CCR-T sessions.

pub mod avp;
pub mod commands;
pub mod constants;
pub mod diameter;
pub mod dictionary;
pub mod error;
pub mod node;

pub use crate::diameter::flags;
pub use crate::diameter::{ApplicationId, CommandCode, DiameterHeader, DiameterMessage, GenericMessage};
pub use crate::error::{Error, Result};
