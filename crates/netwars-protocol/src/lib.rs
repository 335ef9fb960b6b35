//! Wire protocol for Netwars.
//!
//! This crate defines how bytes on a socket become messages:
//!
//! - **Registration** ([`parse_registration`]): the raw username a
//!   client sends before anything else.
//! - **Framing** ([`Framer`]): cutting complete JSON objects out of a
//!   byte stream.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): converting framed bytes
//!   to and from Rust types.
//! - **Addressing** ([`PlayerId`], [`Recipient`]): who a message is
//!   from and who it goes to.
//!
//! # Architecture
//!
//! ```text
//! Transport (bytes) → Protocol (frames, messages) → Session / Match
//! ```
//!
//! The protocol layer knows nothing about game rules; message enums are
//! defined by the match crate and only pass through the codec here.

mod codec;
mod error;
mod framer;
mod registration;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use framer::{Framer, MAX_FRAME_LEN};
pub use registration::{MAX_USERNAME_LEN, parse_registration};
pub use types::{PlayerId, Recipient};
