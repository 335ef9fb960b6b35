//! Error types for the protocol layer.
//!
//! Each crate in Netwars defines its own error enum. A `ProtocolError`
//! means the bytes on the wire were the problem, not the network or the
//! game rules.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, an unknown `type` tag, missing
    /// required fields, or wrong data types.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A partial object grew past the framer's limit and was discarded.
    #[error("frame exceeded {limit} bytes and was discarded")]
    FrameTooLarge { limit: usize },

    /// The registration preamble was not a usable username.
    #[error("invalid registration: {0}")]
    InvalidRegistration(String),
}
