//! Codec trait and the JSON implementation used on the wire.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The rest of the server only sees the [`Codec`] trait; [`JsonCodec`]
//! is the one format clients speak today.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task for the life of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a complete outbound message.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes one framed message.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or
    /// don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that writes one JSON object per line.
///
/// Outbound messages are suffixed with `\n`. Inbound messages are not
/// required to be newline-delimited; the [`Framer`](crate::Framer) finds
/// their boundaries structurally.
///
/// ## Example
///
/// ```rust
/// use netwars_protocol::{Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let bytes = codec.encode(&serde_json::json!({ "type": "disable_draw" })).unwrap();
/// assert_eq!(bytes, b"{\"type\":\"disable_draw\"}\n");
///
/// let value: serde_json::Value = codec.decode(&bytes).unwrap();
/// assert_eq!(value["type"], "disable_draw");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        let mut bytes =
            serde_json::to_vec(value).map_err(ProtocolError::Encode)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
