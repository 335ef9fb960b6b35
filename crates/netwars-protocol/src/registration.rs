//! The registration preamble: a raw username sent before any JSON.
//!
//! A client's first bytes on a fresh socket are its username, as plain
//! UTF-8 with no envelope. A client may pipeline its first JSON message
//! right behind the name, so everything from the first `{` on is handed
//! back for framing.

use crate::{PlayerId, ProtocolError};

/// Longest username accepted, in bytes.
pub const MAX_USERNAME_LEN: usize = 64;

/// Splits a first read into the username and any bytes that follow it.
///
/// # Errors
/// Returns [`ProtocolError::InvalidRegistration`] if the name is empty,
/// too long, or not valid UTF-8.
pub fn parse_registration(
    data: &[u8],
) -> Result<(PlayerId, &[u8]), ProtocolError> {
    let split = data.iter().position(|&b| b == b'{').unwrap_or(data.len());
    let (name, rest) = data.split_at(split);

    let name = std::str::from_utf8(name)
        .map_err(|e| ProtocolError::InvalidRegistration(e.to_string()))?
        .trim();

    if name.is_empty() {
        return Err(ProtocolError::InvalidRegistration(
            "empty username".into(),
        ));
    }
    if name.len() > MAX_USERNAME_LEN {
        return Err(ProtocolError::InvalidRegistration(format!(
            "username longer than {MAX_USERNAME_LEN} bytes"
        )));
    }

    Ok((PlayerId::new(name), rest))
}
