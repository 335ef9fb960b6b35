//! Unified error type for the Netwars server.

use netwars_match::MatchError;
use netwars_protocol::ProtocolError;
use netwars_session::SessionError;
use netwars_transport::TransportError;

/// Top-level error that wraps every layer's error.
///
/// The `#[from]` attribute on each variant lets `?` convert layer errors
/// automatically.
#[derive(Debug, thiserror::Error)]
pub enum NetwarsError {
    /// Bind, accept, send, or receive failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Bad registration, undecodable frame, or oversized frame.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Seat refused or reconnect rejected.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A rule violation.
    #[error(transparent)]
    Match(#[from] MatchError),
}
