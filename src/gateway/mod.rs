//! Seam between the diagnostic layer and the vendor gateway client.
//!
//! A remote gateway service hands out diagnostic sessions keyed by a ticket
//! number. Within a session the client configures buses on the OBD connector
//! and opens ISO-TP sockets bound to individual ECUs. All transport concerns
//! (segmentation, flow control, wire timeouts) live on the gateway side of
//! these traits; implementations only move payloads.
//!
//! The following implementations exist:
//! * Vendor client bindings (out of tree, provided by the gateway vendor)
//! * [simulation::SimulationGateway] - in-memory implementation for tests

pub mod bus;
pub mod simulation;

pub use bus::{BusConfig, ChannelConfig, TransceiverSpeed};

use chrono::{DateTime, Utc};

/// Gateway operation result
pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Clone, Debug, thiserror::Error)]
/// Error produced by the gateway transport
pub enum GatewayError {
    /// The gateway rejected the ticket (unknown, expired or already claimed)
    #[error("Gateway rejected ticket: {0}")]
    TicketRejected(String),
    /// No reply arrived on the socket within the requested timeout
    #[error("Timeout waiting for a reply on the socket")]
    ReadTimeout,
    /// The session was closed or interrupted underneath the socket
    #[error("Gateway session is no longer active")]
    SessionClosed,
    /// Request addressed to a bus that was never configured in this session
    #[error("Bus '{0}' has not been configured")]
    UnknownBus(String),
    /// Underlying vendor API error
    #[error("Gateway API error ({code}): {desc}")]
    APIError {
        /// Vendor error code
        code: u32,
        /// Vendor error description
        desc: String,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
/// State of a remote session as reported by the gateway
pub enum SessionState {
    /// Session is live and able to carry diagnostic traffic
    Active,
    /// Session exists but the vehicle side has not connected yet
    Pending,
    /// Session was finished or interrupted
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Bookkeeping entry for one remote session, used for listing and
/// interrupting sessions left behind by a crashed client
pub struct SessionInfo {
    /// Gateway assigned session identifier
    pub id: String,
    /// Current state of the session
    pub state: SessionState,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
/// Result reported back to the gateway when finishing a session
pub enum SessionOutcome {
    /// The diagnostic work completed
    Success,
    /// The diagnostic work failed; the gateway may flag the ticket for review
    Failure,
}

/// A validated gateway ticket reference.
///
/// Tickets are numeric references issued by the gateway service operator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TicketId(String);

impl TicketId {
    /// Validates and wraps a raw ticket string. Tickets must be non-empty
    /// and numeric.
    pub fn new(raw: &str) -> Result<Self, crate::DiagError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(crate::DiagError::InvalidTicket(raw.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the ticket as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Entry point trait for a gateway service. Opens sessions and manages the
/// session list.
pub trait GatewayClient {
    /// Session type handed out by this gateway
    type Session: GatewaySession;

    /// Opens a diagnostic session on the given ticket
    fn open_ticket(&mut self, ticket: &TicketId) -> GatewayResult<Self::Session>;

    /// Lists the sessions currently known to the gateway for this account
    fn active_sessions(&mut self) -> GatewayResult<Vec<SessionInfo>>;

    /// Forcefully interrupts a session by its gateway identifier
    fn interrupt_session(&mut self, session_id: &str) -> GatewayResult<()>;
}

/// One live diagnostic session on a vehicle
pub trait GatewaySession {
    /// Socket type handed out by this session
    type Socket: DiagSocket;

    /// Configures the OBD connector buses for this session. Must be called
    /// before any socket is opened on those buses.
    fn configure_buses(&mut self, buses: &[BusConfig]) -> GatewayResult<()>;

    /// Opens an ISO-TP socket bound to one ECU address pair
    fn isotp_socket(&mut self, cfg: ChannelConfig) -> GatewayResult<Self::Socket>;

    /// Finishes the session, reporting the outcome to the gateway
    fn finish(self, outcome: SessionOutcome) -> GatewayResult<()>;
}

/// A bidirectional ISO-TP socket bound to a single ECU.
///
/// The gateway performs exactly one ISO-TP exchange per [DiagSocket::request]
/// call; late replies (for example after a negative `responsePending`) are
/// collected with [DiagSocket::recv].
pub trait DiagSocket {
    /// Returns the channel configuration this socket was opened with
    fn channel(&self) -> &ChannelConfig;

    /// Writes a payload without waiting for a reply
    fn send(&mut self, payload: &[u8]) -> GatewayResult<()>;

    /// Writes a payload and waits up to `timeout_ms` for the ECU's reply
    fn request(&mut self, payload: &[u8], timeout_ms: u32) -> GatewayResult<Vec<u8>>;

    /// Waits up to `timeout_ms` for a further reply without sending anything
    fn recv(&mut self, timeout_ms: u32) -> GatewayResult<Vec<u8>>;

    /// Closes the socket. Further IO returns [GatewayError::SessionClosed]
    fn close(&mut self) -> GatewayResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_validation() {
        assert!(TicketId::new("8066797").is_ok());
        assert!(TicketId::new(" 8066797 ").is_ok());
        assert!(TicketId::new("").is_err());
        assert!(TicketId::new("ticket-1").is_err());
        assert_eq!(TicketId::new("12345").unwrap().as_str(), "12345");
    }
}
