#![warn(
    missing_docs,
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications,
    clippy::uninlined_format_args
)]

//! A crate for running UDS (ISO14229) diagnostic workflows against vehicle ECUs
//! that sit behind a remote CAN/ISO-TP gateway service.
//!
//! Remote gateway services expose a vehicle's CAN buses over the network: a
//! technician opens a session on a ticket, configures one or more buses on the
//! OBD connector, and is handed ISO-TP sockets bound to individual ECUs. The
//! gateway owns all of the transport concerns (CAN framing, ISO-TP
//! segmentation/reassembly, low level timeouts). What remains on the client
//! side, and what this crate implements, is the diagnostic layer:
//!
//! * Building UDS requests and classifying the ECU's reply (positive response
//!   prefix checking, negative response code interpretation, busy/pending
//!   handling, bounded retries). See [uds].
//! * Decoding identification data (VIN, part numbers, software versions) and
//!   diagnostic trouble codes from raw response payloads. See
//!   [uds::data_ident] and [dtc].
//! * Orchestrating multi-ECU scans over the well-known VAG module address
//!   table, including CAN ID sweep discovery for unknown vehicles. See
//!   [vehicle::scan].
//! * Maintenance workflows built from those primitives: service counter
//!   resets with read-back verification and routine control sequences. See
//!   [vehicle::service_reset] and [uds::routine].
//!
//! The gateway itself is abstracted behind the traits in [gateway], with an
//! in-memory simulation implementation for testing diagnostic logic without a
//! vehicle.

use crate::gateway::GatewayError;

pub mod dtc;
pub mod gateway;
pub mod report;
pub mod uds;
pub mod vehicle;

pub(crate) mod helpers;

/// Diagnostic operation result
pub type DiagServerResult<T> = Result<T, DiagError>;

#[derive(Clone, Debug, thiserror::Error)]
/// Diagnostic layer error
pub enum DiagError {
    /// The requested operation is not supported by the target ECU
    #[error("Operation not supported by the ECU")]
    NotSupported,
    /// Diagnostic error code from the ECU itself
    #[error("ECU Negative response. Error 0x{:02X?}, definition: {:?}", code, def)]
    ECUError {
        /// Raw negative response code from the ECU
        code: u8,
        /// Negative response code definition according to ISO14229
        def: Option<String>,
    },
    /// Response empty
    #[error("ECU did not respond to the request")]
    EmptyResponse,
    /// ECU responded with a message that wasn't a reply for the sent request
    #[error("ECU response is out of order")]
    WrongMessage,
    /// ECU responded with a message, but the length was incorrect
    #[error("ECU response size was not the correct length")]
    InvalidResponseLength,
    /// A parameter given to the function is invalid. Check the function's
    /// documentation for more information
    #[error("Diagnostic function parameter invalid")]
    ParameterInvalid,
    /// The supplied gateway ticket reference is not usable
    #[error("Invalid gateway ticket '{0}'")]
    InvalidTicket(String),
    /// Mismatched data identifier in the ECU's response
    #[error(
        "Requested Ident 0x{:04X?}, but received ident 0x{:04X?}",
        want,
        received
    )]
    MismatchedIdentResponse {
        /// Requested data identifier
        want: u16,
        /// Received data identifier from the ECU
        received: u16,
    },
    /// Error from the underlying gateway transport
    #[error("Gateway transport error")]
    Gateway(
        #[from]
        #[source]
        GatewayError,
    ),
}
