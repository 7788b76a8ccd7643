//! Module for UDS (Unified diagnostic services - ISO14229) over a gateway
//! socket.
//!
//! [UdsClient] is a synchronous request engine: it frames a service request,
//! performs one exchange on the underlying [DiagSocket], and classifies the
//! ECU's reply. Negative `responsePending` and `busyRepeatRequest` replies
//! are handled transparently; everything else surfaces as a [DiagError].

use std::time::{Duration, Instant};

use automotive_diag::uds::{UdsCommand, UdsErrorByte, UdsSessionType, UdsSessionTypeByte};
use log::{debug, error, warn};

use crate::{
    gateway::{ChannelConfig, DiagSocket},
    helpers, DiagError, DiagServerResult,
};

pub mod data_ident;
pub mod read_dtc_information;
pub mod routine;

/// NRC 0x78 - request received, response pending
const NRC_RESPONSE_PENDING: u8 = 0x78;
/// NRC 0x21 - ECU busy, repeat the request
const NRC_BUSY_REPEAT: u8 = 0x21;
/// Maximum busyRepeatRequest resends within one attempt, after which the
/// negative response is surfaced
const BUSY_REPEAT_LIMIT: u32 = 3;

pub(crate) fn lookup_uds_nrc(x: u8) -> String {
    format!("{:?}", UdsErrorByte::from(x))
}

/// Checks if the response payload matches the request ServiceID.
/// The matching response SID is request + 0x40.
pub(crate) fn check_pos_response_id(sid: u8, resp: Vec<u8>) -> DiagServerResult<Vec<u8>> {
    if resp[0] != sid + 0x40 {
        error!(
            "ECU SID mismatch. Request SID was 0x{:02X}, response SID was {:02X?}",
            sid, resp[0]
        );
        Err(DiagError::WrongMessage)
    } else {
        debug!("ECU SID matches request");
        Ok(resp)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
/// Retry and timeout policy for UDS exchanges.
///
/// `busyRepeatRequest` replies are resent after a 500 ms wait, up to a
/// fixed limit of 3 resends within a single attempt; that limit is not
/// governed by [RequestPolicy::tries], which only spans whole attempts.
pub struct RequestPolicy {
    /// Number of attempts for a request before giving up. ECU negative
    /// responses are never retried; retries only apply to transport
    /// failures.
    pub tries: u32,
    /// Per-attempt reply timeout in ms
    pub timeout_ms: u32,
    /// Minimum spacing between attempts in ms
    pub retry_interval_ms: u32,
    /// Total budget in ms to wait for the real reply after the ECU answered
    /// `responsePending`
    pub pending_wait_ms: u32,
}

impl Default for RequestPolicy {
    fn default() -> Self {
        Self {
            tries: 2,
            timeout_ms: 5000,
            retry_interval_ms: 1000,
            pending_wait_ms: 4000,
        }
    }
}

impl RequestPolicy {
    /// Short-timeout single-shot policy used when probing for ECUs that may
    /// not exist
    pub fn probe() -> Self {
        Self {
            tries: 1,
            timeout_ms: 200,
            retry_interval_ms: 0,
            pending_wait_ms: 1000,
        }
    }
}

/// UDS request engine over one gateway socket
pub struct UdsClient<S: DiagSocket> {
    socket: S,
    policy: RequestPolicy,
}

impl<S: DiagSocket> std::fmt::Debug for UdsClient<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UdsClient")
            .field("channel", self.socket.channel())
            .field("policy", &self.policy)
            .finish()
    }
}

impl<S: DiagSocket> UdsClient<S> {
    /// Creates a client with the default retry policy (2 tries, 5s timeout)
    pub fn new(socket: S) -> Self {
        Self::with_policy(socket, RequestPolicy::default())
    }

    /// Creates a client with an explicit retry policy
    pub fn with_policy(socket: S, policy: RequestPolicy) -> Self {
        Self { socket, policy }
    }

    /// Returns the channel this client is bound to
    pub fn channel(&self) -> &ChannelConfig {
        self.socket.channel()
    }

    /// Returns the active retry policy
    pub fn policy(&self) -> RequestPolicy {
        self.policy
    }

    /// Replaces the retry policy
    pub fn set_policy(&mut self, policy: RequestPolicy) {
        self.policy = policy;
    }

    /// Closes the underlying socket
    pub fn close(&mut self) -> DiagServerResult<()> {
        Ok(self.socket.close()?)
    }

    /// Sends a command to the ECU and receives its response.
    ///
    /// On success the full positive response is returned, starting with
    /// sid + 0x40.
    pub fn execute_command_with_response(
        &mut self,
        sid: UdsCommand,
        args: &[u8],
    ) -> DiagServerResult<Vec<u8>> {
        let mut payload: Vec<u8> = Vec::with_capacity(args.len() + 1);
        payload.push(sid.into());
        payload.extend_from_slice(args);
        self.send_byte_array_with_response(&payload)
    }

    /// Sends a command to the ECU without waiting for a response
    pub fn execute_command(&mut self, sid: UdsCommand, args: &[u8]) -> DiagServerResult<()> {
        let mut payload: Vec<u8> = Vec::with_capacity(args.len() + 1);
        payload.push(sid.into());
        payload.extend_from_slice(args);
        debug!("Sending req to ECU (no response): {}", helpers::to_hex(&payload));
        Ok(self.socket.send(&payload)?)
    }

    /// Sends an arbitrary byte array to the ECU and polls for the response,
    /// retrying per the [RequestPolicy]
    pub fn send_byte_array_with_response(&mut self, payload: &[u8]) -> DiagServerResult<Vec<u8>> {
        if payload.is_empty() {
            return Err(DiagError::ParameterInvalid);
        }
        if self.policy.tries <= 1 {
            return self.perform_request(payload);
        }
        let mut last_err: Option<DiagError> = None;
        for _ in 0..self.policy.tries {
            let start = Instant::now();
            match self.perform_request(payload) {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    if let DiagError::ECUError { code, def } = e {
                        // ECU error. Sending again won't help.
                        return Err(DiagError::ECUError { code, def });
                    }
                    last_err = Some(e);
                    let interval = Duration::from_millis(self.policy.retry_interval_ms.into());
                    if let Some(sleep_time) = interval.checked_sub(start.elapsed()) {
                        std::thread::sleep(sleep_time);
                    }
                }
            }
        }
        Err(last_err.unwrap())
    }

    /// One request/reply exchange including pending and busy handling
    fn perform_request(&mut self, payload: &[u8]) -> DiagServerResult<Vec<u8>> {
        let sid = payload[0];
        debug!("Sending req to ECU: {}", helpers::to_hex(payload));
        let mut resp = self.socket.request(payload, self.policy.timeout_ms)?;
        let mut busy_retries = 0u32;
        loop {
            if resp.is_empty() {
                return Err(DiagError::EmptyResponse);
            }
            debug!("ECU Response: {}", helpers::to_hex(&resp));
            if resp[0] != 0x7F {
                return check_pos_response_id(sid, resp);
            }
            if resp.len() < 3 {
                return Err(DiagError::InvalidResponseLength);
            }
            let code = resp[2];
            match code {
                NRC_BUSY_REPEAT if busy_retries < BUSY_REPEAT_LIMIT => {
                    warn!("ECU responded busyRepeatRequest, retrying in 500ms");
                    busy_retries += 1;
                    std::thread::sleep(Duration::from_millis(500));
                    resp = self.socket.request(payload, self.policy.timeout_ms)?;
                }
                NRC_RESPONSE_PENDING => {
                    warn!("ECU responded responsePending, waiting for real response");
                    resp = self.await_pending_response(code)?;
                }
                _ => {
                    error!("ECU Negative response 0x{code:02X?}");
                    return Err(DiagError::ECUError {
                        code,
                        def: Some(lookup_uds_nrc(code)),
                    });
                }
            }
        }
    }

    /// Polls the socket for the delayed reply after a `responsePending` NRC
    fn await_pending_response(&mut self, pending_code: u8) -> DiagServerResult<Vec<u8>> {
        let timestamp = Instant::now();
        while timestamp.elapsed() <= Duration::from_millis(self.policy.pending_wait_ms.into()) {
            if let Ok(resp) = self.socket.recv(self.policy.timeout_ms) {
                if resp.is_empty() {
                    error!("ECU response was empty after responsePending");
                    return Err(DiagError::EmptyResponse);
                }
                return Ok(resp);
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        error!("ECU never followed up on responsePending. Giving up.");
        Err(DiagError::ECUError {
            code: pending_code,
            def: Some(lookup_uds_nrc(pending_code)),
        })
    }

    /// Requests the ECU to go into a specific diagnostic session mode
    pub fn set_session_mode(&mut self, session_mode: UdsSessionTypeByte) -> DiagServerResult<()> {
        self.execute_command_with_response(
            UdsCommand::DiagnosticSessionControl,
            &[session_mode.into()],
        )?;
        Ok(())
    }

    /// Enters the extended diagnostic session, falling back to the default
    /// session if the ECU rejects extended mode. Some modules (instrument
    /// clusters, older gateways) only answer identification reads in the
    /// default session.
    ///
    /// Returns the session mode that was accepted.
    pub fn start_session_with_fallback(&mut self) -> DiagServerResult<UdsSessionTypeByte> {
        match self.set_session_mode(UdsSessionType::Extended.into()) {
            Ok(()) => Ok(UdsSessionType::Extended.into()),
            Err(e) => {
                warn!("Extended session rejected ({e}), falling back to default session");
                self.set_session_mode(UdsSessionType::Default.into())?;
                Ok(UdsSessionType::Default.into())
            }
        }
    }

    /// Sends a tester present message to keep the current session alive
    pub fn tester_present(&mut self) -> DiagServerResult<()> {
        self.execute_command_with_response(UdsCommand::TesterPresent, &[0x00])
            .map(|_| ())
    }
}
