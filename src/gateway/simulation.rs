//! Simulation gateway for unit testing diagnostic workflows without a
//! vehicle or a remote service.
//!
//! The simulation maps `(request CAN ID, request payload)` pairs to canned
//! ECU replies. Replies can be fixed, consumed as a sequence (for values
//! that change between reads, such as service counters), or delivered after
//! a `responsePending` negative reply to exercise the pending path.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, RwLock},
};

use chrono::Utc;

use super::{
    BusConfig, ChannelConfig, DiagSocket, GatewayClient, GatewayError, GatewayResult,
    GatewaySession, SessionInfo, SessionOutcome, SessionState, TicketId,
};

#[derive(Debug, Clone)]
enum SimReply {
    /// Same reply for every request
    Fixed(Vec<u8>),
    /// One reply consumed per request; the final entry sticks
    Sequence(VecDeque<Vec<u8>>),
    /// First reply is `7F <sid> 78`, the real reply arrives via recv()
    PendingThen(Vec<u8>),
}

type ReplyMap = Arc<RwLock<HashMap<(u32, Vec<u8>), SimReply>>>;

#[derive(Debug, Clone, Default)]
/// In-memory gateway usable anywhere a [GatewayClient] is expected
pub struct SimulationGateway {
    replies: ReplyMap,
    sessions: Arc<RwLock<Vec<SessionInfo>>>,
}

impl SimulationGateway {
    /// Creates an empty simulation with no ECU replies mapped
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps a request payload on an ECU request ID to a fixed reply
    pub fn add_response(&self, request_id: u32, req: &[u8], resp: &[u8]) {
        self.replies.write().unwrap().insert(
            (request_id, req.to_vec()),
            SimReply::Fixed(resp.to_vec()),
        );
    }

    /// Maps a request payload to a sequence of replies, consumed one per
    /// request. The last reply is returned for all further requests.
    pub fn add_response_sequence(&self, request_id: u32, req: &[u8], resps: &[&[u8]]) {
        self.replies.write().unwrap().insert(
            (request_id, req.to_vec()),
            SimReply::Sequence(resps.iter().map(|r| r.to_vec()).collect()),
        );
    }

    /// Maps a request payload to a `responsePending` negative reply followed
    /// by the real reply on the next socket read
    pub fn add_pending_response(&self, request_id: u32, req: &[u8], resp: &[u8]) {
        self.replies.write().unwrap().insert(
            (request_id, req.to_vec()),
            SimReply::PendingThen(resp.to_vec()),
        );
    }
}

impl GatewayClient for SimulationGateway {
    type Session = SimulationSession;

    fn open_ticket(&mut self, ticket: &TicketId) -> GatewayResult<Self::Session> {
        let id = format!("sim-{ticket}");
        self.sessions.write().unwrap().push(SessionInfo {
            id: id.clone(),
            state: SessionState::Active,
            created_at: Utc::now(),
        });
        Ok(SimulationSession {
            id,
            replies: self.replies.clone(),
            sessions: self.sessions.clone(),
            buses: Vec::new(),
        })
    }

    fn active_sessions(&mut self) -> GatewayResult<Vec<SessionInfo>> {
        Ok(self
            .sessions
            .read()
            .unwrap()
            .iter()
            .filter(|s| s.state == SessionState::Active)
            .cloned()
            .collect())
    }

    fn interrupt_session(&mut self, session_id: &str) -> GatewayResult<()> {
        let mut sessions = self.sessions.write().unwrap();
        match sessions.iter_mut().find(|s| s.id == session_id) {
            Some(info) => {
                info.state = SessionState::Closed;
                Ok(())
            }
            None => Err(GatewayError::SessionClosed),
        }
    }
}

#[derive(Debug)]
/// Session handed out by [SimulationGateway]
pub struct SimulationSession {
    id: String,
    replies: ReplyMap,
    sessions: Arc<RwLock<Vec<SessionInfo>>>,
    buses: Vec<String>,
}

impl GatewaySession for SimulationSession {
    type Socket = SimulationSocket;

    fn configure_buses(&mut self, buses: &[BusConfig]) -> GatewayResult<()> {
        for bus in buses {
            self.buses.push(bus.name.clone());
        }
        Ok(())
    }

    fn isotp_socket(&mut self, cfg: ChannelConfig) -> GatewayResult<Self::Socket> {
        if !self.buses.iter().any(|b| *b == cfg.bus_name) {
            return Err(GatewayError::UnknownBus(cfg.bus_name));
        }
        Ok(SimulationSocket {
            cfg,
            replies: self.replies.clone(),
            rx_queue: VecDeque::new(),
            open: true,
        })
    }

    fn finish(self, _outcome: SessionOutcome) -> GatewayResult<()> {
        let mut sessions = self.sessions.write().unwrap();
        if let Some(info) = sessions.iter_mut().find(|s| s.id == self.id) {
            info.state = SessionState::Closed;
        }
        Ok(())
    }
}

#[derive(Debug)]
/// ISO-TP socket handed out by [SimulationSession]
pub struct SimulationSocket {
    cfg: ChannelConfig,
    replies: ReplyMap,
    rx_queue: VecDeque<Vec<u8>>,
    open: bool,
}

impl SimulationSocket {
    fn lookup(&mut self, payload: &[u8]) -> Option<Vec<u8>> {
        let key = (self.cfg.request_id, payload.to_vec());
        let mut map = self.replies.write().unwrap();
        match map.get_mut(&key)? {
            SimReply::Fixed(r) => Some(r.clone()),
            SimReply::Sequence(seq) => {
                if seq.len() > 1 {
                    seq.pop_front()
                } else {
                    seq.front().cloned()
                }
            }
            SimReply::PendingThen(r) => {
                self.rx_queue.push_back(r.clone());
                Some(vec![0x7F, payload[0], 0x78])
            }
        }
    }
}

impl DiagSocket for SimulationSocket {
    fn channel(&self) -> &ChannelConfig {
        &self.cfg
    }

    fn send(&mut self, payload: &[u8]) -> GatewayResult<()> {
        if !self.open {
            return Err(GatewayError::SessionClosed);
        }
        if let Some(reply) = self.lookup(payload) {
            self.rx_queue.push_back(reply);
        }
        Ok(())
    }

    fn request(&mut self, payload: &[u8], _timeout_ms: u32) -> GatewayResult<Vec<u8>> {
        if !self.open {
            return Err(GatewayError::SessionClosed);
        }
        self.rx_queue.clear();
        self.lookup(payload).ok_or(GatewayError::ReadTimeout)
    }

    fn recv(&mut self, _timeout_ms: u32) -> GatewayResult<Vec<u8>> {
        if !self.open {
            return Err(GatewayError::SessionClosed);
        }
        self.rx_queue.pop_front().ok_or(GatewayError::ReadTimeout)
    }

    fn close(&mut self) -> GatewayResult<()> {
        self.open = false;
        Ok(())
    }
}
