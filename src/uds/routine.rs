//! Functions for remotely executing routines on an ECU (UDS service 0x31)

use std::time::Duration;

use automotive_diag::uds::{UdsCommand, UdsSessionType};
use log::debug;

use crate::{gateway::DiagSocket, uds::UdsClient, DiagError, DiagServerResult};

/// startRoutine sub-function
const SUB_FN_START: u8 = 0x01;
/// stopRoutine sub-function
const SUB_FN_STOP: u8 = 0x02;
/// requestRoutineResults sub-function
const SUB_FN_RESULTS: u8 = 0x03;

/// Routine that takes a brake system ECU out of its service (pad change)
/// mode. Started and then stopped to complete the exit sequence.
pub const BRAKE_SERVICE_EXIT_ROUTINE: u16 = 0x03A0;

/// Routine execution manager bound to one routine on one ECU.
///
/// Creating the manager switches the ECU into the extended diagnostic
/// session, which routine control requires.
#[derive(Debug)]
pub struct UdsRoutineManager<'a, S: DiagSocket> {
    routine_id: u16,
    client: &'a mut UdsClient<S>,
}

impl<'a, S: DiagSocket> UdsRoutineManager<'a, S> {
    /// Creates a routine manager and puts the ECU into the extended session
    pub fn new(
        client: &'a mut UdsClient<S>,
        routine_id: u16,
    ) -> DiagServerResult<Self> {
        client.set_session_mode(UdsSessionType::Extended.into())?;
        Ok(Self { routine_id, client })
    }

    /// Starts the routine, passing optional entry parameters
    pub fn start(&mut self, args: &[u8]) -> DiagServerResult<Vec<u8>> {
        self.routine_control(SUB_FN_START, args)
    }

    /// Stops the routine
    pub fn stop(&mut self, args: &[u8]) -> DiagServerResult<Vec<u8>> {
        self.routine_control(SUB_FN_STOP, args)
    }

    /// Requests the routine's results
    pub fn request_results(&mut self) -> DiagServerResult<Vec<u8>> {
        self.routine_control(SUB_FN_RESULTS, &[])
    }

    fn routine_control(&mut self, sub_fn: u8, args: &[u8]) -> DiagServerResult<Vec<u8>> {
        let mut payload = Vec::with_capacity(args.len() + 3);
        payload.push(sub_fn);
        payload.extend_from_slice(&self.routine_id.to_be_bytes());
        payload.extend_from_slice(args);
        let resp = self
            .client
            .execute_command_with_response(UdsCommand::RoutineControl, &payload)?;
        if resp.len() < 4 {
            return Err(DiagError::InvalidResponseLength);
        }
        // Response must echo sub-function and routine ID
        if resp[1] != sub_fn || resp[2..4] != self.routine_id.to_be_bytes() {
            return Err(DiagError::WrongMessage);
        }
        Ok(resp[4..].to_vec())
    }
}

/// Default settle time between starting and stopping the brake service exit
/// routine, giving the actuator time to run
pub const BRAKE_SERVICE_EXIT_SETTLE: Duration = Duration::from_secs(2);

/// Takes a brake ECU out of service mode by starting and then stopping the
/// exit routine, waiting `settle` in between.
pub fn exit_brake_service_mode<S: DiagSocket>(
    client: &mut UdsClient<S>,
    settle: Duration,
) -> DiagServerResult<()> {
    let mut manager = UdsRoutineManager::new(client, BRAKE_SERVICE_EXIT_ROUTINE)?;
    debug!("Starting brake service exit routine");
    manager.start(&[])?;
    std::thread::sleep(settle);
    debug!("Stopping brake service exit routine");
    manager.stop(&[])?;
    Ok(())
}
