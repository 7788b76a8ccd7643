//! Multi-ECU scan orchestration: identification reads over the known module
//! table, and CAN ID sweep discovery for vehicles the table misses

use log::{debug, info, warn};

use crate::{
    gateway::{ChannelConfig, DiagSocket, GatewaySession},
    uds::{
        data_ident::DataIdentifier,
        RequestPolicy, UdsClient,
    },
    vehicle::{ecu_function, VagModule, COMMON_VAG_ECU_IDS},
    DiagServerResult,
};

/// Identification data collected from one responding module
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModuleReport {
    /// Module name from the scan table, or the probed address for sweep hits
    pub module_name: String,
    /// CAN ID the module was addressed on
    pub request_id: u32,
    /// CAN ID the module answered from
    pub response_id: u32,
    /// VIN as reported by this module
    pub vin: Option<String>,
    /// Factory part number
    pub part_number: Option<String>,
    /// Software version
    pub software_version: Option<String>,
    /// ECU type designation
    pub ecu_type: Option<String>,
    /// Vehicle function derived from the J-code in the type designation
    pub function: Option<String>,
}

impl ModuleReport {
    fn empty(name: String, request_id: u32, response_id: u32) -> Self {
        Self {
            module_name: name,
            request_id,
            response_id,
            vin: None,
            part_number: None,
            software_version: None,
            ecu_type: None,
            function: None,
        }
    }

    /// True if the module answered at least one identification read
    pub fn answered(&self) -> bool {
        self.vin.is_some()
            || self.part_number.is_some()
            || self.software_version.is_some()
            || self.ecu_type.is_some()
    }
}

fn read_ident<S: DiagSocket>(client: &mut UdsClient<S>, did: DataIdentifier) -> Option<String> {
    match client.read_ident_text(did) {
        Ok(t) => Some(t.text()),
        Err(e) => {
            debug!("Ident read {did} failed: {e}");
            None
        }
    }
}

/// Scans the given modules over their table addresses, reading VIN, part
/// number and software version from each.
///
/// Failures are isolated per module: an ECU that never answers is logged and
/// skipped, and one module's errors never abort the rest of the scan. Only
/// gateway-level failures (opening a socket on the session) propagate.
pub fn scan_modules<G: GatewaySession>(
    session: &mut G,
    bus_name: &str,
    modules: &[VagModule],
) -> DiagServerResult<Vec<ModuleReport>> {
    let mut reports = Vec::new();
    for module in modules {
        info!("===== Scanning {} =====", module.name);
        let cfg = ChannelConfig::new(bus_name, module.request_id, module.response_id);
        let socket = session.isotp_socket(cfg)?;
        let mut client = UdsClient::new(socket);

        if !module.skip_session_init {
            if let Err(e) = client.start_session_with_fallback() {
                warn!("{} did not answer session control ({e}), skipping", module.name);
                continue;
            }
        }

        let mut report = ModuleReport::empty(
            module.name.to_string(),
            module.request_id,
            module.response_id,
        );
        report.vin = read_ident(&mut client, DataIdentifier::Vin);
        report.part_number = read_ident(&mut client, DataIdentifier::FactoryPartNumber);
        report.software_version = read_ident(&mut client, DataIdentifier::SoftwareVersion);

        if report.answered() {
            reports.push(report);
        } else {
            warn!("{} entered a session but answered no ident reads", module.name);
        }
    }
    Ok(reports)
}

/// Probes the common VAG ECU address range (`0x700 + offset` requests,
/// `0x780 + offset` responses) with short timeouts, collecting a report for
/// every address that answers.
///
/// Useful for platforms whose modules are not in the scan table yet.
pub fn sweep_scan<G: GatewaySession>(
    session: &mut G,
    bus_name: &str,
) -> DiagServerResult<Vec<ModuleReport>> {
    let mut reports = Vec::new();
    for &offset in COMMON_VAG_ECU_IDS {
        let request_id = 0x700 + offset as u32;
        let response_id = 0x780 + offset as u32;
        let cfg = ChannelConfig::new(bus_name, request_id, response_id);
        let socket = session.isotp_socket(cfg)?;
        let mut client = UdsClient::with_policy(socket, RequestPolicy::probe());

        if client.start_session_with_fallback().is_err() {
            continue;
        }

        let mut report = ModuleReport::empty(
            format!("ECU_0x{offset:02X}"),
            request_id,
            response_id,
        );
        report.vin = read_ident(&mut client, DataIdentifier::Vin);
        report.software_version = read_ident(&mut client, DataIdentifier::SoftwareRevision);
        report.ecu_type = read_ident(&mut client, DataIdentifier::EcuType);
        report.function = report
            .ecu_type
            .as_deref()
            .and_then(ecu_function)
            .map(str::to_string);

        if report.answered() {
            info!("ECU found at ID 0x{offset:02X}");
            reports.push(report);
        }
    }
    Ok(reports)
}
