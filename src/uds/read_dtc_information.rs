//! Functions for reading and clearing diagnostic trouble code information
//! (UDS services 0x19 and 0x14)

use automotive_diag::uds::UdsCommand;

use crate::{
    dtc::{dtc_format_from_uds, Dtc, DtcFormatType, DtcStatus},
    gateway::DiagSocket,
    uds::UdsClient,
    DiagError, DiagServerResult,
};

/// reportNumberOfDTCByStatusMask sub-function
const SUB_FN_NUM_BY_STATUS_MASK: u8 = 0x01;
/// reportDTCByStatusMask sub-function
const SUB_FN_BY_STATUS_MASK: u8 = 0x02;

impl<S: DiagSocket> UdsClient<S> {
    /// Returns the number of DTCs matching a status mask, along with the
    /// DTC format the ECU stores them in
    pub fn get_number_of_dtcs_by_status_mask(
        &mut self,
        status_mask: DtcStatus,
    ) -> DiagServerResult<(u16, DtcFormatType)> {
        let resp = self.execute_command_with_response(
            UdsCommand::ReadDTCInformation,
            &[SUB_FN_NUM_BY_STATUS_MASK, status_mask.bits()],
        )?;
        if resp.len() < 6 {
            return Err(DiagError::InvalidResponseLength);
        }
        let format = dtc_format_from_uds(resp[3]);
        let count = u16::from_be_bytes([resp[4], resp[5]]);
        Ok((count, format))
    }

    /// Reads all DTCs whose status matches the given mask.
    ///
    /// The response header (service echo, sub-function echo, status
    /// availability mask) is stripped; the remainder is parsed as 4 byte
    /// records of 3 code bytes plus a status byte. An ECU that stores no
    /// matching DTCs answers with the bare header, which yields an empty
    /// list rather than an error.
    pub fn read_dtcs_by_status_mask(
        &mut self,
        status_mask: DtcStatus,
    ) -> DiagServerResult<Vec<Dtc>> {
        let mut resp = self.execute_command_with_response(
            UdsCommand::ReadDTCInformation,
            &[SUB_FN_BY_STATUS_MASK, status_mask.bits()],
        )?;
        if resp.len() < 7 {
            // No errors stored on the ECU
            return Ok(Vec::new());
        }
        resp.drain(0..3);
        if resp.len() % 4 != 0 {
            return Err(DiagError::InvalidResponseLength);
        }
        Ok(resp
            .chunks_exact(4)
            .map(|r| Dtc::from_uds_record(&[r[0], r[1], r[2], r[3]], DtcFormatType::Iso14229_1))
            .collect())
    }

    /// Reads every stored DTC regardless of status
    pub fn read_all_dtcs(&mut self) -> DiagServerResult<Vec<Dtc>> {
        self.read_dtcs_by_status_mask(DtcStatus::all())
    }

    /// Clears all diagnostic information on the ECU (service 0x14 with the
    /// 0xFFFFFF group-of-DTC wildcard)
    pub fn clear_diagnostic_information(&mut self) -> DiagServerResult<()> {
        self.execute_command_with_response(
            UdsCommand::ClearDiagnosticInformation,
            &[0xFF, 0xFF, 0xFF],
        )?;
        Ok(())
    }
}
