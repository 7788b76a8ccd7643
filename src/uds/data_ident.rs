//! Functions for reading and writing ECU data by identifier (UDS services
//! 0x22 and 0x2E)

use automotive_diag::uds::UdsCommand;

use crate::{
    gateway::DiagSocket, helpers, uds::UdsClient, DiagError, DiagServerResult,
};

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, strum_macros::Display,
    strum_macros::EnumIter,
)]
#[repr(u16)]
/// Data identifiers used by VAG identification and maintenance workflows
pub enum DataIdentifier {
    /// Service interval in days, written to schedule the next reminder
    ServiceInterval = 0x0C34,
    /// Service counter, days remaining until the next reminder
    ServiceCounter = 0x0C38,
    /// ECU factory part number (spare part number)
    FactoryPartNumber = 0xF187,
    /// ECU software version string
    SoftwareVersion = 0xF189,
    /// System supplier identifier
    SupplierNumber = 0xF18A,
    /// Vehicle identification number
    Vin = 0xF190,
    /// ECU hardware number
    HardwareNumber = 0xF191,
    /// Repair shop code / tester serial
    WorkshopCode = 0xF198,
    /// Programming date
    ProgrammingDate = 0xF199,
    /// ECU type designation (J-code on VAG vehicles)
    EcuType = 0xF19E,
    /// Software version revision
    SoftwareRevision = 0xF1A2,
    /// Engine code letters
    EngineCode = 0xF1AD,
}

impl From<DataIdentifier> for u16 {
    fn from(did: DataIdentifier) -> Self {
        did as u16
    }
}

/// Raw identification payload paired with the identifier it was read from.
///
/// Most identification records are ASCII, but some modules answer with
/// binary blobs; [IdentText::text] falls back to a hex rendering for those.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IdentText {
    /// Identifier the record was read from
    pub identifier: u16,
    /// Raw record payload
    pub raw: Vec<u8>,
}

impl IdentText {
    /// Renders the record as trimmed text, or uppercase hex if the payload
    /// is not printable
    pub fn text(&self) -> String {
        match helpers::decode_ident_utf8(&self.raw) {
            Some(t) if !t.is_empty() && !t.chars().any(char::is_control) => t,
            _ => format!("0x{}", helpers::to_hex(&self.raw)),
        }
    }
}

impl std::fmt::Display for IdentText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text())
    }
}

impl<S: DiagSocket> UdsClient<S> {
    /// Reads a data record from the ECU by its 16 bit identifier.
    ///
    /// The returned payload has the service byte and the echoed identifier
    /// stripped. An echo that does not match the requested identifier is
    /// rejected as [DiagError::MismatchedIdentResponse]. A reply carrying
    /// no payload after the echo is [DiagError::InvalidResponseLength];
    /// data records are never empty.
    pub fn read_data_by_identifier(&mut self, did: u16) -> DiagServerResult<Vec<u8>> {
        let resp =
            self.execute_command_with_response(UdsCommand::ReadDataByIdentifier, &did.to_be_bytes())?;
        if resp.len() <= 3 {
            return Err(DiagError::InvalidResponseLength);
        }
        let received = u16::from_be_bytes([resp[1], resp[2]]);
        if received != did {
            return Err(DiagError::MismatchedIdentResponse {
                want: did,
                received,
            });
        }
        Ok(resp[3..].to_vec())
    }

    /// Reads an identification record and wraps it for text rendering
    pub fn read_ident_text<T: Into<u16>>(&mut self, did: T) -> DiagServerResult<IdentText> {
        let identifier = did.into();
        let raw = self.read_data_by_identifier(identifier)?;
        Ok(IdentText { identifier, raw })
    }

    /// Reads a big-endian counter value from the final two bytes of a data
    /// record. VAG service counters report their day count this way.
    pub fn read_counter<T: Into<u16>>(&mut self, did: T) -> DiagServerResult<u16> {
        let raw = self.read_data_by_identifier(did.into())?;
        helpers::be_counter_tail(&raw).ok_or(DiagError::InvalidResponseLength)
    }

    /// Writes a data record to the ECU by its 16 bit identifier (service
    /// 0x2E). The ECU must be in a session that permits the write.
    pub fn write_data_by_identifier<T: Into<u16>>(
        &mut self,
        did: T,
        data: &[u8],
    ) -> DiagServerResult<()> {
        let identifier: u16 = did.into();
        let mut args = Vec::with_capacity(data.len() + 2);
        args.extend_from_slice(&identifier.to_be_bytes());
        args.extend_from_slice(data);
        self.execute_command_with_response(UdsCommand::WriteDataByIdentifier, &args)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ident_text_prefers_utf8() {
        let t = IdentText {
            identifier: DataIdentifier::Vin.into(),
            raw: b"WVWZZZ1KZAW123456".to_vec(),
        };
        assert_eq!(t.text(), "WVWZZZ1KZAW123456");
    }

    #[test]
    fn ident_text_falls_back_to_hex() {
        let t = IdentText {
            identifier: 0xF19E,
            raw: vec![0x01, 0xFE, 0x00],
        };
        assert_eq!(t.text(), "0x01FE00");
    }

    #[test]
    fn data_identifier_values() {
        assert_eq!(u16::from(DataIdentifier::Vin), 0xF190);
        assert_eq!(u16::from(DataIdentifier::ServiceCounter), 0x0C38);
        assert_eq!(u16::from(DataIdentifier::ServiceInterval), 0x0C34);
    }

    #[test]
    fn data_identifier_values_are_unique() {
        use strum::IntoEnumIterator;
        let mut values: Vec<u16> = DataIdentifier::iter().map(u16::from).collect();
        values.sort_unstable();
        values.dedup();
        assert_eq!(values.len(), DataIdentifier::iter().count());
    }
}
