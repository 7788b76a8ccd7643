//! Module for common Diagnostic trouble code data

use bitflags::bitflags;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
/// DTC name interpretation format specifier
pub enum DtcFormatType {
    /// ISO15031-6 DTC Format
    Iso15031_6,
    /// ISO14229-1 DTC Format
    Iso14229_1,
    /// SAEJ1939-73 DTC Format
    SaeJ1939_73,
    /// ISO11992-4 DTC Format
    Iso11992_4,
    /// Unknown DTC Format
    Unknown(u8),
}

pub(crate) fn dtc_format_from_uds(fmt: u8) -> DtcFormatType {
    match fmt {
        0x00 => DtcFormatType::Iso15031_6,
        0x01 => DtcFormatType::Iso14229_1,
        0x02 => DtcFormatType::SaeJ1939_73,
        0x03 => DtcFormatType::Iso11992_4,
        x => DtcFormatType::Unknown(x),
    }
}

bitflags! {
    /// ISO14229 DTC status mask byte
    #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct DtcStatus: u8 {
        /// Most recent test of the monitored condition failed
        const TEST_FAILED = 0x01;
        /// Test failed at some point during the current operation cycle
        const TEST_FAILED_THIS_CYCLE = 0x02;
        /// Failure detected but not yet confirmed (pending)
        const PENDING = 0x04;
        /// DTC is confirmed and stored in non volatile memory
        const CONFIRMED = 0x08;
        /// Test has not completed since the last clear
        const TEST_NOT_COMPLETED_SINCE_CLEAR = 0x10;
        /// Test failed at least once since the last clear
        const TEST_FAILED_SINCE_CLEAR = 0x20;
        /// Test has not completed this operation cycle
        const TEST_NOT_COMPLETED_THIS_CYCLE = 0x40;
        /// DTC requests the warning indicator (MIL) to be on
        const WARNING_INDICATOR_ON = 0x80;
    }
}

impl DtcStatus {
    /// Returns true if this DTC turns on the malfunction indicator lamp
    pub fn mil_on(&self) -> bool {
        self.contains(DtcStatus::WARNING_INDICATOR_ON)
    }

    /// Returns true if this DTC is confirmed and stored
    pub fn is_confirmed(&self) -> bool {
        self.contains(DtcStatus::CONFIRMED)
    }

    /// Returns true if this DTC is pending but not yet confirmed
    pub fn is_pending(&self) -> bool {
        self.contains(DtcStatus::PENDING) && !self.contains(DtcStatus::CONFIRMED)
    }
}

/// Diagnostic trouble code (DTC) storage struct
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Dtc {
    /// The [DtcFormatType] of the DTC, used to interpret the raw value
    pub format: DtcFormatType,
    /// The raw 3 byte value of the DTC according to the ECU
    pub raw: u32,
    /// Status mask of the DTC
    pub status: DtcStatus,
}

impl Dtc {
    /// Builds a DTC from a 4 byte UDS record (3 code bytes + status byte)
    pub(crate) fn from_uds_record(record: &[u8; 4], format: DtcFormatType) -> Self {
        Self {
            format,
            raw: (record[0] as u32) << 16 | (record[1] as u32) << 8 | record[2] as u32,
            status: DtcStatus::from_bits_retain(record[3]),
        }
    }

    /// Formats the DTC the way scan tools print it: the leading nibble
    /// selects the system letter (0=P, 1=C, 2=B, 3=U), the remaining five
    /// nibbles are kept as hex. Example: raw 0x012345 renders as "P12345".
    pub fn code_string(&self) -> String {
        let letter = match (self.raw >> 20) & 0xF {
            0 => 'P',
            1 => 'C',
            2 => 'B',
            3 => 'U',
            _ => 'P',
        };
        format!("{}{:05X}", letter, self.raw & 0xF_FFFF)
    }
}

impl std::fmt::Display for Dtc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.code_string())
    }
}

/// Source of human readable DTC descriptions.
///
/// Online translation services are an external collaborator; implement this
/// trait over one to enrich reports, or use [StaticDtcTable] offline.
pub trait DtcTranslator {
    /// Returns a description for the DTC, if one is known
    fn describe(&self, dtc: &Dtc) -> Option<String>;
}

/// Built-in lookup over a small table of common powertrain and chassis codes
#[derive(Debug, Copy, Clone, Default)]
pub struct StaticDtcTable;

impl DtcTranslator for StaticDtcTable {
    fn describe(&self, dtc: &Dtc) -> Option<String> {
        let code = dtc.code_string();
        let desc = match code.as_str() {
            "P30000" => "Random/multiple cylinder misfire detected",
            "P42000" => "Catalyst system efficiency below threshold (bank 1)",
            "P17100" => "System too lean (bank 1)",
            "P56200" => "System voltage low",
            "U10000" => "Lost communication with ECM/PCM",
            "U14000" => "Lost communication with body control module",
            "C03500" => "Left front wheel speed sensor circuit",
            "B10000" => "Control unit defective",
            _ => return None,
        };
        Some(desc.to_string())
    }
}
