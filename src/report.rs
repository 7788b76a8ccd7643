//! Scan report assembly and rendering.
//!
//! Reports collect the per-module identification data, decoded trouble codes
//! and a chronological log of noteworthy events, and render to plain text for
//! technicians or to JSON (behind the `serde` feature) for upload.

use chrono::{DateTime, Utc};

use crate::{
    dtc::{Dtc, DtcTranslator},
    vehicle::scan::ModuleReport,
};

/// One decoded trouble code attributed to the module that reported it
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DtcEntry {
    /// Module the code was read from
    pub module_name: String,
    /// Scan tool rendering of the code
    pub code: String,
    /// Human readable description, when the translator knows the code
    pub description: Option<String>,
    /// True if the code is confirmed and stored
    pub confirmed: bool,
    /// True if the code requests the warning lamp
    pub mil_on: bool,
}

/// Complete result of one diagnostic session on a vehicle
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanReport {
    /// When the report was created
    pub created_at: DateTime<Utc>,
    /// Gateway ticket the session ran on
    pub ticket: String,
    /// VIN, taken from the first module that reported one
    pub vin: Option<String>,
    /// Brand guessed from the VIN
    pub brand: Option<String>,
    /// Per-module identification data
    pub modules: Vec<ModuleReport>,
    /// Decoded trouble codes across all modules
    pub dtcs: Vec<DtcEntry>,
    /// Chronological notes recorded during the session
    pub log_lines: Vec<String>,
}

impl ScanReport {
    /// Creates a report over the given module scan results. The VIN and
    /// brand are derived from the first module that reported a VIN.
    pub fn new(ticket: &str, modules: Vec<ModuleReport>) -> Self {
        let vin = modules.iter().find_map(|m| m.vin.clone());
        let brand = vin
            .as_deref()
            .and_then(crate::vehicle::guess_vag_brand)
            .map(str::to_string);
        Self {
            created_at: Utc::now(),
            ticket: ticket.to_string(),
            vin,
            brand,
            modules,
            dtcs: Vec::new(),
            log_lines: Vec::new(),
        }
    }

    /// Attributes a batch of trouble codes to a module, describing each via
    /// the translator
    pub fn add_dtcs(&mut self, module_name: &str, dtcs: &[Dtc], translator: &dyn DtcTranslator) {
        for dtc in dtcs {
            self.dtcs.push(DtcEntry {
                module_name: module_name.to_string(),
                code: dtc.code_string(),
                description: translator.describe(dtc),
                confirmed: dtc.status.is_confirmed(),
                mil_on: dtc.status.mil_on(),
            });
        }
    }

    /// Appends a note to the session log
    pub fn log(&mut self, line: impl Into<String>) {
        self.log_lines.push(line.into());
    }

    /// Renders the report as plain text for technicians
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str("Scan Report\n");
        out.push_str(&format!(
            "Date: {}\n",
            self.created_at.format("%Y-%m-%d %H:%M:%S")
        ));
        out.push_str(&format!("Ticket: {}\n", self.ticket));
        out.push_str(&format!("VIN: {}\n", self.vin.as_deref().unwrap_or("N/A")));
        out.push_str(&format!(
            "Brand: {}\n",
            self.brand.as_deref().unwrap_or("Unknown")
        ));
        let names: Vec<&str> = self.modules.iter().map(|m| m.module_name.as_str()).collect();
        out.push_str(&format!("Modules: {}\n", names.join(", ")));

        for module in &self.modules {
            out.push_str(&format!(
                "\n===== {} (0x{:03X}/0x{:03X}) =====\n",
                module.module_name, module.request_id, module.response_id
            ));
            let field = |label: &str, value: &Option<String>| {
                format!("{label}: {}\n", value.as_deref().unwrap_or("No response"))
            };
            out.push_str(&field("VIN", &module.vin));
            out.push_str(&field("Part Number", &module.part_number));
            out.push_str(&field("Software Version", &module.software_version));
            if module.ecu_type.is_some() {
                out.push_str(&field("ECU Type", &module.ecu_type));
            }
            if module.function.is_some() {
                out.push_str(&field("Function", &module.function));
            }
        }

        if !self.dtcs.is_empty() {
            out.push_str("\nTrouble Codes:\n");
            for entry in &self.dtcs {
                let mut line = format!("  [{}] {}", entry.module_name, entry.code);
                if let Some(desc) = &entry.description {
                    line.push_str(&format!(" - {desc}"));
                }
                if entry.mil_on {
                    line.push_str(" (MIL on)");
                } else if entry.confirmed {
                    line.push_str(" (confirmed)");
                }
                out.push_str(&line);
                out.push('\n');
            }
        }

        if !self.log_lines.is_empty() {
            out.push_str("\nSession Log:\n");
            for line in &self.log_lines {
                out.push_str(&format!("  {line}\n"));
            }
        }
        out
    }

    /// Serializes the report as pretty JSON for upload
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtc::{DtcFormatType, DtcStatus, StaticDtcTable};

    fn module(name: &str, vin: Option<&str>) -> ModuleReport {
        ModuleReport {
            module_name: name.to_string(),
            request_id: 0x7E0,
            response_id: 0x7E8,
            vin: vin.map(str::to_string),
            part_number: Some("5G0906259B".to_string()),
            software_version: Some("8351".to_string()),
            ecu_type: None,
            function: None,
        }
    }

    #[test]
    fn vin_and_brand_from_first_reporting_module() {
        let report = ScanReport::new(
            "12345",
            vec![
                module("19_GTW", None),
                module("01_ECM", Some("WVWZZZ1KZAW123456")),
            ],
        );
        assert_eq!(report.vin.as_deref(), Some("WVWZZZ1KZAW123456"));
        assert_eq!(report.brand.as_deref(), Some("Volkswagen"));
    }

    #[test]
    fn text_rendering_lists_modules_and_dtcs() {
        let mut report =
            ScanReport::new("99", vec![module("01_ECM", Some("WVWZZZ1KZAW123456"))]);
        let dtc = Dtc {
            format: DtcFormatType::Iso14229_1,
            raw: 0x030000,
            status: DtcStatus::CONFIRMED | DtcStatus::WARNING_INDICATOR_ON,
        };
        report.add_dtcs("01_ECM", &[dtc], &StaticDtcTable);
        report.log("extended session accepted");

        let text = report.render_text();
        assert!(text.contains("VIN: WVWZZZ1KZAW123456"));
        assert!(text.contains("Brand: Volkswagen"));
        assert!(text.contains("Modules: 01_ECM"));
        assert!(text.contains("[01_ECM] P30000 - Random/multiple cylinder misfire detected"));
        assert!(text.contains("(MIL on)"));
        assert!(text.contains("extended session accepted"));
    }
}
