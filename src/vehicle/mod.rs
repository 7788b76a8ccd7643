//! VAG vehicle knowledge: well-known module addresses, VIN decoding helpers
//! and the scan/maintenance workflows built on top of them

pub mod scan;
pub mod service_reset;
pub mod versions;

/// Diagnostic address pair for one known VAG module.
///
/// The name carries the conventional VAG address prefix ("01" for the engine,
/// "19" for the gateway) followed by a short module label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VagModule {
    /// Display name, prefixed with the VAG address
    pub name: &'static str,
    /// CAN ID the module listens on (11 or 29 bit)
    pub request_id: u32,
    /// CAN ID the module answers from
    pub response_id: u32,
    /// The module stalls on diagnostic session control requests; identification
    /// reads go out in whatever session the module is already in
    pub skip_session_init: bool,
}

impl VagModule {
    const fn new(name: &'static str, request_id: u32, response_id: u32) -> Self {
        Self {
            name,
            request_id,
            response_id,
            skip_session_init: false,
        }
    }
}

/// Modules found on most VAG platforms, with their UDS address pairs.
///
/// Newer platforms (Golf 8 and up) move the engine controller to
/// 0x0710/0x077A behind the gateway; the sweep scan finds those.
pub const KNOWN_MODULES: &[VagModule] = &[
    VagModule::new("01_ECM", 0x07E0, 0x07E8),
    VagModule {
        name: "51_E_Drivetrain",
        request_id: 0x17FC_007C,
        response_id: 0x17FE_007C,
        skip_session_init: true,
    },
    VagModule::new("03_ABS_ESP", 0x0713, 0x077D),
    VagModule::new("C6_EV_OBC", 0x0744, 0x07AE),
    VagModule::new("23_EBKV", 0x073B, 0x07A5),
    VagModule::new("16_Steering_Wheel", 0x070C, 0x0776),
    VagModule::new("15_SRS_Airbag", 0x0715, 0x077F),
    VagModule::new("75_SOS_Module", 0x0767, 0x07D1),
    VagModule::new("44_EPS", 0x0712, 0x077C),
    VagModule::new("AC_SCR", 0x0794, 0x072A),
    VagModule::new("55_AFS_Light", 0x0754, 0x07BE),
    VagModule::new("02_TCM", 0x07E1, 0x07E9),
    VagModule::new("17_IPC", 0x0714, 0x077E),
    VagModule::new("19_GTW", 0x0710, 0x077A),
    VagModule::new("09_BCM", 0x070E, 0x0778),
    VagModule::new("13_ACC", 0x0757, 0x07C1),
    VagModule::new("A5_Front_Sensors", 0x074F, 0x07B9),
];

/// ECU address offsets probed by the sweep scan. The request ID is
/// `0x700 + offset`, the response ID `0x780 + offset`.
pub const COMMON_VAG_ECU_IDS: &[u8] = &[
    0x01, 0x02, 0x03, 0x08, 0x09, 0x0F, 0x15, 0x16, 0x17, 0x19, 0x25, 0x29, 0x42, 0x44, 0x46,
    0x47, 0x52, 0x53, 0x55, 0x56, 0x5F, 0x61, 0x65, 0x6C, 0x6D, 0x76, 0x77, 0x7D,
];

/// Guesses the VAG brand from the VIN's world manufacturer identifier (the
/// first three characters). Returns None for VINs outside the known WMI set.
pub fn guess_vag_brand(vin: &str) -> Option<&'static str> {
    if vin.len() < 3 {
        return None;
    }
    match vin[..3].to_ascii_uppercase().as_str() {
        "WVW" => Some("Volkswagen"),
        "WV1" => Some("Volkswagen Commercial"),
        "WAU" => Some("Audi"),
        "TRU" => Some("Audi (Hungary)"),
        "SKZ" | "TMB" => Some("Skoda"),
        "VSS" => Some("SEAT"),
        "3VW" => Some("Volkswagen (Mexico)"),
        "9BW" => Some("Volkswagen (Brazil)"),
        _ => None,
    }
}

/// Maps an ECU type designation to its vehicle function by the VAG J-code
/// embedded in the designation string
pub fn ecu_function(ecu_info: &str) -> Option<&'static str> {
    const KNOWN_ECUS: &[(&str, &str)] = &[
        ("J104", "ABS/ESP"),
        ("J519", "Body Control Module (BCM)"),
        ("J527", "Steering Wheel Module"),
        ("J500", "Power Steering Control"),
        ("J393", "Central Locking"),
        ("J285", "Instrument Cluster"),
        ("J623", "Engine Control Module (ECM)"),
        ("J345", "Airbag Control Unit"),
        ("J533", "Gateway"),
        ("J743", "Mechatronics DSG"),
        ("J255", "Climatronic Control"),
        ("J367", "Battery Regulation"),
        ("J428", "Adaptive Cruise Control"),
        ("J941", "Light Control"),
    ];
    KNOWN_ECUS
        .iter()
        .find(|(code, _)| ecu_info.contains(code))
        .map(|(_, label)| *label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brand_guess_from_wmi() {
        assert_eq!(guess_vag_brand("WVWZZZ1KZAW123456"), Some("Volkswagen"));
        assert_eq!(guess_vag_brand("wauZZZ8V0FA123456"), Some("Audi"));
        assert_eq!(guess_vag_brand("TMBJJ7NE1F0123456"), Some("Skoda"));
        assert_eq!(guess_vag_brand("1HGBH41JXMN109186"), None);
        assert_eq!(guess_vag_brand("WV"), None);
    }

    #[test]
    fn ecu_function_matches_jcode_substring() {
        assert_eq!(
            ecu_function("MOTOR 2.0l TFSI J623"),
            Some("Engine Control Module (ECM)")
        );
        assert_eq!(ecu_function("GW MQB J533 High"), Some("Gateway"));
        assert_eq!(ecu_function("unknown box"), None);
    }

    #[test]
    fn module_table_has_unique_names() {
        let mut names: Vec<&str> = KNOWN_MODULES.iter().map(|m| m.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), KNOWN_MODULES.len());
    }

    #[test]
    fn e_drivetrain_uses_29_bit_addressing() {
        let m = KNOWN_MODULES
            .iter()
            .find(|m| m.name == "51_E_Drivetrain")
            .unwrap();
        assert!(m.request_id > 0x7FF);
        assert!(m.skip_session_init);
    }
}
