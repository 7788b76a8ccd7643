//! Bus and channel configuration types for the gateway connector.
//!
//! These mirror what gateway services expect when configuring a vehicle
//! connection: a named bus is a pin pair on the OBD connector plus electrical
//! parameters, and a channel is an ISO-TP address pair on one of those buses.

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
/// CAN transceiver speed selection
pub enum TransceiverSpeed {
    /// High speed transceiver (powertrain / gateway buses)
    High,
    /// Low speed / fault tolerant transceiver (older comfort buses)
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Configuration of one named CAN bus on the OBD connector
pub struct BusConfig {
    /// Name the bus is registered under; channels refer to it by this name
    pub name: String,
    /// CAN high pin on the OBD connector
    pub pin_plus: u8,
    /// CAN low pin on the OBD connector
    pub pin_min: u8,
    /// Bus bit rate in bits per second
    pub bit_rate: u32,
    /// Transceiver speed
    pub transceiver: TransceiverSpeed,
}

impl BusConfig {
    /// Standard OBD powertrain bus on pins 6/14 at 500kbps. This is the bus
    /// nearly all VAG diagnostic modules answer on.
    pub fn powertrain(name: &str) -> Self {
        Self {
            name: name.to_string(),
            pin_plus: 6,
            pin_min: 14,
            bit_rate: 500_000,
            transceiver: TransceiverSpeed::High,
        }
    }

    /// Secondary bus on pins 3/11 at 500kbps, used by some body and comfort
    /// modules
    pub fn comfort(name: &str) -> Self {
        Self {
            name: name.to_string(),
            pin_plus: 3,
            pin_min: 11,
            bit_rate: 500_000,
            transceiver: TransceiverSpeed::High,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// ISO-TP channel configuration binding a socket to one ECU
pub struct ChannelConfig {
    /// Name of the configured bus to open the channel on
    pub bus_name: String,
    /// CAN ID the ECU listens on (11 or 29 bit)
    pub request_id: u32,
    /// CAN ID the ECU answers from
    pub response_id: u32,
    /// Pad ISO-TP frames to 8 bytes
    pub padding: bool,
}

impl ChannelConfig {
    /// Creates a channel configuration with frame padding enabled, which is
    /// what VAG ECUs expect
    pub fn new(bus_name: &str, request_id: u32, response_id: u32) -> Self {
        Self {
            bus_name: bus_name.to_string(),
            request_id,
            response_id,
            padding: true,
        }
    }

    /// Disables ISO-TP frame padding on this channel
    pub fn without_padding(mut self) -> Self {
        self.padding = false;
        self
    }
}
