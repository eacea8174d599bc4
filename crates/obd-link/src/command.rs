//! Command Catalog and Response Decoding
//!
//! Defines the fixed set of adapter and vehicle commands used by the
//! telemetry pipeline: ELM327 `AT` commands that reconfigure the bus
//! addressing, and UDS service 0x22 data requests with their decoding
//! formulas. The catalog is static; nothing is derived at runtime.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error strings the ELM327 prints in place of a data frame. A response
/// matching one of these is invalid by definition.
const ERROR_SENTINELS: [&str; 4] = ["NO DATA", "CAN ERROR", "UNABLE TO CONNECT", "STOPPED"];

/// Decoding strategy for a command's response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decoder {
    /// Keep the response text as-is (adapter configuration commands)
    RawText,
    /// First payload byte / 2 (%)
    Percent,
    /// First payload byte - 40 (°C)
    OffsetTemp,
    /// Big-endian u16 payload / 10 (V)
    ScaledVoltage,
    /// Big-endian i16 payload / 10 (A, signed)
    ScaledCurrent,
}

/// A decoded command response
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// Raw adapter text (addressing commands have no data value)
    Text(String),
    /// A numeric sensor reading
    Reading(f64),
}

impl Decoded {
    /// The numeric reading, if this is one
    pub fn reading(&self) -> Option<f64> {
        match self {
            Decoded::Reading(value) => Some(*value),
            Decoded::Text(_) => None,
        }
    }
}

/// An immutable command descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    /// Unique symbolic name
    pub name: &'static str,
    /// Request string sent to the adapter (terminator appended by the session)
    pub request: &'static str,
    /// How to interpret the response
    pub decoder: Decoder,
}

impl Command {
    const fn new(name: &'static str, request: &'static str, decoder: Decoder) -> Self {
        Self {
            name,
            request,
            decoder,
        }
    }

    /// Decode a raw adapter response.
    ///
    /// Returns `None` for anything the pipeline must treat as invalid: an
    /// empty response, an adapter error sentinel, a frame that does not echo
    /// this command's request, or a payload too short for the formula.
    pub fn decode(&self, raw: &str) -> Option<Decoded> {
        let cleaned = clean_response(raw);
        if cleaned.is_empty() || is_error_sentinel(&cleaned) {
            return None;
        }

        match self.decoder {
            Decoder::RawText => Some(Decoded::Text(cleaned)),
            Decoder::Percent => {
                let payload = self.response_payload(&cleaned)?;
                Some(Decoded::Reading(payload[0] as f64 / 2.0))
            }
            Decoder::OffsetTemp => {
                let payload = self.response_payload(&cleaned)?;
                Some(Decoded::Reading(payload[0] as f64 - 40.0))
            }
            Decoder::ScaledVoltage => {
                let payload = self.response_payload(&cleaned)?;
                let word = u16::from_be_bytes([*payload.first()?, *payload.get(1)?]);
                Some(Decoded::Reading(word as f64 / 10.0))
            }
            Decoder::ScaledCurrent => {
                let payload = self.response_payload(&cleaned)?;
                let word = i16::from_be_bytes([*payload.first()?, *payload.get(1)?]);
                Some(Decoded::Reading(word as f64 / 10.0))
            }
        }
    }

    /// Extract the data bytes of a UDS positive response.
    ///
    /// The request `22 DD DD` must be echoed back as `62 DD DD` ahead of the
    /// payload; a mismatched or truncated frame yields nothing.
    fn response_payload(&self, cleaned: &str) -> Option<Vec<u8>> {
        let request = parse_hex_bytes(self.request)?;
        let response = parse_hex_bytes(cleaned)?;
        if request.len() < 3 || response.len() < request.len() + 1 {
            return None;
        }
        if response[0] != (request[0] | 0x40) || response[1..3] != request[1..3] {
            return None;
        }
        Some(response[3..].to_vec())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Strip adapter noise from a response: search banners, line terminators,
/// and the `>` prompt.
pub(crate) fn clean_response(raw: &str) -> String {
    raw.replace("SEARCHING...", "")
        .replace(['\r', '\n', '>'], " ")
        .trim()
        .to_string()
}

fn is_error_sentinel(cleaned: &str) -> bool {
    if cleaned == "?" {
        return true;
    }
    let upper = cleaned.to_ascii_uppercase();
    ERROR_SENTINELS.iter().any(|s| upper.contains(s))
}

/// Parse whitespace-separated hex text into bytes; `None` if any character
/// is not a hex digit or a byte is incomplete.
fn parse_hex_bytes(text: &str) -> Option<Vec<u8>> {
    let digits: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.is_empty() || digits.len() % 2 != 0 {
        return None;
    }
    digits
        .as_bytes()
        .chunks(2)
        .map(|pair| {
            let s = std::str::from_utf8(pair).ok()?;
            u8::from_str_radix(s, 16).ok()
        })
        .collect()
}

// Addressing commands. Selecting a module's CAN header and receive address
// is stateful session configuration consumed by the very next data request.
pub const CAN_HEADER_7E4: Command =
    Command::new("CAN_HEADER_7E4", "ATSH7E4", Decoder::RawText);
pub const CAN_HEADER_7C6: Command =
    Command::new("CAN_HEADER_7C6", "ATSH7C6", Decoder::RawText);
pub const CAN_HEADER_7E2: Command =
    Command::new("CAN_HEADER_7E2", "ATSH7E2", Decoder::RawText);
pub const CAN_HEADER_7A0: Command =
    Command::new("CAN_HEADER_7A0", "ATSH7A0", Decoder::RawText);
pub const CAN_HEADER_7E6: Command =
    Command::new("CAN_HEADER_7E6", "ATSH7E6", Decoder::RawText);

pub const CAN_RECEIVE_ADDRESS_7EC: Command =
    Command::new("CAN_RECEIVE_ADDRESS_7EC", "ATCRA7EC", Decoder::RawText);
pub const CAN_RECEIVE_ADDRESS_7EA: Command =
    Command::new("CAN_RECEIVE_ADDRESS_7EA", "ATCRA7EA", Decoder::RawText);
pub const CAN_RECEIVE_ADDRESS_7A8: Command =
    Command::new("CAN_RECEIVE_ADDRESS_7A8", "ATCRA7A8", Decoder::RawText);
pub const CAN_RECEIVE_ADDRESS_7EE: Command =
    Command::new("CAN_RECEIVE_ADDRESS_7EE", "ATCRA7EE", Decoder::RawText);

pub const CAN_FILTER_7CE: Command =
    Command::new("CAN_FILTER_7CE", "ATCF7CE", Decoder::RawText);

// Value commands (UDS service 0x22 against the addressed module).
pub const BAT_SOC: Command = Command::new("BAT_SOC", "228334", Decoder::Percent);
pub const AMBIENT_AIR_TEMP: Command =
    Command::new("AMBIENT_AIR_TEMP", "220046", Decoder::OffsetTemp);
pub const BAT_COOLANT_TEMP: Command =
    Command::new("BAT_COOLANT_TEMP", "2241A4", Decoder::OffsetTemp);
pub const ELEC_COOLANT_TEMP: Command =
    Command::new("ELEC_COOLANT_TEMP", "2241A4", Decoder::OffsetTemp);
pub const AC_VOLTAGE: Command =
    Command::new("AC_VOLTAGE", "224368", Decoder::ScaledVoltage);
pub const AC_CURRENT: Command =
    Command::new("AC_CURRENT", "224369", Decoder::ScaledCurrent);
pub const CHARGING_LEVEL: Command =
    Command::new("CHARGING_LEVEL", "224531", Decoder::Percent);

/// Every command the pipeline knows about, keyed by symbolic name
pub const CATALOG: &[&Command] = &[
    &CAN_HEADER_7E4,
    &CAN_HEADER_7C6,
    &CAN_HEADER_7E2,
    &CAN_HEADER_7A0,
    &CAN_HEADER_7E6,
    &CAN_RECEIVE_ADDRESS_7EC,
    &CAN_RECEIVE_ADDRESS_7EA,
    &CAN_RECEIVE_ADDRESS_7A8,
    &CAN_RECEIVE_ADDRESS_7EE,
    &CAN_FILTER_7CE,
    &BAT_SOC,
    &AMBIENT_AIR_TEMP,
    &BAT_COOLANT_TEMP,
    &ELEC_COOLANT_TEMP,
    &AC_VOLTAGE,
    &AC_CURRENT,
    &CHARGING_LEVEL,
];

/// Look up a catalog command by name
pub fn find(name: &str) -> Option<&'static Command> {
    CATALOG.iter().copied().find(|c| c.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_soc_decode() {
        // 0xA9 = 169, so SOC = 169 / 2 = 84.5%
        let decoded = BAT_SOC.decode("62 83 34 A9").unwrap();
        assert_eq!(decoded, Decoded::Reading(84.5));
    }

    #[test]
    fn test_temp_decode() {
        // 0x3C = 60, so temp = 60 - 40 = 20°C
        let decoded = AMBIENT_AIR_TEMP.decode("62 00 46 3C").unwrap();
        assert_eq!(decoded, Decoded::Reading(20.0));
    }

    #[test]
    fn test_voltage_decode() {
        // 0x0910 = 2320, so voltage = 232.0 V
        let decoded = AC_VOLTAGE.decode("62 43 68 09 10").unwrap();
        assert_eq!(decoded, Decoded::Reading(232.0));
    }

    #[test]
    fn test_current_decode_signed() {
        // 0xFF9C = -100 as i16, so current = -10.0 A
        let decoded = AC_CURRENT.decode("62 43 69 FF 9C").unwrap();
        assert_eq!(decoded, Decoded::Reading(-10.0));

        let decoded = AC_CURRENT.decode("62 43 69 00 64").unwrap();
        assert_eq!(decoded, Decoded::Reading(10.0));
    }

    #[test]
    fn test_addressing_decodes_to_text() {
        let decoded = CAN_HEADER_7E4.decode("OK\r\r>").unwrap();
        assert_eq!(decoded, Decoded::Text("OK".to_string()));
    }

    #[test]
    fn test_invalid_responses_rejected() {
        assert_eq!(BAT_SOC.decode(""), None);
        assert_eq!(BAT_SOC.decode("  \r\n>"), None);
        assert_eq!(BAT_SOC.decode("?"), None);
        assert_eq!(BAT_SOC.decode("NO DATA"), None);
        assert_eq!(BAT_SOC.decode("CAN ERROR"), None);
        assert_eq!(CAN_HEADER_7E4.decode("UNABLE TO CONNECT"), None);
    }

    #[test]
    fn test_echo_mismatch_rejected() {
        // Frame echoes DID 0046, not 8334
        assert_eq!(BAT_SOC.decode("62 00 46 A9"), None);
        // Negative response instead of 0x62
        assert_eq!(BAT_SOC.decode("7F 22 31"), None);
    }

    #[test]
    fn test_truncated_frame_rejected() {
        assert_eq!(BAT_SOC.decode("62 83 34"), None);
        assert_eq!(AC_VOLTAGE.decode("62 43 68 09"), None);
    }

    #[test]
    fn test_search_banner_stripped() {
        let decoded = BAT_SOC.decode("SEARCHING...\r62 83 34 C8\r\r>").unwrap();
        assert_eq!(decoded, Decoded::Reading(100.0));
    }

    #[test]
    fn test_catalog_lookup() {
        assert_eq!(find("BAT_SOC"), Some(&BAT_SOC));
        assert_eq!(find("ODOMETER"), None);
    }

    #[test]
    fn test_catalog_names_unique() {
        for (i, a) in CATALOG.iter().enumerate() {
            for b in &CATALOG[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    proptest! {
        #[test]
        fn decode_never_panics(raw in ".*") {
            for command in CATALOG {
                let _ = command.decode(&raw);
            }
        }

        #[test]
        fn offset_temp_stays_in_byte_range(byte in 0u8..=255) {
            let raw = format!("62 00 46 {byte:02X}");
            let decoded = AMBIENT_AIR_TEMP.decode(&raw).unwrap();
            let value = decoded.reading().unwrap();
            prop_assert!((-40.0..=215.0).contains(&value));
        }
    }
}
