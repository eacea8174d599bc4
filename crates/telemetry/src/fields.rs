//! Field Table
//!
//! Declarative mapping from published field name to the addressing pair and
//! value command that read it. The whole battery set lives on the BMS
//! module, so every row selects header 7E4 and receive address 7EC before
//! its value query.

use obd_link::command::{
    AC_CURRENT, AC_VOLTAGE, AMBIENT_AIR_TEMP, BAT_COOLANT_TEMP, BAT_SOC, CAN_HEADER_7E4,
    CAN_RECEIVE_ADDRESS_7EC, CHARGING_LEVEL, ELEC_COOLANT_TEMP,
};
use obd_link::Command;

/// One field of the telemetry snapshot and how to read it
#[derive(Debug, Clone, Copy)]
pub struct FieldQuery {
    /// Field name as published in the snapshot
    pub field: &'static str,
    /// CAN header selection, sent first
    pub header: &'static Command,
    /// CAN receive address selection, sent second
    pub receive_address: &'static Command,
    /// The data request itself
    pub value: &'static Command,
}

/// The configured field set, iterated in this order on every run
pub const FIELD_QUERIES: [FieldQuery; 7] = [
    FieldQuery {
        field: "charge_voltage",
        header: &CAN_HEADER_7E4,
        receive_address: &CAN_RECEIVE_ADDRESS_7EC,
        value: &AC_VOLTAGE,
    },
    FieldQuery {
        field: "charge_current",
        header: &CAN_HEADER_7E4,
        receive_address: &CAN_RECEIVE_ADDRESS_7EC,
        value: &AC_CURRENT,
    },
    FieldQuery {
        field: "charge_level",
        header: &CAN_HEADER_7E4,
        receive_address: &CAN_RECEIVE_ADDRESS_7EC,
        value: &CHARGING_LEVEL,
    },
    FieldQuery {
        field: "battery_charge",
        header: &CAN_HEADER_7E4,
        receive_address: &CAN_RECEIVE_ADDRESS_7EC,
        value: &BAT_SOC,
    },
    FieldQuery {
        field: "battery_coolant_temp",
        header: &CAN_HEADER_7E4,
        receive_address: &CAN_RECEIVE_ADDRESS_7EC,
        value: &BAT_COOLANT_TEMP,
    },
    FieldQuery {
        field: "electronics_coolant_temp",
        header: &CAN_HEADER_7E4,
        receive_address: &CAN_RECEIVE_ADDRESS_7EC,
        value: &ELEC_COOLANT_TEMP,
    },
    FieldQuery {
        field: "ambient_air_temp",
        header: &CAN_HEADER_7E4,
        receive_address: &CAN_RECEIVE_ADDRESS_7EC,
        value: &AMBIENT_AIR_TEMP,
    },
];
