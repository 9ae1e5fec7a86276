//! Decoder module - frame payloads to named variables.
//!
//! One decoder per status frame kind:
//! - [`central_heating`] - burner, pumps, flow and mixer temperatures
//! - [`heating_circuit`] - room controller desired/measured temperature, mode
//! - [`hot_water`] - cylinder temperatures, counters, charge flags
//! - [`date_time`] - controller clock
//!
//! All multi-byte fields are big-endian unsigned integers; temperatures with a
//! two-byte field are transmitted in tenths of a degree.
//!
//! # Example
//!
//! ```
//! use ht3_driver::decoder::{self, names};
//! use ht3_driver::protocol::{seal, Frame, FrameKind};
//!
//! let mut raw = vec![0u8; 14];
//! raw[..4].copy_from_slice(FrameKind::HeatingCircuit.signature());
//! raw[6] = 3;
//! seal(&mut raw);
//!
//! let readings = decoder::decode(&Frame::from_slice(FrameKind::HeatingCircuit, &raw)).unwrap();
//! assert!(readings.iter().any(|r| r.name == names::HC_MODE));
//! ```

pub mod central_heating;
pub mod date_time;
pub mod heating_circuit;
pub mod hot_water;

use crate::protocol::Frame;
use crate::protocol::FrameKind;
use crate::store::Value;

/// Variable names as published to observers.
pub mod names {
    /// Flow temperature requested by the controller (°C).
    pub const CH_TFLOW_DESIRED: &str = "ch_Tflow_desired";
    /// Measured flow temperature (°C).
    pub const CH_TFLOW_MEASURED: &str = "ch_Tflow_measured";
    /// Mixer temperature (°C).
    pub const CH_TMIXER: &str = "ch_Tmixer";
    /// Burner power (%).
    pub const CH_BURNER_POWER: &str = "ch_burner_power";
    /// Burner running.
    pub const CH_BURNER_OPERATION: &str = "ch_burner_operation";
    /// Heating pump running.
    pub const CH_PUMP_HEATING: &str = "ch_pump_heating";
    /// Cylinder charge pump running.
    pub const CH_PUMP_CYLINDER: &str = "ch_pump_cylinder";
    /// Circulation pump running.
    pub const CH_PUMP_CIRCULATION: &str = "ch_pump_circulation";
    /// Burner fan running.
    pub const CH_BURNER_FAN: &str = "ch_burner_fan";
    /// Boiler mode bits.
    pub const CH_MODE: &str = "ch_mode";
    /// Combined error code.
    pub const CH_CODE: &str = "ch_code";
    /// First raw error-code byte.
    pub const CH_22_NUM: &str = "ch_22_num";
    /// Second raw error-code byte.
    pub const CH_23_NUM: &str = "ch_23_num";

    /// Room temperature requested on the heating circuit (°C).
    pub const HC_TDESIRED: &str = "hc_Tdesired";
    /// Measured room temperature (°C).
    pub const HC_TMEASURED: &str = "hc_Tmeasured";
    /// Heating-circuit operating mode.
    pub const HC_MODE: &str = "hc_mode";
    /// Heating-circuit automatic program flag.
    pub const HC_AUTO: &str = "hc_auto";

    /// Hot water temperature requested (°C).
    pub const DHW_TDESIRED: &str = "dhw_Tdesired";
    /// Hot water temperature measured (°C).
    pub const DHW_TMEASURED: &str = "dhw_Tmeasured";
    /// Cylinder temperature (°C).
    pub const DHW_TCYLINDER: &str = "dhw_Tcylinder";
    /// Burner running time for hot water (minutes).
    pub const CH_RUNTIME_DHW: &str = "ch_runtime_dhw";
    /// Burner starts for hot water.
    pub const CH_STARTS_DHW: &str = "ch_starts_dhw";
    /// One-time charge active.
    pub const DHW_CHARGE_ONCE: &str = "dhw_charge_once";
    /// Thermal disinfection active.
    pub const DHW_THERMAL_DESINFECTION: &str = "dhw_thermal_desinfection";
    /// Hot water being generated.
    pub const DHW_GENERATING: &str = "dhw_generating";
    /// Boost charge active.
    pub const DHW_BOOST_CHARGE: &str = "dhw_boost_charge";
    /// Hot water temperature reached.
    pub const DHW_TOK: &str = "dhw_Tok";

    /// Controller clock.
    pub const HT3_TIME: &str = "ht3_time";
}

/// One decoded `(name, value)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// Variable name (see [`names`]).
    pub name: &'static str,
    /// Scaled value.
    pub value: Value,
}

impl Reading {
    /// Create a new reading.
    pub fn new(name: &'static str, value: Value) -> Self {
        Self { name, value }
    }
}

/// Display metadata for a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableInfo {
    /// Variable name.
    pub name: &'static str,
    /// Human-readable label.
    pub label: &'static str,
    /// Unit of the value, if any.
    pub unit: Option<&'static str>,
}

const fn info(
    name: &'static str,
    label: &'static str,
    unit: Option<&'static str>,
) -> VariableInfo {
    VariableInfo { name, label, unit }
}

const CELSIUS: Option<&str> = Some("°C");

/// Every variable the decoders can produce.
pub static VARIABLES: &[VariableInfo] = &[
    info(names::CH_TFLOW_DESIRED, "CH Temp flow desired", CELSIUS),
    info(names::CH_TFLOW_MEASURED, "CH Temp flow measured", CELSIUS),
    info(names::CH_TMIXER, "CH Temp mixer", CELSIUS),
    info(names::CH_BURNER_POWER, "CH Burner power", Some("%")),
    info(names::CH_BURNER_OPERATION, "Burner operation", None),
    info(names::CH_PUMP_HEATING, "Pump heating", None),
    info(names::CH_PUMP_CYLINDER, "Pump cylinder", None),
    info(names::CH_PUMP_CIRCULATION, "Pump circulation", None),
    info(names::CH_BURNER_FAN, "Burner fan", None),
    info(names::CH_MODE, "CH Mode", None),
    info(names::CH_CODE, "CH Error code", None),
    info(names::CH_22_NUM, "CH Error byte 22", None),
    info(names::CH_23_NUM, "CH Error byte 23", None),
    info(names::HC_TDESIRED, "HC Temp desired", CELSIUS),
    info(names::HC_TMEASURED, "HC Temp measured", CELSIUS),
    info(names::HC_MODE, "HC Mode", None),
    info(names::HC_AUTO, "HC Auto", None),
    info(names::DHW_TDESIRED, "DHW Temp desired", CELSIUS),
    info(names::DHW_TMEASURED, "DHW Temp measured", CELSIUS),
    info(names::DHW_TCYLINDER, "DHW Temp cylinder", CELSIUS),
    info(names::CH_RUNTIME_DHW, "DHW Burner runtime", Some("min")),
    info(names::CH_STARTS_DHW, "DHW Burner starts", None),
    info(names::DHW_CHARGE_ONCE, "DHW Charge once", None),
    info(names::DHW_THERMAL_DESINFECTION, "DHW Thermal disinfection", None),
    info(names::DHW_GENERATING, "DHW generating", None),
    info(names::DHW_BOOST_CHARGE, "DHW Boost charge", None),
    info(names::DHW_TOK, "DHW OK", None),
    info(names::HT3_TIME, "Controller time", None),
];

/// Look up display metadata for a variable name.
pub fn variable_info(name: &str) -> Option<&'static VariableInfo> {
    VARIABLES.iter().find(|info| info.name == name)
}

/// Validate and decode a frame.
///
/// Returns `None` if the frame kind is not decoded, the length does not match
/// the declared length, or the CRC trailer is wrong.
pub fn decode(frame: &Frame) -> Option<Vec<Reading>> {
    if !frame.kind.is_decoded() || !frame.is_valid() {
        return None;
    }

    let bytes = frame.as_bytes();
    let readings = match frame.kind {
        FrameKind::CentralHeating => central_heating::decode(bytes),
        FrameKind::HeatingCircuit => heating_circuit::decode(bytes),
        FrameKind::HotWater => hot_water::decode(bytes),
        FrameKind::DateTime => date_time::decode(bytes),
        FrameKind::HeaterVariant | FrameKind::Diagnostic => return None,
    };
    Some(readings)
}

/// Big-endian unsigned field of `width` bytes at `offset`.
#[inline]
pub(crate) fn be_field(bytes: &[u8], offset: usize, width: usize) -> u32 {
    bytes[offset..offset + width]
        .iter()
        .fold(0u32, |acc, &byte| (acc << 8) | u32::from(byte))
}

/// Single byte as an integer value.
#[inline]
pub(crate) fn byte(bytes: &[u8], offset: usize) -> Value {
    Value::Integer(u32::from(bytes[offset]))
}

/// Two-byte field in tenths, as a decimal value.
#[inline]
pub(crate) fn tenths(bytes: &[u8], offset: usize) -> Value {
    Value::Decimal(f64::from(be_field(bytes, offset, 2)) / 10.0)
}

/// Bit test as a flag value.
#[inline]
pub(crate) fn flag(bytes: &[u8], offset: usize, mask: u8) -> Value {
    Value::Flag(bytes[offset] & mask != 0)
}
