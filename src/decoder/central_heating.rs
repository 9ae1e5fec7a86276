//! Central-heating status frame (`88001800`, 31 bytes).
//!
//! ```text
//! byte  4     flow temperature desired (°C)
//! bytes 5-6   flow temperature measured (1/10 °C)
//! byte  8     burner power (%)
//! byte  9     bits 0-1 mode, bit 3 burner operation
//! byte  11    bit 0 fan, bit 5 heating pump, bit 6 cylinder pump, bit 7 circulation pump
//! bytes 13-14 mixer temperature (1/10 °C)
//! bytes 22-23 raw error-code bytes
//! bytes 24-25 error code
//! ```

use super::{be_field, byte, flag, names, tenths, Reading};
use crate::store::Value;

/// Decode a CRC-checked central-heating frame.
pub fn decode(bytes: &[u8]) -> Vec<Reading> {
    vec![
        Reading::new(names::CH_TFLOW_DESIRED, byte(bytes, 4)),
        Reading::new(names::CH_TFLOW_MEASURED, tenths(bytes, 5)),
        Reading::new(names::CH_TMIXER, tenths(bytes, 13)),
        Reading::new(names::CH_BURNER_POWER, byte(bytes, 8)),
        Reading::new(names::CH_BURNER_OPERATION, flag(bytes, 9, 0x08)),
        Reading::new(names::CH_PUMP_HEATING, flag(bytes, 11, 0x20)),
        Reading::new(names::CH_PUMP_CYLINDER, flag(bytes, 11, 0x40)),
        Reading::new(names::CH_PUMP_CIRCULATION, flag(bytes, 11, 0x80)),
        Reading::new(names::CH_BURNER_FAN, flag(bytes, 11, 0x01)),
        Reading::new(names::CH_MODE, Value::Integer(u32::from(bytes[9] & 0x03))),
        Reading::new(names::CH_CODE, Value::Integer(be_field(bytes, 24, 2))),
        Reading::new(names::CH_22_NUM, byte(bytes, 22)),
        Reading::new(names::CH_23_NUM, byte(bytes, 23)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::testutil::{frame, value};
    use crate::protocol::FrameKind;

    #[test]
    fn test_burner_power_and_operation() {
        let raw = frame(FrameKind::CentralHeating, &[(8, 0x32), (9, 0x08)]);
        let readings = decode(&raw);

        assert_eq!(value(&readings, names::CH_BURNER_POWER), &Value::Integer(50));
        assert_eq!(value(&readings, names::CH_BURNER_OPERATION), &Value::Flag(true));
        assert_eq!(value(&readings, names::CH_MODE), &Value::Integer(0));
    }

    #[test]
    fn test_temperatures() {
        // 0x01C7 = 455 -> 45.5, 0x0190 = 400 -> 40.0
        let raw = frame(
            FrameKind::CentralHeating,
            &[(4, 60), (5, 0x01), (6, 0xC7), (13, 0x01), (14, 0x90)],
        );
        let readings = decode(&raw);

        assert_eq!(value(&readings, names::CH_TFLOW_DESIRED), &Value::Integer(60));
        assert_eq!(value(&readings, names::CH_TFLOW_MEASURED), &Value::Decimal(45.5));
        assert_eq!(value(&readings, names::CH_TMIXER), &Value::Decimal(40.0));
    }

    #[test]
    fn test_pump_and_fan_bits() {
        let raw = frame(FrameKind::CentralHeating, &[(11, 0xA1)]);
        let readings = decode(&raw);

        assert_eq!(value(&readings, names::CH_PUMP_HEATING), &Value::Flag(true));
        assert_eq!(value(&readings, names::CH_PUMP_CYLINDER), &Value::Flag(false));
        assert_eq!(value(&readings, names::CH_PUMP_CIRCULATION), &Value::Flag(true));
        assert_eq!(value(&readings, names::CH_BURNER_FAN), &Value::Flag(true));
    }

    #[test]
    fn test_mode_masks_low_bits() {
        let raw = frame(FrameKind::CentralHeating, &[(9, 0xFB)]);
        let readings = decode(&raw);

        assert_eq!(value(&readings, names::CH_MODE), &Value::Integer(3));
        assert_eq!(value(&readings, names::CH_BURNER_OPERATION), &Value::Flag(true));
    }

    #[test]
    fn test_error_codes() {
        let raw = frame(
            FrameKind::CentralHeating,
            &[(22, b'E'), (23, b'A'), (24, 0x00), (25, 0xE3)],
        );
        let readings = decode(&raw);

        assert_eq!(value(&readings, names::CH_22_NUM), &Value::Integer(0x45));
        assert_eq!(value(&readings, names::CH_23_NUM), &Value::Integer(0x41));
        assert_eq!(value(&readings, names::CH_CODE), &Value::Integer(227));
    }
}
