//! Domestic hot water status frame (`88003400`, 23 bytes).
//!
//! ```text
//! byte  4     hot water temperature desired (°C)
//! bytes 5-6   hot water temperature measured (1/10 °C)
//! bytes 7-8   cylinder temperature (1/10 °C)
//! byte  9     bit 1 charge once, bit 2 thermal disinfection, bit 3 generating,
//!             bit 4 boost charge, bit 5 temperature ok
//! bytes 14-16 burner running time for hot water
//! bytes 17-19 burner starts for hot water
//! ```

use super::{be_field, byte, flag, names, tenths, Reading};
use crate::store::Value;

/// Decode a CRC-checked hot water frame.
pub fn decode(bytes: &[u8]) -> Vec<Reading> {
    vec![
        Reading::new(names::DHW_TDESIRED, byte(bytes, 4)),
        Reading::new(names::DHW_TMEASURED, tenths(bytes, 5)),
        Reading::new(names::DHW_TCYLINDER, tenths(bytes, 7)),
        Reading::new(names::CH_RUNTIME_DHW, Value::Integer(be_field(bytes, 14, 3))),
        Reading::new(names::CH_STARTS_DHW, Value::Integer(be_field(bytes, 17, 3))),
        Reading::new(names::DHW_CHARGE_ONCE, flag(bytes, 9, 0x02)),
        Reading::new(names::DHW_THERMAL_DESINFECTION, flag(bytes, 9, 0x04)),
        Reading::new(names::DHW_GENERATING, flag(bytes, 9, 0x08)),
        Reading::new(names::DHW_BOOST_CHARGE, flag(bytes, 9, 0x10)),
        Reading::new(names::DHW_TOK, flag(bytes, 9, 0x20)),
    ]
}
