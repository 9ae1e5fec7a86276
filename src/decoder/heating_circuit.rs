//! Heating-circuit controller status frame (`9000ff00`, 14 bytes).
//!
//! ```text
//! byte  6     operating mode
//! byte  7     automatic program flag
//! bytes 8-9   room temperature desired (1/10 °C)
//! bytes 10-11 room temperature measured (1/10 °C)
//! ```

use super::{byte, names, tenths, Reading};

/// Decode a CRC-checked heating-circuit frame.
///
/// Short controller variants (9 or 11 bytes) without temperatures have never
/// been observed behind this signature; the 14-byte layout is always assumed.
pub fn decode(bytes: &[u8]) -> Vec<Reading> {
    vec![
        Reading::new(names::HC_TDESIRED, tenths(bytes, 8)),
        Reading::new(names::HC_TMEASURED, tenths(bytes, 10)),
        Reading::new(names::HC_MODE, byte(bytes, 6)),
        Reading::new(names::HC_AUTO, byte(bytes, 7)),
    ]
}
