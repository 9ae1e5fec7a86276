//! Date/time broadcast frame (`90000600`, 14 bytes).
//!
//! ```text
//! byte 4  year - 2000
//! byte 5  month
//! byte 6  hours
//! byte 7  day
//! byte 8  minute
//! byte 9  second
//! ```
//!
//! The fields are formatted as transmitted; an out-of-range value from the
//! controller shows up verbatim in the string.

use super::{names, Reading};
use crate::store::Value;

/// Decode a CRC-checked date/time frame into `YYYY-MM-DD HH:MM:SS`.
pub fn decode(bytes: &[u8]) -> Vec<Reading> {
    let year = 2000 + u32::from(bytes[4]);
    let month = bytes[5];
    let hours = bytes[6];
    let day = bytes[7];
    let minute = bytes[8];
    let second = bytes[9];

    let timestamp = format!(
        "{:4}-{:02}-{:02} {:02}:{:02}:{:02}",
        year, month, day, hours, minute, second
    );

    vec![Reading::new(names::HT3_TIME, Value::Timestamp(timestamp))]
}
