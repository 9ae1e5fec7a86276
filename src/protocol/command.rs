//! Outbound command blocks.
//!
//! Implements the 11-byte block understood by the gateway transceiver:
//! ```text
//! ┌───────┬────────┬─────┬────────┬───────┬──────┬──────┬──────────┬──────────┬────────┬──────┐
//! │ Start │ Length │ Ack │ Device │ Class │ Dest │ 0xFF │ Register │ Reserved │ Action │ Data │
//! │  '#'  │  0x09  │ '!' │  'S'   │ 0x11  │ 0x10 │      │          │   0x00   │        │      │
//! └───────┴────────┴─────┴────────┴───────┴──────┴──────┴──────────┴──────────┴────────┴──────┘
//! ```
//!
//! Every setting change is a [`WriteSequence`] of two blocks that must be sent
//! in order with a pause in between.

use crate::error::{Ht3Error, Result};

/// Block size in bytes (fixed, exactly 11).
pub const BLOCK_SIZE: usize = 11;

/// Header size in bytes.
pub const BLOCK_HEADER_SIZE: usize = 5;

/// Header and payload markers.
pub mod markers {
    /// Start of block (`#`).
    pub const START: u8 = 0x23;
    /// Acknowledgement marker (`!`).
    pub const ACK: u8 = 0x21;
    /// Device marker (`S`).
    pub const DEVICE: u8 = 0x53;
    /// Command class for heating-circuit writes.
    pub const CLASS: u8 = 0x11;
    /// Bus destination of heating-circuit writes.
    pub const DESTINATION: u8 = 0x10;
    /// Fixed second payload byte.
    pub const FILL: u8 = 0xFF;
    /// Reserved payload byte.
    pub const RESERVED: u8 = 0x00;

    /// First block of a sequence.
    pub const ACTION_SET: u8 = 0x65;
    /// Second block of a sequence.
    pub const ACTION_COMMIT: u8 = 0x79;
}

/// Sub-register identifiers.
pub mod registers {
    /// Requested room temperature, first block.
    pub const SETPOINT: u8 = 0x11;
    /// Requested room temperature, second block.
    pub const SETPOINT_COMMIT: u8 = 0x07;
    /// Operating mode, first block.
    pub const MODE: u8 = 0x0E;
    /// Operating mode, second block.
    pub const MODE_COMMIT: u8 = 0x04;
}

/// Highest setpoint representable as a one-byte bus unit.
pub const MAX_SETPOINT: f64 = 127.5;

/// Heating-circuit operating mode as written to the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HcMode {
    /// Frost protection (off).
    Frost = 1,
    /// Economy (off).
    Eco = 2,
    /// Comfort (heat).
    Comfort = 3,
    /// Automatic program.
    Auto = 4,
}

impl HcMode {
    /// Wire code of the mode.
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Mode written for a thermostat "off" request (eco, not frost).
    pub fn off() -> Self {
        HcMode::Eco
    }
}

impl TryFrom<u8> for HcMode {
    type Error = Ht3Error;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            1 => Ok(HcMode::Frost),
            2 => Ok(HcMode::Eco),
            3 => Ok(HcMode::Comfort),
            4 => Ok(HcMode::Auto),
            other => Err(Ht3Error::InvalidMode(other)),
        }
    }
}

impl std::str::FromStr for HcMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "frost" | "1" => Ok(HcMode::Frost),
            "eco" | "off" | "2" => Ok(HcMode::Eco),
            "comfort" | "heat" | "3" => Ok(HcMode::Comfort),
            "auto" | "4" => Ok(HcMode::Auto),
            other => Err(format!("unknown mode '{}'", other)),
        }
    }
}

/// Convert degrees Celsius to bus units (degrees × 2, truncated).
///
/// # Example
///
/// ```
/// use ht3_driver::protocol::to_bus_units;
///
/// assert_eq!(to_bus_units(21.5).unwrap(), 43);
/// assert_eq!(to_bus_units(21.7).unwrap(), 43);
/// assert!(to_bus_units(200.0).is_err());
/// ```
pub fn to_bus_units(degrees: f64) -> Result<u8> {
    if !degrees.is_finite() || !(0.0..=MAX_SETPOINT).contains(&degrees) {
        return Err(Ht3Error::InvalidSetpoint(degrees));
    }
    Ok((degrees * 2.0) as u8)
}

/// A single outbound command block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandBlock {
    /// Sub-register being written.
    pub register: u8,
    /// Action id (set or commit).
    pub action: u8,
    /// Data byte.
    pub data: u8,
}

impl CommandBlock {
    /// Create a new command block.
    pub fn new(register: u8, action: u8, data: u8) -> Self {
        Self {
            register,
            action,
            data,
        }
    }

    /// Encode the block to bytes.
    ///
    /// # Example
    ///
    /// ```
    /// use ht3_driver::protocol::CommandBlock;
    ///
    /// let bytes = CommandBlock::new(0x11, 0x65, 43).encode();
    /// assert_eq!(bytes, [0x23, 0x09, 0x21, 0x53, 0x11, 0x10, 0xFF, 0x11, 0x00, 0x65, 43]);
    /// ```
    pub fn encode(&self) -> [u8; BLOCK_SIZE] {
        [
            markers::START,
            (BLOCK_SIZE - BLOCK_HEADER_SIZE + 3) as u8,
            markers::ACK,
            markers::DEVICE,
            markers::CLASS,
            markers::DESTINATION,
            markers::FILL,
            self.register,
            markers::RESERVED,
            self.action,
            self.data,
        ]
    }
}

/// The two blocks of one setting change, in send order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteSequence {
    /// Blocks to send, with the write delay between them.
    pub blocks: [CommandBlock; 2],
}

impl WriteSequence {
    /// Sequence writing a requested room temperature in bus units.
    pub fn setpoint(units: u8) -> Self {
        Self {
            blocks: [
                CommandBlock::new(registers::SETPOINT, markers::ACTION_SET, units),
                CommandBlock::new(registers::SETPOINT_COMMIT, markers::ACTION_COMMIT, units),
            ],
        }
    }

    /// Sequence writing an operating mode.
    pub fn mode(mode: HcMode) -> Self {
        let code = mode.code();
        Self {
            blocks: [
                CommandBlock::new(registers::MODE, markers::ACTION_SET, code),
                CommandBlock::new(registers::MODE_COMMIT, markers::ACTION_COMMIT, code),
            ],
        }
    }
}
