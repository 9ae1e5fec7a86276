//! Protocol module - framing, checksum and command blocks.
//!
//! This module implements the bus wire format:
//! - CRC-8 trailer validation
//! - Frame kinds with their signatures and declared lengths
//! - Frame buffer for reassembling frames from partial reads
//! - 11-byte outbound command blocks

mod command;
pub mod crc;
mod frame;
mod frame_buffer;

pub use command::{
    markers, registers, to_bus_units, CommandBlock, HcMode, WriteSequence, BLOCK_HEADER_SIZE,
    BLOCK_SIZE, MAX_SETPOINT,
};
pub use crc::{checksum, crc_check, seal};
pub use frame::{Frame, FrameKind};
pub use frame_buffer::{FrameBuffer, Inbound, DEFAULT_MAX_BUFFERED};
