//! Frame kinds and the frame struct.
//!
//! A frame is identified by a fixed signature at its start and has a fixed
//! declared length per kind:
//!
//! | Signature  | Bytes | Kind                                   |
//! |------------|-------|----------------------------------------|
//! | `88002000` | 31    | [`FrameKind::HeaterVariant`] (ignored) |
//! | `88001800` | 31    | [`FrameKind::CentralHeating`]          |
//! | `9000ff00` | 14    | [`FrameKind::HeatingCircuit`]          |
//! | `88003400` | 23    | [`FrameKind::HotWater`]                |
//! | `90000600` | 14    | [`FrameKind::DateTime`]                |
//! | `#HR`      | -     | [`FrameKind::Diagnostic`] (text)       |
//!
//! # Example
//!
//! ```
//! use ht3_driver::protocol::{Frame, FrameKind};
//! use bytes::Bytes;
//!
//! let mut raw = vec![0u8; 14];
//! raw[..4].copy_from_slice(FrameKind::DateTime.signature());
//! let frame = Frame::new(FrameKind::DateTime, Bytes::from(raw));
//!
//! assert_eq!(frame.len(), 14);
//! assert!(frame.is_complete());
//! ```

use bytes::Bytes;

use super::crc::crc_check;

/// Known frame kinds on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// Heater message variant that is recognised but not decoded.
    HeaterVariant,
    /// Central-heating (burner, pumps, flow temperature) status.
    CentralHeating,
    /// Heating-circuit controller status.
    HeatingCircuit,
    /// Domestic hot water status.
    HotWater,
    /// Date/time broadcast.
    DateTime,
    /// Plain-text diagnostic output of the gateway.
    Diagnostic,
}

impl FrameKind {
    /// Scan order used by the frame buffer. The first kind whose signature
    /// is present in the buffer wins.
    pub const PRIORITY: [FrameKind; 6] = [
        FrameKind::HeaterVariant,
        FrameKind::CentralHeating,
        FrameKind::HeatingCircuit,
        FrameKind::HotWater,
        FrameKind::DateTime,
        FrameKind::Diagnostic,
    ];

    /// Signature bytes at the start of the frame.
    pub fn signature(self) -> &'static [u8] {
        match self {
            FrameKind::HeaterVariant => &[0x88, 0x00, 0x20, 0x00],
            FrameKind::CentralHeating => &[0x88, 0x00, 0x18, 0x00],
            FrameKind::HeatingCircuit => &[0x90, 0x00, 0xFF, 0x00],
            FrameKind::HotWater => &[0x88, 0x00, 0x34, 0x00],
            FrameKind::DateTime => &[0x90, 0x00, 0x06, 0x00],
            FrameKind::Diagnostic => b"#HR",
        }
    }

    /// Declared frame length in bytes, `None` for free-form text.
    pub fn byte_length(self) -> Option<usize> {
        match self {
            FrameKind::HeaterVariant | FrameKind::CentralHeating => Some(31),
            FrameKind::HeatingCircuit | FrameKind::DateTime => Some(14),
            FrameKind::HotWater => Some(23),
            FrameKind::Diagnostic => None,
        }
    }

    /// Whether frames of this kind are handed to a decoder.
    pub fn is_decoded(self) -> bool {
        !matches!(self, FrameKind::HeaterVariant | FrameKind::Diagnostic)
    }

    /// Short name for logging.
    pub fn name(self) -> &'static str {
        match self {
            FrameKind::HeaterVariant => "heater-variant",
            FrameKind::CentralHeating => "central-heating",
            FrameKind::HeatingCircuit => "heating-circuit",
            FrameKind::HotWater => "hot-water",
            FrameKind::DateTime => "date-time",
            FrameKind::Diagnostic => "diagnostic",
        }
    }
}

impl std::fmt::Display for FrameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A complete bus frame, signature included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Kind selected by the signature.
    pub kind: FrameKind,
    /// Raw frame bytes (zero-copy via `bytes::Bytes`).
    pub bytes: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(kind: FrameKind, bytes: Bytes) -> Self {
        Self { kind, bytes }
    }

    /// Create a frame from raw bytes (copies data).
    pub fn from_slice(kind: FrameKind, bytes: &[u8]) -> Self {
        Self {
            kind,
            bytes: Bytes::copy_from_slice(bytes),
        }
    }

    /// Get a reference to the frame bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Frame length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if the frame holds no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Check that the frame has exactly its kind's declared length.
    pub fn is_complete(&self) -> bool {
        self.kind.byte_length() == Some(self.bytes.len())
    }

    /// Check length and CRC trailer.
    pub fn is_valid(&self) -> bool {
        self.is_complete() && crc_check(&self.bytes, self.bytes.len())
    }

    /// Hex rendering for logs.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::crc::seal;

    #[test]
    fn test_signatures_are_distinct() {
        for (i, a) in FrameKind::PRIORITY.iter().enumerate() {
            for b in &FrameKind::PRIORITY[i + 1..] {
                assert_ne!(a.signature(), b.signature());
            }
        }
    }

    #[test]
    fn test_declared_lengths() {
        assert_eq!(FrameKind::HeaterVariant.byte_length(), Some(31));
        assert_eq!(FrameKind::CentralHeating.byte_length(), Some(31));
        assert_eq!(FrameKind::HeatingCircuit.byte_length(), Some(14));
        assert_eq!(FrameKind::HotWater.byte_length(), Some(23));
        assert_eq!(FrameKind::DateTime.byte_length(), Some(14));
        assert_eq!(FrameKind::Diagnostic.byte_length(), None);
    }

    #[test]
    fn test_only_status_frames_are_decoded() {
        assert!(!FrameKind::HeaterVariant.is_decoded());
        assert!(!FrameKind::Diagnostic.is_decoded());
        assert!(FrameKind::CentralHeating.is_decoded());
        assert!(FrameKind::DateTime.is_decoded());
    }

    #[test]
    fn test_frame_validity() {
        let mut raw = vec![0u8; 23];
        raw[..4].copy_from_slice(FrameKind::HotWater.signature());
        raw[4] = 55;
        seal(&mut raw);

        let frame = Frame::from_slice(FrameKind::HotWater, &raw);
        assert!(frame.is_valid());

        let short = Frame::from_slice(FrameKind::HotWater, &raw[..22]);
        assert!(!short.is_complete());
        assert!(!short.is_valid());

        raw[4] = 56;
        let corrupted = Frame::from_slice(FrameKind::HotWater, &raw);
        assert!(corrupted.is_complete());
        assert!(!corrupted.is_valid());
    }

    #[test]
    fn test_hex_rendering() {
        let frame = Frame::from_slice(FrameKind::HeatingCircuit, &[0x90, 0x00, 0xFF, 0x00]);
        assert_eq!(frame.to_hex(), "9000ff00");
    }
}
