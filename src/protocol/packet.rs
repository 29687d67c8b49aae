//! Packet framing and checksum.
//!
//! Every message exchanged with a TP90x thermometer, in either direction,
//! uses the same frame layout:
//!
//! `Command(1) + Length(1) + Data(Length) + Checksum(1)`
//!
//! The checksum is the low byte of the sum of all preceding bytes.

use crate::error::{Error, Result};
use crate::protocol::commands::{Command, ResponseType};

/// Smallest possible frame: command, length and checksum with no data.
pub const MIN_FRAME_LEN: usize = 3;

/// Offset of the first data byte within a frame.
pub const HEADER_LEN: usize = 2;

/// Calculate the frame checksum over `bytes`.
///
/// # Example
///
/// ```
/// use tp90x::protocol::checksum;
///
/// assert_eq!(checksum(&[0x41, 0x00]), 0x41);
/// assert_eq!(checksum(&[0xFF, 0x02]), 0x01);
/// ```
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, &b| sum.wrapping_add(b))
}

/// Build a complete frame for `command` carrying `payload`.
///
/// The length byte is `payload.len()` truncated to a byte; callers keep
/// payloads at or below 255 bytes.
pub fn build_packet(command: u8, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(MIN_FRAME_LEN + payload.len());
    frame.push(command);
    frame.push(payload.len() as u8);
    frame.extend_from_slice(payload);
    frame.push(checksum(&frame));
    frame
}

/// Verify the checksum of a frame.
///
/// Returns `false` if the frame is shorter than [`MIN_FRAME_LEN`], shorter
/// than its length byte claims, or if the checksum does not match. Bytes
/// after the checksum are ignored.
pub fn verify_checksum(frame: &[u8]) -> bool {
    if frame.len() < MIN_FRAME_LEN {
        return false;
    }

    let end = HEADER_LEN + frame[1] as usize;
    if frame.len() < end + 1 {
        return false;
    }

    checksum(&frame[..end]) == frame[end]
}

/// A validated frame split into its command byte and payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Raw command byte.
    pub command: u8,
    /// Data bytes between the length byte and the checksum.
    pub payload: Vec<u8>,
}

impl Packet {
    /// Create a packet from a raw command byte.
    pub fn new(command: u8, payload: Vec<u8>) -> Self {
        Self { command, payload }
    }

    /// Create an outbound packet for a known command.
    pub fn for_command(command: Command, payload: Vec<u8>) -> Self {
        Self::new(command.to_raw(), payload)
    }

    /// Parse and checksum-validate a received frame.
    pub fn parse(frame: &[u8]) -> Result<Self> {
        if frame.len() < MIN_FRAME_LEN {
            return Err(Error::InvalidData {
                context: format!("Frame too short: {} bytes", frame.len()),
            });
        }

        let end = HEADER_LEN + frame[1] as usize;
        if frame.len() < end + 1 {
            return Err(Error::InvalidData {
                context: format!(
                    "Frame incomplete: have {} bytes, need {}",
                    frame.len(),
                    end + 1
                ),
            });
        }

        let expected = checksum(&frame[..end]);
        if expected != frame[end] {
            return Err(Error::ChecksumMismatch {
                expected,
                actual: frame[end],
            });
        }

        Ok(Self {
            command: frame[0],
            payload: frame[HEADER_LEN..end].to_vec(),
        })
    }

    /// Serialize the packet to a complete frame.
    pub fn to_bytes(&self) -> Vec<u8> {
        build_packet(self.command, &self.payload)
    }

    /// Interpret the command byte as an inbound message type.
    pub fn response_type(&self) -> ResponseType {
        ResponseType::from_raw(self.command)
    }
}
