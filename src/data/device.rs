//! Device information replies: firmware version, status and authentication.

use std::fmt;

use crate::data::temperatures::Units;

/// Status byte value meaning the beeper is on.
pub const BEEPER_ON: u8 = 0x0C;

/// Firmware version (0x41).
///
/// Payload layout:
/// - Byte 0: Major (high nibble) and minor (low nibble)
/// - Byte 1: Patch
/// - Byte 2: Build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FirmwareVersion {
    /// Major version (0-15).
    pub major: u8,
    /// Minor version (0-15).
    pub minor: u8,
    /// Patch level.
    pub patch: u8,
    /// Build number.
    pub build: u8,
}

impl FirmwareVersion {
    /// Size of the payload in bytes.
    pub const SIZE: usize = 3;

    /// Parse from a firmware version payload.
    pub fn from_payload(payload: &[u8]) -> Option<Self> {
        if payload.len() != Self::SIZE {
            return None;
        }

        Some(Self {
            major: payload[0] >> 4,
            minor: payload[0] & 0x0F,
            patch: payload[1],
            build: payload[2],
        })
    }
}

/// Formats as `major.minor.patch.build` with patch and build in hex.
impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{:02x}.{:02x}",
            self.major, self.minor, self.patch, self.build
        )
    }
}

/// Device status (0x26).
///
/// Payload layout:
/// - Byte 0: Units
/// - Byte 1: Beeper (0x0C = on, 0x0F = off)
/// - Byte 2: Battery (0-100)
/// - Bytes 3-4: Unused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceStatus {
    /// Display units.
    pub units: Units,
    /// Whether the audible alarm is enabled.
    pub beeper: bool,
    /// Battery level in percent.
    pub battery: u8,
}

impl DeviceStatus {
    /// Size of the payload in bytes.
    pub const SIZE: usize = 5;

    /// Parse from a status payload.
    pub fn from_payload(payload: &[u8]) -> Option<Self> {
        if payload.len() != Self::SIZE {
            return None;
        }

        Some(Self {
            units: Units::from_raw(payload[0]),
            beeper: payload[1] == BEEPER_ON,
            battery: payload[2],
        })
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Status(units={} beeper={} bat={}%)",
            self.units,
            if self.beeper { "ON" } else { "OFF" },
            self.battery
        )
    }
}

/// Authentication reply (0x01).
///
/// The meaning of the two bytes is unknown; receiving the reply at all means
/// the handshake was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AuthResponse {
    /// Opaque reply bytes.
    pub data: [u8; 2],
}

impl AuthResponse {
    /// Size of the payload in bytes.
    pub const SIZE: usize = 2;

    /// Parse from an authentication payload.
    pub fn from_payload(payload: &[u8]) -> Option<Self> {
        match payload {
            [a, b] => Some(Self { data: [*a, *b] }),
            _ => None,
        }
    }
}

impl fmt::Display for AuthResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Auth(data={:02x}{:02x})", self.data[0], self.data[1])
    }
}
