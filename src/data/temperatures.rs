//! Temperature data structures.
//!
//! Contains the per-probe reading type and the two messages that carry
//! readings: the periodic broadcast and the actual-temperature report.

use std::fmt;

use crate::protocol::bcd::decode_temperature_at;

/// Raw units byte for Celsius.
pub const UNITS_CELSIUS: u8 = 0x0C;
/// Raw units byte for Fahrenheit.
pub const UNITS_FAHRENHEIT: u8 = 0x0F;

/// Display units reported by (or sent to) the thermometer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Units {
    /// Degrees Celsius (0x0C).
    Celsius,
    /// Degrees Fahrenheit (0x0F).
    Fahrenheit,
    /// Any other byte, kept as received.
    Unknown(u8),
}

impl Units {
    /// Create from raw byte value. Never fails.
    pub fn from_raw(value: u8) -> Self {
        match value {
            UNITS_CELSIUS => Self::Celsius,
            UNITS_FAHRENHEIT => Self::Fahrenheit,
            other => Self::Unknown(other),
        }
    }

    /// Convert to raw byte value.
    pub fn to_raw(&self) -> u8 {
        match self {
            Self::Celsius => UNITS_CELSIUS,
            Self::Fahrenheit => UNITS_FAHRENHEIT,
            Self::Unknown(raw) => *raw,
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Celsius => write!(f, "C"),
            Self::Fahrenheit => write!(f, "F"),
            Self::Unknown(raw) => write!(f, "{:#04x}", raw),
        }
    }
}

/// A single probe reading.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Temperature {
    /// Probe channel (1-based).
    pub channel: u8,
    /// Reading with 0.1° resolution, or `None` if no probe is plugged in.
    pub value: Option<f64>,
}

impl Temperature {
    /// Create a new reading.
    pub fn new(channel: u8, value: Option<f64>) -> Self {
        Self { channel, value }
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(value) => write!(f, "T{}={:.1}", self.channel, value),
            None => write!(f, "T{}=---", self.channel),
        }
    }
}

/// Decode `count` consecutive BCD readings starting at `offset`.
fn read_temperatures(payload: &[u8], offset: usize, count: u8) -> Vec<Temperature> {
    (0..count)
        .map(|i| {
            let at = offset + usize::from(i) * 2;
            Temperature::new(i + 1, decode_temperature_at(payload, at))
        })
        .collect()
}

fn write_temperatures(f: &mut fmt::Formatter<'_>, temperatures: &[Temperature]) -> fmt::Result {
    for t in temperatures {
        write!(f, " {}", t)?;
    }
    Ok(())
}

/// Periodic temperature broadcast (0x30).
///
/// Payload layout:
/// - Byte 0: Battery (0-100)
/// - Byte 1: Units
/// - Byte 2: Alarm bitmask
/// - Bytes 3..: One 2-byte BCD reading per probe
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TemperatureBroadcast {
    /// Battery level in percent.
    pub battery: u8,
    /// Display units.
    pub units: Units,
    /// Alarm bitmask.
    pub alarms: u8,
    /// One reading per probe, in channel order.
    pub temperatures: Vec<Temperature>,
}

impl TemperatureBroadcast {
    /// Payload length for a device with `probe_count` probes.
    pub fn payload_len(probe_count: u8) -> usize {
        3 + 2 * usize::from(probe_count)
    }

    /// Parse from a broadcast payload.
    ///
    /// Returns `None` unless the payload length matches `probe_count` exactly.
    pub fn from_payload(payload: &[u8], probe_count: u8) -> Option<Self> {
        if payload.len() != Self::payload_len(probe_count) {
            return None;
        }

        Some(Self {
            battery: payload[0],
            units: Units::from_raw(payload[1]),
            alarms: payload[2],
            temperatures: read_temperatures(payload, 3, probe_count),
        })
    }

    /// Get the reading for a 1-based channel.
    pub fn temperature(&self, channel: u8) -> Option<&Temperature> {
        self.temperatures.iter().find(|t| t.channel == channel)
    }
}

impl fmt::Display for TemperatureBroadcast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Broadcast(bat={}% units={} alarms={:#04x}",
            self.battery, self.units, self.alarms
        )?;
        write_temperatures(f, &self.temperatures)?;
        write!(f, ")")
    }
}

/// Actual temperature report (0x25).
///
/// Payload layout:
/// - Byte 0: Probe count as reported by the device
/// - Byte 1: Alarm bitmask
/// - Bytes 2..: One 2-byte BCD reading per probe
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TemperatureActual {
    /// Probe count reported by the device. Not checked against the profile.
    pub probe_count: u8,
    /// Alarm bitmask.
    pub alarms: u8,
    /// One reading per probe of the active profile, in channel order.
    pub temperatures: Vec<Temperature>,
}

impl TemperatureActual {
    /// Payload length for a device with `probe_count` probes.
    pub fn payload_len(probe_count: u8) -> usize {
        2 + 2 * usize::from(probe_count)
    }

    /// Parse from an actual-temperature payload.
    ///
    /// Returns `None` unless the payload length matches `probe_count` exactly.
    pub fn from_payload(payload: &[u8], probe_count: u8) -> Option<Self> {
        if payload.len() != Self::payload_len(probe_count) {
            return None;
        }

        Some(Self {
            probe_count: payload[0],
            alarms: payload[1],
            temperatures: read_temperatures(payload, 2, probe_count),
        })
    }
}

impl fmt::Display for TemperatureActual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Actual(probes={} alarms={:#04x}", self.probe_count, self.alarms)?;
        write_temperatures(f, &self.temperatures)?;
        write!(f, ")")
    }
}
