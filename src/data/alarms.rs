//! Temperature alarm data structures.
//!
//! Each probe channel has one alarm, configured either with a single target
//! temperature or with an upper/lower range.

use std::fmt;

use crate::protocol::bcd::decode_temperature_at;

/// Raw mode byte for a disabled alarm.
pub const ALARM_MODE_OFF: u8 = 0x00;
/// Raw mode byte for a target-temperature alarm.
pub const ALARM_MODE_TARGET: u8 = 0x0A;
/// Raw mode byte for a range alarm.
pub const ALARM_MODE_RANGE: u8 = 0x82;

/// Alarm mode as carried in the mode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AlarmMode {
    /// Alarm disabled.
    Off,
    /// Alarm when the probe reaches a target temperature.
    Target,
    /// Alarm when the probe leaves a temperature range.
    Range,
    /// Any other mode byte, kept as received.
    Unknown(u8),
}

impl AlarmMode {
    /// Create from raw byte value.
    pub fn from_raw(value: u8) -> Self {
        match value {
            ALARM_MODE_OFF => Self::Off,
            ALARM_MODE_TARGET => Self::Target,
            ALARM_MODE_RANGE => Self::Range,
            other => Self::Unknown(other),
        }
    }

    /// Convert to raw byte value.
    pub fn to_raw(&self) -> u8 {
        match self {
            Self::Off => ALARM_MODE_OFF,
            Self::Target => ALARM_MODE_TARGET,
            Self::Range => ALARM_MODE_RANGE,
            Self::Unknown(raw) => *raw,
        }
    }
}

/// Alarm to configure on a channel.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AlarmSetting {
    /// Disable the alarm.
    Off,
    /// Alarm at a target temperature.
    Target(f64),
    /// Alarm outside a range.
    Range {
        /// Upper bound.
        high: f64,
        /// Lower bound.
        low: f64,
    },
}

impl AlarmSetting {
    /// Get the mode this setting is sent with.
    pub fn mode(&self) -> AlarmMode {
        match self {
            Self::Off => AlarmMode::Off,
            Self::Target(_) => AlarmMode::Target,
            Self::Range { .. } => AlarmMode::Range,
        }
    }
}

/// Alarm configuration of one channel, as reported by the device (0x24).
///
/// Payload layout:
/// - Byte 0: Channel
/// - Byte 1: Mode
/// - Bytes 2-3: Value 1 (target, or upper bound in range mode)
/// - Bytes 4-5: Value 2 (lower bound, range mode only)
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlarmConfig {
    /// Probe channel (1-based).
    pub channel: u8,
    /// Alarm mode.
    pub mode: AlarmMode,
    /// Target temperature, or upper bound in range mode.
    pub value1: Option<f64>,
    /// Lower bound. Only meaningful in range mode.
    pub value2: Option<f64>,
}

impl AlarmConfig {
    /// Size of the payload in bytes.
    pub const SIZE: usize = 6;

    /// Parse from an alarm payload.
    ///
    /// Returns `None` if the payload is not exactly [`Self::SIZE`] bytes or
    /// the reported channel is outside `1..=probe_count`.
    pub fn from_payload(payload: &[u8], probe_count: u8) -> Option<Self> {
        if payload.len() != Self::SIZE {
            return None;
        }

        let channel = payload[0];
        if !(1..=probe_count).contains(&channel) {
            return None;
        }

        Some(Self {
            channel,
            mode: AlarmMode::from_raw(payload[1]),
            value1: decode_temperature_at(payload, 2),
            value2: decode_temperature_at(payload, 4),
        })
    }

    /// Convert back into a setting, if the mode is known.
    ///
    /// Missing values in target or range mode read as 0.
    pub fn setting(&self) -> Option<AlarmSetting> {
        match self.mode {
            AlarmMode::Off => Some(AlarmSetting::Off),
            AlarmMode::Target => Some(AlarmSetting::Target(self.value1.unwrap_or(0.0))),
            AlarmMode::Range => Some(AlarmSetting::Range {
                high: self.value1.unwrap_or(0.0),
                low: self.value2.unwrap_or(0.0),
            }),
            AlarmMode::Unknown(_) => None,
        }
    }
}

impl fmt::Display for AlarmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value1 = self.value1.unwrap_or(0.0);
        let value2 = self.value2.unwrap_or(0.0);
        match self.mode {
            AlarmMode::Off => write!(f, "Alarm(ch{} OFF)", self.channel),
            AlarmMode::Target => write!(f, "Alarm(ch{} TARGET={:.1})", self.channel, value1),
            AlarmMode::Range => write!(
                f,
                "Alarm(ch{} RANGE={:.1}-{:.1})",
                self.channel, value2, value1
            ),
            AlarmMode::Unknown(raw) => write!(f, "Alarm(ch{} mode={:#04x})", self.channel, raw),
        }
    }
}
