//! Command codes and request builders.
//!
//! Outbound and inbound messages share the frame layout in
//! [`packet`](crate::protocol::packet) but use separate code tables. Some
//! codes overlap (a get-alarm request and its reply are both 0x24), others
//! only occur in one direction (temperature broadcasts are 0x30).

use crate::data::{AlarmSetting, Units};
use crate::protocol::bcd::{encode_temperature, ABSENT_TEMPERATURE};
use crate::protocol::packet::Packet;

/// Fixed authentication frame.
///
/// This is the complete frame, checksum included, and is sent verbatim. The
/// device accepts it as a valid handshake.
pub const AUTH_PACKET: [u8; 12] = [
    0x01, 0x09, 0x99, 0xA8, 0x89, 0x3C, 0x66, 0x81, 0x75, 0x0D, 0xE3, 0x5C,
];

/// Payload byte enabling the audible alarm.
pub const SOUND_ON: u8 = 0x0C;
/// Payload byte disabling the audible alarm.
pub const SOUND_OFF: u8 = 0x0F;

/// Commands sent to the thermometer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    /// Authentication handshake (0x01).
    Auth = 0x01,
    /// Light up the display, same as pressing a button (0x02).
    BacklightOn = 0x02,
    /// Set display units (0x20).
    SetUnits = 0x20,
    /// Enable or disable the audible alarm (0x21).
    SetSound = 0x21,
    /// Configure the alarm of one channel (0x23).
    SetAlarm = 0x23,
    /// Read the alarm of one channel (0x24).
    GetAlarm = 0x24,
    /// Read units, beeper and battery (0x26).
    GetStatus = 0x26,
    /// Silence a sounding alarm until it next triggers (0x27).
    SnoozeAlarm = 0x27,
    /// Set the device clock (0x28).
    TimeSync = 0x28,
    /// Read the firmware version (0x41).
    GetFirmwareVersion = 0x41,
}

impl Command {
    /// Convert to raw byte value.
    pub fn to_raw(&self) -> u8 {
        *self as u8
    }

    /// Get the reply a request waits for, if it expects one.
    pub fn response_type(&self) -> Option<ResponseType> {
        match self {
            Self::Auth => Some(ResponseType::Auth),
            Self::GetAlarm => Some(ResponseType::Alarm),
            Self::GetStatus => Some(ResponseType::Status),
            Self::GetFirmwareVersion => Some(ResponseType::FirmwareVersion),
            Self::BacklightOn
            | Self::SetUnits
            | Self::SetSound
            | Self::SetAlarm
            | Self::SnoozeAlarm
            | Self::TimeSync => None,
        }
    }
}

/// Messages received from the thermometer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ResponseType {
    /// Authentication reply (0x01).
    Auth = 0x01,
    /// Alarm configuration of one channel (0x24).
    Alarm = 0x24,
    /// Actual temperature reading (0x25).
    TemperatureActual = 0x25,
    /// Device status (0x26).
    Status = 0x26,
    /// Periodic temperature broadcast (0x30).
    TemperatureBroadcast = 0x30,
    /// Firmware version (0x41).
    FirmwareVersion = 0x41,
    /// Error report (0xE0). Its payload is not interpreted.
    Error = 0xE0,
    /// Unknown message type.
    Unknown = 0xFF,
}

impl ResponseType {
    /// Create from raw byte value.
    pub fn from_raw(value: u8) -> Self {
        match value {
            0x01 => Self::Auth,
            0x24 => Self::Alarm,
            0x25 => Self::TemperatureActual,
            0x26 => Self::Status,
            0x30 => Self::TemperatureBroadcast,
            0x41 => Self::FirmwareVersion,
            0xE0 => Self::Error,
            _ => Self::Unknown,
        }
    }

    /// Convert to raw byte value.
    pub fn to_raw(&self) -> u8 {
        *self as u8
    }

    /// Check if this message is sent unsolicited.
    pub fn is_broadcast(&self) -> bool {
        matches!(self, Self::TemperatureBroadcast)
    }
}

// Request builders

/// Build a Backlight On request.
pub fn build_backlight_on_request() -> Packet {
    Packet::for_command(Command::BacklightOn, vec![])
}

/// Build a Get Firmware Version request.
pub fn build_get_firmware_version_request() -> Packet {
    Packet::for_command(Command::GetFirmwareVersion, vec![])
}

/// Build a Get Status request.
pub fn build_get_status_request() -> Packet {
    Packet::for_command(Command::GetStatus, vec![])
}

/// Build a Snooze Alarm request.
pub fn build_snooze_alarm_request() -> Packet {
    Packet::for_command(Command::SnoozeAlarm, vec![])
}

/// Build a Get Alarm request. The channel is not validated here.
pub fn build_get_alarm_request(channel: u8) -> Packet {
    Packet::for_command(Command::GetAlarm, vec![channel])
}

/// Build a Set Units request.
pub fn build_set_units_request(units: Units) -> Packet {
    Packet::for_command(Command::SetUnits, vec![units.to_raw()])
}

/// Build a Set Sound request.
pub fn build_set_sound_request(enabled: bool) -> Packet {
    let value = if enabled { SOUND_ON } else { SOUND_OFF };
    Packet::for_command(Command::SetSound, vec![value])
}

/// Build a Set Alarm request. The channel is not validated here.
///
/// Payload: `channel, mode, value1(2), value2(2)`
/// - Off: both values are the absent marker `FF FF`
/// - Target: value1 is the target, value2 is `00 00`
/// - Range: value1 is the upper bound, value2 the lower bound
pub fn build_set_alarm_request(channel: u8, setting: &AlarmSetting) -> Packet {
    let (value1, value2) = match *setting {
        AlarmSetting::Off => (ABSENT_TEMPERATURE, ABSENT_TEMPERATURE),
        AlarmSetting::Target(target) => (encode_temperature(target), [0x00, 0x00]),
        AlarmSetting::Range { high, low } => (encode_temperature(high), encode_temperature(low)),
    };

    let mut payload = Vec::with_capacity(6);
    payload.push(channel);
    payload.push(setting.mode().to_raw());
    payload.extend_from_slice(&value1);
    payload.extend_from_slice(&value2);
    Packet::for_command(Command::SetAlarm, payload)
}

/// Build a Time Sync request from seconds since 2020-01-01 00:00:00 UTC.
pub fn build_time_sync_request(seconds_since_2020: u32) -> Packet {
    Packet::for_command(Command::TimeSync, seconds_since_2020.to_le_bytes().to_vec())
}
