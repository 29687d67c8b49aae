//! Response classification.
//!
//! Turns a checksum-validated [`Packet`] into a typed [`Response`]. A known
//! command whose payload has the wrong shape degrades to
//! [`Response::Raw`] rather than an error.

use std::fmt;

use crate::data::{
    AlarmConfig, AuthResponse, DeviceStatus, FirmwareVersion, TemperatureActual,
    TemperatureBroadcast,
};
use crate::profile::DeviceProfile;
use crate::protocol::commands::ResponseType;
use crate::protocol::packet::Packet;

/// A parsed inbound message.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Response {
    /// Periodic temperature broadcast.
    TemperatureBroadcast(TemperatureBroadcast),
    /// Actual temperature report.
    TemperatureActual(TemperatureActual),
    /// Alarm configuration of one channel.
    Alarm(AlarmConfig),
    /// Firmware version.
    FirmwareVersion(FirmwareVersion),
    /// Device status.
    Status(DeviceStatus),
    /// Authentication reply.
    Auth(AuthResponse),
    /// Unknown command, error report, or a payload of unexpected shape.
    Raw {
        /// Raw command byte.
        command: u8,
        /// Payload bytes, unchanged.
        payload: Vec<u8>,
    },
}

impl Response {
    /// Classify a packet for the given device profile.
    pub fn parse(packet: &Packet, profile: &DeviceProfile) -> Self {
        let payload = packet.payload.as_slice();
        let probes = profile.probe_count();

        let parsed = match packet.response_type() {
            ResponseType::TemperatureBroadcast => {
                TemperatureBroadcast::from_payload(payload, probes).map(Self::TemperatureBroadcast)
            }
            ResponseType::TemperatureActual => {
                TemperatureActual::from_payload(payload, probes).map(Self::TemperatureActual)
            }
            ResponseType::Alarm => AlarmConfig::from_payload(payload, probes).map(Self::Alarm),
            ResponseType::FirmwareVersion => {
                FirmwareVersion::from_payload(payload).map(Self::FirmwareVersion)
            }
            ResponseType::Status => DeviceStatus::from_payload(payload).map(Self::Status),
            ResponseType::Auth => AuthResponse::from_payload(payload).map(Self::Auth),
            ResponseType::Error | ResponseType::Unknown => None,
        };

        parsed.unwrap_or_else(|| Self::Raw {
            command: packet.command,
            payload: packet.payload.clone(),
        })
    }

    /// Get the message type.
    pub fn response_type(&self) -> ResponseType {
        match self {
            Self::TemperatureBroadcast(_) => ResponseType::TemperatureBroadcast,
            Self::TemperatureActual(_) => ResponseType::TemperatureActual,
            Self::Alarm(_) => ResponseType::Alarm,
            Self::FirmwareVersion(_) => ResponseType::FirmwareVersion,
            Self::Status(_) => ResponseType::Status,
            Self::Auth(_) => ResponseType::Auth,
            Self::Raw { command, .. } => ResponseType::from_raw(*command),
        }
    }

    /// Check if this response fell back to raw bytes.
    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Raw { .. })
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TemperatureBroadcast(b) => write!(f, "{}", b),
            Self::TemperatureActual(a) => write!(f, "{}", a),
            Self::Alarm(a) => write!(f, "{}", a),
            Self::FirmwareVersion(v) => write!(f, "{}", v),
            Self::Status(s) => write!(f, "{}", s),
            Self::Auth(a) => write!(f, "{}", a),
            Self::Raw { command, payload } => {
                write!(f, "Raw(cmd={:#04x} data={:02X?})", command, payload)
            }
        }
    }
}

/// Result of a request/response exchange.
///
/// The awaited reply arrived, and either parsed into the expected type or
/// had an unexpected shape and is returned as raw payload bytes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Reply<T> {
    /// Reply parsed into the expected type.
    Parsed(T),
    /// Reply payload that could not be parsed.
    Raw(Vec<u8>),
}

impl<T> Reply<T> {
    /// Parse `payload` with `parse`, keeping the bytes if it fails.
    pub fn from_payload(payload: Vec<u8>, parse: impl FnOnce(&[u8]) -> Option<T>) -> Self {
        match parse(&payload) {
            Some(value) => Self::Parsed(value),
            None => Self::Raw(payload),
        }
    }

    /// Get the parsed value, discarding raw bytes.
    pub fn parsed(self) -> Option<T> {
        match self {
            Self::Parsed(value) => Some(value),
            Self::Raw(_) => None,
        }
    }

    /// Check if the reply parsed.
    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed(_))
    }
}

impl<T: fmt::Display> fmt::Display for Reply<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parsed(value) => write!(f, "{}", value),
            Self::Raw(payload) => write!(f, "Raw({:02X?})", payload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Temperature, Units};
    use crate::protocol::packet::build_packet;
    use pretty_assertions::assert_eq;

    fn parse_frame(frame: &[u8], profile: &DeviceProfile) -> Response {
        Response::parse(&Packet::parse(frame).unwrap(), profile)
    }

    #[test]
    fn test_broadcast_frame_six_probes() {
        let pairs: [[u8; 2]; 6] = [
            [0x02, 0x35],
            [0x01, 0x80],
            [0xFF, 0xFF],
            [0x80, 0x15],
            [0x22, 0x50],
            [0x00, 0x00],
        ];
        let mut payload = vec![80, 0x0C, 0x00];
        for pair in &pairs {
            payload.extend_from_slice(pair);
        }
        let frame = build_packet(0x30, &payload);
        assert_eq!(frame[1], 15);

        let response = parse_frame(&frame, &DeviceProfile::TP902);
        assert_eq!(
            response,
            Response::TemperatureBroadcast(TemperatureBroadcast {
                battery: 80,
                units: Units::Celsius,
                alarms: 0,
                temperatures: vec![
                    Temperature::new(1, Some(23.5)),
                    Temperature::new(2, Some(18.0)),
                    Temperature::new(3, None),
                    Temperature::new(4, Some(-1.5)),
                    Temperature::new(5, Some(225.0)),
                    Temperature::new(6, Some(0.0)),
                ],
            })
        );
    }

    #[test]
    fn test_broadcast_for_wrong_profile_is_raw() {
        let payload = [80, 0x0C, 0x00, 0x02, 0x35, 0xFF, 0xFF];
        let frame = build_packet(0x30, &payload);
        assert!(matches!(
            parse_frame(&frame, &DeviceProfile::TP904),
            Response::TemperatureBroadcast(_)
        ));
        assert_eq!(
            parse_frame(&frame, &DeviceProfile::TP902),
            Response::Raw {
                command: 0x30,
                payload: payload.to_vec()
            }
        );
    }

    #[test]
    fn test_alarm_wrong_length_is_raw() {
        let frame = build_packet(0x24, &[0x01, 0x0A, 0x07, 0x40]);
        let response = parse_frame(&frame, &DeviceProfile::TP902);
        assert_eq!(
            response,
            Response::Raw {
                command: 0x24,
                payload: vec![0x01, 0x0A, 0x07, 0x40]
            }
        );
        assert_eq!(response.response_type(), ResponseType::Alarm);
    }

    #[test]
    fn test_alarm_channel_outside_profile_is_raw() {
        let payload = [0x05, 0x0A, 0x07, 0x40, 0x00, 0x00];
        let frame = build_packet(0x24, &payload);
        assert!(parse_frame(&frame, &DeviceProfile::TP904).is_raw());
        assert!(matches!(
            parse_frame(&frame, &DeviceProfile::TP902),
            Response::Alarm(AlarmConfig { channel: 5, .. })
        ));
    }

    #[test]
    fn test_typed_responses() {
        let profile = DeviceProfile::TP904;
        assert!(matches!(
            parse_frame(&build_packet(0x41, &[0x12, 0x0A, 0x1F]), &profile),
            Response::FirmwareVersion(FirmwareVersion { major: 1, minor: 2, .. })
        ));
        assert!(matches!(
            parse_frame(&build_packet(0x26, &[0x0C, 0x0C, 0x50, 0x00, 0x00]), &profile),
            Response::Status(DeviceStatus { battery: 80, beeper: true, .. })
        ));
        assert!(matches!(
            parse_frame(&build_packet(0x01, &[0x00, 0x01]), &profile),
            Response::Auth(_)
        ));
        assert!(matches!(
            parse_frame(&build_packet(0x25, &[2, 0x00, 0x02, 0x35, 0xFF, 0xFF]), &profile),
            Response::TemperatureActual(_)
        ));
    }

    #[test]
    fn test_error_and_unknown_are_raw() {
        let profile = DeviceProfile::TP902;
        let error = parse_frame(&build_packet(0xE0, &[0x01]), &profile);
        assert_eq!(error.response_type(), ResponseType::Error);
        assert!(error.is_raw());

        let unknown = parse_frame(&build_packet(0x77, &[]), &profile);
        assert_eq!(
            unknown,
            Response::Raw {
                command: 0x77,
                payload: vec![]
            }
        );
        assert_eq!(unknown.to_string(), "Raw(cmd=0x77 data=[])");
    }

    #[test]
    fn test_reply_from_payload() {
        let reply = Reply::from_payload(vec![0x12, 0x0A, 0x1F], FirmwareVersion::from_payload);
        assert!(reply.is_parsed());
        assert_eq!(reply.to_string(), "1.2.0a.1f");

        let packet = Packet::new(0x41, vec![0x12, 0x0A, 0x1F]);
        let response = Response::parse(&packet, &DeviceProfile::TP902);
        assert_eq!(response.to_string(), reply.to_string());

        let reply = Reply::from_payload(vec![0x12], FirmwareVersion::from_payload);
        assert_eq!(reply, Reply::Raw(vec![0x12]));
        assert_eq!(reply.parsed(), None);
    }
}
