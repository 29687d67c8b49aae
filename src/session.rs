//! Protocol session.
//!
//! [`Session`] drives one thermometer over a [`Transport`]: it sends
//! commands, waits for their replies, and hands temperature broadcasts to a
//! callback, including those that arrive while a reply is being awaited.

use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use crate::data::{
    AlarmConfig, AlarmSetting, AuthResponse, DeviceStatus, FirmwareVersion, TemperatureBroadcast,
    Units,
};
use crate::error::Result;
use crate::profile::DeviceProfile;
use crate::protocol::commands::*;
use crate::protocol::{Packet, Reply, Response};
use crate::transport::Transport;

/// 2020-01-01 00:00:00 UTC as a Unix timestamp; the device clock counts from here.
pub const EPOCH_2020: i64 = 1_577_836_800;

/// Callback invoked for every temperature broadcast.
///
/// A broadcast whose payload does not fit the profile arrives as
/// [`Reply::Raw`].
pub type TemperatureCallback = Box<dyn FnMut(Reply<TemperatureBroadcast>) + Send>;

/// Seconds between 2020-01-01 00:00:00 UTC and `now`.
///
/// Returns 0 if `now` is before 2020 or too far in the future for 32 bits.
pub fn seconds_since_2020(now: DateTime<Utc>) -> u32 {
    u32::try_from(now.timestamp() - EPOCH_2020).unwrap_or(0)
}

/// A protocol session with one thermometer.
///
/// Every operation is synchronous. Request/response operations block until
/// the reply arrives or the timeout elapses; a timeout is reported as
/// `Ok(None)`, not as an error.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use tp90x::{DeviceProfile, Result, Session, Transport};
///
/// fn run(transport: impl Transport) -> Result<()> {
///     let mut session = Session::new(transport, DeviceProfile::TP902)
///         .with_temperature_callback(|broadcast| println!("{}", broadcast));
///
///     if session.authenticate(Duration::from_secs(5))?.is_none() {
///         println!("Auth timeout!");
///         return Ok(());
///     }
///     session.sync_time()?;
///
///     loop {
///         session.process(Duration::from_secs(1))?;
///     }
/// }
/// ```
pub struct Session<T> {
    /// Byte channel to the device.
    transport: T,
    /// Active device profile.
    profile: DeviceProfile,
    /// Broadcast subscriber.
    on_temperature: Option<TemperatureCallback>,
}

impl<T> Session<T> {
    /// Default timeout for request/response operations.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Default timeout for a single [`process`](Session::process) call.
    pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(100);
}

impl<T: Transport> Session<T> {
    /// Create a session over a connected transport.
    pub fn new(transport: T, profile: DeviceProfile) -> Self {
        Self {
            transport,
            profile,
            on_temperature: None,
        }
    }

    /// Register the broadcast callback while building the session.
    pub fn with_temperature_callback(
        mut self,
        callback: impl FnMut(Reply<TemperatureBroadcast>) + Send + 'static,
    ) -> Self {
        self.set_temperature_callback(callback);
        self
    }

    /// Register (or replace) the broadcast callback.
    pub fn set_temperature_callback(
        &mut self,
        callback: impl FnMut(Reply<TemperatureBroadcast>) + Send + 'static,
    ) {
        self.on_temperature = Some(Box::new(callback));
    }

    /// Remove the broadcast callback.
    pub fn clear_temperature_callback(&mut self) {
        self.on_temperature = None;
    }

    /// Get the active device profile.
    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    /// Borrow the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consume the session and return the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    // === Request/response ===

    /// Send the authentication handshake and wait for the device to accept it.
    pub fn authenticate(&mut self, timeout: Duration) -> Result<Option<Reply<AuthResponse>>> {
        debug!("Authenticating with {}", self.profile.model());
        self.send_frame(&AUTH_PACKET)?;
        self.wait_reply(ResponseType::Auth, timeout, AuthResponse::from_payload)
    }

    /// Request the firmware version.
    pub fn get_firmware_version(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<Reply<FirmwareVersion>>> {
        self.send(build_get_firmware_version_request())?;
        self.wait_reply(
            ResponseType::FirmwareVersion,
            timeout,
            FirmwareVersion::from_payload,
        )
    }

    /// Request the alarm configuration of a channel.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChannel`](crate::Error::InvalidChannel) before
    /// sending anything if `channel` is not a probe of the active profile.
    pub fn get_alarm(
        &mut self,
        channel: u8,
        timeout: Duration,
    ) -> Result<Option<Reply<AlarmConfig>>> {
        let channel = self.profile.validate_channel(channel)?;
        self.send(build_get_alarm_request(channel))?;

        let probes = self.profile.probe_count();
        self.wait_reply(ResponseType::Alarm, timeout, |payload| {
            AlarmConfig::from_payload(payload, probes)
        })
    }

    /// Request units, beeper state and battery level.
    pub fn get_status(&mut self, timeout: Duration) -> Result<Option<Reply<DeviceStatus>>> {
        self.send(build_get_status_request())?;
        self.wait_reply(ResponseType::Status, timeout, DeviceStatus::from_payload)
    }

    // === Fire-and-forget ===

    /// Light up the display, same as a button press.
    pub fn backlight_on(&mut self) -> Result<()> {
        self.send(build_backlight_on_request())
    }

    /// Silence a sounding alarm until it next triggers.
    pub fn snooze_alarm(&mut self) -> Result<()> {
        self.send(build_snooze_alarm_request())
    }

    /// Set the display units.
    pub fn set_units(&mut self, units: Units) -> Result<()> {
        self.send(build_set_units_request(units))
    }

    /// Enable or disable the audible alarm.
    pub fn set_sound_alarm(&mut self, enabled: bool) -> Result<()> {
        self.send(build_set_sound_request(enabled))
    }

    /// Configure the alarm of a channel.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChannel`](crate::Error::InvalidChannel) before
    /// sending anything if `channel` is not a probe of the active profile.
    pub fn set_alarm(&mut self, channel: u8, setting: AlarmSetting) -> Result<()> {
        let channel = self.profile.validate_channel(channel)?;
        self.send(build_set_alarm_request(channel, &setting))
    }

    /// Set the device clock from the system clock.
    pub fn sync_time(&mut self) -> Result<()> {
        self.sync_time_to(seconds_since_2020(Utc::now()))
    }

    /// Set the device clock to an explicit number of seconds since 2020.
    pub fn sync_time_to(&mut self, seconds_since_2020: u32) -> Result<()> {
        debug!("Syncing device time to {} s since 2020", seconds_since_2020);
        self.send(build_time_sync_request(seconds_since_2020))
    }

    // === Polling ===

    /// Process at most one inbound frame.
    ///
    /// Call in a loop for continuous operation. Broadcasts are handed to the
    /// callback and also returned. Returns `Ok(None)` on timeout or if the
    /// frame was malformed.
    pub fn process(&mut self, timeout: Duration) -> Result<Option<Response>> {
        let frame = match self.transport.receive(timeout)? {
            Some(frame) => frame,
            None => return Ok(None),
        };

        let packet = match Self::decode(&frame) {
            Some(packet) => packet,
            None => return Ok(None),
        };

        let response = Response::parse(&packet, &self.profile);
        if packet.response_type().is_broadcast() {
            self.dispatch_broadcast(packet.payload);
        }

        Ok(Some(response))
    }

    // === Internal ===

    fn send(&mut self, packet: Packet) -> Result<()> {
        self.send_frame(&packet.to_bytes())
    }

    fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
        trace!("TX {:02X?}", frame);
        self.transport.send(frame)
    }

    fn wait_reply<R>(
        &mut self,
        expected: ResponseType,
        timeout: Duration,
        parse: impl FnOnce(&[u8]) -> Option<R>,
    ) -> Result<Option<Reply<R>>> {
        Ok(self
            .wait_response(expected, timeout)?
            .map(|packet| Reply::from_payload(packet.payload, parse)))
    }

    /// Wait for a packet of the expected type, dispatching broadcasts that
    /// arrive in the meantime and discarding everything else.
    fn wait_response(&mut self, expected: ResponseType, timeout: Duration) -> Result<Option<Packet>> {
        let deadline = Instant::now().checked_add(timeout);

        loop {
            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => timeout,
            };
            if remaining.is_zero() {
                debug!("No {:?} response within {:?}", expected, timeout);
                return Ok(None);
            }

            let frame = match self.transport.receive(remaining)? {
                Some(frame) => frame,
                None => {
                    debug!("No {:?} response within {:?}", expected, timeout);
                    return Ok(None);
                }
            };

            let packet = match Self::decode(&frame) {
                Some(packet) => packet,
                None => continue,
            };

            if packet.response_type().is_broadcast() {
                self.dispatch_broadcast(packet.payload);
            } else if packet.command == expected.to_raw() {
                return Ok(Some(packet));
            } else {
                debug!(
                    "Discarding {:#04x} while waiting for {:?}",
                    packet.command, expected
                );
            }
        }
    }

    fn decode(frame: &[u8]) -> Option<Packet> {
        match Packet::parse(frame) {
            Ok(packet) => {
                trace!("RX {:02X?}", frame);
                Some(packet)
            }
            Err(e) => {
                debug!("Discarding malformed frame {:02X?}: {}", frame, e);
                None
            }
        }
    }

    fn dispatch_broadcast(&mut self, payload: Vec<u8>) {
        let probes = self.profile.probe_count();
        let broadcast = Reply::from_payload(payload, |payload| {
            TemperatureBroadcast::from_payload(payload, probes)
        });
        if let Reply::Raw(raw) = &broadcast {
            debug!(
                "Broadcast with {} byte payload does not fit {}",
                raw.len(),
                self.profile
            );
        }

        if let Some(callback) = self.on_temperature.as_mut() {
            callback(broadcast);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{AlarmMode, Temperature};
    use crate::error::Error;
    use crate::protocol::build_packet;
    use crate::transport::MockTransport;
    use chrono::TimeZone;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::sync::Arc;

    const TIMEOUT: Duration = Duration::from_millis(200);

    fn broadcast_frame() -> Vec<u8> {
        build_packet(
            0x30,
            &[
                80, 0x0C, 0x00, 0x02, 0x35, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
                0xFF,
            ],
        )
    }

    /// Receive handler that replays `frames` in order, then times out.
    fn replay(
        frames: Vec<Vec<u8>>,
    ) -> impl FnMut(Duration) -> Result<Option<Vec<u8>>> + Send + 'static {
        let mut frames: VecDeque<Vec<u8>> = frames.into();
        move |_| Ok(frames.pop_front())
    }

    /// Mock that accepts any number of sends and records them.
    fn recording_mock() -> (MockTransport, Arc<Mutex<Vec<Vec<u8>>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let mut mock = MockTransport::new();
        let log = sent.clone();
        mock.expect_send().returning(move |frame| {
            log.lock().push(frame.to_vec());
            Ok(())
        });
        (mock, sent)
    }

    fn collecting_session(
        mock: MockTransport,
    ) -> (
        Session<MockTransport>,
        Arc<Mutex<Vec<Reply<TemperatureBroadcast>>>>,
    ) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let session = Session::new(mock, DeviceProfile::TP902)
            .with_temperature_callback(move |broadcast| sink.lock().push(broadcast));
        (session, seen)
    }

    #[test]
    fn test_firmware_with_interleaved_broadcast() {
        let (mut mock, sent) = recording_mock();
        mock.expect_receive().returning(replay(vec![
            broadcast_frame(),
            build_packet(0x41, &[0x12, 0x0A, 0x1F]),
        ]));
        let (mut session, seen) = collecting_session(mock);

        let reply = session.get_firmware_version(TIMEOUT).unwrap();

        assert_eq!(
            reply,
            Some(Reply::Parsed(FirmwareVersion {
                major: 1,
                minor: 2,
                patch: 0x0A,
                build: 0x1F,
            }))
        );
        assert_eq!(*sent.lock(), vec![vec![0x41, 0x00, 0x41]]);

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        let broadcast = match &seen[0] {
            Reply::Parsed(broadcast) => broadcast,
            Reply::Raw(raw) => panic!("broadcast not parsed: {:02X?}", raw),
        };
        assert_eq!(broadcast.battery, 80);
        assert_eq!(broadcast.temperatures[0], Temperature::new(1, Some(23.5)));
    }

    #[test]
    fn test_short_broadcast_reaches_callback_as_raw() {
        let (mut mock, _sent) = recording_mock();
        mock.expect_receive().returning(replay(vec![
            build_packet(0x30, &[80, 0x0C, 0x00, 0x02, 0x35]),
            build_packet(0x41, &[0x12, 0x0A, 0x1F]),
        ]));
        let (mut session, seen) = collecting_session(mock);

        let fw = session
            .get_firmware_version(TIMEOUT)
            .unwrap()
            .and_then(Reply::parsed);
        assert!(fw.is_some());

        assert_eq!(
            *seen.lock(),
            vec![Reply::Raw(vec![80, 0x0C, 0x00, 0x02, 0x35])]
        );
    }

    #[test]
    fn test_unrelated_and_malformed_frames_are_discarded() {
        let (mut mock, _sent) = recording_mock();
        mock.expect_receive().returning(replay(vec![
            build_packet(0x26, &[0x0C, 0x0C, 0x50, 0x00, 0x00]),
            vec![0x41, 0x03, 0x12, 0x0A, 0x1F, 0x00], // bad checksum
            vec![0x41],
            build_packet(0xE0, &[0x01]),
            build_packet(0x41, &[0x21, 0x00, 0x05]),
        ]));
        let mut session = Session::new(mock, DeviceProfile::TP904);

        let fw = session
            .get_firmware_version(TIMEOUT)
            .unwrap()
            .and_then(Reply::parsed)
            .unwrap();
        assert_eq!(fw.to_string(), "2.1.00.05");
    }

    #[test]
    fn test_deadline_exhaustion_returns_none() {
        let mut mock = MockTransport::new();
        mock.expect_send().times(1).returning(|_| Ok(()));
        mock.expect_receive()
            .withf(|timeout| *timeout <= TIMEOUT)
            .returning(|_| Ok(None));
        let mut session = Session::new(mock, DeviceProfile::TP902);

        assert_eq!(session.get_status(TIMEOUT).unwrap(), None);
    }

    #[test]
    fn test_deadline_bounds_stream_of_unmatched_frames() {
        let timeout = Duration::from_millis(30);
        let mut mock = MockTransport::new();
        mock.expect_send().times(1).returning(|_| Ok(()));
        mock.expect_receive()
            .withf(move |remaining| *remaining <= timeout)
            .returning(|remaining| {
                std::thread::sleep(remaining.min(Duration::from_millis(5)));
                Ok(Some(build_packet(0x26, &[0x0C, 0x0C, 0x50, 0x00, 0x00])))
            });
        let mut session = Session::new(mock, DeviceProfile::TP902);

        let start = Instant::now();
        assert_eq!(session.get_firmware_version(timeout).unwrap(), None);
        assert!(start.elapsed() >= timeout);
    }

    #[test]
    fn test_get_alarm_rejects_out_of_range_channels() {
        let mut mock = MockTransport::new();
        mock.expect_send().never();
        mock.expect_receive().never();
        let mut session = Session::new(mock, DeviceProfile::TP902);

        assert!(matches!(
            session.get_alarm(0, TIMEOUT),
            Err(Error::InvalidChannel { channel: 0, .. })
        ));
        assert!(matches!(
            session.get_alarm(7, TIMEOUT),
            Err(Error::InvalidChannel { channel: 7, max: 6, .. })
        ));
        assert!(matches!(
            session.set_alarm(7, AlarmSetting::Off),
            Err(Error::InvalidChannel { .. })
        ));
    }

    #[test]
    fn test_get_alarm_accepts_boundary_channels() {
        let (mut mock, sent) = recording_mock();
        mock.expect_receive().returning(|_| Ok(None));
        let mut session = Session::new(mock, DeviceProfile::TP902);

        assert_eq!(session.get_alarm(1, TIMEOUT).unwrap(), None);
        assert_eq!(session.get_alarm(6, TIMEOUT).unwrap(), None);
        assert_eq!(
            *sent.lock(),
            vec![vec![0x24, 0x01, 0x01, 0x26], vec![0x24, 0x01, 0x06, 0x2B]]
        );
    }

    #[test]
    fn test_set_alarm_accepts_boundary_channels() {
        let (mut mock, sent) = recording_mock();
        mock.expect_receive().never();
        let mut session = Session::new(mock, DeviceProfile::TP904);

        session.set_alarm(1, AlarmSetting::Target(74.0)).unwrap();
        session.set_alarm(2, AlarmSetting::Off).unwrap();
        assert!(matches!(
            session.set_alarm(3, AlarmSetting::Off),
            Err(Error::InvalidChannel { channel: 3, max: 2, .. })
        ));

        assert_eq!(
            *sent.lock(),
            vec![
                build_packet(0x23, &[0x01, 0x0A, 0x07, 0x40, 0x00, 0x00]),
                build_packet(0x23, &[0x02, 0x00, 0xFF, 0xFF, 0xFF, 0xFF]),
            ]
        );
    }

    #[test]
    fn test_get_alarm_parsed_and_raw() {
        let (mut mock, _sent) = recording_mock();
        mock.expect_receive().returning(replay(vec![
            build_packet(0x24, &[0x02, 0x0A, 0x07, 0x40, 0x00, 0x00]),
            build_packet(0x24, &[0x02, 0x0A, 0x07, 0x40]),
        ]));
        let mut session = Session::new(mock, DeviceProfile::TP904);

        let parsed = session.get_alarm(2, TIMEOUT).unwrap();
        assert_eq!(
            parsed,
            Some(Reply::Parsed(AlarmConfig {
                channel: 2,
                mode: AlarmMode::Target,
                value1: Some(74.0),
                value2: Some(0.0),
            }))
        );

        let raw = session.get_alarm(2, TIMEOUT).unwrap();
        assert_eq!(raw, Some(Reply::Raw(vec![0x02, 0x0A, 0x07, 0x40])));
    }

    #[test]
    fn test_authenticate_sends_fixed_frame() {
        let (mut mock, sent) = recording_mock();
        mock.expect_receive()
            .returning(replay(vec![build_packet(0x01, &[0x00, 0x00])]));
        let mut session = Session::new(mock, DeviceProfile::TP902);

        let reply = session.authenticate(TIMEOUT).unwrap();
        assert_eq!(reply, Some(Reply::Parsed(AuthResponse { data: [0, 0] })));
        assert_eq!(*sent.lock(), vec![AUTH_PACKET.to_vec()]);
    }

    #[test]
    fn test_fire_and_forget_frames() {
        let (mut mock, sent) = recording_mock();
        mock.expect_receive().never();
        let mut session = Session::new(mock, DeviceProfile::TP902);

        session.backlight_on().unwrap();
        session.snooze_alarm().unwrap();
        session.set_units(Units::Fahrenheit).unwrap();
        session.set_sound_alarm(false).unwrap();
        session
            .set_alarm(
                3,
                AlarmSetting::Range {
                    high: 120.5,
                    low: -5.0,
                },
            )
            .unwrap();
        session.set_alarm(4, AlarmSetting::Off).unwrap();
        session.sync_time_to(86_400).unwrap();

        assert_eq!(
            *sent.lock(),
            vec![
                vec![0x02, 0x00, 0x02],
                vec![0x27, 0x00, 0x27],
                vec![0x20, 0x01, 0x0F, 0x30],
                vec![0x21, 0x01, 0x0F, 0x31],
                build_packet(0x23, &[0x03, 0x82, 0x12, 0x05, 0x80, 0x50]),
                build_packet(0x23, &[0x04, 0x00, 0xFF, 0xFF, 0xFF, 0xFF]),
                build_packet(0x28, &[0x80, 0x51, 0x01, 0x00]),
            ]
        );
    }

    #[test]
    fn test_process_dispatches_broadcast() {
        let mut mock = MockTransport::new();
        mock.expect_receive().returning(replay(vec![
            broadcast_frame(),
            vec![0x30, 0x00, 0x00],
            build_packet(0x30, &[80, 0x0C]),
            build_packet(0x25, &[6, 0x00, 0x02, 0x35, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]),
        ]));
        let (mut session, seen) = collecting_session(mock);

        let first = session.process(TIMEOUT).unwrap();
        assert!(matches!(first, Some(Response::TemperatureBroadcast(_))));
        assert_eq!(seen.lock().len(), 1);

        // Malformed frame
        assert_eq!(session.process(TIMEOUT).unwrap(), None);
        assert_eq!(seen.lock().len(), 1);

        let short = session.process(TIMEOUT).unwrap();
        assert_eq!(
            short,
            Some(Response::Raw {
                command: 0x30,
                payload: vec![80, 0x0C],
            })
        );
        assert_eq!(seen.lock()[1], Reply::Raw(vec![80, 0x0C]));

        let actual = session.process(TIMEOUT).unwrap();
        assert!(matches!(actual, Some(Response::TemperatureActual(_))));

        // Timeout
        assert_eq!(session.process(TIMEOUT).unwrap(), None);
        assert_eq!(seen.lock().len(), 2);
    }

    #[test]
    fn test_broadcast_without_callback_is_dropped() {
        let (mut mock, _sent) = recording_mock();
        mock.expect_receive().returning(replay(vec![
            broadcast_frame(),
            build_packet(0x26, &[0x0C, 0x0C, 0x50, 0x00, 0x00]),
        ]));
        let mut session = Session::new(mock, DeviceProfile::TP902);

        let status = session.get_status(TIMEOUT).unwrap().and_then(Reply::parsed);
        assert_eq!(
            status,
            Some(DeviceStatus {
                units: Units::Celsius,
                beeper: true,
                battery: 80,
            })
        );
    }

    #[test]
    fn test_send_failure_propagates() {
        let mut mock = MockTransport::new();
        mock.expect_send().returning(|_| Err(Error::ConnectionLost));
        mock.expect_receive().never();
        let mut session = Session::new(mock, DeviceProfile::TP902);

        assert!(matches!(session.get_status(TIMEOUT), Err(Error::ConnectionLost)));
        assert!(matches!(session.backlight_on(), Err(Error::ConnectionLost)));
    }

    #[test]
    fn test_receive_failure_propagates() {
        let (mut mock, _sent) = recording_mock();
        mock.expect_receive().returning(|_| Err(Error::ConnectionLost));
        let mut session = Session::new(mock, DeviceProfile::TP902);

        assert!(matches!(
            session.get_firmware_version(TIMEOUT),
            Err(Error::ConnectionLost)
        ));
        assert!(matches!(session.process(TIMEOUT), Err(Error::ConnectionLost)));
    }

    #[test]
    fn test_seconds_since_2020() {
        let epoch = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(epoch.timestamp(), EPOCH_2020);
        assert_eq!(seconds_since_2020(epoch), 0);

        let next_day = Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap();
        assert_eq!(seconds_since_2020(next_day), 86_400);

        let before = Utc.with_ymd_and_hms(2019, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(seconds_since_2020(before), 0);
    }
}
