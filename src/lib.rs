// Allow unusual byte groupings for UUIDs which have standard format
#![allow(clippy::unusual_byte_groupings)]

//! # tp90x
//!
//! A Rust library for talking to ThermoPro TP902 and TP904 wireless
//! thermometers over Bluetooth Low Energy.
//!
//! The protocol engine is transport-agnostic and synchronous: a [`Session`]
//! sends commands through any [`Transport`] and waits for replies, handing
//! temperature broadcasts to a callback as they arrive. A btleplug-based
//! [`BleTransport`] is included.
//!
//! ## Features
//!
//! - **Framing**: `CMD LEN DATA CHECKSUM` frames with checksum validation
//! - **Temperatures**: BCD codec, broadcasts and actual readings
//! - **Alarms**: Read and configure target and range alarms per probe
//! - **Device control**: Units, beeper, backlight, snooze, clock sync
//! - **Profiles**: TP902 (6 probes), TP904 (2 probes), or custom
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use tp90x::{BleTransport, ConnectOptions, DeviceProfile, Result, Session};
//!
//! fn main() -> Result<()> {
//!     let transport = BleTransport::connect("AA:BB:CC:DD:EE:FF", &ConnectOptions::default())?;
//!     let mut session = Session::new(transport, DeviceProfile::TP902)
//!         .with_temperature_callback(|broadcast| println!("{}", broadcast));
//!
//!     session.authenticate(Duration::from_secs(5))?;
//!     session.sync_time()?;
//!
//!     if let Some(fw) = session.get_firmware_version(Duration::from_secs(5))? {
//!         println!("Firmware: {}", fw);
//!     }
//!
//!     loop {
//!         session.process(Duration::from_millis(100))?;
//!     }
//! }
//! ```
//!
//! ## Platform Notes
//!
//! ### macOS
//! Requires Bluetooth permission. Peripherals are identified by a platform
//! UUID instead of a hardware address.
//!
//! ### Linux
//! Requires BlueZ. User may need to be in the `bluetooth` group.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization for data types

// Public modules
pub mod ble;
pub mod data;
pub mod error;
pub mod profile;
pub mod protocol;
pub mod session;
pub mod transport;

// Re-exports for convenience
pub use ble::{BleScanner, BleTransport, ConnectOptions, SearchMode};
pub use error::{Error, Result};
pub use profile::DeviceProfile;
pub use protocol::{Packet, Reply, Response};
pub use session::{Session, TemperatureCallback};
pub use transport::{FrameQueue, Transport};

// Re-export commonly used types from submodules
pub use data::{
    AlarmConfig, AlarmMode, AlarmSetting, AuthResponse, DeviceStatus, FirmwareVersion,
    Temperature, TemperatureActual, TemperatureBroadcast, Units,
};
