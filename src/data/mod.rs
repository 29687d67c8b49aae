//! Data structures for thermometer data.
//!
//! This module contains the typed values parsed out of inbound frames:
//! temperature readings, alarm configuration and device information.

pub mod alarms;
pub mod device;
pub mod temperatures;

pub use alarms::{AlarmConfig, AlarmMode, AlarmSetting};
pub use device::{AuthResponse, DeviceStatus, FirmwareVersion};
pub use temperatures::{Temperature, TemperatureActual, TemperatureBroadcast, Units};
