//! BLE communication module.
//!
//! This module provides the Bluetooth Low Energy backend: discovering a
//! thermometer and exposing it as a [`Transport`](crate::transport::Transport).

pub mod connection;
pub mod scanner;
pub mod uuids;

pub use connection::{BleTransport, ConnectOptions};
pub use scanner::{BleScanner, SearchMode};
pub use uuids::*;
