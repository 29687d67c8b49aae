//! Error types for the tp90x crate.

use thiserror::Error;

/// The main error type for this crate.
///
/// Timeouts while waiting for a device reply are not errors: the session
/// reports them as `Ok(None)`. Malformed inbound frames are logged and
/// discarded by the session, so [`Error::InvalidData`] and
/// [`Error::ChecksumMismatch`] only reach callers that parse frames
/// themselves.
#[derive(Error, Debug)]
pub enum Error {
    /// Bluetooth-related error from the underlying BLE library.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Bluetooth is not available or is disabled on this system.
    #[error("Bluetooth not available or disabled")]
    BluetoothUnavailable,

    /// No device matching the identifier was found while scanning.
    #[error("Device not found: {identifier}")]
    DeviceNotFound {
        /// The address or name that was searched for.
        identifier: String,
    },

    /// Failed to establish a connection to the device.
    #[error("Connection failed: {reason}")]
    ConnectionFailed {
        /// Description of why the connection failed.
        reason: String,
    },

    /// The connection to the device was lost.
    #[error("Connection lost")]
    ConnectionLost,

    /// A Bluetooth operation did not complete in time.
    #[error("Bluetooth operation timed out: {operation}")]
    BluetoothTimeout {
        /// The operation that timed out.
        operation: String,
    },

    /// A frame was too short or truncated.
    #[error("Invalid data received: {context}")]
    InvalidData {
        /// Description of what was invalid about the data.
        context: String,
    },

    /// The trailing checksum byte of a frame did not match its contents.
    #[error("Checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    ChecksumMismatch {
        /// The checksum computed over the frame.
        expected: u8,
        /// The checksum byte carried by the frame.
        actual: u8,
    },

    /// A channel argument was outside the range supported by the device.
    #[error("Invalid channel {channel} for {model}: must be between 1 and {max}")]
    InvalidChannel {
        /// The rejected channel.
        channel: u8,
        /// The highest valid channel (the profile's probe count).
        max: u8,
        /// The model name of the active profile.
        model: String,
    },

    /// A device profile could not be constructed.
    #[error("Invalid device profile: {reason}")]
    InvalidProfile {
        /// Why the profile was rejected.
        reason: String,
    },

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {name} = {value}")]
    InvalidParameter {
        /// The name of the parameter.
        name: String,
        /// The invalid value that was provided.
        value: String,
    },

    /// Characteristic not found on the device.
    #[error("Characteristic not found: {uuid}")]
    CharacteristicNotFound {
        /// The UUID of the characteristic that was not found.
        uuid: String,
    },

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
