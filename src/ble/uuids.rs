//! BLE Service and Characteristic UUIDs.
//!
//! TP90x thermometers expose one vendor service with a write characteristic
//! for commands and a notify characteristic for replies and broadcasts.

use uuid::Uuid;

/// TP90x vendor service UUID.
pub const SERVICE_UUID: Uuid = Uuid::from_u128(0x1086_fff0_3343_4817_8bb2_b32206336ce8);
/// Command characteristic UUID (write to device).
pub const WRITE_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x1086_fff1_3343_4817_8bb2_b32206336ce8);
/// Reply characteristic UUID (notifications from device).
pub const NOTIFY_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x1086_fff2_3343_4817_8bb2_b32206336ce8);
