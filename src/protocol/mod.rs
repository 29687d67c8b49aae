//! Protocol module for parsing and constructing frames.
//!
//! This module contains the implementations for:
//! - Frame building and checksum validation
//! - The BCD temperature codec
//! - Command codes and request builders
//! - Response classification

pub mod bcd;
pub mod commands;
pub mod packet;
pub mod response;

pub use bcd::{decode_temperature, encode_temperature, ABSENT_TEMPERATURE};
pub use commands::{Command, ResponseType, AUTH_PACKET};
pub use packet::{build_packet, checksum, verify_checksum, Packet};
pub use response::{Reply, Response};
