//! Transport abstraction.
//!
//! The session talks to the thermometer through [`Transport`], an ordered,
//! reliable byte channel that delivers one complete frame per notification.
//! The BLE backend in [`crate::ble`] is one implementation; tests use mocks.

pub mod queue;

use std::time::Duration;

use crate::error::Result;

pub use queue::FrameQueue;

/// A connected byte channel to a thermometer.
#[cfg_attr(test, mockall::automock)]
pub trait Transport {
    /// Send one complete frame.
    ///
    /// # Errors
    ///
    /// Any error is a transport failure and is propagated to the caller
    /// unchanged.
    fn send(&mut self, frame: &[u8]) -> Result<()>;

    /// Block until the next inbound frame arrives or `timeout` elapses.
    ///
    /// Returns `Ok(None)` on timeout.
    ///
    /// # Errors
    ///
    /// Any error is a transport failure and is propagated to the caller
    /// unchanged.
    fn receive(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, frame: &[u8]) -> Result<()> {
        (**self).send(frame)
    }

    fn receive(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>> {
        (**self).receive(timeout)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, frame: &[u8]) -> Result<()> {
        (**self).send(frame)
    }

    fn receive(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>> {
        (**self).receive(timeout)
    }
}
