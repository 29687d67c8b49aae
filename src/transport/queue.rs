//! Notification buffering for callback-driven transports.
//!
//! BLE stacks deliver notifications on their own task. [`FrameQueue`] holds
//! them until the session asks for the next frame.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::trace;

use crate::error::{Error, Result};

#[derive(Default)]
struct QueueState {
    frames: VecDeque<Vec<u8>>,
    closed: bool,
}

/// Thread-safe FIFO of inbound frames with a deadline-bounded pop.
#[derive(Default)]
pub struct FrameQueue {
    state: Mutex<QueueState>,
    ready: Condvar,
}

impl FrameQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a frame and wake a waiting reader.
    ///
    /// Frames pushed after [`close`](Self::close) are dropped.
    pub fn push(&self, frame: Vec<u8>) {
        let mut state = self.state.lock();
        if state.closed {
            trace!("Dropping {} byte frame pushed after close", frame.len());
            return;
        }
        state.frames.push_back(frame);
        drop(state);
        self.ready.notify_one();
    }

    /// Mark the source as finished and wake all readers.
    ///
    /// Frames already queued can still be popped.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.ready.notify_all();
    }

    /// Check if the queue was closed.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Number of frames waiting.
    pub fn len(&self) -> usize {
        self.state.lock().frames.len()
    }

    /// Check if no frames are waiting.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pop the oldest frame, waiting up to `timeout` for one to arrive.
    ///
    /// Returns `Ok(None)` on timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionLost`] once the queue is closed and drained.
    pub fn pop(&self, timeout: Duration) -> Result<Option<Vec<u8>>> {
        // `None` means the timeout is too large to represent: wait forever
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.state.lock();

        loop {
            if let Some(frame) = state.frames.pop_front() {
                return Ok(Some(frame));
            }
            if state.closed {
                return Err(Error::ConnectionLost);
            }
            match deadline {
                Some(deadline) => {
                    if self.ready.wait_until(&mut state, deadline).timed_out() {
                        return Ok(state.frames.pop_front());
                    }
                }
                None => self.ready.wait(&mut state),
            }
        }
    }
}
