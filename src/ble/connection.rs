//! BLE connection and transport.
//!
//! [`BleTransport`] connects to a thermometer with btleplug and exposes it as
//! a blocking [`Transport`]. It owns a small tokio runtime that drives the
//! BLE stack; notifications are buffered in a [`FrameQueue`] until the
//! session asks for them.

use btleplug::api::{Characteristic, Peripheral as _, ValueNotification, WriteType};
use btleplug::platform::Peripheral;
use futures::stream::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

use crate::ble::scanner::{BleScanner, SearchMode};
use crate::ble::uuids::{NOTIFY_CHARACTERISTIC_UUID, WRITE_CHARACTERISTIC_UUID};
use crate::error::{Error, Result};
use crate::transport::{FrameQueue, Transport};

type NotificationStream = Pin<Box<dyn Stream<Item = ValueNotification> + Send>>;

/// Options for [`BleTransport::connect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectOptions {
    /// How the identifier is matched during discovery.
    pub search_mode: SearchMode,
    /// How long to scan for the device.
    pub scan_timeout: Duration,
    /// How long to wait for the BLE connection.
    pub connect_timeout: Duration,
    /// How long a single write may take.
    pub write_timeout: Duration,
}

impl ConnectOptions {
    /// Default scan timeout.
    pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(10);
    /// Default connect timeout.
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(20);
    /// Default write timeout.
    pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

    /// Set the search mode.
    pub fn with_search_mode(mut self, search_mode: SearchMode) -> Self {
        self.search_mode = search_mode;
        self
    }

    /// Set the scan timeout.
    pub fn with_scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the write timeout.
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            search_mode: SearchMode::Address,
            scan_timeout: Self::DEFAULT_SCAN_TIMEOUT,
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
            write_timeout: Self::DEFAULT_WRITE_TIMEOUT,
        }
    }
}

/// A connected thermometer, usable as a [`Transport`].
///
/// All methods block. They must not be called from inside an async
/// runtime, because the transport drives its own.
pub struct BleTransport {
    /// Runtime driving btleplug and the notification listener.
    runtime: Runtime,
    /// The connected peripheral.
    peripheral: Peripheral,
    /// Command characteristic.
    write_characteristic: Characteristic,
    /// Reply characteristic.
    notify_characteristic: Characteristic,
    /// Notifications waiting to be received.
    frames: Arc<FrameQueue>,
    /// Notification listener; `None` once disconnected.
    listener: Option<JoinHandle<()>>,
    /// Upper bound for one write.
    write_timeout: Duration,
}

impl BleTransport {
    /// Scan for a thermometer, connect and subscribe to its notifications.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceNotFound`] if the scan times out,
    /// [`Error::ConnectionFailed`] or [`Error::BluetoothTimeout`] if the
    /// connection cannot be made, and [`Error::CharacteristicNotFound`] if
    /// the device lacks the TP90x characteristics.
    pub fn connect(identifier: &str, options: &ConnectOptions) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("tp90x-ble")
            .enable_all()
            .build()
            .map_err(|e| Error::Internal(format!("Failed to start BLE runtime: {}", e)))?;

        let peripheral = runtime.block_on(async {
            let scanner = BleScanner::new().await?;
            scanner
                .find_device(identifier, options.search_mode, options.scan_timeout)
                .await
        })?;

        let setup = runtime.block_on(Self::establish(&peripheral, options.connect_timeout));
        let (write_characteristic, notify_characteristic, notifications) = match setup {
            Ok(setup) => setup,
            Err(e) => {
                if let Err(disconnect_err) = runtime.block_on(peripheral.disconnect()) {
                    warn!("Failed to disconnect after setup error: {}", disconnect_err);
                }
                return Err(e);
            }
        };

        let frames = Arc::new(FrameQueue::new());
        let listener = runtime.spawn(Self::listen(notifications, frames.clone()));

        info!("Connected to {}", peripheral.address());

        Ok(Self {
            runtime,
            peripheral,
            write_characteristic,
            notify_characteristic,
            frames,
            listener: Some(listener),
            write_timeout: options.write_timeout,
        })
    }

    /// Get the peripheral.
    pub fn peripheral(&self) -> &Peripheral {
        &self.peripheral
    }

    /// Get the hardware address of the peripheral.
    pub fn address(&self) -> String {
        self.peripheral.address().to_string()
    }

    /// Check if the link is still up.
    pub fn is_connected(&self) -> bool {
        self.listener.is_some() && !self.frames.is_closed()
    }

    /// Unsubscribe and disconnect.
    ///
    /// Calling this more than once is a no-op. Also runs on drop.
    pub fn disconnect(&mut self) -> Result<()> {
        let listener = match self.listener.take() {
            Some(listener) => listener,
            None => return Ok(()),
        };

        self.frames.close();

        let peripheral = &self.peripheral;
        let notify = &self.notify_characteristic;
        let result = self.runtime.block_on(async {
            if let Err(e) = peripheral.unsubscribe(notify).await {
                warn!("Failed to unsubscribe: {}", e);
            }
            peripheral.disconnect().await
        });

        listener.abort();

        match result {
            Ok(()) => {
                info!("Disconnected from {}", self.peripheral.address());
                Ok(())
            }
            Err(e) => {
                warn!("Failed to disconnect: {}", e);
                Err(Error::Bluetooth(e))
            }
        }
    }

    async fn establish(
        peripheral: &Peripheral,
        connect_timeout: Duration,
    ) -> Result<(Characteristic, Characteristic, NotificationStream)> {
        debug!("Connecting to {}", peripheral.address());

        match tokio::time::timeout(connect_timeout, peripheral.connect()).await {
            Ok(result) => result.map_err(|e| Error::ConnectionFailed {
                reason: e.to_string(),
            })?,
            Err(_) => {
                return Err(Error::BluetoothTimeout {
                    operation: "connect".to_string(),
                })
            }
        }

        peripheral.discover_services().await?;

        let characteristics = peripheral.characteristics();
        let find = |uuid: Uuid| {
            characteristics
                .iter()
                .find(|c| c.uuid == uuid)
                .cloned()
                .ok_or_else(|| Error::CharacteristicNotFound {
                    uuid: uuid.to_string(),
                })
        };
        let write = find(WRITE_CHARACTERISTIC_UUID)?;
        let notify = find(NOTIFY_CHARACTERISTIC_UUID)?;

        // Take the stream before subscribing so no early notification is lost
        let notifications = peripheral.notifications().await?;
        peripheral.subscribe(&notify).await?;
        debug!("Subscribed to {}", notify.uuid);

        Ok((write, notify, notifications))
    }

    async fn listen(mut notifications: NotificationStream, frames: Arc<FrameQueue>) {
        while let Some(notification) = notifications.next().await {
            if notification.uuid != NOTIFY_CHARACTERISTIC_UUID {
                trace!("Ignoring notification from {}", notification.uuid);
                continue;
            }
            trace!("Notification {:02X?}", notification.value);
            frames.push(notification.value);
        }

        if frames.is_closed() {
            debug!("Notification listener stopped");
        } else {
            error!("Notification stream ended, connection lost");
            frames.close();
        }
    }
}

impl Transport for BleTransport {
    fn send(&mut self, frame: &[u8]) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::ConnectionLost);
        }

        trace!("Write {:02X?}", frame);
        let write = self
            .peripheral
            .write(&self.write_characteristic, frame, WriteType::WithResponse);

        match self.runtime.block_on(tokio::time::timeout(self.write_timeout, write)) {
            Ok(result) => result.map_err(Error::Bluetooth),
            Err(_) => Err(Error::BluetoothTimeout {
                operation: "write".to_string(),
            }),
        }
    }

    fn receive(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>> {
        self.frames.pop(timeout)
    }
}

impl Drop for BleTransport {
    fn drop(&mut self) {
        if let Err(e) = self.disconnect() {
            warn!("Disconnect on drop failed: {}", e);
        }
    }
}
