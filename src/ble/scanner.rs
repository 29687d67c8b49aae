//! BLE scanning functionality.
//!
//! Locates a thermometer by hardware address or advertised name.

use btleplug::api::{Central, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};

/// How often discovered peripherals are re-checked while scanning.
const SCAN_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// How to match a device identifier during discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SearchMode {
    /// Match the hardware address (or platform peripheral ID).
    #[default]
    Address,
    /// Match the advertised local name exactly.
    Name,
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address => write!(f, "address"),
            Self::Name => write!(f, "name"),
        }
    }
}

impl FromStr for SearchMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("address") {
            Ok(Self::Address)
        } else if s.eq_ignore_ascii_case("name") {
            Ok(Self::Name)
        } else {
            Err(Error::InvalidParameter {
                name: "search_mode".to_string(),
                value: s.to_string(),
            })
        }
    }
}

/// Check an identifier against a peripheral's address or platform ID.
///
/// Addresses compare case-insensitively. Platforms that hide the hardware
/// address (macOS) only expose the peripheral ID.
fn matches_address(address: &str, peripheral_id: &str, identifier: &str) -> bool {
    address.eq_ignore_ascii_case(identifier) || peripheral_id.eq_ignore_ascii_case(identifier)
}

/// BLE scanner for locating thermometers.
pub struct BleScanner {
    /// The BLE adapter to use for scanning.
    adapter: Adapter,
}

impl BleScanner {
    /// Create a scanner on the first available adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if Bluetooth is not available.
    pub async fn new() -> Result<Self> {
        let manager = Manager::new()
            .await
            .map_err(|_e| Error::BluetoothUnavailable)?;

        let adapter = manager
            .adapters()
            .await?
            .into_iter()
            .next()
            .ok_or(Error::BluetoothUnavailable)?;

        info!(
            "Using Bluetooth adapter: {:?}",
            adapter.adapter_info().await.ok()
        );

        Ok(Self::with_adapter(adapter))
    }

    /// Create a scanner with a specific adapter.
    pub fn with_adapter(adapter: Adapter) -> Self {
        Self { adapter }
    }

    /// Get the underlying adapter.
    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    /// Scan until a peripheral matching `identifier` shows up.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceNotFound`] if nothing matches within `timeout`.
    pub async fn find_device(
        &self,
        identifier: &str,
        mode: SearchMode,
        timeout: Duration,
    ) -> Result<Peripheral> {
        info!("Scanning for {} by {} for {:?}", identifier, mode, timeout);

        self.adapter.start_scan(ScanFilter::default()).await?;
        let found = tokio::time::timeout(timeout, self.poll_for(identifier, mode)).await;

        if let Err(e) = self.adapter.stop_scan().await {
            warn!("Failed to stop scan: {}", e);
        }

        match found {
            Ok(result) => result,
            Err(_) => Err(Error::DeviceNotFound {
                identifier: identifier.to_string(),
            }),
        }
    }

    async fn poll_for(&self, identifier: &str, mode: SearchMode) -> Result<Peripheral> {
        loop {
            for peripheral in self.adapter.peripherals().await? {
                if Self::matches(&peripheral, identifier, mode).await {
                    debug!("Found {} at {}", identifier, peripheral.address());
                    return Ok(peripheral);
                }
            }
            tokio::time::sleep(SCAN_POLL_INTERVAL).await;
        }
    }

    async fn matches(peripheral: &Peripheral, identifier: &str, mode: SearchMode) -> bool {
        match mode {
            SearchMode::Address => matches_address(
                &peripheral.address().to_string(),
                &peripheral.id().to_string(),
                identifier,
            ),
            SearchMode::Name => match peripheral.properties().await {
                Ok(Some(properties)) => {
                    trace!(
                        "Peripheral {} advertises {:?}",
                        peripheral.address(),
                        properties.local_name
                    );
                    properties.local_name.as_deref() == Some(identifier)
                }
                _ => false,
            },
        }
    }
}
