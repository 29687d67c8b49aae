//! Per-model device constants.

use std::borrow::Cow;
use std::fmt;

use crate::error::{Error, Result};

/// Largest probe count whose broadcast payload still fits a one-byte length.
pub const MAX_PROBES: u8 = 126;

/// Model-specific constants that parametrize parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceProfile {
    model: Cow<'static, str>,
    probe_count: u8,
}

impl DeviceProfile {
    /// ThermoPro TP902: six probes, backlight control.
    pub const TP902: Self = Self {
        model: Cow::Borrowed("TP902"),
        probe_count: 6,
    };

    /// ThermoPro TP904: two probes.
    pub const TP904: Self = Self {
        model: Cow::Borrowed("TP904"),
        probe_count: 2,
    };

    /// Known models, in lookup order.
    pub const KNOWN: [Self; 2] = [Self::TP902, Self::TP904];

    /// Create a profile for another model.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidProfile`] if `probe_count` is 0 or above
    /// [`MAX_PROBES`].
    pub fn new(model: impl Into<String>, probe_count: u8) -> Result<Self> {
        let model = model.into();
        if probe_count == 0 || probe_count > MAX_PROBES {
            return Err(Error::InvalidProfile {
                reason: format!(
                    "{} probe count must be between 1 and {}, got {}",
                    model, MAX_PROBES, probe_count
                ),
            });
        }

        Ok(Self {
            model: Cow::Owned(model),
            probe_count,
        })
    }

    /// Look up a known model by name, ignoring case.
    pub fn from_model(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::KNOWN
            .into_iter()
            .find(|profile| profile.model.eq_ignore_ascii_case(name))
    }

    /// Get the model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get the number of probe channels.
    pub fn probe_count(&self) -> u8 {
        self.probe_count
    }

    /// Check that a channel is within `1..=probe_count`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChannel`] otherwise.
    pub fn validate_channel(&self, channel: u8) -> Result<u8> {
        if (1..=self.probe_count).contains(&channel) {
            Ok(channel)
        } else {
            Err(Error::InvalidChannel {
                channel,
                max: self.probe_count,
                model: self.model.to_string(),
            })
        }
    }

    /// Iterate over all valid channels.
    pub fn channels(&self) -> impl Iterator<Item = u8> {
        1..=self.probe_count
    }
}

impl fmt::Display for DeviceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} probes)", self.model, self.probe_count)
    }
}
