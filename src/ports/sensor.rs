//! Sensor ports - the consumer-facing capabilities of the engine
//!
//! Three capabilities sit on top of the same engine:
//!
//! - **SensorPort**: take a live sample and convert it
//! - **EventPort**: wait for a threshold crossing on a channel
//! - **ThermalPort**: pull-based temperature for an external governor
//!
//! Adapters pick the set they expose: the character-device adapter offers
//! sampling and events, the thermal-zone adapter sampling and polling.

use crate::domain::{ChannelId, SensorReading};
use crate::error::Result;

/// Port for reading sensor data
///
/// A reading is always the instantaneous value of the data register. Armed
/// thresholds and pending events have no influence on it.
pub trait SensorPort {
    /// Read a single sensor value
    fn read(&mut self) -> Result<SensorReading>;

    /// Channel the next read samples
    fn channel(&self) -> ChannelId;

    /// Get the last raw code (for diagnostics)
    ///
    /// Returns `None` if the channel has not been sampled yet.
    fn last_raw_value(&self) -> Option<u16> {
        None
    }
}

/// Port for threshold events
pub trait EventPort {
    /// Wait until a threshold crossing is pending, then consume it
    ///
    /// Resolves to [`Error::Cancelled`](crate::Error::Cancelled) when the
    /// device shuts down while waiting.
    fn wait_event(&mut self) -> impl core::future::Future<Output = Result<()>>;

    /// Consume a pending event without waiting
    fn poll_event(&mut self) -> bool;
}

/// Port polled by an external thermal governor on its own schedule
pub trait ThermalPort {
    /// Current temperature in millidegrees Celsius
    fn get_temp(&self) -> Result<i32>;
}

/// Event kinds passed to a thermal governor
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ThermalEvent {
    /// Something changed; re-evaluate the zone
    Unspecified,
}

/// Governor notified when a zone's threshold is crossed
pub trait ThermalGovernor {
    fn update(&self, event: ThermalEvent);
}
