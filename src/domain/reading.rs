//! Sensor reading domain entity
//!
//! A reading is what the consumer-facing surfaces produce: the raw code
//! sampled from a channel's data register and the temperature derived from
//! it. It has no knowledge of how it is formatted or transmitted.

use crate::domain::{CalibrationTable, ChannelId};
use crate::error::{Error, Result};

/// A single temperature sample
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorReading {
    /// Channel the sample was taken from
    pub channel: ChannelId,
    /// Raw 12-bit code
    pub code: u16,
    /// Temperature in Celsius
    pub celsius: i32,
    /// The sensor had not settled and `celsius` is the table floor
    pub substituted: bool,
}

impl SensorReading {
    /// Convert a sampled code, substituting the table floor for a sensor that
    /// has not settled yet. Out-of-range codes are returned as errors.
    pub fn from_code(table: &CalibrationTable, channel: ChannelId, code: u16) -> Result<Self> {
        match table.code_to_temp(code as u32) {
            Ok(celsius) => Ok(Self {
                channel,
                code,
                celsius,
                substituted: false,
            }),
            Err(Error::NotReady { .. }) => Ok(Self {
                channel,
                code,
                celsius: table.floor_celsius(),
                substituted: true,
            }),
            Err(e) => Err(e),
        }
    }

    /// Temperature in millidegrees Celsius
    pub const fn millicelsius(&self) -> i32 {
        self.celsius * 1000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CH: ChannelId = ChannelId::DEFAULT;

    #[test]
    fn test_not_ready_is_substituted_with_floor() {
        let reading = SensorReading::from_code(&CalibrationTable::RK3588, CH, 0x800).unwrap();
        assert_eq!(reading.celsius, -40);
        assert!(reading.substituted);
        assert_eq!(reading.millicelsius(), -40_000);
    }

    #[test]
    fn test_out_of_range_is_surfaced() {
        assert_eq!(
            SensorReading::from_code(&CalibrationTable::RK3588, CH, 100),
            Err(Error::OutOfRange { code: 100 })
        );
    }

    #[test]
    fn test_settled_code_converts() {
        let reading = SensorReading::from_code(&CalibrationTable::RK3588, CH, 285).unwrap();
        assert_eq!(reading.celsius, 25);
        assert!(!reading.substituted);
    }
}
