//! Temperature calibration domain service
//!
//! Converts raw converter codes to degrees Celsius through a piecewise-linear
//! lookup table, and maps a temperature back to a comparator code.
//!
//! # Table direction
//!
//! Entries are ordered by strictly decreasing code and strictly decreasing
//! temperature, i.e. the code rises with temperature. Entry 0 is the hottest
//! measurable point, the last entry the coldest. Codes above entry 0 mean the
//! sensor has not settled yet; codes below the last entry are outside the
//! calibrated range.

use crate::error::{Error, Result};
use crate::regs::DATA_MASK;

/// One (temperature, code) point of a calibration curve
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationPoint {
    /// Temperature in Celsius
    pub celsius: i32,
    /// Raw converter code at that temperature
    pub code: i32,
}

impl CalibrationPoint {
    pub const fn new(celsius: i32, code: i32) -> Self {
        Self { celsius, code }
    }
}

const RK3588_POINTS: [CalibrationPoint; 4] = [
    CalibrationPoint::new(125, 395),
    CalibrationPoint::new(85, 350),
    CalibrationPoint::new(25, 285),
    CalibrationPoint::new(-40, 215),
];

/// Monotonic calibration table
///
/// The table is a replaceable calibration input: any slice honouring the
/// direction documented at module level can be used through [`Self::new`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationTable {
    points: &'static [CalibrationPoint],
}

impl CalibrationTable {
    /// RK3588 TSADC curve, from the TRM
    pub const RK3588: Self = Self {
        points: &RK3588_POINTS,
    };

    /// Create a table, checking that it has at least two entries, that
    /// both fields strictly decrease from the first entry to the last and
    /// that every code fits the data register
    pub fn new(points: &'static [CalibrationPoint]) -> Result<Self> {
        if points.len() < 2 {
            return Err(Error::InvalidTable);
        }
        if points.iter().any(|p| !(0..=DATA_MASK as i32).contains(&p.code)) {
            return Err(Error::InvalidTable);
        }
        let monotonic = points
            .windows(2)
            .all(|pair| pair[0].code > pair[1].code && pair[0].celsius > pair[1].celsius);
        if !monotonic {
            return Err(Error::InvalidTable);
        }
        Ok(Self { points })
    }

    /// Table entries, hottest first
    pub fn points(&self) -> &'static [CalibrationPoint] {
        self.points
    }

    /// Hottest measurable point (largest code)
    pub fn hottest(&self) -> CalibrationPoint {
        self.points[0]
    }

    /// Coldest measurable point (smallest code)
    pub fn coldest(&self) -> CalibrationPoint {
        self.points[self.points.len() - 1]
    }

    /// Floor value substituted for not-ready readings
    pub fn floor_celsius(&self) -> i32 {
        self.coldest().celsius
    }

    /// Convert a raw code to Celsius
    ///
    /// Returns [`Error::NotReady`] for codes above the hottest entry and
    /// [`Error::OutOfRange`] for codes below the coldest one. Inside the
    /// table the bracketing interval is found by binary search and the
    /// result is linearly interpolated with truncating integer division.
    pub fn code_to_temp(&self, code: u32) -> Result<i32> {
        let raw = i64::from(code);

        if raw > i64::from(self.hottest().code) {
            return Err(Error::NotReady { code });
        }
        if raw < i64::from(self.coldest().code) {
            return Err(Error::OutOfRange { code });
        }

        let last_interval = self.points.len() - 2;

        // Entries with code >= raw form a non-empty prefix. An exact hit on an
        // interior entry selects the interval starting at that entry.
        let at_or_above = self.points.partition_point(|p| i64::from(p.code) >= raw);
        let upper = at_or_above.saturating_sub(1).min(last_interval);

        let hi = self.points[upper];
        let lo = self.points[upper + 1];

        let num = (raw - i64::from(lo.code)) * (i64::from(hi.celsius) - i64::from(lo.celsius));
        let den = i64::from(hi.code) - i64::from(lo.code);
        // Lies between lo.celsius and hi.celsius.
        Ok((i64::from(lo.celsius) + num / den) as i32)
    }

    /// Map a temperature to the code programmed into a comparator
    ///
    /// The code of the upper end of the interval `(t[i+1], t[i]]` holding
    /// `celsius` is returned as is, without interpolation. Temperatures at or
    /// below the coldest entry return the coldest code, temperatures above the
    /// hottest entry the hottest code.
    pub fn temp_to_code(&self, celsius: i32) -> u32 {
        let code = if celsius <= self.coldest().celsius {
            self.coldest().code
        } else {
            self.points
                .windows(2)
                .find(|pair| celsius <= pair[0].celsius && celsius > pair[1].celsius)
                .map_or(self.hottest().code, |pair| pair[0].code)
        };
        // Codes are checked against the data register width on creation.
        code.clamp(0, DATA_MASK as i32) as u32
    }
}

impl Default for CalibrationTable {
    fn default() -> Self {
        Self::RK3588
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: CalibrationTable = CalibrationTable::RK3588;

    #[test]
    fn test_exact_entries_have_no_interpolation_error() {
        for point in TABLE.points() {
            assert_eq!(TABLE.code_to_temp(point.code as u32), Ok(point.celsius));
        }
    }

    #[test]
    fn test_interpolation_regression() {
        // 25 + (320 - 285) * (85 - 25) / (350 - 285) = 25 + 2100 / 65
        assert_eq!(TABLE.code_to_temp(320), Ok(57));
        assert_eq!(TABLE.code_to_temp(350), Ok(85));
        // -40 + 35 * 65 / 70 truncates 32.5 to 32
        assert_eq!(TABLE.code_to_temp(250), Ok(-8));
        assert_eq!(TABLE.code_to_temp(300), Ok(38));
        assert_eq!(TABLE.code_to_temp(394), Ok(124));
    }

    #[test]
    fn test_codes_above_hottest_entry_are_not_ready() {
        assert_eq!(TABLE.code_to_temp(396), Err(Error::NotReady { code: 396 }));
        assert_eq!(TABLE.code_to_temp(0xfff), Err(Error::NotReady { code: 0xfff }));
    }

    #[test]
    fn test_codes_below_coldest_entry_are_out_of_range() {
        assert_eq!(TABLE.code_to_temp(214), Err(Error::OutOfRange { code: 214 }));
        assert_eq!(TABLE.code_to_temp(0), Err(Error::OutOfRange { code: 0 }));
    }

    #[test]
    fn test_temp_to_code_selects_bracket_endpoint() {
        assert_eq!(TABLE.temp_to_code(90), 395);
        assert_eq!(TABLE.temp_to_code(85), 350);
        assert_eq!(TABLE.temp_to_code(30), 350);
        assert_eq!(TABLE.temp_to_code(25), 285);
        assert_eq!(TABLE.temp_to_code(-39), 285);
    }

    #[test]
    fn test_temp_to_code_saturates() {
        assert_eq!(TABLE.temp_to_code(-40), 215);
        assert_eq!(TABLE.temp_to_code(-100), 215);
        assert_eq!(TABLE.temp_to_code(126), 395);
        assert_eq!(TABLE.temp_to_code(i32::MIN), 215);
        assert_eq!(TABLE.temp_to_code(i32::MAX), 395);
    }

    #[test]
    fn test_codes_outside_data_register_are_rejected() {
        static NEGATIVE: [CalibrationPoint; 2] =
            [CalibrationPoint::new(10, -100), CalibrationPoint::new(0, -200)];
        static WIDE: [CalibrationPoint; 2] =
            [CalibrationPoint::new(125, 0x1000), CalibrationPoint::new(-40, 215)];

        assert_eq!(CalibrationTable::new(&NEGATIVE), Err(Error::InvalidTable));
        assert_eq!(CalibrationTable::new(&WIDE), Err(Error::InvalidTable));
    }

    #[test]
    fn test_wide_temperature_range_does_not_overflow() {
        static WIDE: [CalibrationPoint; 2] = [
            CalibrationPoint::new(2_000_000, 4095),
            CalibrationPoint::new(-2_000_000, 0),
        ];
        let table = CalibrationTable::new(&WIDE).unwrap();

        // -2_000_000 + 4000 * 4_000_000 / 4095
        assert_eq!(table.code_to_temp(4000), Ok(1_907_203));
        assert_eq!(table.code_to_temp(4095), Ok(2_000_000));
        assert_eq!(table.code_to_temp(0), Ok(-2_000_000));
        assert_eq!(table.code_to_temp(4096), Err(Error::NotReady { code: 4096 }));
        assert_eq!(table.code_to_temp(u32::MAX), Err(Error::NotReady { code: u32::MAX }));
        assert_eq!(table.temp_to_code(i32::MIN), 0);
        assert_eq!(table.temp_to_code(i32::MAX), 4095);
    }

    #[test]
    fn test_table_validation() {
        static ASCENDING: [CalibrationPoint; 2] =
            [CalibrationPoint::new(-40, 215), CalibrationPoint::new(125, 395)];
        static SINGLE: [CalibrationPoint; 1] = [CalibrationPoint::new(25, 285)];
        static INVERTED: [CalibrationPoint; 2] =
            [CalibrationPoint::new(-40, 3800), CalibrationPoint::new(110, -530)];

        assert_eq!(CalibrationTable::new(&ASCENDING), Err(Error::InvalidTable));
        assert_eq!(CalibrationTable::new(&SINGLE), Err(Error::InvalidTable));
        assert_eq!(CalibrationTable::new(&INVERTED), Err(Error::InvalidTable));
        assert_eq!(CalibrationTable::new(&RK3588_POINTS), Ok(TABLE));
    }

    #[test]
    fn test_floor_is_coldest_entry() {
        assert_eq!(TABLE.floor_celsius(), -40);
    }
}
