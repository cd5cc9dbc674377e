//! TSADC register map
//!
//! Offsets are relative to the base of the controller's register window.
//! The control block follows the RK3588 TRM. The per-channel data and
//! comparator banks differ between controller revisions and are described
//! by a [`RegisterLayout`].

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of sensor channels multiplexed through the converter
pub const MAX_CHANNELS: usize = 8;

/// Size of the register window the engine touches
pub const REGISTER_SPAN: usize = 0x100;

/// Auto conversion control
pub const AUTO_CON: usize = 0x0004;
/// Interrupt source enable, one bit per channel
pub const INT_EN: usize = 0x0008;
/// Pending interrupts, write 1 to clear
pub const INT_PD: usize = 0x000c;
/// High temperature interrupt debounce
pub const HIGHT_INT_DEBOUNCE: usize = 0x0060;
/// High temperature shutdown debounce
pub const HIGHT_TSHUT_DEBOUNCE: usize = 0x0064;
/// Auto conversion period
pub const AUTO_PERIOD: usize = 0x0068;
/// Auto conversion period once a channel is above its threshold
pub const AUTO_PERIOD_HT: usize = 0x006c;

const CONTROL: [usize; 7] = [
    AUTO_CON,
    INT_EN,
    INT_PD,
    HIGHT_INT_DEBOUNCE,
    HIGHT_TSHUT_DEBOUNCE,
    AUTO_PERIOD,
    AUTO_PERIOD_HT,
];

/// Valid bits of a data register
pub const DATA_MASK: u32 = 0xfff;

/// Start bit in `AUTO_CON`
pub const AUTO_CON_START: u32 = 1 << 0;

/// Source enable bit of `chn` in `AUTO_CON`
pub const fn auto_con_src_en(chn: usize) -> u32 {
    1 << (4 + chn)
}

/// Interrupt enable bit of `chn` in `INT_EN`
pub const fn int_src_en(chn: usize) -> u32 {
    1 << chn
}

/// Pending bit of `chn` in `INT_PD`
pub const fn int_src_mask(chn: usize) -> u32 {
    1 << chn
}

/// Placement of the per-channel register banks
///
/// Each bank holds one 32-bit register per channel, `MAX_CHANNELS` words
/// long.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterLayout {
    /// Offset of the data register of channel 0
    pub data: usize,
    /// Offset of the interrupt comparator of channel 0
    pub comp_int: usize,
}

const BANK_LEN: usize = MAX_CHANNELS * 4;

impl RegisterLayout {
    /// Data bank at `0x20`, comparator bank right after the control block
    pub const DEFAULT: Self = Self {
        data: 0x0020,
        comp_int: 0x0070,
    };

    /// Raw conversion result of `chn`
    pub const fn data(&self, chn: usize) -> usize {
        self.data + chn * 4
    }

    /// Interrupt comparator of `chn`
    pub const fn comp_int(&self, chn: usize) -> usize {
        self.comp_int + chn * 4
    }

    /// Check that both banks are word aligned, fit in a window of `size`
    /// bytes and share no register with each other or the control block
    pub fn validate(&self, size: usize) -> Result<()> {
        let banks = [self.data, self.comp_int];
        for base in banks {
            let end = match base.checked_add(BANK_LEN) {
                Some(end) if base % 4 == 0 && end <= size => end,
                _ => return Err(Error::InvalidConfig),
            };
            if CONTROL.iter().any(|reg| (base..end).contains(reg)) {
                return Err(Error::InvalidConfig);
            }
        }
        if self.data.abs_diff(self.comp_int) < BANK_LEN {
            return Err(Error::InvalidConfig);
        }
        Ok(())
    }
}

impl Default for RegisterLayout {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_is_valid() {
        assert_eq!(RegisterLayout::DEFAULT.validate(REGISTER_SPAN), Ok(()));
        assert_eq!(RegisterLayout::DEFAULT.data(7), 0x3c);
        assert_eq!(RegisterLayout::DEFAULT.comp_int(7), 0x8c);
    }

    #[test]
    fn test_channel_banks_must_not_alias() {
        // Data of channels 4..7 would land on the comparators of 0..3.
        let aliased = RegisterLayout {
            data: 0x20,
            comp_int: 0x30,
        };
        assert_eq!(aliased.validate(REGISTER_SPAN), Err(Error::InvalidConfig));
    }

    #[test]
    fn test_banks_must_avoid_control_block() {
        let over_int_pd = RegisterLayout {
            data: 0x00,
            comp_int: 0x70,
        };
        let over_period = RegisterLayout {
            data: 0x20,
            comp_int: 0x50,
        };
        assert_eq!(over_int_pd.validate(REGISTER_SPAN), Err(Error::InvalidConfig));
        assert_eq!(over_period.validate(REGISTER_SPAN), Err(Error::InvalidConfig));
    }

    #[test]
    fn test_banks_must_fit_window() {
        let past_end = RegisterLayout {
            data: 0x20,
            comp_int: 0xf0,
        };
        assert_eq!(past_end.validate(REGISTER_SPAN), Err(Error::InvalidConfig));
        assert_eq!(past_end.validate(0x200), Ok(()));
        let unaligned = RegisterLayout {
            data: 0x22,
            comp_int: 0x70,
        };
        assert_eq!(unaligned.validate(REGISTER_SPAN), Err(Error::InvalidConfig));
    }
}
