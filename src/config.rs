//! Attach configuration
//!
//! The registration layer (device tree, board tables, ...) supplies where
//! the controller lives and which channel it drives; the engine only checks
//! that the values are usable.

use serde::{Deserialize, Serialize};

use crate::domain::ChannelId;
use crate::error::{Error, Result};
use crate::regs::{RegisterLayout, REGISTER_SPAN};

/// Conversion period programmed when none is configured, in controller
/// clock cycles
pub const DEFAULT_AUTO_PERIOD: u32 = 4800;

/// Configuration consumed by [`attach`](crate::attach())
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Physical base address of the register window
    pub base: usize,
    /// Size of the register window in bytes
    pub size: usize,
    /// Interrupt number of the controller
    pub irq: u32,
    /// Channel sampled by automatic conversion
    pub channel: ChannelId,
    /// Auto conversion period
    #[serde(default = "default_auto_period")]
    pub auto_period: u32,
    /// Auto conversion period while above the threshold
    #[serde(default = "default_auto_period")]
    pub auto_period_ht: u32,
    /// High temperature interrupt debounce count
    #[serde(default)]
    pub int_debounce: u32,
    /// High temperature shutdown debounce count
    #[serde(default)]
    pub tshut_debounce: u32,
    /// Enable the channel's interrupt source at attach, before any
    /// threshold is armed
    #[serde(default)]
    pub arm_on_attach: bool,
    /// Placement of the per-channel data and comparator banks
    #[serde(default)]
    pub layout: RegisterLayout,
}

fn default_auto_period() -> u32 {
    DEFAULT_AUTO_PERIOD
}

impl Config {
    /// Create a configuration with default timing
    pub const fn new(base: usize, size: usize, irq: u32, channel: ChannelId) -> Self {
        Self {
            base,
            size,
            irq,
            channel,
            auto_period: DEFAULT_AUTO_PERIOD,
            auto_period_ht: DEFAULT_AUTO_PERIOD,
            int_debounce: 0,
            tshut_debounce: 0,
            arm_on_attach: false,
            layout: RegisterLayout::DEFAULT,
        }
    }

    /// Set both conversion periods
    pub const fn with_auto_period(mut self, period: u32) -> Self {
        self.auto_period = period;
        self.auto_period_ht = period;
        self
    }

    /// Set the conversion period used above the threshold
    pub const fn with_auto_period_ht(mut self, period: u32) -> Self {
        self.auto_period_ht = period;
        self
    }

    pub const fn with_debounce(mut self, int_debounce: u32, tshut_debounce: u32) -> Self {
        self.int_debounce = int_debounce;
        self.tshut_debounce = tshut_debounce;
        self
    }

    pub const fn with_arm_on_attach(mut self, arm: bool) -> Self {
        self.arm_on_attach = arm;
        self
    }

    pub const fn with_layout(mut self, layout: RegisterLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Check that the register window can be mapped and that the channel
    /// banks fit in it without aliasing
    pub fn validate(&self) -> Result<()> {
        if self.base == 0 || self.base % 4 != 0 || self.size < REGISTER_SPAN {
            return Err(Error::InvalidConfig);
        }
        self.layout.validate(self.size)
    }
}
