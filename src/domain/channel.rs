//! Channel identifiers and per-channel state

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::regs::MAX_CHANNELS;

/// Sensor channel identifier
///
/// Always within `[0, MAX_CHANNELS)`; construction is checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelId(u8);

impl ChannelId {
    /// Channel sampled by default after attach
    pub const DEFAULT: ChannelId = ChannelId(0);

    /// Check and wrap a raw channel id
    pub const fn new(id: i32) -> Result<Self, Error> {
        if id >= 0 && (id as usize) < MAX_CHANNELS {
            Ok(Self(id as u8))
        } else {
            Err(Error::InvalidChannel(id))
        }
    }

    /// Every channel, in ascending order
    pub fn all() -> impl Iterator<Item = ChannelId> {
        (0..MAX_CHANNELS as u8).map(ChannelId)
    }

    /// Index into per-channel tables and register arrays
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// Get the raw ID value
    pub const fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i32> for ChannelId {
    type Error = Error;

    fn try_from(id: i32) -> Result<Self, Error> {
        Self::new(id)
    }
}

impl From<ChannelId> for i32 {
    fn from(id: ChannelId) -> i32 {
        id.0 as i32
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Set of channels, one bit per channel as laid out in `INT_EN`/`INT_PD`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelMask(u32);

impl ChannelMask {
    pub const EMPTY: ChannelMask = ChannelMask(0);

    /// Keep only the bits that name a channel
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits & ((1 << MAX_CHANNELS) - 1))
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn contains(&self, channel: ChannelId) -> bool {
        self.0 & (1 << channel.0) != 0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = ChannelId> + '_ {
        ChannelId::all().filter(|ch| self.contains(*ch))
    }
}

/// Per-channel state owned by the device
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelState {
    /// Channel this state belongs to
    pub id: ChannelId,
    /// Armed threshold in Celsius, unset until the first threshold command
    pub threshold: Option<i32>,
    /// Threshold crossing seen by the dispatcher and not yet observed
    pub event: bool,
    /// Last raw code sampled on this channel (diagnostic only)
    pub last_code: Option<u16>,
}

impl ChannelState {
    pub const fn new(id: ChannelId) -> Self {
        Self {
            id,
            threshold: None,
            event: false,
            last_code: None,
        }
    }

    /// Observe the event flag and clear it in one step
    pub fn take_event(&mut self) -> bool {
        core::mem::replace(&mut self.event, false)
    }
}
