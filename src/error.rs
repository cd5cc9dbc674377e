//! Error type shared by the engine, the adapters and the protocol
//!
//! Nothing in this crate retries. Every failure is either substituted
//! deterministically (a not-ready code on the sampling paths) or returned to
//! the immediate caller.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Result alias used across the crate
pub type Result<T> = core::result::Result<T, Error>;

/// Hardware resource acquired while attaching
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Resource {
    /// Register window mapping
    Registers,
    /// Controller clock
    Clock,
    /// APB reset line
    Reset,
    /// Interrupt line binding
    Interrupt,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registers => write!(f, "register window"),
            Self::Clock => write!(f, "clock"),
            Self::Reset => write!(f, "reset line"),
            Self::Interrupt => write!(f, "interrupt line"),
        }
    }
}

/// Errors reported by the TSADC engine and its adapters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A resource could not be acquired while attaching; `code` is the
    /// platform's own error code
    ResourceAcquisition { resource: Resource, code: i32 },
    /// The attach configuration is unusable
    InvalidConfig,
    /// The calibration table is not strictly monotonic or too short
    InvalidTable,
    /// Channel id outside `[0, MAX_CHANNELS)`
    InvalidChannel(i32),
    /// Raw code beyond the settled side of the table (sensor still settling)
    NotReady { code: u32 },
    /// Raw code beyond the coverage of the table
    OutOfRange { code: u32 },
    /// Data could not be moved across the consumer boundary
    BoundaryCopy,
    /// The wait was released by device shutdown
    Cancelled,
    /// The control surface does not know this command
    UnsupportedCommand,
}

impl Error {
    /// Linux errno equivalent, for character-device style surfaces
    pub const fn errno(&self) -> i32 {
        match self {
            Self::ResourceAcquisition { code, .. } => {
                if *code < 0 {
                    -*code
                } else {
                    errno::ENOMEM
                }
            }
            Self::InvalidConfig | Self::InvalidTable | Self::InvalidChannel(_) => errno::EINVAL,
            Self::OutOfRange { .. } => errno::EINVAL,
            Self::NotReady { .. } => errno::EAGAIN,
            Self::BoundaryCopy => errno::EFAULT,
            Self::Cancelled => errno::ECANCELED,
            Self::UnsupportedCommand => errno::ENOTTY,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResourceAcquisition { resource, code } => {
                write!(f, "failed to acquire {} (code {})", resource, code)
            }
            Self::InvalidConfig => write!(f, "invalid configuration"),
            Self::InvalidTable => write!(f, "calibration table is not strictly monotonic"),
            Self::InvalidChannel(id) => write!(f, "invalid channel {}", id),
            Self::NotReady { code } => write!(f, "sensor not ready (code {})", code),
            Self::OutOfRange { code } => write!(f, "code {} outside calibration range", code),
            Self::BoundaryCopy => write!(f, "failed to copy data across the boundary"),
            Self::Cancelled => write!(f, "wait cancelled by shutdown"),
            Self::UnsupportedCommand => write!(f, "unsupported command"),
        }
    }
}

impl core::error::Error for Error {}

/// Errno values used by [`Error::errno`]
pub mod errno {
    pub const EAGAIN: i32 = 11;
    pub const ENOMEM: i32 = 12;
    pub const EFAULT: i32 = 14;
    pub const EINVAL: i32 = 22;
    pub const ENOTTY: i32 = 25;
    pub const ECANCELED: i32 = 125;
}
