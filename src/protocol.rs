//! Control protocol shared between a host and the device
//!
//! This module defines the commands accepted by the control surface and the
//! responses it produces, independent of the transport carrying them.
//!
//! Messages are serialized using `postcard` with COBS encoding for framing.
//! Any failure to encode or decode a frame is reported as
//! [`Error::BoundaryCopy`]: the data could not be moved across the boundary.

use serde::{Deserialize, Serialize};

use crate::domain::{ChannelId, SensorReading};
use crate::error::{Error, Result};

/// Largest encoded frame, sentinel included
pub const MAX_FRAME_SIZE: usize = 64;

/// Command sent from host to device
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Select the active channel
    SetChannel { channel: i32 },

    /// Report the active channel
    GetChannel,

    /// Arm a threshold (Celsius) on the active channel
    SetIntThreshold { celsius: i32 },

    /// Sample the active channel
    ReadTemperature,

    /// Block until the active channel reports a threshold crossing
    WaitEvent,
}

impl Command {
    /// Create set channel command
    pub fn set_channel(channel: i32) -> Self {
        Self::SetChannel { channel }
    }

    /// Create get channel command
    pub fn get_channel() -> Self {
        Self::GetChannel
    }

    /// Create set threshold command
    pub fn set_int_threshold(celsius: i32) -> Self {
        Self::SetIntThreshold { celsius }
    }

    /// Create read command
    pub fn read_temperature() -> Self {
        Self::ReadTemperature
    }

    /// Create wait command
    pub fn wait_event() -> Self {
        Self::WaitEvent
    }

    /// Decode a Linux ioctl request and its integer argument
    ///
    /// Unknown requests yield [`Error::UnsupportedCommand`].
    pub fn from_ioctl(request: u32, arg: i32) -> Result<Self> {
        match request {
            ioctl::SET_CHANNEL => Ok(Self::SetChannel { channel: arg }),
            ioctl::GET_CHANNEL => Ok(Self::GetChannel),
            ioctl::SET_INT_THRESHOLD => Ok(Self::SetIntThreshold { celsius: arg }),
            _ => Err(Error::UnsupportedCommand),
        }
    }
}

/// Response sent from device to host
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Response {
    /// Success
    Ok,

    /// Active channel
    Channel { channel: ChannelId },

    /// Temperature sample
    Temperature {
        /// Channel sampled
        channel: ChannelId,
        /// Raw code read from the data register
        code: u16,
        /// Temperature in Celsius
        celsius: i32,
    },

    /// A threshold crossing was observed and consumed
    Event { channel: ChannelId },

    /// The command failed
    Error { error: Error },
}

impl Response {
    /// Create error response
    pub fn error(error: Error) -> Self {
        Self::Error { error }
    }

    /// Create temperature response
    pub fn temperature(reading: &SensorReading) -> Self {
        Self::Temperature {
            channel: reading.channel,
            code: reading.code,
            celsius: reading.celsius,
        }
    }
}

impl From<Result<Response>> for Response {
    fn from(result: Result<Response>) -> Self {
        result.unwrap_or_else(Response::error)
    }
}

/// Encode a message as a COBS frame into `buf`, returning the used part
pub fn encode<'a, T: Serialize>(message: &T, buf: &'a mut [u8]) -> Result<&'a mut [u8]> {
    postcard::to_slice_cobs(message, buf).map_err(|_| Error::BoundaryCopy)
}

/// Decode a COBS frame in place
pub fn decode<'a, T: Deserialize<'a>>(frame: &'a mut [u8]) -> Result<T> {
    postcard::from_bytes_cobs(frame).map_err(|_| Error::BoundaryCopy)
}

/// Linux ioctl request numbers of the character device
pub mod ioctl {
    /// ioctl type byte
    pub const MAGIC: u8 = b'T';

    const WRITE: u32 = 1;
    const READ: u32 = 2;
    const INT_SIZE: u32 = core::mem::size_of::<i32>() as u32;

    const fn ioc(dir: u32, nr: u32) -> u32 {
        (dir << 30) | (INT_SIZE << 16) | ((MAGIC as u32) << 8) | nr
    }

    /// `_IOW('T', 1, int)`
    pub const SET_CHANNEL: u32 = ioc(WRITE, 1);
    /// `_IOR('T', 2, int)`
    pub const GET_CHANNEL: u32 = ioc(READ, 2);
    /// `_IOW('T', 3, int)`, temperature in Celsius
    pub const SET_INT_THRESHOLD: u32 = ioc(WRITE, 3);
}
