//! Character-device adapter
//!
//! Exposes the engine the way the misc device node does: `read` returns the
//! active channel's temperature as decimal text, `ioctl` carries the control
//! commands and `poll` reports pending threshold events.
//!
//! Each open file is a [`Session`]. A session yields one sample per
//! open/rewind cycle, so `cat` terminates.

use core::fmt::Write as _;

use heapless::String;

use crate::blocking::block_on;

use crate::device::Tsadc;
use crate::domain::{ChannelId, SensorReading};
use crate::error::{Error, Result};
use crate::ports::registers::RegisterPort;
use crate::ports::sensor::{EventPort, SensorPort};
use crate::protocol::{Command, Response};

/// Smallest buffer a read is served into
pub const MIN_READ_LEN: usize = 12;

/// Device node backed by an attached engine
pub struct CharDevice<'a, R: RegisterPort> {
    device: &'a Tsadc<R>,
}

impl<'a, R: RegisterPort> CharDevice<'a, R> {
    pub fn new(device: &'a Tsadc<R>) -> Self {
        Self { device }
    }

    /// Open a new session
    pub fn open(&self) -> Session<'a, R> {
        Session {
            device: self.device,
            offset: 0,
        }
    }
}

/// One open file on the device node
pub struct Session<'a, R: RegisterPort> {
    device: &'a Tsadc<R>,
    offset: usize,
}

impl<'a, R: RegisterPort> Session<'a, R> {
    /// Read the active channel's temperature as `"<celsius>\n"`
    ///
    /// Returns 0 once the session has produced its sample, and for buffers
    /// shorter than [`MIN_READ_LEN`]. A sensor that has not settled reads as
    /// the table floor. Pending events are neither consulted nor cleared.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.offset > 0 || buf.len() < MIN_READ_LEN {
            return Ok(0);
        }

        let reading = self.device.read(self.device.active_channel())?;

        let mut text: String<MIN_READ_LEN> = String::new();
        writeln!(text, "{}", reading.celsius).map_err(|_| Error::BoundaryCopy)?;

        let len = text.len();
        buf[..len].copy_from_slice(text.as_bytes());
        self.offset += len;
        Ok(len)
    }

    /// Position of the session, in bytes already returned
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Seek back to the start so the next read samples again
    pub fn rewind(&mut self) {
        self.offset = 0;
    }

    /// Execute a control command
    ///
    /// Only the ioctl commands are accepted here; reads and waits have their
    /// own entry points.
    pub fn ioctl(&mut self, command: &Command) -> Result<Response> {
        match *command {
            Command::SetChannel { channel } => {
                self.device.set_active_channel(channel)?;
                Ok(Response::Ok)
            }
            Command::GetChannel => Ok(Response::Channel {
                channel: self.device.active_channel(),
            }),
            Command::SetIntThreshold { celsius } => {
                self.device.set_threshold(celsius);
                Ok(Response::Ok)
            }
            Command::ReadTemperature | Command::WaitEvent => Err(Error::UnsupportedCommand),
        }
    }

    /// Execute a raw ioctl request
    ///
    /// Returns the integer handed back to user space: the channel id for
    /// `GET_CHANNEL`, 0 otherwise.
    pub fn ioctl_raw(&mut self, request: u32, arg: i32) -> Result<i32> {
        let command = Command::from_ioctl(request, arg)?;
        match self.ioctl(&command)? {
            Response::Channel { channel } => Ok(channel.into()),
            _ => Ok(0),
        }
    }

    /// Non-blocking poll: consume a pending event on the active channel
    pub fn poll(&mut self) -> bool {
        self.device.take_event(self.device.active_channel())
    }

    /// Wait until the active channel reports a threshold crossing
    ///
    /// The channel is the one active when the wait starts.
    pub async fn wait_readable(&self) -> Result<()> {
        let channel = self.device.active_channel();
        self.device.wait_for_event(channel).await
    }

    /// Blocking form of [`Self::wait_readable`]
    ///
    /// On hosted builds the calling thread sleeps until the dispatcher wakes
    /// it.
    pub fn wait_readable_blocking(&self) -> Result<()> {
        block_on(self.wait_readable())
    }
}

impl<'a, R: RegisterPort> SensorPort for Session<'a, R> {
    fn read(&mut self) -> Result<SensorReading> {
        self.device.read(self.device.active_channel())
    }

    fn channel(&self) -> ChannelId {
        self.device.active_channel()
    }

    fn last_raw_value(&self) -> Option<u16> {
        self.device.channel_state(self.channel()).last_code
    }
}

impl<'a, R: RegisterPort> EventPort for Session<'a, R> {
    async fn wait_event(&mut self) -> Result<()> {
        self.wait_readable().await
    }

    fn poll_event(&mut self) -> bool {
        self.poll()
    }
}
