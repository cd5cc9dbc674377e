//! Byte-stream communication adapter
//!
//! Implements [`CommunicationPort`] over any blocking `Read + Write` stream:
//! a serial port, a socket, a pipe. Frames are postcard COBS, terminated by
//! the 0x00 sentinel.

use std::io::{ErrorKind, Read, Write};

use heapless::Vec as HeaplessVec;

use crate::ports::communication::{CommunicationError, CommunicationPort};
use crate::protocol::{self, Command, Response, MAX_FRAME_SIZE};

/// COBS framed link over a byte stream
pub struct StreamLink<S: Read + Write> {
    stream: S,
}

impl<S: Read + Write> StreamLink<S> {
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    /// Get the underlying stream
    pub fn stream(&self) -> &S {
        &self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Read one frame up to and including the sentinel
    ///
    /// Returns `None` when the stream ends between frames. Read timeouts
    /// while idle are retried, so a serial port with a short timeout works.
    fn read_cobs_message(
        &mut self,
    ) -> Result<Option<HeaplessVec<u8, MAX_FRAME_SIZE>>, CommunicationError> {
        let mut rx_buf = HeaplessVec::<u8, MAX_FRAME_SIZE>::new();
        let mut byte = [0u8; 1];

        loop {
            match self.stream.read(&mut byte) {
                Ok(1) => {
                    rx_buf
                        .push(byte[0])
                        .map_err(|_| CommunicationError::MessageTooLarge)?;
                    if byte[0] == 0x00 {
                        return Ok(Some(rx_buf));
                    }
                }
                Ok(_) => {
                    if rx_buf.is_empty() {
                        return Ok(None);
                    }
                    return Err(CommunicationError::Disconnected);
                }
                Err(e) if matches!(e.kind(), ErrorKind::Interrupted | ErrorKind::TimedOut) => {}
                Err(_) => return Err(CommunicationError::ReceiveFailed),
            }
        }
    }
}

impl<S: Read + Write> CommunicationPort for StreamLink<S> {
    async fn send_response(&mut self, response: &Response) -> Result<(), CommunicationError> {
        let mut tx_buf = [0u8; MAX_FRAME_SIZE];
        let frame = protocol::encode(response, &mut tx_buf)
            .map_err(|_| CommunicationError::InvalidFormat)?;

        self.stream
            .write_all(frame)
            .and_then(|()| self.stream.flush())
            .map_err(|_| CommunicationError::SendFailed)
    }

    async fn receive_command(&mut self) -> Result<Option<Command>, CommunicationError> {
        let Some(mut rx_buf) = self.read_cobs_message()? else {
            return Ok(None);
        };

        let cmd = protocol::decode(&mut rx_buf).map_err(|_| CommunicationError::InvalidFormat)?;
        Ok(Some(cmd))
    }
}
