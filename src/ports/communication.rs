//! Communication port - abstraction for host communication
//!
//! This trait allows the control service to talk to a host without knowing
//! the specific transport (UART, USB CDC, a pipe to user space, ...)

use crate::protocol::{Command, Response};

/// Error type for communication operations
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommunicationError {
    /// Connection lost
    Disconnected,
    /// Failed to send response
    SendFailed,
    /// Failed to receive command
    ReceiveFailed,
    /// Message too large for a frame
    MessageTooLarge,
    /// Frame could not be decoded or encoded
    InvalidFormat,
}

/// Port for communication with a host
///
/// # Example Implementation
///
/// ```ignore
/// struct UartLink<U> {
///     uart: U,
/// }
///
/// impl<U: Uart> CommunicationPort for UartLink<U> {
///     async fn send_response(&mut self, response: &Response) -> Result<(), CommunicationError> {
///         let mut buf = [0u8; MAX_FRAME_SIZE];
///         let frame = protocol::encode(response, &mut buf)
///             .map_err(|_| CommunicationError::InvalidFormat)?;
///         self.uart.write_all(frame).await.map_err(|_| CommunicationError::SendFailed)
///     }
///
///     async fn receive_command(&mut self) -> Result<Option<Command>, CommunicationError> {
///         // ... read up to the COBS sentinel, then protocol::decode ...
///     }
/// }
/// ```
pub trait CommunicationPort {
    /// Send a response to the host
    fn send_response(
        &mut self,
        response: &Response,
    ) -> impl core::future::Future<Output = Result<(), CommunicationError>>;

    /// Receive a command from the host
    ///
    /// Returns `None` once the host has gone away.
    fn receive_command(
        &mut self,
    ) -> impl core::future::Future<Output = Result<Option<Command>, CommunicationError>>;

    /// Send a ready signal to the host
    fn send_ready(&mut self) -> impl core::future::Future<Output = Result<(), CommunicationError>> {
        async { self.send_response(&Response::Ok).await }
    }
}
