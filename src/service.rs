//! Control service - serves the protocol over any communication port
//!
//! Translates [`Command`]s into calls on a character-device session, so a
//! remote host sees the same semantics as a local user of the device node.

use crate::adapters::char_device::Session;
use crate::error::Result;
use crate::ports::communication::{CommunicationError, CommunicationPort};
use crate::ports::registers::RegisterPort;
use crate::ports::sensor::SensorPort;
use crate::protocol::{Command, Response};

/// Command loop bound to one session
pub struct ControlService<'a, R: RegisterPort> {
    session: Session<'a, R>,
}

impl<'a, R: RegisterPort> ControlService<'a, R> {
    pub fn new(session: Session<'a, R>) -> Self {
        Self { session }
    }

    /// Execute one command
    ///
    /// `WaitEvent` suspends until the active channel reports a crossing or
    /// the device shuts down.
    pub async fn handle(&mut self, command: Command) -> Response {
        debug!("tsadc: command {:?}", command);
        let result: Result<Response> = match command {
            Command::ReadTemperature => {
                self.session.rewind();
                SensorPort::read(&mut self.session).map(|r| Response::temperature(&r))
            }
            Command::WaitEvent => {
                let channel = self.session.channel();
                self.session
                    .wait_readable()
                    .await
                    .map(|()| Response::Event { channel })
            }
            other => self.session.ioctl(&other),
        };
        result.into()
    }

    /// Serve commands until the host goes away
    pub async fn serve<P: CommunicationPort>(
        &mut self,
        port: &mut P,
    ) -> core::result::Result<(), CommunicationError> {
        port.send_ready().await?;
        info!("tsadc: control service ready");

        loop {
            match port.receive_command().await {
                Ok(Some(command)) => {
                    let response = self.handle(command).await;
                    port.send_response(&response).await.inspect_err(|e| {
                        warn!("tsadc: failed to send response: {:?}", e);
                    })?;
                }
                Ok(None) => {
                    info!("tsadc: host disconnected");
                    return Ok(());
                }
                Err(e) => {
                    warn!("tsadc: command receive error: {:?}", e);
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{CharDevice, SimRegisters};
    use crate::blocking::block_on;
    use crate::device::Tsadc;
    use crate::domain::{CalibrationTable, ChannelId};
    use crate::error::Error;
    use crate::protocol::{self, MAX_FRAME_SIZE};
    use std::collections::VecDeque;
    use std::vec::Vec;

    /// Loopback port carrying real COBS frames in both directions
    #[derive(Default)]
    struct Loopback {
        inbound: VecDeque<Vec<u8>>,
        outbound: Vec<Response>,
    }

    impl Loopback {
        fn push(&mut self, command: Command) {
            let mut buf = [0u8; MAX_FRAME_SIZE];
            let frame = protocol::encode(&command, &mut buf).unwrap();
            self.inbound.push_back(frame.to_vec());
        }
    }

    impl CommunicationPort for Loopback {
        async fn send_response(
            &mut self,
            response: &Response,
        ) -> core::result::Result<(), CommunicationError> {
            let mut buf = [0u8; MAX_FRAME_SIZE];
            let frame = protocol::encode(response, &mut buf)
                .map_err(|_| CommunicationError::InvalidFormat)?;
            let decoded = protocol::decode(frame).map_err(|_| CommunicationError::InvalidFormat)?;
            self.outbound.push(decoded);
            Ok(())
        }

        async fn receive_command(
            &mut self,
        ) -> core::result::Result<Option<Command>, CommunicationError> {
            match self.inbound.pop_front() {
                Some(mut frame) => protocol::decode(&mut frame)
                    .map(Some)
                    .map_err(|_| CommunicationError::InvalidFormat),
                None => Ok(None),
            }
        }
    }

    fn device() -> Tsadc<SimRegisters> {
        Tsadc::new(SimRegisters::new(), CalibrationTable::RK3588, ChannelId::DEFAULT)
    }

    fn ch(id: i32) -> ChannelId {
        ChannelId::new(id).unwrap()
    }

    #[test]
    fn test_serve_session() {
        let dev = device();
        dev.registers().set_code(ch(2), 320);
        let mut service = ControlService::new(CharDevice::new(&dev).open());

        let mut port = Loopback::default();
        port.push(Command::set_channel(2));
        port.push(Command::get_channel());
        port.push(Command::read_temperature());
        port.push(Command::read_temperature());
        port.push(Command::set_channel(11));
        port.push(Command::set_int_threshold(85));

        assert_eq!(block_on(service.serve(&mut port)), Ok(()));
        assert_eq!(
            port.outbound,
            [
                Response::Ok,
                Response::Ok,
                Response::Channel { channel: ch(2) },
                Response::Temperature { channel: ch(2), code: 320, celsius: 57 },
                Response::Temperature { channel: ch(2), code: 320, celsius: 57 },
                Response::error(Error::InvalidChannel(11)),
                Response::Ok,
            ]
        );
        assert_eq!(dev.channel_state(ch(2)).threshold, Some(85));
    }

    #[test]
    fn test_wait_event_consumes_pending_crossing() {
        let dev = device();
        let mut service = ControlService::new(CharDevice::new(&dev).open());
        block_on(service.handle(Command::set_channel(2)));

        dev.registers().raise(1 << 2);
        dev.on_interrupt();
        assert_eq!(
            block_on(service.handle(Command::wait_event())),
            Response::Event { channel: ch(2) }
        );

        dev.shutdown();
        assert_eq!(
            block_on(service.handle(Command::wait_event())),
            Response::error(Error::Cancelled)
        );
    }

    #[test]
    fn test_garbage_frame_ends_service() {
        let dev = device();
        let mut service = ControlService::new(CharDevice::new(&dev).open());
        let mut port = Loopback::default();
        port.inbound.push_back(std::vec![0x03, 0xff, 0xff, 0x00]);

        assert_eq!(
            block_on(service.serve(&mut port)),
            Err(CommunicationError::InvalidFormat)
        );
        assert_eq!(port.outbound, [Response::Ok]);
    }
}
