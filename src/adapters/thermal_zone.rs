//! Thermal-zone adapter
//!
//! Lets an external thermal governor poll the engine on its own schedule.
//! Temperatures are reported in millidegrees Celsius. When the zone's
//! channel crosses its threshold the governor is told to re-evaluate.

use crate::device::Tsadc;
use crate::domain::{ChannelId, ChannelMask, SensorReading};
use crate::error::Result;
use crate::ports::registers::RegisterPort;
use crate::ports::sensor::{SensorPort, ThermalEvent, ThermalGovernor, ThermalPort};
use crate::regs;

/// Thermal zone bound to one channel of an attached engine
pub struct ThermalZone<'a, R: RegisterPort> {
    device: &'a Tsadc<R>,
    channel: ChannelId,
}

impl<'a, R: RegisterPort> ThermalZone<'a, R> {
    pub fn new(device: &'a Tsadc<R>, channel: ChannelId) -> Self {
        Self { device, channel }
    }

    /// Interrupt handler for platforms that report through the thermal
    /// framework
    ///
    /// Runs the dispatcher and notifies `governor` when this zone's channel
    /// was among the pending ones.
    pub fn handle_interrupt<G: ThermalGovernor>(&self, governor: &G) -> ChannelMask {
        let fired = self.device.on_interrupt();
        if fired.bits() & regs::int_src_mask(self.channel.index()) != 0 {
            debug!("tsadc: zone {} update", self.channel.value());
            governor.update(ThermalEvent::Unspecified);
        }
        fired
    }

    /// Arm a trip temperature on this zone's channel
    ///
    /// The engine's active channel is left as it was.
    pub fn set_trip(&self, celsius: i32) -> Result<()> {
        self.device.arm_threshold(self.channel, celsius);
        Ok(())
    }
}

impl<'a, R: RegisterPort> ThermalPort for ThermalZone<'a, R> {
    fn get_temp(&self) -> Result<i32> {
        self.device.read(self.channel).map(|r| r.millicelsius())
    }
}

impl<'a, R: RegisterPort> SensorPort for ThermalZone<'a, R> {
    fn read(&mut self) -> Result<SensorReading> {
        self.device.read(self.channel)
    }

    fn channel(&self) -> ChannelId {
        self.channel
    }

    fn last_raw_value(&self) -> Option<u16> {
        self.device.channel_state(self.channel).last_code
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{CharDevice, SimRegisters};
    use crate::domain::CalibrationTable;
    use crate::error::Error;
    use crate::protocol::Command;
    use crate::regs::RegisterLayout;
    use core::cell::Cell;

    #[derive(Default)]
    struct CountingGovernor {
        updates: Cell<u32>,
    }

    impl ThermalGovernor for CountingGovernor {
        fn update(&self, event: ThermalEvent) {
            assert_eq!(event, ThermalEvent::Unspecified);
            self.updates.set(self.updates.get() + 1);
        }
    }

    fn device() -> Tsadc<SimRegisters> {
        Tsadc::new(SimRegisters::new(), CalibrationTable::RK3588, ChannelId::DEFAULT)
    }

    fn ch(id: i32) -> ChannelId {
        ChannelId::new(id).unwrap()
    }

    #[test]
    fn test_get_temp_in_millicelsius() {
        let dev = device();
        let zone = ThermalZone::new(&dev, ch(1));

        dev.registers().set_code(ch(1), 320);
        assert_eq!(zone.get_temp(), Ok(57_000));

        dev.registers().set_code(ch(1), 0xfff);
        assert_eq!(zone.get_temp(), Ok(-40_000));

        dev.registers().set_code(ch(1), 10);
        assert_eq!(zone.get_temp(), Err(Error::OutOfRange { code: 10 }));
        assert_eq!(zone.last_raw_value(), Some(10));
    }

    #[test]
    fn test_governor_notified_for_own_channel_only() {
        let dev = device();
        let zone = ThermalZone::new(&dev, ch(1));
        let governor = CountingGovernor::default();

        dev.registers().raise(1 << 4);
        assert_eq!(zone.handle_interrupt(&governor).bits(), 1 << 4);
        assert_eq!(governor.updates.get(), 0);

        dev.registers().raise((1 << 1) | (1 << 4));
        zone.handle_interrupt(&governor);
        assert_eq!(governor.updates.get(), 1);
    }

    #[test]
    fn test_set_trip_arms_zone_channel() {
        let dev = device();
        let zone = ThermalZone::new(&dev, ch(6));
        zone.set_trip(85).unwrap();
        assert_eq!(dev.channel_state(ch(6)).threshold, Some(85));
        assert_eq!(dev.registers().peek(RegisterLayout::DEFAULT.comp_int(6)), 350);
    }

    #[test]
    fn test_set_trip_keeps_session_channel() {
        let dev = device();
        let mut session = CharDevice::new(&dev).open();
        session.ioctl(&Command::set_channel(2)).unwrap();

        ThermalZone::new(&dev, ch(6)).set_trip(85).unwrap();

        assert_eq!(
            session.ioctl(&Command::get_channel()),
            Ok(crate::protocol::Response::Channel { channel: ch(2) })
        );
        assert_eq!(dev.channel_state(ch(2)).threshold, None);
        assert_eq!(dev.registers().peek(crate::regs::INT_EN), 1 << 6);
    }
}
