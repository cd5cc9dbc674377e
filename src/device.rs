//! TSADC device state and interrupt dispatcher
//!
//! [`Tsadc`] owns the register handle, the active-channel selector, the
//! per-channel state table and the set of consumers waiting for events.
//!
//! # Concurrency
//!
//! The dispatcher ([`Tsadc::on_interrupt`]) runs in interrupt context while
//! any number of consumers call into the device from thread context. All
//! mutable state lives behind one `critical_section::Mutex`, which can be
//! entered from both. Event flag read-clears, flag sets and every comparator
//! write happen inside it.
//!
//! Waiting consumers register their waker with the device; the dispatcher
//! wakes all of them on every interrupt. Each woken waiter re-checks its
//! channel's flag under the lock and only the first to clear it observes the
//! event. The others go back to waiting.

use core::cell::RefCell;
use core::future::{poll_fn, Future};
use core::task::Poll;

use critical_section::Mutex;
use embassy_sync::waitqueue::MultiWakerRegistration;

use crate::config::Config;
use crate::domain::{CalibrationTable, ChannelId, ChannelMask, ChannelState, SensorReading};
use crate::error::{Error, Result};
use crate::ports::RegisterPort;
use crate::regs::{self, RegisterLayout, MAX_CHANNELS};

/// Number of waker slots. When more tasks wait at once, registering one more
/// wakes everybody so that they register again.
pub const MAX_WAITERS: usize = 8;

struct State {
    active: ChannelId,
    channels: [ChannelState; MAX_CHANNELS],
    waiters: MultiWakerRegistration<MAX_WAITERS>,
    shut_down: bool,
}

impl State {
    fn new(active: ChannelId) -> Self {
        let mut channels = [ChannelState::new(ChannelId::DEFAULT); MAX_CHANNELS];
        for id in ChannelId::all() {
            channels[id.index()] = ChannelState::new(id);
        }
        Self {
            active,
            channels,
            waiters: MultiWakerRegistration::new(),
            shut_down: false,
        }
    }
}

/// TSADC engine
///
/// Created by [`attach`](crate::attach()) once the hardware resources are
/// held, shared by reference with the interrupt handler and the consumer
/// adapters.
pub struct Tsadc<R: RegisterPort> {
    regs: R,
    layout: RegisterLayout,
    table: CalibrationTable,
    state: Mutex<RefCell<State>>,
}

impl<R: RegisterPort> Tsadc<R> {
    /// Create the device state for an already mapped register window
    ///
    /// `channel` becomes the active channel. No register is touched until
    /// [`Self::start`].
    pub fn new(regs: R, table: CalibrationTable, channel: ChannelId) -> Self {
        Self {
            regs,
            layout: RegisterLayout::DEFAULT,
            table,
            state: Mutex::new(RefCell::new(State::new(channel))),
        }
    }

    /// Use `layout` for the per-channel data and comparator registers
    ///
    /// The layout must have passed [`RegisterLayout::validate`].
    pub fn with_layout(mut self, layout: RegisterLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Program the initial hardware state and start automatic conversion
    /// of `config.channel`
    pub fn start(&self, config: &Config) {
        let chn = config.channel.index();

        critical_section::with(|_| {
            self.regs.write(regs::AUTO_PERIOD, config.auto_period);
            self.regs.write(regs::AUTO_PERIOD_HT, config.auto_period_ht);
            self.regs.write(regs::HIGHT_INT_DEBOUNCE, config.int_debounce);
            self.regs.write(regs::HIGHT_TSHUT_DEBOUNCE, config.tshut_debounce);

            self.regs.write(regs::AUTO_CON, regs::auto_con_src_en(chn));
            if config.arm_on_attach {
                self.regs.write(regs::INT_EN, regs::int_src_en(chn));
            }
            self.regs.write(
                regs::AUTO_CON,
                regs::AUTO_CON_START | regs::auto_con_src_en(chn),
            );
        });

        info!(
            "tsadc: conversion started on channel {}, period {}",
            chn,
            config.auto_period
        );
    }

    /// Calibration table used for conversions
    pub fn table(&self) -> &CalibrationTable {
        &self.table
    }

    /// Register handle
    pub fn registers(&self) -> &R {
        &self.regs
    }

    pub fn layout(&self) -> RegisterLayout {
        self.layout
    }

    /// Select the channel control operations act on
    ///
    /// Thresholds and event flags of all channels are left untouched.
    pub fn set_active_channel(&self, id: i32) -> Result<ChannelId> {
        let channel = ChannelId::new(id).inspect_err(|_| {
            warn!("tsadc: rejected channel {}", id);
        })?;
        critical_section::with(|cs| {
            self.state.borrow_ref_mut(cs).active = channel;
        });
        info!("tsadc: channel set to {}", channel.value());
        Ok(channel)
    }

    /// Currently active channel
    pub fn active_channel(&self) -> ChannelId {
        critical_section::with(|cs| self.state.borrow_ref(cs).active)
    }

    /// Arm a threshold on the active channel
    ///
    /// The comparator receives the table code bracketing `celsius` and the
    /// channel's interrupt source is enabled. The threshold stays with the
    /// channel that was active at the time of the call. Returns that channel.
    pub fn set_threshold(&self, celsius: i32) -> ChannelId {
        let code = self.table.temp_to_code(celsius);
        let channel = critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            let channel = state.active;
            self.arm(&mut state, channel, celsius, code);
            channel
        });
        info!(
            "tsadc: interrupt threshold set to {} C (code {}) on channel {}",
            celsius,
            code,
            channel.value()
        );
        channel
    }

    /// Arm a threshold on `channel` without touching the active channel
    pub fn arm_threshold(&self, channel: ChannelId, celsius: i32) {
        let code = self.table.temp_to_code(celsius);
        critical_section::with(|cs| {
            self.arm(&mut self.state.borrow_ref_mut(cs), channel, celsius, code);
        });
        info!(
            "tsadc: interrupt threshold set to {} C (code {}) on channel {}",
            celsius,
            code,
            channel.value()
        );
    }

    // Caller holds the critical section.
    fn arm(&self, state: &mut State, channel: ChannelId, celsius: i32, code: u32) {
        let chn = channel.index();
        self.regs.write(self.layout.comp_int(chn), code);
        self.regs.modify(regs::INT_EN, |en| en | regs::int_src_en(chn));
        state.channels[chn].threshold = Some(celsius);
    }

    /// Interrupt dispatcher
    ///
    /// Reads the pending register once, acknowledges exactly the bits read,
    /// then flags every channel among them and wakes all waiters. Returns the
    /// channels that were flagged.
    pub fn on_interrupt(&self) -> ChannelMask {
        let (pending, fired) = critical_section::with(|cs| {
            let pending = self.regs.read(regs::INT_PD);
            self.regs.write(regs::INT_PD, pending);

            let fired = ChannelMask::from_bits(pending);
            let mut state = self.state.borrow_ref_mut(cs);
            if !fired.is_empty() && !state.shut_down {
                for channel in fired.iter() {
                    state.channels[channel.index()].event = true;
                }
                state.waiters.wake();
            }
            (pending, fired)
        });

        for channel in fired.iter() {
            info!(
                "tsadc: temperature threshold crossed for channel {}",
                channel.value()
            );
        }
        trace!("tsadc: irq pending {:x}", pending);
        fired
    }

    /// Observe and clear the event flag of `channel`
    pub fn take_event(&self, channel: ChannelId) -> bool {
        critical_section::with(|cs| {
            self.state.borrow_ref_mut(cs).channels[channel.index()].take_event()
        })
    }

    /// Wait for a threshold crossing on `channel`
    ///
    /// Resolves once this waiter has observed and cleared the channel's event
    /// flag, or with [`Error::Cancelled`] once the device is shut down.
    pub fn wait_for_event(&self, channel: ChannelId) -> impl Future<Output = Result<()>> + '_ {
        poll_fn(move |cx| {
            critical_section::with(|cs| {
                let mut state = self.state.borrow_ref_mut(cs);
                if state.shut_down {
                    return Poll::Ready(Err(Error::Cancelled));
                }
                if state.channels[channel.index()].take_event() {
                    return Poll::Ready(Ok(()));
                }
                state.waiters.register(cx.waker());
                Poll::Pending
            })
        })
    }

    /// Read the raw code of `channel` from its data register
    pub fn sample(&self, channel: ChannelId) -> u16 {
        let code = (self.regs.read(self.layout.data(channel.index())) & regs::DATA_MASK) as u16;
        critical_section::with(|cs| {
            self.state.borrow_ref_mut(cs).channels[channel.index()].last_code = Some(code);
        });
        code
    }

    /// Sample `channel` and convert the code to Celsius
    ///
    /// A sensor that has not settled yet reads as the table floor; codes
    /// outside the table are errors.
    pub fn read(&self, channel: ChannelId) -> Result<SensorReading> {
        let code = self.sample(channel);
        let reading = SensorReading::from_code(&self.table, channel, code).inspect_err(|e| {
            error!("tsadc: channel {} code {}: {:?}", channel.value(), code, e);
        })?;
        debug!(
            "tsadc: channel {} code {} temperature {}",
            channel.value(),
            code,
            reading.celsius
        );
        Ok(reading)
    }

    /// Snapshot of a channel's state
    pub fn channel_state(&self, channel: ChannelId) -> ChannelState {
        critical_section::with(|cs| self.state.borrow_ref(cs).channels[channel.index()])
    }

    /// Stop conversion, disable interrupts and release every waiter
    ///
    /// Waiters resolve with [`Error::Cancelled`], and so does every wait
    /// started afterwards. Calling this more than once has no further effect.
    pub fn shutdown(&self) {
        let first = critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            if state.shut_down {
                return false;
            }
            state.shut_down = true;

            self.regs.write(regs::AUTO_CON, 0);
            self.regs.write(regs::INT_EN, 0);
            state.waiters.wake();
            true
        });

        if first {
            info!("tsadc: shut down");
        }
    }

    /// Whether [`Self::shutdown`] has run
    pub fn is_shut_down(&self) -> bool {
        critical_section::with(|cs| self.state.borrow_ref(cs).shut_down)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::SimRegisters;
    use embassy_futures::poll_once;

    fn device() -> Tsadc<SimRegisters> {
        Tsadc::new(SimRegisters::new(), CalibrationTable::RK3588, ChannelId::DEFAULT)
    }

    fn ch(id: i32) -> ChannelId {
        ChannelId::new(id).unwrap()
    }

    const LAYOUT: RegisterLayout = RegisterLayout::DEFAULT;

    #[test]
    fn test_set_active_channel_range() {
        let dev = device();
        assert_eq!(dev.set_active_channel(-1), Err(Error::InvalidChannel(-1)));
        assert_eq!(
            dev.set_active_channel(MAX_CHANNELS as i32),
            Err(Error::InvalidChannel(MAX_CHANNELS as i32))
        );
        assert_eq!(dev.active_channel(), ChannelId::DEFAULT);

        for id in 0..MAX_CHANNELS as i32 {
            assert_eq!(dev.set_active_channel(id), Ok(ch(id)));
            assert_eq!(dev.active_channel(), ch(id));
        }
    }

    #[test]
    fn test_start_programs_hardware_in_order() {
        let dev = device();
        let config = Config::new(0xfec0_0000, 0x100, 429, ch(1)).with_auto_period(0x20);
        dev.start(&config);

        let writes = dev.registers().writes();
        assert_eq!(
            writes.as_slice(),
            &[
                (regs::AUTO_PERIOD, 0x20),
                (regs::AUTO_PERIOD_HT, 0x20),
                (regs::HIGHT_INT_DEBOUNCE, 0),
                (regs::HIGHT_TSHUT_DEBOUNCE, 0),
                (regs::AUTO_CON, 1 << 5),
                (regs::AUTO_CON, (1 << 5) | 1),
            ]
        );
    }

    #[test]
    fn test_set_threshold_arms_active_channel() {
        let dev = device();
        dev.set_active_channel(2).unwrap();

        assert_eq!(dev.set_threshold(90), ch(2));
        assert_eq!(dev.registers().peek(LAYOUT.comp_int(2)), 395);
        assert_eq!(dev.registers().peek(regs::INT_EN), 1 << 2);
        assert_eq!(dev.channel_state(ch(2)).threshold, Some(90));

        // Switching channels does not move the armed threshold.
        dev.set_active_channel(5).unwrap();
        assert_eq!(dev.channel_state(ch(2)).threshold, Some(90));
        assert_eq!(dev.channel_state(ch(5)).threshold, None);

        dev.set_threshold(30);
        assert_eq!(dev.registers().peek(LAYOUT.comp_int(5)), 350);
        assert_eq!(dev.registers().peek(regs::INT_EN), (1 << 2) | (1 << 5));
    }

    #[test]
    fn test_arm_threshold_leaves_active_channel() {
        let dev = device();
        dev.set_active_channel(2).unwrap();

        dev.arm_threshold(ch(6), 85);

        assert_eq!(dev.active_channel(), ch(2));
        assert_eq!(dev.channel_state(ch(6)).threshold, Some(85));
        assert_eq!(dev.channel_state(ch(2)).threshold, None);
        assert_eq!(dev.registers().peek(LAYOUT.comp_int(6)), 350);
        assert_eq!(dev.registers().peek(regs::INT_EN), 1 << 6);
    }

    #[test]
    fn test_comparator_writes_do_not_reach_data_registers() {
        let dev = device();
        for id in ChannelId::all() {
            dev.registers().set_code(id, 285);
        }
        for id in ChannelId::all() {
            dev.arm_threshold(id, 85);
        }
        for id in ChannelId::all() {
            assert_eq!(dev.read(id).map(|r| r.celsius), Ok(25), "channel {}", id.value());
        }
    }

    #[test]
    fn test_custom_layout() {
        let layout = RegisterLayout {
            data: 0x90,
            comp_int: 0x20,
        };
        let dev = device().with_layout(layout);
        dev.registers().set_code_at(layout, ch(4), 350);
        dev.set_active_channel(4).unwrap();
        dev.set_threshold(25);

        assert_eq!(dev.read(ch(4)).map(|r| r.celsius), Ok(85));
        assert_eq!(dev.registers().peek(0x30), 285);
    }

    #[test]
    fn test_dispatch_flags_only_pending_channels() {
        let dev = device();
        dev.set_active_channel(2).unwrap();
        dev.registers().raise(1 << 2);

        let fired = dev.on_interrupt();

        assert_eq!(fired.bits(), 1 << 2);
        for id in ChannelId::all() {
            assert_eq!(dev.channel_state(id).event, id == ch(2));
        }
        // The acknowledge write is exactly the value read.
        assert_eq!(dev.registers().writes().last(), Some(&(regs::INT_PD, 1 << 2)));
        assert_eq!(dev.registers().peek(regs::INT_PD), 0);
    }

    #[test]
    fn test_dispatch_acknowledges_only_observed_bits() {
        let dev = device();
        dev.registers().raise(1 << 1);
        dev.on_interrupt();
        // A crossing arriving after the read stays pending.
        dev.registers().raise(1 << 3);
        assert_eq!(dev.registers().peek(regs::INT_PD), 1 << 3);
        assert_eq!(dev.on_interrupt().bits(), 1 << 3);
    }

    #[test]
    fn test_event_observed_once() {
        let dev = device();
        dev.registers().raise(1 << 2);
        dev.on_interrupt();

        assert_eq!(poll_once(dev.wait_for_event(ch(2))), Poll::Ready(Ok(())));
        assert!(poll_once(dev.wait_for_event(ch(2))).is_pending());
        assert!(!dev.take_event(ch(2)));
    }

    #[test]
    fn test_shutdown_cancels_waits() {
        let dev = device();
        dev.start(&Config::new(0xfec0_0000, 0x100, 429, ch(0)).with_arm_on_attach(true));
        assert!(poll_once(dev.wait_for_event(ch(0))).is_pending());

        dev.shutdown();
        dev.shutdown();

        assert!(dev.is_shut_down());
        assert_eq!(
            poll_once(dev.wait_for_event(ch(0))),
            Poll::Ready(Err(Error::Cancelled))
        );
        assert_eq!(dev.registers().peek(regs::AUTO_CON), 0);
        assert_eq!(dev.registers().peek(regs::INT_EN), 0);
    }

    #[test]
    fn test_sample_records_last_code() {
        let dev = device();
        dev.registers().set_code(ch(4), 0xf12c);
        assert_eq!(dev.sample(ch(4)), 300);
        assert_eq!(dev.channel_state(ch(4)).last_code, Some(300));
        assert_eq!(dev.read(ch(4)).map(|r| r.celsius), Ok(38));
    }
}
