//! Simulated register bank
//!
//! Stands in for the controller on hosts and in tests. Registers are plain
//! memory except `INT_PD`, which is write-1-to-clear and only gains bits
//! through [`SimRegisters::raise`]. Every write is logged.

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::Vec;

use crate::domain::ChannelId;
use crate::ports::platform::PlatformError;
use crate::ports::registers::{RegisterMapper, RegisterPort};
use crate::regs::{self, RegisterLayout, REGISTER_SPAN};

/// Number of writes kept in the log; older writes are dropped
pub const WRITE_LOG_DEPTH: usize = 64;

const WORDS: usize = REGISTER_SPAN / 4;

struct Bank {
    words: [u32; WORDS],
    writes: Vec<(usize, u32), WRITE_LOG_DEPTH>,
}

/// In-memory register window
pub struct SimRegisters {
    bank: Mutex<RefCell<Bank>>,
}

impl SimRegisters {
    pub const fn new() -> Self {
        Self {
            bank: Mutex::new(RefCell::new(Bank {
                words: [0; WORDS],
                writes: Vec::new(),
            })),
        }
    }

    /// Current register value, without logging
    pub fn peek(&self, offset: usize) -> u32 {
        critical_section::with(|cs| self.bank.borrow_ref(cs).words[offset / 4])
    }

    /// Set pending interrupt bits as the hardware would
    pub fn raise(&self, bits: u32) {
        critical_section::with(|cs| {
            self.bank.borrow_ref_mut(cs).words[regs::INT_PD / 4] |= bits;
        });
    }

    /// Load a conversion result into a channel's data register
    pub fn set_code(&self, channel: ChannelId, code: u32) {
        self.set_code_at(RegisterLayout::DEFAULT, channel, code);
    }

    /// Like [`Self::set_code`] for a device using `layout`
    pub fn set_code_at(&self, layout: RegisterLayout, channel: ChannelId, code: u32) {
        critical_section::with(|cs| {
            self.bank.borrow_ref_mut(cs).words[layout.data(channel.index()) / 4] = code;
        });
    }

    /// Writes performed so far, oldest first
    pub fn writes(&self) -> Vec<(usize, u32), WRITE_LOG_DEPTH> {
        critical_section::with(|cs| self.bank.borrow_ref(cs).writes.clone())
    }

    /// Forget logged writes
    pub fn clear_writes(&self) {
        critical_section::with(|cs| self.bank.borrow_ref_mut(cs).writes.clear());
    }
}

impl Default for SimRegisters {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterPort for SimRegisters {
    fn read(&self, offset: usize) -> u32 {
        self.peek(offset)
    }

    fn write(&self, offset: usize, value: u32) {
        critical_section::with(|cs| {
            let mut bank = self.bank.borrow_ref_mut(cs);
            if bank.writes.is_full() {
                bank.writes.remove(0);
            }
            let _ = bank.writes.push((offset, value));

            let word = &mut bank.words[offset / 4];
            if offset == regs::INT_PD {
                *word &= !value;
            } else {
                *word = value;
            }
        });
    }
}

/// Mapper handing out simulated windows
///
/// Mapping fails with `error` when one is set, which lets attach unwinding
/// be exercised.
#[derive(Default)]
pub struct SimMapper {
    pub error: Option<PlatformError>,
}

impl RegisterMapper for SimMapper {
    type Registers = SimRegisters;

    fn map(&mut self, _base: usize, size: usize) -> Result<SimRegisters, PlatformError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if size < REGISTER_SPAN {
            return Err(PlatformError(-crate::error::errno::EINVAL));
        }
        Ok(SimRegisters::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_pd_is_write_one_to_clear() {
        let sim = SimRegisters::new();
        sim.raise(0b1010);
        sim.write(regs::INT_PD, 0b0010);
        assert_eq!(sim.read(regs::INT_PD), 0b1000);
        assert_eq!(sim.writes().as_slice(), &[(regs::INT_PD, 0b0010)]);
    }

    #[test]
    fn test_write_log_keeps_latest() {
        let sim = SimRegisters::new();
        for value in 0..(WRITE_LOG_DEPTH as u32 + 3) {
            sim.write(regs::AUTO_PERIOD, value);
        }
        let writes = sim.writes();
        assert_eq!(writes.len(), WRITE_LOG_DEPTH);
        assert_eq!(writes.first(), Some(&(regs::AUTO_PERIOD, 3)));
        assert_eq!(sim.peek(regs::AUTO_PERIOD), WRITE_LOG_DEPTH as u32 + 2);
    }

    #[test]
    fn test_mapper() {
        let mut mapper = SimMapper::default();
        assert!(mapper.map(0xfec0_0000, REGISTER_SPAN).is_ok());
        assert!(mapper.map(0xfec0_0000, 0x40).is_err());

        mapper.error = Some(PlatformError(-12));
        assert_eq!(mapper.map(0xfec0_0000, REGISTER_SPAN).err().map(|e| e.0), Some(-12));
    }
}
