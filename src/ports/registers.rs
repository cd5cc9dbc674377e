//! Register port - ordered access to the controller's register window
//!
//! Registers have side effects on both paths (reading `INT_PD` reports what
//! is pending, writing it acknowledges), so implementations must perform every
//! access in program order and must not cache values.

use crate::ports::platform::PlatformError;

/// Port for reading and writing 32-bit registers at an offset from the
/// window base
///
/// Accesses go through `&self`: the dispatcher runs in interrupt context
/// while consumers run in thread context, and both hold shared references to
/// the device.
pub trait RegisterPort {
    /// Read the register at `offset`
    fn read(&self, offset: usize) -> u32;

    /// Write `value` to the register at `offset`
    fn write(&self, offset: usize, value: u32);

    /// Read-modify-write helper
    fn modify(&self, offset: usize, f: impl FnOnce(u32) -> u32) {
        let value = self.read(offset);
        self.write(offset, f(value));
    }
}

/// Port that maps a physical register window
///
/// The returned handle owns the mapping; dropping it releases the mapping.
pub trait RegisterMapper {
    /// Handle to the mapped window
    type Registers: RegisterPort;

    /// Map `size` bytes of registers starting at `base`
    fn map(&mut self, base: usize, size: usize) -> Result<Self::Registers, PlatformError>;
}
