//! Memory-mapped register window
//!
//! For targets where the controller's registers are directly addressable
//! (bare metal, or a window already mapped by the platform).

use core::ptr::NonNull;

use crate::error::errno;
use crate::ports::platform::PlatformError;
use crate::ports::registers::{RegisterMapper, RegisterPort};
use crate::regs::REGISTER_SPAN;

/// Volatile accessor for a mapped register window
pub struct MmioRegisters {
    base: NonNull<u32>,
    size: usize,
}

// SAFETY: the window is device memory and every access is a single volatile
// 32-bit load or store, which the hardware serializes.
unsafe impl Send for MmioRegisters {}
unsafe impl Sync for MmioRegisters {}

impl MmioRegisters {
    /// Wrap an already mapped window
    ///
    /// # Safety
    ///
    /// `base` must point to `size` bytes of TSADC registers that stay mapped
    /// for the lifetime of the returned value, and nothing else may hold a
    /// Rust reference into that memory.
    pub unsafe fn new(base: NonNull<u32>, size: usize) -> Self {
        Self { base, size }
    }

    /// Size of the window in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    fn reg(&self, offset: usize) -> *mut u32 {
        debug_assert!(offset % 4 == 0 && offset < self.size);
        // SAFETY: offsets come from `regs` and stay inside the window.
        unsafe { self.base.as_ptr().add(offset / 4) }
    }
}

impl RegisterPort for MmioRegisters {
    #[inline(always)]
    fn read(&self, offset: usize) -> u32 {
        unsafe { core::ptr::read_volatile(self.reg(offset)) }
    }

    #[inline(always)]
    fn write(&self, offset: usize, value: u32) {
        unsafe { core::ptr::write_volatile(self.reg(offset), value) }
    }
}

/// Mapper for identity-mapped physical windows
///
/// The physical base is used as the virtual address.
pub struct MmioMapper {
    _private: (),
}

impl MmioMapper {
    /// # Safety
    ///
    /// Every window later passed to [`RegisterMapper::map`] must be identity
    /// mapped device memory belonging exclusively to the TSADC.
    pub unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl RegisterMapper for MmioMapper {
    type Registers = MmioRegisters;

    fn map(&mut self, base: usize, size: usize) -> Result<MmioRegisters, PlatformError> {
        if base % 4 != 0 || size < REGISTER_SPAN {
            return Err(PlatformError(-errno::EINVAL));
        }
        let base = NonNull::new(base as *mut u32).ok_or(PlatformError(-errno::EINVAL))?;
        // SAFETY: exclusivity of the window is the contract of `MmioMapper::new`.
        Ok(unsafe { MmioRegisters::new(base, size) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regs::{self, RegisterLayout};

    #[test]
    fn test_volatile_access_hits_backing_memory() {
        let comp_int = RegisterLayout::DEFAULT.comp_int(3);
        let mut window = [0u32; REGISTER_SPAN / 4];
        let base = NonNull::new(window.as_mut_ptr()).unwrap();
        let mmio = unsafe { MmioRegisters::new(base, REGISTER_SPAN) };

        mmio.write(comp_int, 350);
        mmio.modify(regs::INT_EN, |en| en | regs::int_src_en(3));

        assert_eq!(mmio.read(comp_int), 350);
        drop(mmio);
        assert_eq!(window[comp_int / 4], 350);
        assert_eq!(window[regs::INT_EN / 4], 1 << 3);
    }

    #[test]
    fn test_map_rejects_bad_windows() {
        let mut mapper = unsafe { MmioMapper::new() };
        assert_eq!(mapper.map(0, 0x100).err(), Some(PlatformError(-errno::EINVAL)));
        assert_eq!(mapper.map(0x1002, 0x100).err(), Some(PlatformError(-errno::EINVAL)));
        assert_eq!(mapper.map(0x1000, 0x80).err(), Some(PlatformError(-errno::EINVAL)));
    }
}
