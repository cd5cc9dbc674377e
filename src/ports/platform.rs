//! Platform ports - clock, reset and interrupt line
//!
//! How these handles are looked up (device tree, board tables, ...) is the
//! business of the registration layer. The engine only needs to switch them
//! on while attaching and off again, in reverse order, when detaching.

use core::fmt;

/// Error reported by a platform collaborator
///
/// Carries the platform's own error code, typically a negative errno.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlatformError(pub i32);

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "platform error {}", self.0)
    }
}

/// Port for the controller clock
pub trait ClockPort {
    /// Prepare and enable the clock
    fn enable(&mut self) -> Result<(), PlatformError>;

    /// Disable and unprepare the clock
    fn disable(&mut self);
}

/// Port for the controller reset line
pub trait ResetPort {
    /// Take the controller out of reset
    ///
    /// Implementations that need a reset pulse assert, hold and deassert here.
    fn deassert(&mut self) -> Result<(), PlatformError>;

    /// Put the controller back into reset
    fn assert(&mut self);
}

/// Port for the interrupt line
///
/// Binding routes the line to the device's dispatcher; once bound the
/// platform calls [`Tsadc::on_interrupt`](crate::Tsadc::on_interrupt) (or an
/// adapter wrapping it) whenever the line fires.
pub trait InterruptPort {
    /// Bind interrupt number `irq`
    fn bind(&mut self, irq: u32) -> Result<(), PlatformError>;

    /// Release interrupt number `irq`
    fn unbind(&mut self, irq: u32);
}
