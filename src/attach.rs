//! Attach and detach
//!
//! Acquisition happens in a fixed order: map registers, enable the clock,
//! deassert reset, bind the interrupt, then program the controller. Every
//! acquired resource is held by a guard, so a failure part way through
//! releases exactly what was acquired, newest first. Detaching stops the
//! controller and releases everything in the same reverse order.

use crate::config::Config;
use crate::device::Tsadc;
use crate::domain::CalibrationTable;
use crate::error::{Error, Resource, Result};
use crate::ports::platform::{ClockPort, InterruptPort, PlatformError, ResetPort};
use crate::ports::registers::{RegisterMapper, RegisterPort};

/// Platform handles consumed by [`attach`]
pub struct Resources<M, C, X, I> {
    pub mapper: M,
    pub clock: C,
    pub reset: X,
    pub irq: I,
}

struct ClockGuard<C: ClockPort>(C);

impl<C: ClockPort> Drop for ClockGuard<C> {
    fn drop(&mut self) {
        self.0.disable();
        debug!("tsadc: clock disabled");
    }
}

struct ResetGuard<X: ResetPort>(X);

impl<X: ResetPort> Drop for ResetGuard<X> {
    fn drop(&mut self) {
        self.0.assert();
        debug!("tsadc: reset asserted");
    }
}

struct IrqGuard<I: InterruptPort> {
    port: I,
    irq: u32,
}

impl<I: InterruptPort> Drop for IrqGuard<I> {
    fn drop(&mut self) {
        self.port.unbind(self.irq);
        debug!("tsadc: irq {} released", self.irq);
    }
}

/// An attached controller
///
/// Owns the engine together with the platform resources it runs on.
/// Dropping it (or calling [`Attached::detach`]) shuts the engine down,
/// cancelling every waiter, then releases the interrupt, the reset line,
/// the clock and finally the register mapping.
pub struct Attached<R, C, X, I>
where
    R: RegisterPort,
    C: ClockPort,
    X: ResetPort,
    I: InterruptPort,
{
    // Fields drop in declaration order, which is the release order.
    irq: IrqGuard<I>,
    reset: ResetGuard<X>,
    clock: ClockGuard<C>,
    device: Tsadc<R>,
}

impl<R, C, X, I> Attached<R, C, X, I>
where
    R: RegisterPort,
    C: ClockPort,
    X: ResetPort,
    I: InterruptPort,
{
    /// The running engine
    pub fn device(&self) -> &Tsadc<R> {
        &self.device
    }

    /// Interrupt number bound at attach
    pub fn irq(&self) -> u32 {
        self.irq.irq
    }

    /// Shut down and release all resources
    pub fn detach(self) {
        info!("tsadc: detaching");
        drop(self);
    }
}

impl<R, C, X, I> Drop for Attached<R, C, X, I>
where
    R: RegisterPort,
    C: ClockPort,
    X: ResetPort,
    I: InterruptPort,
{
    fn drop(&mut self) {
        self.device.shutdown();
    }
}

fn acquisition(resource: Resource) -> impl FnOnce(PlatformError) -> Error {
    move |e| {
        error!("tsadc: failed to acquire {:?}: {}", resource, e.0);
        Error::ResourceAcquisition {
            resource,
            code: e.0,
        }
    }
}

/// Bring up a controller
///
/// Validates `config`, acquires the resources in order and starts automatic
/// conversion on `config.channel`.
pub fn attach<M, C, X, I>(
    config: &Config,
    table: CalibrationTable,
    resources: Resources<M, C, X, I>,
) -> Result<Attached<M::Registers, C, X, I>>
where
    M: RegisterMapper,
    C: ClockPort,
    X: ResetPort,
    I: InterruptPort,
{
    config.validate().inspect_err(|_| {
        error!("tsadc: invalid configuration");
    })?;

    let Resources {
        mut mapper,
        mut clock,
        mut reset,
        irq: mut irq_port,
    } = resources;

    let regs = mapper
        .map(config.base, config.size)
        .map_err(acquisition(Resource::Registers))?;
    debug!("tsadc: mapped {:x} size {:x}", config.base, config.size);

    clock.enable().map_err(acquisition(Resource::Clock))?;
    let clock = ClockGuard(clock);

    reset.deassert().map_err(acquisition(Resource::Reset))?;
    let reset = ResetGuard(reset);

    irq_port
        .bind(config.irq)
        .map_err(acquisition(Resource::Interrupt))?;
    let irq = IrqGuard {
        port: irq_port,
        irq: config.irq,
    };

    let device = Tsadc::new(regs, table, config.channel).with_layout(config.layout);
    device.start(config);

    info!("tsadc: attached, irq {}", config.irq);
    Ok(Attached {
        irq,
        reset,
        clock,
        device,
    })
}
