//! Ports (interfaces) defining the boundaries of the engine
//!
//! Ports are traits that define how the engine interacts with the hardware
//! below it and with the consumers above it.
//!
//! # Hexagonal Architecture
//!
//! - **RegisterPort / RegisterMapper**: how registers are reached (MMIO, simulation)
//! - **ClockPort / ResetPort / InterruptPort**: platform resources held while attached
//! - **SensorPort / EventPort / ThermalPort**: what consumers can ask for
//! - **CommunicationPort**: how commands reach the control service

pub mod communication;
pub mod platform;
pub mod registers;
pub mod sensor;

pub use communication::{CommunicationError, CommunicationPort};
pub use platform::{ClockPort, InterruptPort, PlatformError, ResetPort};
pub use registers::{RegisterMapper, RegisterPort};
pub use sensor::{EventPort, SensorPort, ThermalEvent, ThermalGovernor, ThermalPort};
