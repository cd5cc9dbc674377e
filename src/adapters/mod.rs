//! Adapters - concrete implementations of ports
//!
//! Adapters connect the engine to the outside world by implementing
//! the port traits. Each adapter knows how to work with a specific
//! technology or consumer.
//!
//! # Available Adapters
//!
//! - **mmio**: volatile access to a directly addressable register window
//! - **sim**: in-memory register bank for hosts and tests
//! - **char_device**: device node with text reads, ioctl and poll
//! - **thermal_zone**: millidegree polling for a thermal governor
//! - **stream_link**: protocol frames over a byte stream (`std` only)

pub mod char_device;
pub mod mmio;
pub mod sim;
#[cfg(any(test, feature = "std"))]
pub mod stream_link;
pub mod thermal_zone;

pub use char_device::{CharDevice, Session};
pub use mmio::{MmioMapper, MmioRegisters};
pub use sim::{SimMapper, SimRegisters};
#[cfg(any(test, feature = "std"))]
pub use stream_link::StreamLink;
pub use thermal_zone::ThermalZone;
