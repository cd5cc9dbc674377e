//! TSADC temperature-sensing engine
//!
//! This library drives a multi-channel temperature sensor ADC of the RK3588
//! family: calibrated code/temperature conversion, per-channel threshold
//! interrupts, and consumers that sample, poll or wait for threshold events.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Domain Layer                                 │
//! │  - CalibrationTable: code <-> Celsius conversion                 │
//! │  - ChannelId / ChannelState / SensorReading                      │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Engine                                       │
//! │  - Tsadc: active channel, thresholds, interrupt dispatch, waits  │
//! │  - attach / Attached: ordered acquisition and reverse teardown   │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Ports (Traits)                               │
//! │  - RegisterPort / RegisterMapper: register window                │
//! │  - ClockPort / ResetPort / InterruptPort: platform resources     │
//! │  - SensorPort / EventPort / ThermalPort: consumer capabilities   │
//! │  - CommunicationPort: host communication                         │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Adapters                                     │
//! │  - MmioRegisters / SimRegisters: hardware and simulated window   │
//! │  - CharDevice: text reads, ioctl, poll                           │
//! │  - ThermalZone: millidegree polling for a governor               │
//! │  - StreamLink: protocol frames over a serial port or pipe        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let attached = tsadc::attach(&config, CalibrationTable::RK3588, resources)?;
//!
//! // from the platform's interrupt handler
//! attached.device().on_interrupt();
//!
//! // from a consumer
//! let node = CharDevice::new(attached.device());
//! let mut session = node.open();
//! session.ioctl(&Command::set_int_threshold(85))?;
//! session.wait_readable_blocking()?;
//! ```

#![cfg_attr(not(any(test, feature = "std")), no_std)]

// This mod MUST go first, so that the others see its macros.
mod fmt;

pub mod error;
pub mod regs;

pub mod config;
pub mod protocol;

/// Domain layer - pure conversion logic
pub mod domain;

/// Ports - traits defining boundaries
pub mod ports;

/// Adapters - concrete implementations
pub mod adapters;

pub mod blocking;

mod attach;
mod device;
mod service;

pub use attach::{attach, Attached, Resources};
pub use config::Config;
pub use device::{Tsadc, MAX_WAITERS};
pub use error::{Error, Result};
pub use service::ControlService;

// Re-export key domain types
pub use domain::{
    CalibrationPoint, CalibrationTable, ChannelId, ChannelMask, ChannelState, SensorReading,
};

// Re-export key port traits
pub use ports::{
    ClockPort, CommunicationPort, EventPort, InterruptPort, RegisterMapper, RegisterPort,
    ResetPort, SensorPort, ThermalGovernor, ThermalPort,
};

// Re-export adapters
pub use adapters::{
    CharDevice, MmioMapper, MmioRegisters, Session, SimMapper, SimRegisters, ThermalZone,
};
#[cfg(any(test, feature = "std"))]
pub use adapters::StreamLink;
