//! Domain layer - pure conversion logic independent of hardware
//!
//! This module contains the calibration service, channel bookkeeping and the
//! reading entity. Nothing here touches registers.

pub mod calibration;
pub mod channel;
pub mod reading;

pub use calibration::{CalibrationPoint, CalibrationTable};
pub use channel::{ChannelId, ChannelMask, ChannelState};
pub use reading::SensorReading;
