//! Simulated vital-sign readings for monitored devices, shaped as multi-path
//! updates for a realtime key-value store.

pub mod errors;
pub mod logger;
pub mod modules;
pub mod shared;

pub use errors::SimError;
pub use modules::readings::{
    generate_update, reading_path, DeviceReading, DeviceStatus, ReadingGenerator, UpdatePayload,
};
