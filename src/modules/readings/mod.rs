pub mod generator;
pub mod models;
pub mod seed;

pub use generator::{generate_update, Clock, ReadingGenerator, SystemClock};
pub use models::{
    reading_path, BloodPressure, DeviceReading, DeviceStatus, PathUpdate, UpdatePayload,
    VitalSigns,
};
