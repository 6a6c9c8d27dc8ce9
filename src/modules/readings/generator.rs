use std::ops::Range;

use log::debug;
use rand::Rng;

use super::models::{
    reading_path, BloodPressure, DeviceReading, DeviceStatus, PathUpdate, UpdatePayload,
    VitalSigns, DEFAULT_PATH_PREFIX,
};

pub const HEART_RATE_RANGE: Range<f64> = 70.0..100.0;
pub const TEMPERATURE_RANGE: Range<f64> = 36.5..38.0;
pub const SPO2_RANGE: Range<f64> = 95.0..100.0;
pub const RESPIRATORY_RATE_RANGE: Range<f64> = 12.0..20.0;
pub const SYSTOLIC_RANGE: Range<f64> = 110.0..130.0;
pub const DIASTOLIC_RANGE: Range<f64> = 70.0..85.0;

// highest one-decimal value inside TEMPERATURE_RANGE
const TEMPERATURE_CEILING: f64 = 37.9;

pub trait Clock {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

pub struct ReadingGenerator<R, C = SystemClock> {
    rng: R,
    clock: C,
    path_prefix: String,
    last_timestamp: i64,
}

impl<R: Rng> ReadingGenerator<R, SystemClock> {
    pub fn with_system_clock(rng: R) -> Self {
        Self::new(rng, SystemClock)
    }
}

impl<R: Rng, C: Clock> ReadingGenerator<R, C> {
    pub fn new(rng: R, clock: C) -> Self {
        ReadingGenerator {
            rng,
            clock,
            path_prefix: DEFAULT_PATH_PREFIX.to_string(),
            last_timestamp: i64::MIN,
        }
    }

    pub fn with_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = prefix.into();
        self
    }

    pub fn path_prefix(&self) -> &str {
        &self.path_prefix
    }

    pub fn generate_vitals(&mut self) -> VitalSigns {
        let heart_rate = self.rng.gen_range(HEART_RATE_RANGE);
        let temperature = self.rng.gen_range(TEMPERATURE_RANGE);
        let spo2 = self.rng.gen_range(SPO2_RANGE);
        let respiratory_rate = self.rng.gen_range(RESPIRATORY_RATE_RANGE);
        let systolic = self.rng.gen_range(SYSTOLIC_RANGE);
        let diastolic = self.rng.gen_range(DIASTOLIC_RANGE);

        VitalSigns {
            temperature: round_temperature(temperature),
            ecg: heart_rate as u32,
            respiratory_rate: respiratory_rate as u32,
            spo2: spo2 as u32,
            blood_pressure: BloodPressure {
                systolic,
                diastolic,
            },
        }
    }

    pub fn generate_reading(&mut self) -> DeviceReading {
        let vitals = self.generate_vitals();
        DeviceReading {
            vitals,
            timestamp: self.next_timestamp(),
            device_status: DeviceStatus::Connected,
        }
    }

    /// Builds one reading per distinct device id, keyed by its store path.
    pub fn generate_update<S: AsRef<str>>(&mut self, device_ids: &[S]) -> UpdatePayload {
        let mut payload = UpdatePayload::new();
        for device_id in device_ids {
            let device_id = device_id.as_ref();
            let path = reading_path(&self.path_prefix, device_id);
            if payload.get(&path).is_some() {
                debug!("Skipping duplicate device id '{}'", device_id);
                continue;
            }
            let reading = self.generate_reading();
            payload.insert(PathUpdate {
                device_id: device_id.to_string(),
                path,
                reading,
            });
        }
        payload
    }

    // never below a timestamp this generator already issued
    fn next_timestamp(&mut self) -> i64 {
        let now = self.clock.now_millis().max(self.last_timestamp);
        self.last_timestamp = now;
        now
    }
}

/// One decimal place, kept strictly under the upper bound.
pub fn round_temperature(raw: f64) -> f64 {
    let rounded = (raw * 10.0).round() / 10.0;
    if rounded >= TEMPERATURE_RANGE.end {
        TEMPERATURE_CEILING
    } else if rounded < TEMPERATURE_RANGE.start {
        TEMPERATURE_RANGE.start
    } else {
        rounded
    }
}

pub fn generate_update<S: AsRef<str>>(device_ids: &[S]) -> UpdatePayload {
    ReadingGenerator::with_system_clock(rand::thread_rng()).generate_update(device_ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::cell::Cell;

    struct StepClock {
        values: Vec<i64>,
        idx: Cell<usize>,
    }

    impl Clock for StepClock {
        fn now_millis(&self) -> i64 {
            let i = self.idx.get();
            self.idx.set(i + 1);
            self.values[i.min(self.values.len() - 1)]
        }
    }

    #[test]
    fn temperature_rounding_stays_in_range() {
        assert_eq!(round_temperature(37.96), 37.9);
        assert_eq!(round_temperature(37.94), 37.9);
        assert_eq!(round_temperature(36.5), 36.5);
        assert_eq!(round_temperature(36.84), 36.8);
    }

    #[test]
    fn vitals_stay_within_ranges() {
        let mut gen = ReadingGenerator::with_system_clock(StdRng::seed_from_u64(7));
        for _ in 0..2000 {
            let v = gen.generate_vitals();
            assert!((70..100).contains(&v.ecg));
            assert!((36.5..38.0).contains(&v.temperature));
            assert!((95..100).contains(&v.spo2));
            assert!((12..20).contains(&v.respiratory_rate));
            assert!((110.0..130.0).contains(&v.blood_pressure.systolic));
            assert!((70.0..85.0).contains(&v.blood_pressure.diastolic));
        }
    }

    #[test]
    fn timestamps_do_not_go_backwards_with_the_clock() {
        let clock = StepClock {
            values: vec![1_000, 900, 1_200],
            idx: Cell::new(0),
        };
        let mut gen = ReadingGenerator::new(StdRng::seed_from_u64(1), clock);
        let stamps: Vec<i64> = (0..3).map(|_| gen.generate_reading().timestamp).collect();
        assert_eq!(stamps, vec![1_000, 1_000, 1_200]);
    }

    #[test]
    fn duplicate_ids_are_collapsed() {
        let mut gen = ReadingGenerator::with_system_clock(StdRng::seed_from_u64(3));
        let payload = gen.generate_update(&["DEVICE001", "DEVICE001", "DEVICE002"]);
        assert_eq!(payload.len(), 2);
    }

    #[test]
    fn custom_prefix_is_used_for_paths() {
        let mut gen =
            ReadingGenerator::with_system_clock(StdRng::seed_from_u64(3)).with_path_prefix("ward_a");
        let payload = gen.generate_update(&["BED1"]);
        assert!(payload.get("ward_a/BED1/current").is_some());
    }
}
