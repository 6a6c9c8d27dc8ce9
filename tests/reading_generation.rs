use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::SeedableRng;

use vitals_sim::modules::readings::ReadingGenerator;
use vitals_sim::{generate_update, DeviceReading, DeviceStatus};

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn assert_in_range(reading: &DeviceReading) {
    let v = &reading.vitals;
    assert!(v.ecg >= 70 && v.ecg < 100, "ecg {}", v.ecg);
    assert!(
        v.temperature >= 36.5 && v.temperature < 38.0,
        "temperature {}",
        v.temperature
    );
    assert!(v.spo2 >= 95 && v.spo2 < 100, "spo2 {}", v.spo2);
    assert!(
        v.respiratory_rate >= 12 && v.respiratory_rate < 20,
        "respiratory rate {}",
        v.respiratory_rate
    );
    let bp = &v.blood_pressure;
    assert!(bp.systolic >= 110.0 && bp.systolic < 130.0, "systolic {}", bp.systolic);
    assert!(bp.diastolic >= 70.0 && bp.diastolic < 85.0, "diastolic {}", bp.diastolic);
}

#[test]
fn two_devices_yield_exactly_their_paths() {
    let payload = generate_update(&["DEVICE001", "DEVICE002"]);

    let paths: HashSet<&str> = payload.paths().collect();
    let expected: HashSet<&str> = [
        "device_readings/DEVICE001/current",
        "device_readings/DEVICE002/current",
    ]
    .into_iter()
    .collect();
    assert_eq!(paths, expected);

    for update in &payload {
        assert_in_range(&update.reading);
        assert_eq!(update.reading.device_status, DeviceStatus::Connected);
    }
}

#[test]
fn one_entry_per_distinct_id() {
    let ids: Vec<String> = (0..50).map(|i| format!("DEVICE{:03}", i % 20)).collect();
    let payload = generate_update(&ids);
    assert_eq!(payload.len(), 20);

    for i in 0..20 {
        let path = format!("device_readings/DEVICE{:03}/current", i);
        assert!(payload.get(&path).is_some(), "missing {}", path);
    }
}

#[test]
fn empty_input_gives_empty_payload() {
    let ids: Vec<String> = Vec::new();
    let payload = generate_update(&ids);
    assert!(payload.is_empty());
    assert_eq!(payload.to_json_value().unwrap(), serde_json::json!({}));
}

#[test]
fn every_field_stays_in_range_over_many_draws() {
    let mut gen = ReadingGenerator::with_system_clock(StdRng::seed_from_u64(2024));
    for _ in 0..5_000 {
        let reading = gen.generate_reading();
        assert_in_range(&reading);
        assert_eq!(reading.device_status, DeviceStatus::Connected);
    }
}

#[test]
fn temperature_has_one_decimal_place() {
    let mut gen = ReadingGenerator::with_system_clock(StdRng::seed_from_u64(77));
    for _ in 0..1_000 {
        let t = gen.generate_vitals().temperature;
        let tenths = t * 10.0;
        assert!((tenths - tenths.round()).abs() < 1e-9, "temperature {}", t);
    }
}

#[test]
fn timestamp_falls_inside_generation_window() {
    let before = now_millis();
    let payload = generate_update(&["DEVICE001", "DEVICE002", "DEVICE003"]);
    let after = now_millis();

    for update in &payload {
        let ts = update.reading.timestamp;
        assert!(ts >= before && ts <= after, "{} not in [{}, {}]", ts, before, after);
    }
}

#[test]
fn successive_calls_keep_shape_and_ordering() {
    let ids = ["DEVICE001", "DEVICE002"];
    let mut gen = ReadingGenerator::with_system_clock(StdRng::seed_from_u64(8));

    let first = gen.generate_update(&ids);
    let second = gen.generate_update(&ids);

    let first_paths: Vec<&str> = first.paths().collect();
    let second_paths: Vec<&str> = second.paths().collect();
    assert_eq!(first_paths, second_paths);

    for path in first_paths {
        let a = first.get(path).unwrap();
        let b = second.get(path).unwrap();
        assert!(a.timestamp <= b.timestamp);
    }
}

#[test]
fn payload_json_matches_store_update_shape() {
    let payload = generate_update(&["DEVICE001"]);
    let value = payload.to_json_value().unwrap();
    let reading = &value["device_readings/DEVICE001/current"];

    for key in [
        "temperature",
        "ecg",
        "respiratoryRate",
        "spo2",
        "bloodPressure",
        "timestamp",
        "deviceStatus",
    ] {
        assert!(reading.get(key).is_some(), "missing key {}", key);
    }
    assert!(reading["ecg"].is_u64());
    assert!(reading["spo2"].is_u64());
    assert!(reading["respiratoryRate"].is_u64());
    assert!(reading["timestamp"].is_i64());
    assert!(reading["bloodPressure"]["systolic"].is_f64());
    assert!(reading["bloodPressure"]["diastolic"].is_f64());
    assert_eq!(reading["deviceStatus"], "connected");
}
