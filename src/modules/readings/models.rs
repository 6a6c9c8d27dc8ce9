use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

pub const DEFAULT_PATH_PREFIX: &str = "device_readings";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct BloodPressure {
    pub systolic: f64,
    pub diastolic: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VitalSigns {
    pub temperature: f64,
    // heart rate, the store keeps the "ecg" key
    pub ecg: u32,
    pub respiratory_rate: u32,
    pub spo2: u32,
    pub blood_pressure: BloodPressure,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Connected,
}

/// One simulated snapshot of vital signs for a single device.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceReading {
    #[serde(flatten)]
    pub vitals: VitalSigns,
    /// Epoch milliseconds at generation time.
    pub timestamp: i64,
    pub device_status: DeviceStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathUpdate {
    pub device_id: String,
    pub path: String,
    pub reading: DeviceReading,
}

/// Path-to-reading updates produced by one generation call.
///
/// Entries keep insertion order and paths are unique. Serializes as a JSON
/// object keyed by path, which is the shape a multi-path update to the
/// realtime store expects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdatePayload {
    entries: Vec<PathUpdate>,
}

impl UpdatePayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry. Returns false and keeps the existing entry when the path
    /// is already present.
    pub fn insert(&mut self, update: PathUpdate) -> bool {
        if self.entries.iter().any(|e| e.path == update.path) {
            return false;
        }
        self.entries.push(update);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&DeviceReading> {
        self.entries
            .iter()
            .find(|e| e.path == path)
            .map(|e| &e.reading)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathUpdate> {
        self.entries.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.path.as_str())
    }

    pub fn to_json_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl Serialize for UpdatePayload {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.path, &entry.reading)?;
        }
        map.end()
    }
}

impl<'a> IntoIterator for &'a UpdatePayload {
    type Item = &'a PathUpdate;
    type IntoIter = std::slice::Iter<'a, PathUpdate>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

pub fn reading_path(prefix: &str, device_id: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        format!("{}/current", device_id)
    } else {
        format!("{}/{}/current", prefix, device_id)
    }
}
