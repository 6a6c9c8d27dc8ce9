use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use super::generator::{Clock, ReadingGenerator};
use super::models::{DeviceReading, VitalSigns};
use crate::shared::config::SeedConfig;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CurrentReading {
    pub current: DeviceReading,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserDevice {
    pub device_id: String,
    pub name: String,
    pub readings: VitalSigns,
    pub last_updated: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct UserDevices {
    pub devices: BTreeMap<String, UserDevice>,
}

/// Full document for a first import into the realtime store.
///
/// Device nodes are nested under the generator's path prefix, so
/// `ward_a/icu` places them at `{"ward_a": {"icu": {...}}}`. With an empty
/// prefix they sit at the document root next to `users`.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedDocument {
    pub readings_prefix: String,
    pub device_readings: BTreeMap<String, CurrentReading>,
    pub users: BTreeMap<String, UserDevices>,
}

impl SeedDocument {
    pub fn to_json_value(&self) -> Result<Value, serde_json::Error> {
        let mut root = Map::new();
        root.insert("users".to_string(), serde_json::to_value(&self.users)?);

        let mut readings = Map::new();
        for (device_id, reading) in &self.device_readings {
            readings.insert(device_id.clone(), serde_json::to_value(reading)?);
        }

        let segments: Vec<&str> = self
            .readings_prefix
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        match segments.split_first() {
            None => root.extend(readings),
            Some((top, rest)) => {
                let mut value = Value::Object(readings);
                for segment in rest.iter().rev() {
                    let mut wrapper = Map::new();
                    wrapper.insert(segment.to_string(), value);
                    value = Value::Object(wrapper);
                }
                root.insert(top.to_string(), value);
            }
        }

        Ok(Value::Object(root))
    }
}

impl Serialize for SeedDocument {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_json_value()
            .map_err(<S::Error as serde::ser::Error>::custom)?
            .serialize(serializer)
    }
}

/// Seeds every id in `device_ids` plus any id that only appears under
/// `[[seed.devices]]`.
pub fn build_seed_document<R: Rng, C: Clock>(
    generator: &mut ReadingGenerator<R, C>,
    seed: &SeedConfig,
    device_ids: &[String],
) -> SeedDocument {
    let mut device_readings = BTreeMap::new();
    let mut user_devices = UserDevices::default();

    let ids = device_ids
        .iter()
        .chain(seed.devices.iter().map(|d| &d.id));

    for device_id in ids {
        if device_readings.contains_key(device_id) {
            continue;
        }
        let reading = generator.generate_reading();

        user_devices.devices.insert(
            device_id.clone(),
            UserDevice {
                device_id: device_id.clone(),
                name: seed.display_name(device_id),
                readings: reading.vitals,
                last_updated: reading.timestamp,
            },
        );
        device_readings.insert(device_id.clone(), CurrentReading { current: reading });
    }

    let mut users = BTreeMap::new();
    users.insert(seed.user_id.clone(), user_devices);

    SeedDocument {
        readings_prefix: generator.path_prefix().to_string(),
        device_readings,
        users,
    }
}
