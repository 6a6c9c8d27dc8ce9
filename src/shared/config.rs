use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::SimError;
use crate::modules::readings::models::DEFAULT_PATH_PREFIX;

pub const CONFIG_ENV: &str = "VITALS_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "vitals.toml";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Configs {
    #[serde(default)]
    pub simulator: SimulatorConfig,
    #[serde(default)]
    pub seed: SeedConfig,
    pub mqtt: Option<MqttConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(skip)]
    config_path: PathBuf,
}

impl Configs {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, SimError> {
        let config_content = fs::read_to_string(&path)?;
        let mut configs: Configs = toml::from_str(&config_content)?;
        configs.config_path = path.as_ref().to_path_buf();
        Ok(configs)
    }

    /// Reads the file named by `VITALS_CONFIG` (or `vitals.toml`). A missing
    /// file yields the built-in defaults; a malformed one is an error.
    pub fn load_from_env() -> Result<Self, SimError> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        if !Path::new(&path).exists() {
            let mut configs = Configs::default();
            configs.config_path = PathBuf::from(path);
            return Ok(configs);
        }
        Self::load_from_file(&path)
    }

    pub fn save_to_file(&self) -> Result<(), SimError> {
        let config_content = toml::to_string_pretty(self)?;
        let mut file = fs::File::create(&self.config_path)?;
        file.write_all(config_content.as_bytes())?;
        Ok(())
    }

    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = path.as_ref().to_path_buf();
        self
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.simulator.interval_secs == 0 {
            return Err(SimError::InvalidConfig(
                "simulator.interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.simulator.devices.is_empty() {
            return Err(SimError::InvalidConfig(
                "simulator.devices must list at least one device".to_string(),
            ));
        }
        if self.simulator.devices.iter().any(|d| d.trim().is_empty()) {
            return Err(SimError::InvalidConfig(
                "simulator.devices contains an empty id".to_string(),
            ));
        }
        match (self.simulator.sink, &self.mqtt) {
            (SinkKind::Mqtt, None) => {
                return Err(SimError::InvalidConfig(
                    "sink = \"mqtt\" requires an [mqtt] section".to_string(),
                ))
            }
            (_, Some(mqtt)) if mqtt.qos > 2 => {
                return Err(SimError::InvalidConfig(format!(
                    "mqtt.qos must be 0, 1 or 2 (got {})",
                    mqtt.qos
                )))
            }
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    #[default]
    Console,
    Mqtt,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct SimulatorConfig {
    pub devices: Vec<String>,
    pub interval_secs: u64,
    pub path_prefix: String,
    pub sink: SinkKind,
    pub pretty: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        SimulatorConfig {
            devices: vec!["DEVICE001".to_string(), "DEVICE002".to_string()],
            interval_secs: 5,
            path_prefix: DEFAULT_PATH_PREFIX.to_string(),
            sink: SinkKind::Console,
            pretty: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SeedDevice {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct SeedConfig {
    pub user_id: String,
    pub output: Option<String>,
    pub devices: Vec<SeedDevice>,
}

impl SeedConfig {
    pub fn display_name(&self, device_id: &str) -> String {
        self.devices
            .iter()
            .find(|d| d.id == device_id)
            .map(|d| d.name.clone())
            .unwrap_or_else(|| format!("{} Monitor", device_id))
    }
}

impl Default for SeedConfig {
    fn default() -> Self {
        SeedConfig {
            user_id: "YOUR_USER_ID_HERE".to_string(),
            output: None,
            devices: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MqttConfig {
    pub broker: String,
    pub port: u16,
    #[serde(default = "default_client_id")]
    pub client_id: String,
    #[serde(default)]
    pub topic_prefix: String,
    #[serde(default = "default_qos")]
    pub qos: u8,
    pub keep_alive: u16,
    pub backup_dir: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ca_cert: Option<String>,
    pub client_cert: Option<String>,
    pub client_key: Option<String>,
}

fn default_client_id() -> String {
    "vitals-sim".to_string()
}

fn default_qos() -> u8 {
    1
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
        }
    }
}
