use log::{debug, error, info, warn};
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS, TlsConfiguration, Transport};
use serde::{Deserialize, Serialize};
use std::{
    io,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{
    fs,
    io::AsyncWriteExt,
    sync::Mutex,
    task,
    time::{interval, sleep},
};

use super::PayloadSink;
use crate::errors::SimError;
use crate::modules::readings::UpdatePayload;
use crate::shared::config::MqttConfig;

const RESEND_INTERVAL: Duration = Duration::from_secs(60);

static BACKUP_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Serialize, Deserialize, Clone)]
struct BackupData<T> {
    topic: String,
    payload: T,
}

#[derive(Clone)]
pub struct MqttClient {
    client: AsyncClient,
    backup_dir: PathBuf,
    topic_prefix: String,
    qos: QoS,
    connected: Arc<Mutex<bool>>,
}

impl MqttClient {
    pub async fn new(config: MqttConfig) -> Result<Self, SimError> {
        let mut options = MqttOptions::new(config.client_id, config.broker, config.port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive.into()));
        options.set_clean_session(false);

        if let (Some(username), Some(password)) = (config.username, config.password) {
            options.set_credentials(username, password);
        }

        // TLS only when all three files are configured
        if let (Some(ca_cert), Some(client_cert), Some(client_key)) =
            (&config.ca_cert, &config.client_cert, &config.client_key)
        {
            let tls_config = TlsConfiguration::Simple {
                ca: fs::read(ca_cert).await?,
                alpn: None,
                client_auth: Some((fs::read(client_cert).await?, fs::read(client_key).await?)),
            };
            options.set_transport(Transport::tls_with_config(tls_config));
        }

        let (client, mut eventloop) = AsyncClient::new(options, 250);
        let connected = Arc::new(Mutex::new(false));
        let task_connected = Arc::clone(&connected);

        let mqtt_client = MqttClient {
            client,
            backup_dir: PathBuf::from(config.backup_dir),
            topic_prefix: config.topic_prefix,
            qos: qos_from_level(config.qos)?,
            connected,
        };

        task::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("Connection established with broker.");
                        *task_connected.lock().await = true;
                    }
                    Ok(Event::Incoming(Packet::PubAck(ack))) => {
                        debug!("Broker acknowledged packet {}", ack.pkid);
                    }
                    Ok(_) => (),
                    Err(e) => {
                        let mut is_connected = task_connected.lock().await;
                        if *is_connected {
                            *is_connected = false;
                            warn!("Connection lost with broker: {}", e);
                        } else {
                            error!("MQTT event loop error: {}", e);
                        }
                        drop(is_connected);
                        sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        mqtt_client.start_resend_task();

        Ok(mqtt_client)
    }

    pub fn topic_for(&self, path: &str) -> String {
        format!("{}{}", self.topic_prefix, path)
    }

    pub async fn is_connected(&self) -> bool {
        *self.connected.lock().await
    }

    /// Waits until the broker acknowledges the connection or `timeout` expires.
    pub async fn wait_connected(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if self.is_connected().await {
                return true;
            }
            sleep(Duration::from_millis(50)).await;
        }
        self.is_connected().await
    }

    /// Queues one message without waiting on the request channel. While the
    /// broker is down, or the channel is full, the message goes to the backup
    /// directory instead and `BrokerUnavailable` is returned.
    pub async fn publish<T>(&self, topic: &str, payload: &T, backup: bool) -> Result<(), SimError>
    where
        T: Serialize,
    {
        let payload_str = serde_json::to_string(payload)?;

        if !self.is_connected().await {
            warn!("Connection with broker is not established, not sending to '{}'", topic);
            if backup {
                self.backup_or_log(topic, &payload_str).await;
            }
            return Err(SimError::BrokerUnavailable(1));
        }

        match self
            .client
            .try_publish(topic, self.qos, false, payload_str.clone())
        {
            Ok(_) => {
                info!("Data sent successfully to topic '{}'", topic);
                Ok(())
            }
            Err(e) => {
                error!("Failed to send data to topic '{}': {}", topic, e);
                if backup {
                    self.backup_or_log(topic, &payload_str).await;
                }
                Err(SimError::Mqtt(e))
            }
        }
    }

    async fn backup_or_log(&self, topic: &str, payload: &str) {
        if let Err(backup_err) = backup_data(&self.backup_dir, topic, payload).await {
            error!("Failed to backup data: {}", backup_err);
        }
    }

    fn start_resend_task(&self) {
        let backup_dir = self.backup_dir.clone();
        let client = self.client.clone();
        let connected = Arc::clone(&self.connected);

        task::spawn(async move {
            let mut resend_interval = interval(RESEND_INTERVAL);

            loop {
                resend_interval.tick().await;

                if !*connected.lock().await {
                    debug!("Broker not connected. Skipping backup data resend.");
                    continue;
                }

                if let Err(e) = resend_backup_data(&client, &backup_dir).await {
                    error!("Failed to resend backup data: {}", e);
                }
            }
        });
    }
}

/// Publishes every reading of the payload to `<topic_prefix><path>`.
pub struct MqttSink {
    client: MqttClient,
}

impl MqttSink {
    pub fn new(client: MqttClient) -> Self {
        MqttSink { client }
    }
}

impl PayloadSink for MqttSink {
    async fn publish(&mut self, payload: &UpdatePayload) -> Result<(), SimError> {
        let mut backed_up = 0;
        let mut first_err = None;
        for update in payload {
            let topic = self.client.topic_for(&update.path);
            match self.client.publish(&topic, &update.reading, true).await {
                Ok(()) => {}
                Err(SimError::BrokerUnavailable(n)) => backed_up += n,
                Err(e) => {
                    first_err.get_or_insert(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None if backed_up > 0 => Err(SimError::BrokerUnavailable(backed_up)),
            None => Ok(()),
        }
    }
}

pub fn qos_from_level(level: u8) -> Result<QoS, SimError> {
    match level {
        0 => Ok(QoS::AtMostOnce),
        1 => Ok(QoS::AtLeastOnce),
        2 => Ok(QoS::ExactlyOnce),
        other => Err(SimError::InvalidConfig(format!(
            "mqtt.qos must be 0, 1 or 2 (got {})",
            other
        ))),
    }
}

/// Stores a payload that could not be sent, one file per attempt.
async fn backup_data(backup_dir: &Path, topic: &str, payload: &str) -> io::Result<PathBuf> {
    if !backup_dir.exists() {
        fs::create_dir_all(backup_dir).await?;
    }

    let backup = BackupData {
        topic: topic.to_string(),
        payload,
    };
    let backup_file = backup_dir.join(format!(
        "backup_{}_{}.json",
        chrono::Utc::now().timestamp_millis(),
        BACKUP_SEQ.fetch_add(1, Ordering::Relaxed)
    ));

    let contents = serde_json::to_string(&backup)?;
    let mut file = fs::File::create(&backup_file).await?;
    file.write_all(contents.as_bytes()).await?;

    info!(
        "Backup created for data on topic '{}', file: '{}'",
        topic,
        backup_file.display()
    );
    Ok(backup_file)
}

async fn read_backup(path: &Path) -> io::Result<BackupData<String>> {
    let contents = fs::read_to_string(path).await?;
    let data = serde_json::from_str(&contents)?;
    Ok(data)
}

async fn resend_backup_data(client: &AsyncClient, backup_dir: &Path) -> io::Result<()> {
    if !backup_dir.exists() {
        return Ok(());
    }
    let mut entries = fs::read_dir(backup_dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }

        let backup = match read_backup(&path).await {
            Ok(data) => data,
            Err(e) => {
                error!("Failed to read backup file '{}': {}", path.display(), e);
                continue;
            }
        };

        // full channel or closed event loop: keep the file for the next round
        match client.try_publish(&backup.topic, QoS::AtLeastOnce, false, backup.payload) {
            Ok(_) => {
                info!("Successfully resent data for topic '{}'", backup.topic);
                if let Err(e) = fs::remove_file(&path).await {
                    error!("Failed to remove backup file '{}': {}", path.display(), e);
                }
            }
            Err(e) => {
                error!("Failed to resend data for topic '{}': {}", backup.topic, e);
            }
        }
    }

    Ok(())
}
