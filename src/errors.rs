use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("failed to encode payload as JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write readings to sink: {0}")]
    Sink(std::io::Error),

    #[error("mqtt client error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    #[error("broker unavailable, {0} readings written to backup")]
    BrokerUnavailable(usize),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn io_messages_do_not_blame_the_config_file() {
        let err = SimError::from(Error::new(ErrorKind::NotFound, "ca.pem"));
        assert_eq!(err.to_string(), "I/O error: ca.pem");

        let err = SimError::Sink(Error::new(ErrorKind::BrokenPipe, "stdout closed"));
        assert_eq!(err.to_string(), "failed to write readings to sink: stdout closed");
    }
}
