use std::io::{self, Stdout, Write};

use super::PayloadSink;
use crate::errors::SimError;
use crate::modules::readings::UpdatePayload;

/// Prints each path update as `Update for <id>: <json>`.
pub struct ConsoleSink<W = Stdout> {
    out: W,
    pretty: bool,
}

impl ConsoleSink<Stdout> {
    pub fn stdout(pretty: bool) -> Self {
        ConsoleSink::new(io::stdout(), pretty)
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W, pretty: bool) -> Self {
        ConsoleSink { out, pretty }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> PayloadSink for ConsoleSink<W> {
    async fn publish(&mut self, payload: &UpdatePayload) -> Result<(), SimError> {
        for update in payload {
            let mut body = serde_json::Map::new();
            body.insert(update.path.clone(), serde_json::to_value(&update.reading)?);
            let body = serde_json::Value::Object(body);

            let rendered = if self.pretty {
                serde_json::to_string_pretty(&body)?
            } else {
                serde_json::to_string(&body)?
            };
            writeln!(self.out, "Update for {}: {}", update.device_id, rendered)
                .map_err(SimError::Sink)?;
        }
        self.out.flush().map_err(SimError::Sink)?;
        Ok(())
    }
}
