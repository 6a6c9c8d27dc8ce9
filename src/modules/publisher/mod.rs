mod console;
mod mqtt_client;

pub use console::ConsoleSink;
pub use mqtt_client::{qos_from_level, MqttClient, MqttSink};

use std::future::Future;
use std::time::Duration;

use log::{error, info};
use rand::Rng;
use tokio::time::{interval, MissedTickBehavior};

use crate::errors::SimError;
use crate::modules::readings::{Clock, ReadingGenerator, UpdatePayload};

/// Destination for generated payloads.
pub trait PayloadSink {
    fn publish(&mut self, payload: &UpdatePayload) -> impl Future<Output = Result<(), SimError>>;
}

pub async fn publish_once<R, C, S>(
    generator: &mut ReadingGenerator<R, C>,
    device_ids: &[String],
    sink: &mut S,
) -> Result<UpdatePayload, SimError>
where
    R: Rng,
    C: Clock,
    S: PayloadSink,
{
    let payload = generator.generate_update(device_ids);
    sink.publish(&payload).await?;
    Ok(payload)
}

/// Generates and publishes a payload every `period` until `max_ticks` runs
/// have happened or Ctrl-C is received. Returns the number of ticks run.
///
/// Publish failures are logged and do not stop the loop.
pub async fn run_periodic<R, C, S>(
    generator: &mut ReadingGenerator<R, C>,
    device_ids: &[String],
    sink: &mut S,
    period: Duration,
    max_ticks: Option<u64>,
) -> u64
where
    R: Rng,
    C: Clock,
    S: PayloadSink,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut ticks = 0u64;
    loop {
        if max_ticks.is_some_and(|max| ticks >= max) {
            break;
        }

        tokio::select! {
            _ = ticker.tick() => {
                ticks += 1;
                match publish_once(generator, device_ids, sink).await {
                    Ok(payload) => info!("Tick {}: published {} readings", ticks, payload.len()),
                    Err(e) => error!("Tick {}: failed to publish readings: {}", ticks, e),
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown requested, stopping after {} ticks", ticks);
                break;
            }
        }
    }

    ticks
}
