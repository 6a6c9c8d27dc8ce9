use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use vitals_sim::errors::SimError;
use vitals_sim::logger::start_log;
use vitals_sim::modules::publisher::{
    publish_once, run_periodic, ConsoleSink, MqttClient, MqttSink, PayloadSink,
};
use vitals_sim::modules::readings::seed::build_seed_document;
use vitals_sim::modules::readings::ReadingGenerator;
use vitals_sim::shared::config::{Configs, SinkKind};

enum Mode {
    Init,
    Seed,
    Once,
    Run,
}

impl Mode {
    fn parse(arg: Option<&str>) -> Result<Self, SimError> {
        match arg {
            Some("init") => Ok(Mode::Init),
            Some("seed") => Ok(Mode::Seed),
            Some("once") => Ok(Mode::Once),
            Some("run") | None => Ok(Mode::Run),
            Some(other) => Err(SimError::InvalidConfig(format!(
                "unknown mode '{}', expected init, seed, once or run",
                other
            ))),
        }
    }
}

#[tokio::main]
async fn main() {
    let configs = match Configs::load_from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configurations: {}", e);
            std::process::exit(1);
        }
    };
    start_log(&configs.logging.level);
    if configs.config_path().exists() {
        log::info!("Configurations loaded from '{}'", configs.config_path().display());
    } else {
        log::warn!(
            "Config file '{}' not found, using defaults",
            configs.config_path().display()
        );
    }

    let mode = std::env::args().nth(1);
    if let Err(e) = run(configs, mode.as_deref()).await {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(configs: Configs, mode: Option<&str>) -> Result<(), SimError> {
    let mode = Mode::parse(mode)?;

    if let Mode::Init = mode {
        if configs.config_path().exists() {
            return Err(SimError::InvalidConfig(format!(
                "'{}' already exists",
                configs.config_path().display()
            )));
        }
        configs.save_to_file()?;
        log::info!("Default config written to '{}'", configs.config_path().display());
        return Ok(());
    }

    configs.validate()?;

    let mut generator = ReadingGenerator::with_system_clock(StdRng::from_entropy())
        .with_path_prefix(configs.simulator.path_prefix.clone());
    let devices = configs.simulator.devices.clone();

    if let Mode::Seed = mode {
        let document = build_seed_document(&mut generator, &configs.seed, &devices);
        let rendered = serde_json::to_string_pretty(&document)?;
        match &configs.seed.output {
            Some(path) => {
                tokio::fs::write(path, rendered).await?;
                log::info!("Seed document written to '{}'", path);
            }
            None => {
                println!("Use this data structure in the realtime store:");
                println!("{}", rendered);
            }
        }
        return Ok(());
    }

    match (configs.simulator.sink, configs.mqtt.clone()) {
        (SinkKind::Mqtt, Some(mqtt_config)) => {
            let client = MqttClient::new(mqtt_config).await?;
            log::info!("Mqtt started...");
            if !client.wait_connected(Duration::from_secs(5)).await {
                log::warn!("Broker not reachable yet, readings go to backup until it is");
            }
            let mut sink = MqttSink::new(client);
            drive(&mode, &configs, &mut generator, &devices, &mut sink).await?;
            // let the event loop flush queued publishes
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        _ => {
            let mut sink = ConsoleSink::stdout(configs.simulator.pretty);
            drive(&mode, &configs, &mut generator, &devices, &mut sink).await?;
        }
    }

    Ok(())
}

async fn drive<S: PayloadSink>(
    mode: &Mode,
    configs: &Configs,
    generator: &mut ReadingGenerator<StdRng>,
    devices: &[String],
    sink: &mut S,
) -> Result<(), SimError> {
    match mode {
        Mode::Once => {
            let payload = publish_once(generator, devices, sink).await?;
            log::info!("Published {} readings", payload.len());
        }
        _ => {
            let period = Duration::from_secs(configs.simulator.interval_secs);
            log::info!(
                "Publishing readings for {} devices every {:?}",
                devices.len(),
                period
            );
            run_periodic(generator, devices, sink, period, None).await;
        }
    }
    Ok(())
}
