use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;

pub fn start_log(level: &str) {
    let mut builder = Builder::new();
    builder
        .format(|buf, record| {
            writeln!(buf, "{}: {}: {}", buf.timestamp(), record.level(), record.args())
        })
        .filter_level(parse_level(level));

    // RUST_LOG wins over the config file when set
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }

    // a second init (tests, embedding) is not an error
    let _ = builder.try_init();
}

pub fn parse_level(level: &str) -> LevelFilter {
    match level.to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_level_falls_back_to_info() {
        assert_eq!(parse_level("verbose"), LevelFilter::Info);
        assert_eq!(parse_level("DEBUG"), LevelFilter::Debug);
        assert_eq!(parse_level("off"), LevelFilter::Off);
    }
}
