#![forbid(unsafe_code)]

mod cli;

use anyhow::Result;
use clap::Parser;
use tracing::{Level as TraceLevel, debug, error};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload};

use cli::Cli;
use motion_config_mapper::Settings;
use motion_config_mapper::constants::config::ENV_LOG_LEVEL;

fn parse_level(level: &str) -> TraceLevel {
    match level.to_lowercase().as_str() {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Subscriber first so settings load and repair are logged; LOG_LEVEL wins over the settings file
    let env_level = std::env::var(ENV_LOG_LEVEL).ok();
    let initial = parse_level(env_level.as_deref().unwrap_or("info"));
    let (filter, filter_handle) = reload::Layer::new(LevelFilter::from_level(initial));
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr));
    tracing::subscriber::set_global_default(subscriber)?;

    if let Err(e) = run(cli, env_level.is_none(), &filter_handle) {
        error!(error = %format!("{e:#}"), "motion-config-mapper failed");
        return Err(e);
    }
    Ok(())
}

fn run(
    cli: Cli,
    use_settings_level: bool,
    filter_handle: &reload::Handle<LevelFilter, tracing_subscriber::Registry>,
) -> Result<()> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    cli.apply_to(&mut settings);
    settings.validate();

    if use_settings_level {
        filter_handle.reload(LevelFilter::from_level(parse_level(&settings.log_level)))?;
    }

    debug!(settings = ?settings, "effective settings");
    cli::run(cli.command, &settings)
}
