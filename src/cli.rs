//! Command-line interface
//!
//! Every command prints to stdout; configuration files are never modified.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use motion_config_mapper::{Conversion, ParameterSet, Settings, flatconf};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "motion-config-mapper",
    about = "Translate motion configuration between motionEye and motion versions",
    version
)]
pub struct Cli {
    /// Settings file (default: <config dir>/motion-config-mapper/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory containing the mapping tables
    #[arg(long, global = true)]
    pub tables_dir: Option<PathBuf>,

    /// Motion version used when no table matches
    #[arg(long, global = true)]
    pub default_version: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show which mapping table a motion version resolves to
    Resolve {
        motion: String,
        #[arg(long)]
        strict: bool,
    },
    /// Convert a motion config file to motionEye parameters
    ToCanonical {
        #[arg(long, short = 'm')]
        motion: String,
        #[arg(long)]
        strict: bool,
        #[arg(long, value_enum, default_value_t = Format::Flat)]
        format: Format,
        file: PathBuf,
    },
    /// Convert motionEye parameters to a motion version's config
    ToVersion {
        #[arg(long, short = 'm')]
        motion: String,
        #[arg(long)]
        strict: bool,
        #[arg(long, value_enum, default_value_t = Format::Flat)]
        input: Format,
        #[arg(long, value_enum, default_value_t = Format::Flat)]
        format: Format,
        file: PathBuf,
    },
    /// Translate a motion config file from one motion version to another
    Translate {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long, value_enum, default_value_t = Format::Flat)]
        format: Format,
        file: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// `key value` lines
    Flat,
    Json,
}

impl Cli {
    /// Flags take precedence over the settings file and environment
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(dir) = &self.tables_dir {
            settings.tables_dir = dir.clone();
        }
        if let Some(version) = &self.default_version {
            settings.default_version = version.clone();
        }
    }
}

pub fn run(command: Command, settings: &Settings) -> Result<()> {
    match command {
        Command::Resolve { motion, strict } => resolve(settings, &motion, strict),
        Command::ToCanonical { motion, strict, format, file } => {
            let params = read_params(&file, Format::Flat)?;
            let mapper = settings.mapper(Some(motion.as_str()), strict)?;
            emit(mapper.to_canonical(&params), format)
        }
        Command::ToVersion { motion, strict, input, format, file } => {
            let params = read_params(&file, input)?;
            let mapper = settings.mapper(Some(motion.as_str()), strict)?;
            emit(mapper.to_daemon(&params), format)
        }
        Command::Translate { from, to, format, file } => {
            let params = read_params(&file, Format::Flat)?;
            let mut mapper = settings.mapper(Some(from.as_str()), false)?;
            let converted = mapper
                .translate(&params, &from, &to)
                .with_context(|| format!("Failed to translate from motion {from} to {to}"))?;
            emit(converted, format)
        }
    }
}

fn resolve(settings: &Settings, motion: &str, strict: bool) -> Result<()> {
    let store = settings.table_store();
    match store.available_versions() {
        Ok(versions) => debug!(?versions, "available mapping tables"),
        Err(e) => warn!(error = %e, "Failed to list mapping tables"),
    }

    let table = store.load_daemon(motion, strict)?;
    println!(
        "{} -> {} ({}) {}",
        table.requested_version(),
        table.version(),
        table.resolution(),
        store.daemon_path(table.version()).display()
    );
    Ok(())
}

fn read_params(path: &Path, format: Format) -> Result<ParameterSet> {
    match format {
        Format::Flat => flatconf::read_file(path),
        Format::Json => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read parameters from {:?}", path))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON parameters from {:?}", path))
        }
    }
}

fn emit(conversion: Conversion, format: Format) -> Result<()> {
    match format {
        Format::Flat => print!("{}", flatconf::render(&conversion.params)),
        Format::Json => {
            let json = serde_json::to_string_pretty(&conversion.params)
                .context("Failed to serialize parameters to JSON")?;
            println!("{json}");
        }
    }

    if conversion.is_clean() {
        info!(params = conversion.params.len(), "Conversion complete");
    } else {
        warn!(params = conversion.params.len(), diagnostics = conversion.diagnostics.len(), "Conversion complete with diagnostics");
    }
    Ok(())
}
