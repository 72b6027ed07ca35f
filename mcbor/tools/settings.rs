use super::encode::Format;
use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::filter::LevelFilter;

const APP_NAME: &str = "mcbor";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub log_level: String,
    pub output_format: Format,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            output_format: Format::Binary,
        }
    }
}

pub fn config_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", APP_NAME).map_or_else(
        || PathBuf::from("."),
        |proj_dirs| proj_dirs.config_local_dir().to_path_buf(),
    )
}

/// Load settings from the configuration file and `MCBOR_*` environment
/// variables, returning them with a description of where they came from.
pub fn load(config_file: Option<&Path>) -> anyhow::Result<(Settings, String)> {
    let mut b = config::Config::builder();

    let config_source: String;
    if let Some(source) = config_file {
        config_source = format!(
            "Using configuration file '{}' specified on command line",
            source.display()
        );
        b = b.add_source(config::File::from(source).format(config::FileFormat::Toml))
    } else if let Ok(source) = std::env::var("MCBOR_CONFIG_FILE") {
        config_source = format!(
            "Using configuration file '{source}' specified by MCBOR_CONFIG_FILE environment variable"
        );
        b = b.add_source(config::File::with_name(&source).format(config::FileFormat::Toml))
    } else {
        let path = config_dir().join(format!("{APP_NAME}.config"));
        config_source = format!("Using optional configuration file '{}'", path.display());
        b = b.add_source(
            config::File::from(path)
                .required(false)
                .format(config::FileFormat::Toml),
        )
    }

    b = b.add_source(config::Environment::with_prefix("MCBOR"));

    let settings = b
        .build()
        .context("Failed to load configuration")?
        .try_deserialize()
        .context("Invalid configuration")?;
    Ok((settings, config_source))
}

fn init_logger(settings: &Settings) -> anyhow::Result<()> {
    let log_level = settings
        .log_level
        .parse::<LevelFilter>()
        .with_context(|| format!("Invalid 'log_level' value '{}'", settings.log_level))?;

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(log_level > LevelFilter::INFO)
        .init();
    Ok(())
}

pub fn init(config_file: Option<&Path>) -> anyhow::Result<Settings> {
    let (settings, config_source) = load(config_file)?;
    init_logger(&settings)?;
    info!("{APP_NAME} version {} starting...", env!("CARGO_PKG_VERSION"));
    info!("{config_source}");
    Ok(settings)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mcbor.toml");
        std::fs::write(&path, "log_level = \"debug\"\noutput_format = \"hex\"\n").unwrap();

        let (settings, source) = load(Some(&path)).unwrap();
        assert_eq!(
            settings,
            Settings {
                log_level: "debug".to_string(),
                output_format: Format::Hex,
            }
        );
        assert!(source.contains("command line"));
    }

    #[test]
    fn test_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.toml");
        std::fs::write(&path, "").unwrap();

        let (settings, _) = load(Some(&path)).unwrap();
        assert_eq!(settings.output_format, Format::Binary);
    }

    #[test]
    fn test_bad_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "output_format = \"yaml\"\n").unwrap();
        assert!(load(Some(&path)).is_err());

        assert!(load(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
