use anyhow::Context;
use citycast_core::{Config, forecaster_from_config};
use clap::Parser;
use std::{io::Write, path::PathBuf};

use crate::{present, prompt};

pub const NOT_AVAILABLE: &str = "Weather data not available.";

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "citycast",
    version,
    about = "Hourly temperature forecast for a city"
)]
pub struct Cli {
    /// City to look up; prompts for one when absent.
    pub city: Option<String>,

    /// Read configuration from this file instead of the platform config directory.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log request, retry and cache activity to stderr.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };

        let city = match self.city {
            Some(city) => city,
            None => prompt::city_name()?,
        };

        let forecaster = forecaster_from_config(&config)?;
        let outcome = forecaster.lookup(&city).await;

        let mut out = std::io::stdout().lock();
        match outcome {
            Ok(report) => {
                if let Some(coords) = report.location.coordinates {
                    tracing::info!(
                        "{} resolved to {}, {}",
                        report.location.name,
                        coords.latitude,
                        coords.longitude
                    );
                }
                present::write_report(&mut out, &report.forecast)?;
            }
            Err(err) if err.is_not_found() => {
                writeln!(out, "{NOT_AVAILABLE}")?;
            }
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to get weather for {city}"));
            }
        }

        out.flush().context("Failed to flush stdout")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_city_and_config() {
        let cli =
            Cli::try_parse_from(["citycast", "Paris", "--config", "/tmp/c.toml", "-v"]).unwrap();

        assert_eq!(cli.city.as_deref(), Some("Paris"));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        assert!(cli.verbose);
    }

    #[test]
    fn city_is_optional() {
        let cli = Cli::try_parse_from(["citycast"]).unwrap();
        assert!(cli.city.is_none());
        assert!(!cli.verbose);
    }
}
