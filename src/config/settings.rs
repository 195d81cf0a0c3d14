use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Discord Rich Presence for Paradox games")]
pub struct Config {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Polling interval in milliseconds
    #[arg(short = 'i', long)]
    pub poll_interval: Option<u64>,

    /// Subcommand
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run a single detection scan and report the result
    Check,
}

impl Config {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Check if running in one-shot check mode
    pub fn is_check_mode(&self) -> bool {
        matches!(self.command, Some(Command::Check))
    }
}

/// Application settings (from config file)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Polling interval in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Save-file settings
    #[serde(default)]
    pub saves: SaveSettings,
}

fn default_poll_interval() -> u64 {
    5000
}

/// Save-file lookup settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveSettings {
    /// Interval between save-directory checks in milliseconds. Runs on its
    /// own clock, unaffected by the outer poll interval.
    #[serde(default = "default_save_check_interval")]
    pub check_interval_ms: u64,

    /// Override for the Hearts of Iron IV save directory
    #[serde(default)]
    pub hoi4_dir: Option<PathBuf>,

    /// Override for the Stellaris save directory
    #[serde(default)]
    pub stellaris_dir: Option<PathBuf>,
}

fn default_save_check_interval() -> u64 {
    5000
}

impl Default for SaveSettings {
    fn default() -> Self {
        Self {
            check_interval_ms: default_save_check_interval(),
            hoi4_dir: None,
            stellaris_dir: None,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            saves: SaveSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from config file or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        // Try custom path first
        if let Some(p) = path {
            if p.exists() {
                let content = std::fs::read_to_string(p)
                    .with_context(|| format!("Failed to read config file: {:?}", p))?;
                return toml::from_str(&content)
                    .with_context(|| format!("Failed to parse config file: {:?}", p));
            }
        }

        // Try default config locations
        let default_paths = [
            dirs::config_dir().map(|p| p.join("pdxrpc/config.toml")),
            dirs::home_dir().map(|p| p.join(".config/pdxrpc/config.toml")),
            dirs::home_dir().map(|p| p.join(".pdxrpc.toml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {:?}", path))?;
                return toml::from_str(&content)
                    .with_context(|| format!("Failed to parse config file: {:?}", path));
            }
        }

        // Return defaults if no config file found
        Ok(Self::default())
    }

    /// Merge CLI config into settings (CLI takes precedence)
    pub fn merge_cli(&mut self, cli: &Config) {
        if let Some(poll_interval) = cli.poll_interval {
            self.poll_interval_ms = poll_interval;
        }
    }

    /// Validate and normalize settings values
    ///
    /// Ensures intervals have a minimum value to prevent CPU exhaustion.
    pub fn validate(&mut self) {
        const MIN_INTERVAL_MS: u64 = 100;

        if self.poll_interval_ms < MIN_INTERVAL_MS {
            self.poll_interval_ms = MIN_INTERVAL_MS;
        }
        if self.saves.check_interval_ms < MIN_INTERVAL_MS {
            self.saves.check_interval_ms = MIN_INTERVAL_MS;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.poll_interval_ms, 5000);
        assert_eq!(settings.saves.check_interval_ms, 5000);
        assert!(settings.saves.hoi4_dir.is_none());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            poll_interval_ms = 10000

            [saves]
            check_interval_ms = 2000
            stellaris_dir = "/tmp/saves"
        "#;

        let settings: Settings = toml::from_str(toml).expect("Should parse TOML");
        assert_eq!(settings.poll_interval_ms, 10000);
        assert_eq!(settings.saves.check_interval_ms, 2000);
        assert_eq!(
            settings.saves.stellaris_dir,
            Some(PathBuf::from("/tmp/saves"))
        );
    }

    #[test]
    fn test_validate_clamps_intervals() {
        let mut settings = Settings {
            poll_interval_ms: 1,
            ..Settings::default()
        };
        settings.saves.check_interval_ms = 0;
        settings.validate();
        assert_eq!(settings.poll_interval_ms, 100);
        assert_eq!(settings.saves.check_interval_ms, 100);
    }
}
