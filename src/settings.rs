// settings.rs

use crate::error::Result;
use config::{Config, Environment, File};
use log::{debug, LevelFilter};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_CALLBACK: &str = "onTickChanged";
pub const ENV_PREFIX: &str = "TICKRELAY";

/// Runtime settings: built-in defaults, then a TOML file, then `TICKRELAY_*` variables
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    /// Substring of the MIDI output port to play through; first port when unset
    pub output_device: Option<String>,
    /// Name the host callback is registered under
    pub callback_name: String,
    pub tempo_bpm: f64,
    pub log_level: String,
    /// Whether the metronome track is audible after loading
    pub metronome: bool,
}

impl Settings {
    /// Loads settings from `path`, which must exist when given. Without a path
    /// an optional `tickrelay.toml` in the working directory is used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("callback_name", DEFAULT_CALLBACK)?
            .set_default("tempo_bpm", 120.0)?
            .set_default("log_level", "info")?
            .set_default("metronome", true)?;

        builder = match path {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name("tickrelay").required(false)),
        };

        let settings: Settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()?;
        debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    pub fn level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_device: None,
            callback_name: DEFAULT_CALLBACK.to_string(),
            tempo_bpm: 120.0,
            log_level: "info".to_string(),
            metronome: true,
        }
    }
}
