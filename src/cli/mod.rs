use crate::settings::Settings;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// List available MIDI output devices
    #[arg(long)]
    pub list_devices: bool,

    /// Event listing of the song to play
    #[arg(long, required_unless_present = "list_devices")]
    pub song: Option<PathBuf>,

    /// Play through the MIDI output port whose name contains this text
    #[arg(long)]
    pub device: Option<String>,

    /// Settings file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Name of the host callback receiving tick positions
    #[arg(long)]
    pub callback: Option<String>,

    /// Playback tempo in beats per minute
    #[arg(long)]
    pub tempo: Option<f64>,

    /// Start with the metronome track muted
    #[arg(long)]
    pub no_metronome: bool,
}

impl Args {
    /// Applies command line overrides on top of loaded settings
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(device) = &self.device {
            settings.output_device = Some(device.clone());
        }
        if let Some(callback) = &self.callback {
            settings.callback_name = callback.clone();
        }
        if let Some(tempo) = self.tempo {
            settings.tempo_bpm = tempo;
        }
        if self.no_metronome {
            settings.metronome = false;
        }
    }
}

pub fn validate_device(device_name: &str, devices: &[String]) -> Result<(), String> {
    if !devices.iter().any(|d| d.contains(device_name)) {
        let mut error_msg = format!(
            "Error: Device '{}' not found in available devices:\n",
            device_name
        );
        for device in devices {
            error_msg.push_str(&format!("  - {}\n", device));
        }
        return Err(error_msg);
    }
    Ok(())
}
