use crate::error::{BridgeError, Result};
use crate::midi::{MessageSink, MidiMessage};
use log::{error, info};
use midir::{MidiOutput, MidiOutputConnection};

const CLIENT_NAME: &str = "tickrelay-output";
const CONNECTION_NAME: &str = "tickrelay-output-conn";

/// Real receiver that writes sequencer output to a MIDI output port
pub struct MidirSink {
    connection: MidiOutputConnection,
    port_name: String,
}

impl MidirSink {
    /// Connects to the first output port whose name contains `device_name`,
    /// or to the first available port when no name is given.
    pub fn connect(device_name: Option<&str>) -> Result<Self> {
        let midi_out = MidiOutput::new(CLIENT_NAME)?;

        let out_ports = midi_out.ports();
        let available_ports: Vec<String> = out_ports
            .iter()
            .filter_map(|p| midi_out.port_name(p).ok())
            .collect();
        info!("Available MIDI output ports: {:?}", available_ports);

        let port = match device_name {
            Some(name) => out_ports
                .iter()
                .find(|p| midi_out.port_name(p).unwrap_or_default().contains(name))
                .ok_or_else(|| {
                    error!("MIDI output device '{}' not found", name);
                    BridgeError::DeviceUnavailable(format!(
                        "MIDI output device '{}' not found",
                        name
                    ))
                })?,
            None => out_ports.first().ok_or_else(|| {
                BridgeError::DeviceUnavailable("No MIDI output ports available".to_string())
            })?,
        };

        let port_name = midi_out.port_name(port)?;
        info!("Connecting to MIDI output port: {}", port_name);
        let connection = midi_out.connect(port, CONNECTION_NAME)?;

        Ok(Self {
            connection,
            port_name,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl MessageSink for MidirSink {
    fn deliver(&mut self, message: &MidiMessage, _timestamp: Option<u64>) {
        let bytes = message.to_bytes();
        if bytes.is_empty() {
            return;
        }
        if let Err(e) = self.connection.send(&bytes) {
            error!("Failed to send MIDI message to {}: {}", self.port_name, e);
        }
    }
}

/// Names of all MIDI output ports currently visible
pub fn list_output_ports() -> Result<Vec<String>> {
    let midi_out = MidiOutput::new("tickrelay-port-lister")?;
    Ok(midi_out
        .ports()
        .iter()
        .filter_map(|p| midi_out.port_name(p).ok())
        .collect())
}
