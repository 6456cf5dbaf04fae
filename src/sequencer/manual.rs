use super::{Playhead, Sequencer};
use crate::error::{BridgeError, Result};
use crate::midi::{MessageSink, MidiMessage, Transmitter};
use crate::sequence::Sequence;
use log::debug;

/// A sequencer whose playback is stepped by the caller
///
/// The caller plays the role of the playback thread: [`ManualSequencer::emit`]
/// moves the playhead and transmits a message, but only while running.
pub struct ManualSequencer {
    open: bool,
    available: bool,
    running: bool,
    playhead: Playhead,
    sequence: Option<Sequence>,
    mutes: Vec<bool>,
    transmitter: Transmitter,
}

impl ManualSequencer {
    pub fn new(receiver: Box<dyn MessageSink>) -> Self {
        Self {
            open: false,
            available: true,
            running: false,
            playhead: Playhead::new(),
            sequence: None,
            mutes: Vec::new(),
            transmitter: Transmitter::new(Some(receiver)),
        }
    }

    /// A device that refuses to open
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new(Box::new(crate::midi::NullSink))
        }
    }

    /// Transmits `message` at `tick`. Returns false, sending nothing, when not running.
    pub fn emit(&mut self, tick: u64, message: MidiMessage) -> bool {
        if !self.running {
            return false;
        }
        self.playhead.set(tick);
        self.transmitter.transmit(&message, None)
    }

    /// Moves the playhead without transmitting, as a running clock would
    pub fn advance_to(&mut self, tick: u64) {
        if self.running {
            self.playhead.set(tick);
        }
    }

    pub fn sequence(&self) -> Option<&Sequence> {
        self.sequence.as_ref()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(BridgeError::DeviceUnavailable("sequencer is not open".to_string()))
        }
    }
}

impl Sequencer for ManualSequencer {
    fn open(&mut self) -> Result<()> {
        if !self.available {
            return Err(BridgeError::DeviceUnavailable(
                "no sequencer device available".to_string(),
            ));
        }
        self.open = true;
        Ok(())
    }

    fn close(&mut self) {
        self.stop();
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn take_receiver(&mut self) -> Result<Option<Box<dyn MessageSink>>> {
        self.ensure_open()?;
        Ok(self.transmitter.take_receiver())
    }

    fn set_receiver(&mut self, receiver: Box<dyn MessageSink>) -> Result<()> {
        self.ensure_open()?;
        self.transmitter.set_receiver(receiver);
        Ok(())
    }

    fn set_sequence(&mut self, sequence: Sequence) -> Result<()> {
        self.ensure_open()?;
        self.running = false;
        self.mutes = vec![false; sequence.track_count()];
        self.sequence = Some(sequence);
        self.playhead.set(0);
        debug!("Manual sequencer loaded {} tracks", self.mutes.len());
        Ok(())
    }

    fn has_sequence(&self) -> bool {
        self.sequence.is_some()
    }

    fn track_count(&self) -> usize {
        self.mutes.len()
    }

    fn start(&mut self) -> Result<()> {
        self.ensure_open()?;
        if self.sequence.is_none() {
            return Err(BridgeError::InvalidState("no sequence loaded".to_string()));
        }
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn set_tick_position(&mut self, tick: u64) {
        self.playhead.set(tick);
    }

    fn tick_position(&self) -> u64 {
        self.playhead.get()
    }

    fn set_track_mute(&mut self, track: usize, mute: bool) {
        if let Some(flag) = self.mutes.get_mut(track) {
            *flag = mute;
        }
    }

    fn track_mute(&self, track: usize) -> bool {
        self.mutes.get(track).copied().unwrap_or(false)
    }

    fn playhead(&self) -> Playhead {
        self.playhead.clone()
    }
}
