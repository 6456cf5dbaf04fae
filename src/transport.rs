//! Transport control over a sequencer, with position notifications wired in

use crate::error::{BridgeError, Result};
use crate::midi::{Interceptor, MidiMessage};
use crate::notifier::{HostCallback, NotificationDispatcher, PositionNotifier};
use crate::sequence::SequenceSource;
use crate::sequencer::Sequencer;
use crate::state::{PlaybackState, TransportState};
use log::{debug, error, info, warn};
use std::sync::Arc;

/// Drives playback and the metronome track of an owned sequencer
///
/// Construction opens the sequencer and splices an [`Interceptor`] between its
/// transmitter and the real receiver, so every note event reaches the
/// [`PositionNotifier`]. Dropping the controller stops playback and closes the
/// sequencer.
pub struct TransportController<S: Sequencer, P: SequenceSource> {
    sequencer: S,
    source: P,
    transport: Arc<TransportState>,
    notifier: Arc<PositionNotifier>,
    metronome_track: Option<usize>,
}

impl<S: Sequencer, P: SequenceSource> TransportController<S, P> {
    /// Opens `sequencer` and installs position tracking. `callback` is the host
    /// function to notify; `None` leaves notifications disabled.
    pub fn new(mut sequencer: S, source: P, callback: Option<HostCallback>) -> Result<Self> {
        sequencer.open()?;

        let transport = Arc::new(TransportState::new());
        let dispatcher = match callback {
            Some(callback) => {
                info!("Position notifications go to '{}'", callback.name());
                Some(NotificationDispatcher::spawn(callback)?)
            }
            None => {
                info!("No host callback registered, position notifications disabled");
                None
            }
        };
        let notifier = Arc::new(PositionNotifier::new(transport.clone(), dispatcher));

        let Some(receiver) = sequencer.take_receiver()? else {
            sequencer.close();
            return Err(BridgeError::DeviceUnavailable(
                "sequencer has no receiver to intercept".to_string(),
            ));
        };

        let playhead = sequencer.playhead();
        let hook_notifier = notifier.clone();
        let hook = move |_message: &MidiMessage, _timestamp: Option<u64>| {
            hook_notifier.on_note_event(playhead.get());
        };
        sequencer.set_receiver(Box::new(Interceptor::new(receiver, hook)))?;
        debug!("Position interceptor installed");

        Ok(Self {
            sequencer,
            source,
            transport,
            notifier,
            metronome_track: None,
        })
    }

    /// Parses and installs a new song. Rejected while playing; on failure the
    /// previous song and transport state are kept.
    pub fn load(&mut self, raw: &str) -> Result<()> {
        if self.state() == PlaybackState::Playing {
            warn!("Refusing to load a song while playing");
            return Err(BridgeError::InvalidState(
                "cannot load a song while playing".to_string(),
            ));
        }

        let song = self.source.parse(raw).map_err(|e| {
            error!("Song data rejected: {}", e);
            BridgeError::from(e)
        })?;

        let track_count = song.sequence.track_count();
        if song.metronome_track >= track_count {
            let err = crate::error::ParseError::new(format!(
                "metronome track {} out of range for {} tracks",
                song.metronome_track, track_count
            ));
            error!("Song data rejected: {}", err);
            return Err(err.into());
        }

        self.sequencer.set_sequence(song.sequence).map_err(|e| {
            error!("Sequencer refused the song: {}", e);
            e
        })?;

        self.metronome_track = Some(song.metronome_track);
        self.transport.set(PlaybackState::Stopped);
        self.notifier.reset();
        info!(
            "Song loaded: {} tracks, metronome on track {}",
            track_count, song.metronome_track
        );
        Ok(())
    }

    /// Loads a new song, keeping the metronome setting of the current one
    pub fn reload(&mut self, raw: &str) -> Result<()> {
        let metronome = self.is_metronome_enabled().ok();
        self.load(raw)?;
        if let Some(enabled) = metronome {
            self.set_metronome_enabled(enabled)?;
        }
        Ok(())
    }

    /// Starts or resumes playback from the current tick
    pub fn play(&mut self) -> Result<()> {
        let previous = self.state();
        self.transport.set(PlaybackState::Playing);
        if let Err(e) = self.sequencer.start() {
            self.transport.set(previous);
            error!("Failed to start playback: {}", e);
            return Err(e);
        }
        info!("Playing from tick {}", self.sequencer.tick_position());
        Ok(())
    }

    /// Halts playback, keeping the tick position
    pub fn pause(&mut self) {
        self.transport.set(PlaybackState::Paused);
        self.sequencer.stop();
        info!("Paused at tick {}", self.sequencer.tick_position());
    }

    /// Halts playback and rewinds to tick zero. Notifications queued before the
    /// stop have reached the host when this returns.
    pub fn stop(&mut self) {
        self.transport.set(PlaybackState::Stopped);
        self.sequencer.stop();
        self.sequencer.set_tick_position(0);
        self.notifier.flush();
        self.notifier.reset();
        info!("Stopped");
    }

    pub fn set_metronome_enabled(&mut self, enabled: bool) -> Result<()> {
        let track = self.metronome_track()?;
        self.sequencer.set_track_mute(track, !enabled);
        debug!("Metronome track {} enabled: {}", track, enabled);
        Ok(())
    }

    pub fn is_metronome_enabled(&self) -> Result<bool> {
        let track = self.metronome_track()?;
        Ok(!self.sequencer.track_mute(track))
    }

    fn metronome_track(&self) -> Result<usize> {
        self.metronome_track
            .ok_or_else(|| BridgeError::InvalidState("no song loaded".to_string()))
    }

    /// Current playback state. A sequence that played to its end reads as paused.
    pub fn state(&self) -> PlaybackState {
        if self.transport.is_playing() && !self.sequencer.is_running() {
            self.transport
                .transition(PlaybackState::Playing, PlaybackState::Paused);
        }
        self.transport.get()
    }

    pub fn tick_position(&self) -> u64 {
        self.sequencer.tick_position()
    }

    pub fn is_loaded(&self) -> bool {
        self.metronome_track.is_some()
    }

    pub fn notifier(&self) -> &PositionNotifier {
        &self.notifier
    }

    pub fn sequencer(&self) -> &S {
        &self.sequencer
    }

    pub fn sequencer_mut(&mut self) -> &mut S {
        &mut self.sequencer
    }
}

impl<S: Sequencer, P: SequenceSource> Drop for TransportController<S, P> {
    fn drop(&mut self) {
        self.transport.set(PlaybackState::Stopped);
        self.sequencer.close();
        debug!("Transport closed");
    }
}
