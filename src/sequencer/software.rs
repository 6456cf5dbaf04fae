use super::{Playhead, Sequencer};
use crate::error::{BridgeError, Result};
use crate::midi::{MessageSink, MidiMessage, Transmitter};
use crate::sequence::Sequence;
use log::{debug, error, info, trace};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Longest the playback thread sleeps before re-checking for a stop request
const MAX_SLEEP: Duration = Duration::from_millis(5);

pub const DEFAULT_TEMPO_BPM: f64 = 120.0;

struct Core {
    sequence: Option<Sequence>,
    mutes: Vec<bool>,
    transmitter: Transmitter,
    /// Per-track index of the next event, kept while playback is suspended
    suspended: Option<Vec<usize>>,
    /// Notes switched on and not yet released, as (channel, note)
    sounding: BTreeSet<(u8, u8)>,
}

fn note_sent(sounding: &mut BTreeSet<(u8, u8)>, message: &MidiMessage) {
    match *message {
        MidiMessage::NoteOn {
            channel,
            note,
            velocity,
        } if velocity > 0 => {
            sounding.insert((channel, note));
        }
        MidiMessage::NoteOn { channel, note, .. } | MidiMessage::NoteOff { channel, note, .. } => {
            sounding.remove(&(channel, note));
        }
        _ => {}
    }
}

impl Core {
    /// Sends a note-off for every note still sounding
    fn release_sounding(&mut self) {
        if self.sounding.is_empty() {
            return;
        }
        debug!("Releasing {} sounding notes", self.sounding.len());
        for (channel, note) in std::mem::take(&mut self.sounding) {
            self.transmitter
                .transmit(&MidiMessage::note_off(channel, note), None);
        }
    }
}

struct Shared {
    open: AtomicBool,
    running: AtomicBool,
    playhead: Playhead,
    core: Mutex<Core>,
}

impl Shared {
    fn core(&self) -> MutexGuard<'_, Core> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Plays a [`Sequence`] on a dedicated thread at a fixed tempo
///
/// Messages are delivered through the transmitter in tick order, track order
/// within a tick. Muted tracks still release their notes. Halting releases
/// every note left sounding, and a later start picks up with the first event
/// not yet delivered.
pub struct SoftwareSequencer {
    shared: Arc<Shared>,
    tempo_bpm: f64,
    worker: Option<JoinHandle<()>>,
}

impl SoftwareSequencer {
    pub fn new(receiver: Box<dyn MessageSink>) -> Self {
        Self::with_tempo(receiver, DEFAULT_TEMPO_BPM)
    }

    pub fn with_tempo(receiver: Box<dyn MessageSink>, tempo_bpm: f64) -> Self {
        let tempo_bpm = if tempo_bpm.is_finite() && tempo_bpm > 0.0 {
            tempo_bpm
        } else {
            DEFAULT_TEMPO_BPM
        };
        Self {
            shared: Arc::new(Shared {
                open: AtomicBool::new(false),
                running: AtomicBool::new(false),
                playhead: Playhead::new(),
                core: Mutex::new(Core {
                    sequence: None,
                    mutes: Vec::new(),
                    transmitter: Transmitter::new(Some(receiver)),
                    suspended: None,
                    sounding: BTreeSet::new(),
                }),
            }),
            tempo_bpm,
            worker: None,
        }
    }

    pub fn tempo_bpm(&self) -> f64 {
        self.tempo_bpm
    }

    fn ensure_open(&self) -> Result<()> {
        if self.shared.open.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BridgeError::DeviceUnavailable("sequencer is not open".to_string()))
        }
    }

    /// Signals the playback thread, waits for it to finish and silences held notes
    fn halt(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                error!("Playback thread panicked");
            }
        }
        self.shared.core().release_sounding();
    }

    fn micros_per_tick(&self, resolution: u16) -> f64 {
        let micros_per_quarter = 60_000_000.0 / self.tempo_bpm;
        micros_per_quarter / f64::from(resolution.max(1))
    }
}

fn run_playback(shared: Arc<Shared>, micros_per_tick: f64) {
    let start_tick = shared.playhead.get();
    let started = Instant::now();

    // Per-track index of the next event to play
    let mut cursors: Vec<usize> = {
        let mut core = shared.core();
        let suspended = core.suspended.take();
        match (suspended, &core.sequence) {
            (Some(cursors), _) => cursors,
            (None, Some(sequence)) => sequence
                .tracks()
                .iter()
                .map(|t| t.events().partition_point(|e| e.tick < start_tick))
                .collect(),
            (None, None) => Vec::new(),
        }
    };
    debug!("Playback thread started at tick {}", start_tick);

    loop {
        let next_tick = {
            let core = shared.core();
            core.sequence.as_ref().and_then(|sequence| {
                sequence
                    .tracks()
                    .iter()
                    .zip(&cursors)
                    .filter_map(|(track, &cursor)| track.events().get(cursor).map(|e| e.tick))
                    .min()
            })
        };

        let Some(next_tick) = next_tick else {
            info!("End of sequence reached at tick {}", shared.playhead.get());
            let mut core = shared.core();
            core.release_sounding();
            core.suspended = Some(cursors);
            shared.running.store(false, Ordering::SeqCst);
            return;
        };

        let due =
            Duration::from_micros(((next_tick - start_tick) as f64 * micros_per_tick) as u64);
        loop {
            if !shared.running.load(Ordering::SeqCst) {
                debug!("Playback thread stopping at tick {}", shared.playhead.get());
                shared.core().suspended = Some(cursors);
                return;
            }
            let elapsed = started.elapsed();
            if elapsed >= due {
                break;
            }
            let progressed = (elapsed.as_micros() as f64 / micros_per_tick) as u64;
            shared.playhead.set((start_tick + progressed).min(next_tick));
            thread::sleep((due - elapsed).min(MAX_SLEEP));
        }

        let mut core = shared.core();
        let Core {
            sequence,
            mutes,
            transmitter,
            suspended,
            sounding,
        } = &mut *core;
        let Some(sequence) = sequence.as_ref() else {
            return;
        };

        shared.playhead.set(next_tick);
        let timestamp = Some(started.elapsed().as_micros() as u64);
        let mut interrupted = false;
        'tracks: for (index, (track, cursor)) in
            sequence.tracks().iter().zip(cursors.iter_mut()).enumerate()
        {
            let muted = mutes.get(index).copied().unwrap_or(false);
            while let Some(event) = track.events().get(*cursor) {
                if event.tick != next_tick {
                    break;
                }
                if !shared.running.load(Ordering::SeqCst) {
                    interrupted = true;
                    break 'tracks;
                }
                if !muted || event.message.is_note_release() {
                    trace!("Tick {}: track {} sends {:?}", next_tick, index, event.message);
                    transmitter.transmit(&event.message, timestamp);
                    note_sent(sounding, &event.message);
                }
                *cursor += 1;
            }
        }

        if interrupted {
            debug!("Playback thread stopping inside tick {}", next_tick);
            *suspended = Some(cursors);
            return;
        }
    }
}

impl Sequencer for SoftwareSequencer {
    fn open(&mut self) -> Result<()> {
        if !self.shared.open.swap(true, Ordering::SeqCst) {
            info!("Software sequencer opened at {} BPM", self.tempo_bpm);
        }
        Ok(())
    }

    fn close(&mut self) {
        self.halt();
        if self.shared.open.swap(false, Ordering::SeqCst) {
            info!("Software sequencer closed");
        }
    }

    fn is_open(&self) -> bool {
        self.shared.open.load(Ordering::SeqCst)
    }

    fn take_receiver(&mut self) -> Result<Option<Box<dyn MessageSink>>> {
        self.ensure_open()?;
        Ok(self.shared.core().transmitter.take_receiver())
    }

    fn set_receiver(&mut self, receiver: Box<dyn MessageSink>) -> Result<()> {
        self.ensure_open()?;
        self.shared.core().transmitter.set_receiver(receiver);
        Ok(())
    }

    fn set_sequence(&mut self, sequence: Sequence) -> Result<()> {
        self.ensure_open()?;
        if sequence.resolution() == 0 {
            return Err(BridgeError::ParseFailure(crate::error::ParseError::new(
                "sequence resolution must be positive",
            )));
        }
        self.halt();

        let mut core = self.shared.core();
        core.mutes = vec![false; sequence.track_count()];
        info!(
            "Loaded sequence: {} tracks, {} ticks",
            sequence.track_count(),
            sequence.length_ticks()
        );
        core.sequence = Some(sequence);
        core.suspended = None;
        self.shared.playhead.set(0);
        Ok(())
    }

    fn has_sequence(&self) -> bool {
        self.shared.core().sequence.is_some()
    }

    fn track_count(&self) -> usize {
        self.shared.core().mutes.len()
    }

    fn start(&mut self) -> Result<()> {
        self.ensure_open()?;
        if self.is_running() {
            return Ok(());
        }
        // A thread that ran to the end of the sequence is still joinable
        self.halt();

        let resolution = match &self.shared.core().sequence {
            Some(sequence) => sequence.resolution(),
            None => return Err(BridgeError::InvalidState("no sequence loaded".to_string())),
        };
        let micros_per_tick = self.micros_per_tick(resolution);

        self.shared.running.store(true, Ordering::SeqCst);
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("sequencer-playback".to_string())
            .spawn(move || run_playback(shared, micros_per_tick));
        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.shared.running.store(false, Ordering::SeqCst);
                Err(BridgeError::Io(e))
            }
        }
    }

    fn stop(&mut self) {
        self.halt();
    }

    fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    fn set_tick_position(&mut self, tick: u64) {
        let was_running = self.is_running();
        if was_running {
            self.halt();
        }
        self.shared.playhead.set(tick);
        self.shared.core().suspended = None;
        if was_running {
            if let Err(e) = self.start() {
                error!("Failed to resume playback after seek: {}", e);
            }
        }
    }

    fn tick_position(&self) -> u64 {
        self.shared.playhead.get()
    }

    fn set_track_mute(&mut self, track: usize, mute: bool) {
        if let Some(flag) = self.shared.core().mutes.get_mut(track) {
            *flag = mute;
        }
    }

    fn track_mute(&self, track: usize) -> bool {
        self.shared.core().mutes.get(track).copied().unwrap_or(false)
    }

    fn playhead(&self) -> Playhead {
        self.shared.playhead.clone()
    }
}

impl Drop for SoftwareSequencer {
    fn drop(&mut self) {
        self.halt();
    }
}
