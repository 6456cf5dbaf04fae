//! Sequencer devices
//!
//! The [`Sequencer`] trait is the device surface the transport drives:
//! - [`SoftwareSequencer`] plays a [`Sequence`] on its own thread at a fixed tempo
//! - [`ManualSequencer`] is stepped by the caller, for tests and hosts with their own clock
//!
mod manual;
mod software;

pub use manual::ManualSequencer;
pub use software::SoftwareSequencer;

use crate::error::Result;
use crate::midi::MessageSink;
use crate::sequence::Sequence;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Read handle on a sequencer's tick position, cheap enough for the playback thread
#[derive(Debug, Clone, Default)]
pub struct Playhead(Arc<AtomicU64>);

impl Playhead {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    pub(crate) fn set(&self, tick: u64) {
        self.0.store(tick, Ordering::SeqCst);
    }
}

/// Primitive operations of a sequencer device
pub trait Sequencer: Send {
    fn open(&mut self) -> Result<()>;

    /// Stops playback and releases the device
    fn close(&mut self);

    fn is_open(&self) -> bool;

    /// Removes the receiver currently attached to the device's transmitter
    fn take_receiver(&mut self) -> Result<Option<Box<dyn MessageSink>>>;

    /// Attaches a receiver to the device's transmitter
    fn set_receiver(&mut self, receiver: Box<dyn MessageSink>) -> Result<()>;

    /// Replaces the loaded sequence, rewinding to tick zero and clearing track mutes
    fn set_sequence(&mut self, sequence: Sequence) -> Result<()>;

    fn has_sequence(&self) -> bool;

    fn track_count(&self) -> usize;

    /// Starts playback from the current tick position
    fn start(&mut self) -> Result<()>;

    /// Halts playback. Nothing is transmitted once this returns.
    fn stop(&mut self);

    fn is_running(&self) -> bool;

    fn set_tick_position(&mut self, tick: u64);

    fn tick_position(&self) -> u64;

    /// Mutes or unmutes a track. Out of range tracks are ignored.
    fn set_track_mute(&mut self, track: usize, mute: bool);

    /// Mute flag of a track; false for out of range tracks
    fn track_mute(&self, track: usize) -> bool;

    fn playhead(&self) -> Playhead;
}
