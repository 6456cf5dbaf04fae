//! MIDI plumbing for the bridge
//!
//! This module provides:
//! - [`MidiMessage`], the typed view of messages leaving a sequencer
//! - [`MessageSink`] and [`Transmitter`], the two ends of a delivery pipeline
//! - [`Interceptor`], which observes a pipeline without altering it
//! - [`MidirSink`], a real receiver backed by a MIDI output port
//!
mod interceptor;
mod message;
pub mod midir_sink;
mod sink;

pub use interceptor::{Interceptor, NoteHook};
pub use message::{MidiMessage, NOTE_OFF, NOTE_ON};
pub use midir_sink::{list_output_ports, MidirSink};
pub use sink::{FnSink, MessageSink, NullSink, Transmitter};
