use crate::midi::{MessageSink, MidiMessage};
use log::trace;

/// Side channel invoked by an [`Interceptor`] for every note-on or note-off it observes
pub trait NoteHook: Send {
    fn note_event(&mut self, message: &MidiMessage, timestamp: Option<u64>);
}

impl<F> NoteHook for F
where
    F: FnMut(&MidiMessage, Option<u64>) + Send,
{
    fn note_event(&mut self, message: &MidiMessage, timestamp: Option<u64>) {
        self(message, timestamp)
    }
}

/// Wraps the real receiver of a sequencer and observes everything sent to it
///
/// Each message is delivered to the wrapped sink exactly once and unchanged,
/// then passed to the hook if it is a note command.
pub struct Interceptor<S, H> {
    inner: S,
    hook: H,
}

impl<S: MessageSink, H: NoteHook> Interceptor<S, H> {
    pub fn new(inner: S, hook: H) -> Self {
        Self { inner, hook }
    }

    pub fn intercept(&mut self, message: &MidiMessage, timestamp: Option<u64>) {
        self.inner.deliver(message, timestamp);

        if message.is_note_event() {
            trace!("Note event observed: {:?} at {:?}", message, timestamp);
            self.hook.note_event(message, timestamp);
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: MessageSink, H: NoteHook> MessageSink for Interceptor<S, H> {
    fn deliver(&mut self, message: &MidiMessage, timestamp: Option<u64>) {
        self.intercept(message, timestamp);
    }
}
