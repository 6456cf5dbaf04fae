use crate::midi::MidiMessage;

/// Anything that accepts MIDI messages from a sequencer
///
/// `timestamp` is in microseconds since playback started, or `None` when the
/// producer has no timing information.
pub trait MessageSink: Send {
    fn deliver(&mut self, message: &MidiMessage, timestamp: Option<u64>);
}

/// Adapts a closure into a [`MessageSink`]
pub struct FnSink<F>(pub F);

impl<F> MessageSink for FnSink<F>
where
    F: FnMut(&MidiMessage, Option<u64>) + Send,
{
    fn deliver(&mut self, message: &MidiMessage, timestamp: Option<u64>) {
        (self.0)(message, timestamp)
    }
}

impl MessageSink for Box<dyn MessageSink> {
    fn deliver(&mut self, message: &MidiMessage, timestamp: Option<u64>) {
        (**self).deliver(message, timestamp)
    }
}

/// Sink that drops everything
#[derive(Debug, Default)]
pub struct NullSink;

impl MessageSink for NullSink {
    fn deliver(&mut self, _message: &MidiMessage, _timestamp: Option<u64>) {}
}

/// The outgoing end of a sequencer, holding whichever sink currently receives its output
#[derive(Default)]
pub struct Transmitter {
    receiver: Option<Box<dyn MessageSink>>,
}

impl Transmitter {
    pub fn new(receiver: Option<Box<dyn MessageSink>>) -> Self {
        Self { receiver }
    }

    pub fn has_receiver(&self) -> bool {
        self.receiver.is_some()
    }

    /// Installs a receiver, returning the previous one
    pub fn set_receiver(&mut self, receiver: Box<dyn MessageSink>) -> Option<Box<dyn MessageSink>> {
        self.receiver.replace(receiver)
    }

    pub fn take_receiver(&mut self) -> Option<Box<dyn MessageSink>> {
        self.receiver.take()
    }

    /// Sends a message to the current receiver. Returns false when there is none.
    pub fn transmit(&mut self, message: &MidiMessage, timestamp: Option<u64>) -> bool {
        match self.receiver.as_mut() {
            Some(receiver) => {
                receiver.deliver(message, timestamp);
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for Transmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transmitter")
            .field("has_receiver", &self.has_receiver())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_transmit_without_receiver() {
        let mut transmitter = Transmitter::default();
        assert!(!transmitter.transmit(&MidiMessage::Clock, None));
    }

    #[test]
    fn test_replacing_receiver_returns_previous() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let mut transmitter = Transmitter::new(Some(Box::new(NullSink)));

        let previous = transmitter.set_receiver(Box::new(FnSink(
            move |msg: &MidiMessage, ts: Option<u64>| {
                seen_clone.lock().unwrap().push((msg.clone(), ts));
            },
        )));
        assert!(previous.is_some());

        assert!(transmitter.transmit(&MidiMessage::Start, Some(5)));
        assert_eq!(*seen.lock().unwrap(), vec![(MidiMessage::Start, Some(5))]);
    }
}
