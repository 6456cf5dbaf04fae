/// Status nibble of a Note Off command
pub const NOTE_OFF: u8 = 0x80;
/// Status nibble of a Note On command
pub const NOTE_ON: u8 = 0x90;

/// Represents a MIDI message flowing out of the sequencer
///
/// Anything that is not one of the typed variants, including truncated or
/// otherwise malformed data, is carried as [`MidiMessage::Raw`] so it can be
/// forwarded byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MidiMessage {
    /// Note On message with note number and velocity
    NoteOn { channel: u8, note: u8, velocity: u8 },
    /// Note Off message with note number and velocity
    NoteOff { channel: u8, note: u8, velocity: u8 },
    /// Control Change message with controller number and value
    ControlChange {
        channel: u8,
        controller: u8,
        value: u8,
    },
    /// Program Change message with program number
    ProgramChange { channel: u8, program: u8 },
    /// MIDI Clock timing message
    Clock,
    /// MIDI Start message
    Start,
    /// MIDI Stop message
    Stop,
    /// MIDI Continue message
    Continue,
    /// Any other byte sequence, kept verbatim
    Raw(Vec<u8>),
}

impl MidiMessage {
    pub fn note_on(channel: u8, note: u8, velocity: u8) -> Self {
        MidiMessage::NoteOn {
            channel: channel & 0x0F,
            note,
            velocity,
        }
    }

    pub fn note_off(channel: u8, note: u8) -> Self {
        MidiMessage::NoteOff {
            channel: channel & 0x0F,
            note,
            velocity: 0,
        }
    }

    /// Decodes raw bytes. Never fails; unknown data becomes `Raw`.
    pub fn from_bytes(data: &[u8]) -> Self {
        let Some(&status) = data.first() else {
            return MidiMessage::Raw(Vec::new());
        };

        // Only exact-length messages are typed so re-encoding stays lossless
        match (status & 0xF0, data.len()) {
            (0x90, 3) => MidiMessage::NoteOn {
                channel: status & 0x0F,
                note: data[1],
                velocity: data[2],
            },
            (0x80, 3) => MidiMessage::NoteOff {
                channel: status & 0x0F,
                note: data[1],
                velocity: data[2],
            },
            (0xB0, 3) => MidiMessage::ControlChange {
                channel: status & 0x0F,
                controller: data[1],
                value: data[2],
            },
            (0xC0, 2) => MidiMessage::ProgramChange {
                channel: status & 0x0F,
                program: data[1],
            },
            _ => match (status, data.len()) {
                (0xF8, 1) => MidiMessage::Clock,
                (0xFA, 1) => MidiMessage::Start,
                (0xFC, 1) => MidiMessage::Stop,
                (0xFB, 1) => MidiMessage::Continue,
                _ => MidiMessage::Raw(data.to_vec()),
            },
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            } => vec![NOTE_ON | (channel & 0x0F), *note, *velocity],
            MidiMessage::NoteOff {
                channel,
                note,
                velocity,
            } => vec![NOTE_OFF | (channel & 0x0F), *note, *velocity],
            MidiMessage::ControlChange {
                channel,
                controller,
                value,
            } => vec![0xB0 | (channel & 0x0F), *controller, *value],
            MidiMessage::ProgramChange { channel, program } => {
                vec![0xC0 | (channel & 0x0F), *program]
            }
            MidiMessage::Clock => vec![0xF8],
            MidiMessage::Start => vec![0xFA],
            MidiMessage::Stop => vec![0xFC],
            MidiMessage::Continue => vec![0xFB],
            MidiMessage::Raw(bytes) => bytes.clone(),
        }
    }

    /// The command nibble for channel voice messages, `None` otherwise
    pub fn command(&self) -> Option<u8> {
        match self {
            MidiMessage::NoteOn { .. } => Some(NOTE_ON),
            MidiMessage::NoteOff { .. } => Some(NOTE_OFF),
            MidiMessage::ControlChange { .. } => Some(0xB0),
            MidiMessage::ProgramChange { .. } => Some(0xC0),
            MidiMessage::Raw(bytes) => match bytes.first() {
                Some(&status) if (0x80..0xF0).contains(&status) => Some(status & 0xF0),
                _ => None,
            },
            _ => None,
        }
    }

    /// True for note-on and note-off commands, the events that mark a position
    pub fn is_note_event(&self) -> bool {
        matches!(self.command(), Some(NOTE_ON) | Some(NOTE_OFF))
    }

    /// True when the message releases a note (Note Off, or Note On with zero velocity)
    pub fn is_note_release(&self) -> bool {
        matches!(
            self,
            MidiMessage::NoteOff { .. } | MidiMessage::NoteOn { velocity: 0, .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_message_parsing() {
        assert_eq!(
            MidiMessage::from_bytes(&[0x93, 60, 100]),
            MidiMessage::NoteOn {
                channel: 3,
                note: 60,
                velocity: 100
            }
        );
        assert_eq!(
            MidiMessage::from_bytes(&[0x80, 60, 0]),
            MidiMessage::NoteOff {
                channel: 0,
                note: 60,
                velocity: 0
            }
        );
        assert_eq!(
            MidiMessage::from_bytes(&[0xC1, 42]),
            MidiMessage::ProgramChange {
                channel: 1,
                program: 42
            }
        );
    }

    #[test]
    fn test_system_message_parsing() {
        assert_eq!(MidiMessage::from_bytes(&[0xF8]), MidiMessage::Clock);
        assert_eq!(MidiMessage::from_bytes(&[0xFA]), MidiMessage::Start);
        assert_eq!(MidiMessage::from_bytes(&[0xFC]), MidiMessage::Stop);
        assert_eq!(MidiMessage::from_bytes(&[0xFB]), MidiMessage::Continue);
    }

    #[test]
    fn test_malformed_data_is_kept_raw() {
        let truncated = [0x90, 60];
        let msg = MidiMessage::from_bytes(&truncated);
        assert_eq!(msg, MidiMessage::Raw(vec![0x90, 60]));
        assert_eq!(msg.to_bytes(), truncated.to_vec());
        // Still a note command, even though it cannot be decoded
        assert!(msg.is_note_event());

        assert_eq!(MidiMessage::from_bytes(&[]), MidiMessage::Raw(Vec::new()));
        assert_eq!(MidiMessage::from_bytes(&[]).command(), None);
    }

    #[test]
    fn test_note_event_detection() {
        assert!(MidiMessage::note_on(0, 60, 100).is_note_event());
        assert!(MidiMessage::note_off(0, 60).is_note_event());
        assert!(!MidiMessage::Clock.is_note_event());
        assert!(!MidiMessage::from_bytes(&[0xB0, 7, 100]).is_note_event());
        assert!(!MidiMessage::from_bytes(&[0xE0, 0, 64]).is_note_event());
    }

    #[test]
    fn test_note_release_detection() {
        assert!(MidiMessage::note_off(2, 64).is_note_release());
        assert!(MidiMessage::note_on(2, 64, 0).is_note_release());
        assert!(!MidiMessage::note_on(2, 64, 1).is_note_release());
    }
}
