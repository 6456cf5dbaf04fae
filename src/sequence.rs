//! Timed MIDI sequences and the sources that produce them

use crate::error::ParseError;
use crate::midi::MidiMessage;

/// Ticks per quarter note used when a source does not say otherwise
pub const DEFAULT_RESOLUTION: u16 = 480;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackEvent {
    pub tick: u64,
    pub message: MidiMessage,
}

/// One track of a sequence. Events are kept sorted by tick, stable for equal ticks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Track {
    events: Vec<TrackEvent>,
}

impl Track {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, tick: u64, message: MidiMessage) {
        let index = self.events.partition_point(|e| e.tick <= tick);
        self.events.insert(index, TrackEvent { tick, message });
    }

    pub fn events(&self) -> &[TrackEvent] {
        &self.events
    }

    pub fn last_tick(&self) -> u64 {
        self.events.last().map(|e| e.tick).unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    resolution: u16,
    tracks: Vec<Track>,
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new(DEFAULT_RESOLUTION)
    }
}

impl Sequence {
    pub fn new(resolution: u16) -> Self {
        Self {
            resolution,
            tracks: Vec::new(),
        }
    }

    /// Ticks per quarter note
    pub fn resolution(&self) -> u16 {
        self.resolution
    }

    /// Appends an empty track and returns its index
    pub fn create_track(&mut self) -> usize {
        self.tracks.push(Track::new());
        self.tracks.len() - 1
    }

    pub fn track_mut(&mut self, index: usize) -> Option<&mut Track> {
        self.tracks.get_mut(index)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn length_ticks(&self) -> u64 {
        self.tracks.iter().map(Track::last_tick).max().unwrap_or(0)
    }
}

/// A parsed song: the sequence plus the track that carries the metronome clicks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSong {
    pub sequence: Sequence,
    pub metronome_track: usize,
}

/// Produces sequences from raw song data
pub trait SequenceSource: Send {
    fn parse(&mut self, raw: &str) -> Result<LoadedSong, ParseError>;
}

impl<F> SequenceSource for F
where
    F: FnMut(&str) -> Result<LoadedSong, ParseError> + Send,
{
    fn parse(&mut self, raw: &str) -> Result<LoadedSong, ParseError> {
        self(raw)
    }
}

/// Reads a plain event listing, one MIDI event per line
///
/// ```text
/// resolution 480
/// metronome 1
/// # track tick bytes...
/// 0 0 90 3c 64
/// 1 0 99 25 7f
/// 0 480 80 3c 00
/// ```
///
/// Tracks are created on demand. The metronome track defaults to the last track.
#[derive(Debug, Default, Clone, Copy)]
pub struct EventListSource;

impl EventListSource {
    pub fn new() -> Self {
        Self
    }

    fn parse_number<T: std::str::FromStr>(line: usize, field: &str, what: &str) -> Result<T, ParseError> {
        field
            .parse::<T>()
            .map_err(|_| ParseError::at_line(line, format!("invalid {}: '{}'", what, field)))
    }

    fn parse_bytes<'a>(line: usize, fields: impl Iterator<Item = &'a str>) -> Result<Vec<u8>, ParseError> {
        let bytes = fields
            .map(|f| {
                u8::from_str_radix(f, 16)
                    .map_err(|_| ParseError::at_line(line, format!("invalid byte: '{}'", f)))
            })
            .collect::<Result<Vec<u8>, ParseError>>()?;
        if bytes.is_empty() {
            return Err(ParseError::at_line(line, "event has no message bytes"));
        }
        Ok(bytes)
    }
}

impl SequenceSource for EventListSource {
    fn parse(&mut self, raw: &str) -> Result<LoadedSong, ParseError> {
        let mut resolution = DEFAULT_RESOLUTION;
        let mut metronome: Option<usize> = None;
        let mut tracks: Vec<Track> = Vec::new();

        for (index, text) in raw.lines().enumerate() {
            let line = index + 1;
            let text = text.split('#').next().unwrap_or("").trim();
            if text.is_empty() {
                continue;
            }

            let mut fields = text.split_whitespace();
            let Some(head) = fields.next() else {
                continue;
            };
            match head {
                "resolution" => {
                    let value = fields
                        .next()
                        .ok_or_else(|| ParseError::at_line(line, "missing resolution"))?;
                    resolution = Self::parse_number(line, value, "resolution")?;
                    if resolution == 0 {
                        return Err(ParseError::at_line(line, "resolution must be positive"));
                    }
                }
                "metronome" => {
                    let value = fields
                        .next()
                        .ok_or_else(|| ParseError::at_line(line, "missing metronome track"))?;
                    metronome = Some(Self::parse_number(line, value, "metronome track")?);
                }
                _ => {
                    let track: usize = Self::parse_number(line, head, "track")?;
                    let tick_field = fields
                        .next()
                        .ok_or_else(|| ParseError::at_line(line, "missing tick"))?;
                    let tick: u64 = Self::parse_number(line, tick_field, "tick")?;
                    let bytes = Self::parse_bytes(line, fields)?;

                    if tracks.len() <= track {
                        tracks.resize_with(track + 1, Track::new);
                    }
                    tracks[track].add(tick, MidiMessage::from_bytes(&bytes));
                }
            }
        }

        if tracks.is_empty() {
            return Err(ParseError::new("song contains no events"));
        }

        let metronome_track = metronome.unwrap_or(tracks.len() - 1);
        let mut sequence = Sequence::new(resolution);
        for track in tracks {
            let index = sequence.create_track();
            if let Some(slot) = sequence.track_mut(index) {
                *slot = track;
            }
        }

        Ok(LoadedSong {
            sequence,
            metronome_track,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_keeps_events_sorted() {
        let mut track = Track::new();
        track.add(480, MidiMessage::note_off(0, 60));
        track.add(0, MidiMessage::note_on(0, 60, 100));
        track.add(480, MidiMessage::note_on(0, 62, 100));

        let ticks: Vec<u64> = track.events().iter().map(|e| e.tick).collect();
        assert_eq!(ticks, vec![0, 480, 480]);
        // Equal ticks keep insertion order
        assert_eq!(track.events()[1].message, MidiMessage::note_off(0, 60));
        assert_eq!(track.last_tick(), 480);
    }

    #[test]
    fn test_sequence_length() {
        let mut sequence = Sequence::default();
        assert_eq!(sequence.length_ticks(), 0);
        let a = sequence.create_track();
        let b = sequence.create_track();
        sequence.track_mut(a).unwrap().add(100, MidiMessage::Clock);
        sequence.track_mut(b).unwrap().add(960, MidiMessage::Clock);
        assert_eq!(sequence.length_ticks(), 960);
        assert_eq!(sequence.track_count(), 2);
    }

    #[test]
    fn test_closure_as_source() {
        let mut source = |_: &str| -> Result<LoadedSong, ParseError> {
            Err(ParseError::new("nothing here"))
        };
        assert!(SequenceSource::parse(&mut source, "x").is_err());
    }
}
