use tickrelay::midi::MidiMessage;
use tickrelay::sequence::{EventListSource, SequenceSource, DEFAULT_RESOLUTION};

#[test]
fn test_parses_tracks_resolution_and_metronome() {
    let song = EventListSource::new()
        .parse(
            "resolution 960\n\
             metronome 0\n\
             # click first\n\
             0 0 99 25 7f\n\
             \n\
             1 960 90 3c 64   # inline comment\n\
             1 0 c0 05\n",
        )
        .unwrap();

    assert_eq!(song.metronome_track, 0);
    assert_eq!(song.sequence.resolution(), 960);
    assert_eq!(song.sequence.track_count(), 2);

    let melody = song.sequence.tracks()[1].events();
    assert_eq!(melody[0].tick, 0);
    assert_eq!(
        melody[0].message,
        MidiMessage::ProgramChange {
            channel: 0,
            program: 5
        }
    );
    assert_eq!(melody[1].message, MidiMessage::note_on(0, 0x3c, 0x64));
    assert_eq!(song.sequence.length_ticks(), 960);
}

#[test]
fn test_metronome_defaults_to_last_track() {
    let song = EventListSource::new()
        .parse("0 0 90 3c 64\n2 0 99 25 7f\n")
        .unwrap();

    assert_eq!(song.sequence.resolution(), DEFAULT_RESOLUTION);
    assert_eq!(song.sequence.track_count(), 3);
    assert_eq!(song.metronome_track, 2);
    assert!(song.sequence.tracks()[1].events().is_empty());
}

#[test]
fn test_unknown_bytes_are_kept_raw() {
    let song = EventListSource::new().parse("0 10 e0 00 40\n").unwrap();
    assert_eq!(
        song.sequence.tracks()[0].events()[0].message,
        MidiMessage::Raw(vec![0xE0, 0x00, 0x40])
    );
}

#[test]
fn test_errors_report_line_numbers() {
    let mut source = EventListSource::new();

    let err = source.parse("0 0 90 3c 64\n0 x 90 3c 64\n").unwrap_err();
    assert_eq!(err.line, Some(2));
    assert!(err.reason.contains("tick"));

    let err = source.parse("0 0 90 zz 64\n").unwrap_err();
    assert_eq!(err.line, Some(1));
    assert!(err.reason.contains("byte"));

    let err = source.parse("resolution 0\n0 0 90 3c 64\n").unwrap_err();
    assert_eq!(err.line, Some(1));

    let err = source.parse("0 0\n").unwrap_err();
    assert_eq!(err.line, Some(1));

    let err = source.parse("metronome\n").unwrap_err();
    assert_eq!(err.line, Some(1));
}

#[test]
fn test_empty_song_is_rejected() {
    let err = EventListSource::new().parse("# nothing\n\n").unwrap_err();
    assert_eq!(err.line, None);
}
