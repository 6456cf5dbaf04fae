use std::sync::{Arc, Mutex};
use tickrelay::midi::{FnSink, Interceptor, MessageSink, MidiMessage};

type Log = Arc<Mutex<Vec<(MidiMessage, Option<u64>)>>>;

fn recording_sink() -> (FnSink<impl FnMut(&MidiMessage, Option<u64>) + Send>, Log) {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let log_clone = log.clone();
    let sink = FnSink(move |msg: &MidiMessage, ts: Option<u64>| {
        log_clone.lock().unwrap().push((msg.clone(), ts));
    });
    (sink, log)
}

#[test]
fn test_every_message_is_forwarded_unchanged_and_in_order() {
    let (sink, delivered) = recording_sink();
    let hooked = Arc::new(Mutex::new(0usize));
    let hooked_clone = hooked.clone();
    let mut interceptor = Interceptor::new(sink, move |_: &MidiMessage, _: Option<u64>| {
        *hooked_clone.lock().unwrap() += 1;
    });

    let input = vec![
        MidiMessage::ProgramChange {
            channel: 0,
            program: 5,
        },
        MidiMessage::note_on(0, 60, 100),
        MidiMessage::from_bytes(&[0xE0, 0x00, 0x40]),
        MidiMessage::note_off(0, 60),
        MidiMessage::Clock,
    ];
    for (i, msg) in input.iter().enumerate() {
        interceptor.deliver(msg, Some(i as u64 * 10));
    }

    let delivered = delivered.lock().unwrap();
    let expected: Vec<(MidiMessage, Option<u64>)> = input
        .iter()
        .enumerate()
        .map(|(i, m)| (m.clone(), Some(i as u64 * 10)))
        .collect();
    assert_eq!(*delivered, expected);
    assert_eq!(*hooked.lock().unwrap(), 2);
}

#[test]
fn test_hook_sees_only_note_commands() {
    let (sink, _delivered) = recording_sink();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    let mut interceptor = Interceptor::new(sink, move |msg: &MidiMessage, _: Option<u64>| {
        seen_clone.lock().unwrap().push(msg.clone());
    });

    interceptor.intercept(
        &MidiMessage::ControlChange {
            channel: 9,
            controller: 7,
            value: 100,
        },
        None,
    );
    interceptor.intercept(&MidiMessage::note_on(9, 37, 127), None);
    interceptor.intercept(&MidiMessage::Start, None);
    interceptor.intercept(&MidiMessage::note_on(9, 37, 0), None);

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            MidiMessage::note_on(9, 37, 127),
            MidiMessage::note_on(9, 37, 0)
        ]
    );
}

#[test]
fn test_malformed_messages_pass_through() {
    let (sink, delivered) = recording_sink();
    let mut interceptor = Interceptor::new(sink, |_: &MidiMessage, _: Option<u64>| {});

    let garbage = [
        MidiMessage::from_bytes(&[]),
        MidiMessage::from_bytes(&[0x42, 0x42]),
        MidiMessage::from_bytes(&[0xF0, 0x7E, 0x7F, 0xF7]),
        MidiMessage::from_bytes(&[0x90]),
    ];
    for msg in &garbage {
        interceptor.intercept(msg, None);
    }

    let delivered: Vec<MidiMessage> = delivered.lock().unwrap().iter().map(|(m, _)| m.clone()).collect();
    assert_eq!(delivered, garbage.to_vec());
}

#[test]
fn test_boxed_sink_can_be_wrapped() {
    let (sink, delivered) = recording_sink();
    let boxed: Box<dyn MessageSink> = Box::new(sink);
    let mut interceptor = Interceptor::new(boxed, |_: &MidiMessage, _: Option<u64>| {});

    interceptor.deliver(&MidiMessage::Stop, None);

    assert_eq!(delivered.lock().unwrap().len(), 1);
}
