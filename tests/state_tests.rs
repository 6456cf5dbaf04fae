use std::sync::Arc;
use std::thread;
use tickrelay::state::{PlaybackState, TransportState};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_initialization() {
        let state = TransportState::new();
        assert_eq!(state.get(), PlaybackState::Stopped);
        assert!(!state.is_playing());
    }

    #[test]
    fn test_play_state() {
        let state = TransportState::new();

        state.set(PlaybackState::Playing);
        assert!(state.is_playing());

        state.set(PlaybackState::Paused);
        assert!(!state.is_playing());
        assert_eq!(state.get(), PlaybackState::Paused);
    }

    #[test]
    fn test_transition_only_from_expected_state() {
        let state = TransportState::new();

        assert!(!state.transition(PlaybackState::Playing, PlaybackState::Paused));
        assert_eq!(state.get(), PlaybackState::Stopped);

        state.set(PlaybackState::Playing);
        assert!(state.transition(PlaybackState::Playing, PlaybackState::Paused));
        assert_eq!(state.get(), PlaybackState::Paused);
    }

    #[test]
    fn test_rapid_play_pause() {
        let state = Arc::new(TransportState::new());
        state.set(PlaybackState::Paused);
        let state_clone = state.clone();

        // Spawn a thread that rapidly toggles play state
        let toggle_handle = thread::spawn(move || {
            for _ in 0..100 {
                state_clone.set(PlaybackState::Playing);
                state_clone.set(PlaybackState::Paused);
            }
        });

        for _ in 0..100 {
            assert_ne!(state.get(), PlaybackState::Stopped);
            thread::yield_now();
        }

        toggle_handle.join().unwrap();
        assert_eq!(state.get(), PlaybackState::Paused);
    }
}
