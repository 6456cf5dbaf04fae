#[cfg(test)]
mod tests {
    use clap::Parser;
    use std::path::PathBuf;
    use tickrelay::cli::{validate_device, Args};
    use tickrelay::settings::Settings;

    fn devices() -> Vec<String> {
        vec!["Mock Device 1".to_string(), "Mock Device 2".to_string()]
    }

    #[test]
    fn test_args_with_song_and_device() {
        let args = Args::parse_from(["test", "--song", "song.txt", "--device", "Mock Device 1"]);
        assert_eq!(args.song, Some(PathBuf::from("song.txt")));
        assert_eq!(args.device, Some("Mock Device 1".to_string()));
        assert!(!args.list_devices);
        assert!(!args.no_metronome);
    }

    #[test]
    fn test_song_required_unless_listing() {
        assert!(Args::try_parse_from(["test"]).is_err());

        let args = Args::try_parse_from(["test", "--list-devices"]).unwrap();
        assert!(args.list_devices);
        assert_eq!(args.song, None);
    }

    #[test]
    fn test_args_override_settings() {
        let args = Args::parse_from([
            "test",
            "--song",
            "song.txt",
            "--device",
            "Synth",
            "--callback",
            "positionChanged",
            "--tempo",
            "95",
            "--no-metronome",
        ]);
        let mut settings = Settings::default();
        args.apply(&mut settings);

        assert_eq!(settings.output_device.as_deref(), Some("Synth"));
        assert_eq!(settings.callback_name, "positionChanged");
        assert_eq!(settings.tempo_bpm, 95.0);
        assert!(!settings.metronome);
    }

    #[test]
    fn test_absent_flags_keep_settings() {
        let args = Args::parse_from(["test", "--song", "song.txt"]);
        let mut settings = Settings::default();
        args.apply(&mut settings);
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_valid_device_binding() {
        assert!(validate_device("Mock Device 1", &devices()).is_ok());
    }

    #[test]
    fn test_invalid_device_binding() {
        let err = validate_device("Nonexistent Device", &devices()).unwrap_err();
        assert!(err.contains("Nonexistent Device"));
        assert!(err.contains("  - Mock Device 2"));
    }
}
