use clap::Parser;
use dialoguer::{theme::ColorfulTheme, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::Path;
use std::time::Duration;
use tickrelay::{
    cli::{validate_device, Args},
    logging,
    midi::{list_output_ports, MidirSink},
    sequence::EventListSource,
    sequencer::SoftwareSequencer,
    settings::Settings,
    BridgeError, HostCallback, TransportController,
};

type Transport = TransportController<SoftwareSequencer, EventListSource>;

const MENU: [&str; 6] = [
    "Play",
    "Pause",
    "Stop",
    "Toggle metronome",
    "Reload song",
    "Quit",
];

fn main() {
    let args = Args::parse();
    let settings = load_settings(&args);
    initialize_logging(&settings);

    if args.list_devices {
        list_available_devices();
        return;
    }

    if let Err(e) = run(&args, &settings) {
        log::error!("{}", e);
        eprintln!("{}", e);
        std::process::exit(1);
    }
    log::info!("Exiting");
}

fn load_settings(args: &Args) -> Settings {
    let mut settings = match Settings::load(args.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    args.apply(&mut settings);
    settings
}

fn initialize_logging(settings: &Settings) {
    if let Err(e) = logging::init_logger(settings.level_filter()) {
        eprintln!("Logging disabled: {}", e);
    }
    log::info!("Application starting");
}

fn list_available_devices() {
    match list_output_ports() {
        Ok(devices) => {
            println!("Available MIDI output devices:");
            for device in devices {
                println!("  - {}", device);
            }
        }
        Err(e) => eprintln!("{}", e),
    }
}

fn create_position_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{prefix:.bold.dim} {spinner} {wide_msg}") {
        pb.set_style(style);
    }
    pb.set_prefix("Tick");
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

fn run(args: &Args, settings: &Settings) -> Result<(), BridgeError> {
    let song_path = args
        .song
        .as_deref()
        .ok_or_else(|| BridgeError::InvalidState("no song given".to_string()))?;

    if let Some(device) = &settings.output_device {
        validate_device(device, &list_output_ports()?).map_err(BridgeError::DeviceUnavailable)?;
    }
    let sink = MidirSink::connect(settings.output_device.as_deref())?;
    println!("Connected to MIDI output: {}", sink.port_name());

    let sequencer = SoftwareSequencer::with_tempo(Box::new(sink), settings.tempo_bpm);
    let spinner = create_position_spinner();
    let bar = spinner.clone();
    let callback = HostCallback::new(settings.callback_name.clone(), move |tick: &str| {
        bar.set_message(tick.to_string());
        Ok(())
    });

    let mut transport = TransportController::new(sequencer, EventListSource::new(), Some(callback))?;
    load_song(&mut transport, song_path)?;
    transport.set_metronome_enabled(settings.metronome)?;

    let result = run_control_loop(&mut transport, song_path);
    transport.stop();
    spinner.finish_and_clear();
    result
}

fn load_song(transport: &mut Transport, path: &Path) -> Result<(), BridgeError> {
    let raw = std::fs::read_to_string(path)?;
    transport.load(&raw)?;
    log::info!("Loaded song from {}", path.display());
    Ok(())
}

fn reload_song(transport: &mut Transport, path: &Path) -> Result<(), BridgeError> {
    let raw = std::fs::read_to_string(path)?;
    transport.reload(&raw)?;
    log::info!("Reloaded song from {}", path.display());
    Ok(())
}

fn run_control_loop(transport: &mut Transport, song_path: &Path) -> Result<(), BridgeError> {
    let theme = ColorfulTheme::default();
    loop {
        let metronome = match transport.is_metronome_enabled() {
            Ok(true) => "on",
            Ok(false) => "off",
            Err(_) => "n/a",
        };
        let prompt = format!(
            "{:?} at tick {} (metronome {})",
            transport.state(),
            transport.tick_position(),
            metronome
        );
        let choice = Select::with_theme(&theme)
            .with_prompt(prompt)
            .items(&MENU)
            .default(0)
            .interact()
            .map_err(|e| BridgeError::Io(io::Error::new(io::ErrorKind::Other, e)))?;

        log::info!("Menu selection: {}", MENU[choice]);
        let outcome = match choice {
            0 => transport.play(),
            1 => {
                transport.pause();
                Ok(())
            }
            2 => {
                transport.stop();
                Ok(())
            }
            3 => transport
                .is_metronome_enabled()
                .and_then(|enabled| transport.set_metronome_enabled(!enabled)),
            4 => reload_song(transport, song_path),
            _ => return Ok(()),
        };

        // Per-command failures are reported and playback carries on
        if let Err(e) = outcome {
            log::warn!("{}", e);
            eprintln!("{}", e);
        }
    }
}
