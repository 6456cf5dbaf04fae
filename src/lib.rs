pub mod cli;
pub mod error;
pub mod logging;
pub mod midi;
pub mod notifier;
pub mod sequence;
pub mod sequencer;
pub mod settings;
pub mod state;
pub mod transport;

pub use error::{BridgeError, ParseError, Result};
pub use notifier::{HostCallback, PositionNotifier};
pub use state::PlaybackState;
pub use transport::TransportController;
