pub mod audio;
pub mod command;
pub mod config;
pub mod console;
pub mod controller;
pub mod error;
pub mod llm;
pub mod personality;
pub mod playback;
pub mod session;
pub mod speech_text;
pub mod transcription;
pub mod tts;
pub mod voice;

pub use command::{classify, Command};
pub use config::Config;
pub use controller::{Notice, TurnController, TurnOutcome};
pub use error::ChatvoxError;
pub use session::SessionState;
