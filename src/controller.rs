//! Turn controller: one typed or spoken input in, one round of state changes
//! and collaborator calls out.
//!
//! A turn either applies a [`Command`] to the session and confirms it, or
//! sends the text to the language model under the active personality, records
//! both sides in the history and speaks the reply. Nothing here is fatal:
//! generation failures become an error turn in the history, synthesis and
//! playback failures are only logged, and transcription failures become a
//! notice without touching the history.

use tracing::{debug, error, info, warn};

use crate::audio;
use crate::command::{self, Command};
use crate::config::{Config, TtsConfig};
use crate::error::ChatvoxError;
use crate::llm::{ChatModel, LlmClient};
use crate::personality::Personality;
use crate::playback::{CommandPlayback, Playback};
use crate::session::SessionState;
use crate::speech_text::SpeechCleaner;
use crate::transcription::{HttpTranscriber, Transcriber, TranscriptionStatus};
use crate::tts::{HttpSpeechSynthesizer, SpeechSynthesizer};
use crate::voice;

/// Prefix of assistant turns that carry a generation failure.
pub const ERROR_PREFIX: &str = "⚠️ Error: ";

/// Short user-facing message produced by a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Info(String),
    Warning(String),
    Error(String),
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Notice::Success(t) | Notice::Info(t) | Notice::Warning(t) | Notice::Error(t) => t,
        }
    }
}

/// What a turn did, for the surface to render.
#[derive(Debug, Default)]
pub struct TurnOutcome {
    pub notices: Vec<Notice>,
    /// Command applied during this turn, if any.
    pub command: Option<Command>,
    /// Assistant text appended to the history (a reply or an error turn).
    pub reply: Option<String>,
    /// True when the reply was synthesized and handed to playback.
    pub spoken: bool,
}

impl TurnOutcome {
    fn notice(notice: Notice) -> Self {
        Self {
            notices: vec![notice],
            ..Self::default()
        }
    }
}

pub struct TurnController {
    state: SessionState,
    model: Box<dyn ChatModel>,
    transcriber: Box<dyn Transcriber>,
    synthesizer: Box<dyn SpeechSynthesizer>,
    playback: Box<dyn Playback>,
    cleaner: SpeechCleaner,
    tts: TtsConfig,
}

impl TurnController {
    pub fn new(
        state: SessionState,
        model: Box<dyn ChatModel>,
        transcriber: Box<dyn Transcriber>,
        synthesizer: Box<dyn SpeechSynthesizer>,
        playback: Box<dyn Playback>,
    ) -> Result<Self, ChatvoxError> {
        let cleaner = SpeechCleaner::new()
            .map_err(|e| ChatvoxError::Config(format!("invalid speech cleanup rule: {}", e)))?;

        Ok(Self {
            state,
            model,
            transcriber,
            synthesizer,
            playback,
            cleaner,
            tts: TtsConfig::default(),
        })
    }

    /// Wire up the HTTP and command-line collaborators described by `config`.
    pub fn from_config(config: &Config) -> Result<Self, ChatvoxError> {
        let controller = Self::new(
            SessionState::from_config(&config.session),
            Box::new(LlmClient::new(&config.llm)?),
            Box::new(HttpTranscriber::new(&config.transcription)?),
            Box::new(HttpSpeechSynthesizer::new(&config.tts)?),
            Box::new(CommandPlayback::with_config(&config.playback)),
        )?;
        Ok(controller.with_tts_config(config.tts.clone()))
    }

    /// Control which personalities get spoken replies.
    pub fn with_tts_config(mut self, tts: TtsConfig) -> Self {
        self.tts = tts;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Handle a typed message.
    pub async fn submit_text(&mut self, text: &str) -> TurnOutcome {
        if text.trim().is_empty() {
            return TurnOutcome::notice(Notice::Warning(
                "Please enter a message first!".to_string(),
            ));
        }

        match command::classify(text) {
            Some(cmd) => self.run_command(cmd),
            None => self.converse(text).await,
        }
    }

    /// Handle a recording from the microphone.
    ///
    /// Repeated deliveries of the same payload are ignored. A transcription
    /// that is not a command is queued as the pending auto-send message and
    /// then sent straight away.
    pub async fn submit_audio(&mut self, audio: &[u8]) -> TurnOutcome {
        if audio.is_empty() {
            debug!("No recording to process");
            return TurnOutcome::default();
        }
        if !audio::admit(&mut self.state, audio) {
            return TurnOutcome::default();
        }

        let transcript = self
            .transcriber
            .transcribe(audio, self.state.language())
            .await;

        let text = match (transcript.status, transcript.text) {
            (TranscriptionStatus::Success, Some(text)) if !text.trim().is_empty() => text,
            (status, _) => {
                // A successful transcription without words is a silent recording
                let status = match status {
                    TranscriptionStatus::Success => TranscriptionStatus::Silent,
                    other => other,
                };
                info!("Recording not transcribed: {}", status);
                return TurnOutcome::notice(transcription_notice(status));
            }
        };

        if let Some(cmd) = command::classify(&text) {
            return self.run_command(cmd);
        }

        self.state.set_pending_message(text.clone());
        let mut outcome = TurnOutcome::notice(Notice::Success(format!("✅ Heard: {}", text)));

        if let Some(message) = self.state.take_pending_message() {
            let turn = self.converse(&message).await;
            outcome.notices.extend(turn.notices);
            outcome.reply = turn.reply;
            outcome.spoken = turn.spoken;
        }

        outcome
    }

    /// Reset the conversation, keeping every setting.
    pub fn clear_chat(&mut self) -> Notice {
        self.state.clear_history();
        Notice::Success(format!("✨ {}", Command::ClearChat.confirmation()))
    }

    /// Pick a preset personality. Picking the active one changes nothing.
    pub fn select_personality(&mut self, personality: Personality) -> Notice {
        if self.state.personality().preset() == Some(personality) {
            return Notice::Info(format!("Already talking to {}", personality));
        }
        self.state.set_personality(personality);
        info!("Personality set to {}", personality);
        Notice::Success(format!("✨ Changed to {}!", personality))
    }

    pub fn set_custom_personality(&mut self, description: &str) -> Notice {
        let description = description.trim();
        if description.is_empty() {
            return Notice::Warning("Describe the personality first!".to_string());
        }
        self.state.set_custom_personality(description);
        info!("Custom personality set");
        Notice::Success(format!("✨ Changed to {}!", self.state.personality().display_name()))
    }

    pub fn select_language(&mut self, tag: &str) -> Notice {
        match voice::language_label(tag) {
            Some(label) => {
                self.state.set_language(tag);
                Notice::Success(format!("✨ Recognition language set to {}", label))
            }
            None => Notice::Warning(format!("Unsupported language '{}'", tag)),
        }
    }

    pub fn select_voice(&mut self, id: &str) -> Notice {
        let id = id.trim();
        if id.is_empty() {
            return Notice::Warning("Voice id cannot be empty".to_string());
        }
        if !voice::is_known_voice(id) {
            warn!("Using voice '{}' which is not in the built-in list", id);
        }
        self.state.set_voice(id);
        Notice::Success(format!(
            "✨ Voice changed to {}",
            voice::voice_label(id).unwrap_or(id)
        ))
    }

    pub fn set_speed(&mut self, speed: f32) -> Notice {
        if self.state.set_speed(speed) {
            Notice::Success(format!("✨ {}", Command::ChangeVoiceSpeed(speed).confirmation()))
        } else {
            Notice::Warning(format!("Invalid speed '{}'", speed))
        }
    }

    pub fn set_music(&mut self, enabled: bool) -> Notice {
        self.state.set_music(enabled);
        Notice::Success(format!("✨ {}", Command::ToggleMusic(enabled).confirmation()))
    }

    /// Stop any reply that is still playing.
    pub async fn shutdown(&self) {
        self.playback.stop().await;
    }

    fn run_command(&mut self, cmd: Command) -> TurnOutcome {
        info!("Applying command {:?}", cmd);
        let notice = self.apply(&cmd);
        TurnOutcome {
            notices: vec![notice],
            command: Some(cmd),
            ..TurnOutcome::default()
        }
    }

    fn apply(&mut self, cmd: &Command) -> Notice {
        match cmd {
            Command::ClearChat => self.state.clear_history(),
            // Voice switches always reset, even to the active personality
            Command::ChangePersonality(p) => self.state.set_personality(*p),
            Command::ChangeVoiceSpeed(speed) => {
                self.state.set_speed(*speed);
            }
            Command::ToggleMusic(enabled) => self.state.set_music(*enabled),
            Command::ChangeVoice(id) => self.state.set_voice(*id),
        }
        Notice::Success(format!("✨ {}", cmd.confirmation()))
    }

    async fn converse(&mut self, text: &str) -> TurnOutcome {
        self.state.push_user(text);
        let instruction = self.state.personality().system_instruction();

        match self.model.generate(text, &instruction).await {
            Ok(reply) => {
                self.state.push_assistant(reply.clone());
                let spoken = self.speak(&reply).await;
                TurnOutcome {
                    reply: Some(reply),
                    spoken,
                    ..TurnOutcome::default()
                }
            }
            Err(e) => {
                error!("Generation failed: {}", e);
                let message = format!("{}{}", ERROR_PREFIX, e);
                self.state.push_error(message.clone());
                TurnOutcome {
                    reply: Some(message),
                    ..TurnOutcome::default()
                }
            }
        }
    }

    async fn speak(&self, reply: &str) -> bool {
        if !self.tts.speaks_for(self.state.personality().preset()) {
            debug!("Spoken replies are off for this personality");
            return false;
        }

        let text = self.cleaner.clean(reply);
        if text.is_empty() {
            return false;
        }

        let audio = match self.synthesizer.synthesize(&text, self.state.voice()).await {
            Ok(audio) => audio,
            Err(e) => {
                warn!("Voice generation error: {}", e);
                return false;
            }
        };

        match self.playback.play(&audio, self.state.speed()).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Playback error: {}", e);
                false
            }
        }
    }
}

fn transcription_notice(status: TranscriptionStatus) -> Notice {
    match status {
        TranscriptionStatus::Success | TranscriptionStatus::Silent => {
            Notice::Warning("🔇 No speech detected".to_string())
        }
        TranscriptionStatus::NoSpeech => Notice::Info("🎤 Couldn't understand".to_string()),
        TranscriptionStatus::NetworkError => Notice::Error("🌐 Network error".to_string()),
        TranscriptionStatus::Empty | TranscriptionStatus::UnknownError => {
            Notice::Error("❌ Error occurred".to_string())
        }
    }
}
