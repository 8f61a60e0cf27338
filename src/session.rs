use chrono::{DateTime, Local};
use tracing::debug;

use crate::command::NORMAL_SPEED;
use crate::config::SessionConfig;
use crate::personality::{ActivePersonality, Personality};
use crate::voice;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Local>,
    /// Set on assistant turns that carry a generation failure.
    pub is_error: bool,
}

impl Message {
    fn new(role: Role, content: String, is_error: bool) -> Self {
        Self {
            role,
            content,
            timestamp: Local::now(),
            is_error,
        }
    }
}

/// Everything one chat session remembers between turns.
///
/// Lives for the lifetime of the process and is never written to disk.
#[derive(Debug, Clone)]
pub struct SessionState {
    history: Vec<Message>,
    personality: ActivePersonality,
    voice: String,
    language: String,
    speed: f32,
    music: bool,
    audio_fingerprint: Option<String>,
    pending_message: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            history: Vec::new(),
            personality: ActivePersonality::default(),
            voice: voice::DEFAULT_VOICE.to_string(),
            language: voice::DEFAULT_LANGUAGE.to_string(),
            speed: NORMAL_SPEED,
            music: false,
            audio_fingerprint: None,
            pending_message: None,
        }
    }
}

impl SessionState {
    /// Build the initial state from the `[session]` config section.
    /// The config is validated on load, so unknown names fall back to defaults.
    pub fn from_config(config: &SessionConfig) -> Self {
        let personality = Personality::from_name(&config.personality).unwrap_or_default();
        Self {
            personality: ActivePersonality::Preset(personality),
            voice: config.voice.clone(),
            language: config.language.clone(),
            speed: config.speed,
            music: config.music,
            ..Self::default()
        }
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.history.push(Message::new(Role::User, content.into(), false));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.history.push(Message::new(Role::Assistant, content.into(), false));
    }

    pub fn push_error(&mut self, content: impl Into<String>) {
        self.history.push(Message::new(Role::Assistant, content.into(), true));
    }

    pub fn clear_history(&mut self) {
        debug!("Clearing {} history entries", self.history.len());
        self.history.clear();
    }

    pub fn personality(&self) -> &ActivePersonality {
        &self.personality
    }

    /// Switch to a preset personality. History is always reset.
    pub fn set_personality(&mut self, personality: Personality) {
        self.personality = ActivePersonality::Preset(personality);
        self.clear_history();
    }

    /// Switch to a free-text personality, replacing any preset. History is reset.
    pub fn set_custom_personality(&mut self, description: impl Into<String>) {
        self.personality = ActivePersonality::Custom(description.into());
        self.clear_history();
    }

    pub fn voice(&self) -> &str {
        &self.voice
    }

    pub fn set_voice(&mut self, voice: impl Into<String>) {
        self.voice = voice.into();
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn set_language(&mut self, language: impl Into<String>) {
        self.language = language.into();
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Returns false and keeps the old value when `speed` is not a positive number.
    pub fn set_speed(&mut self, speed: f32) -> bool {
        if !(speed.is_finite() && speed > 0.0) {
            return false;
        }
        self.speed = speed;
        true
    }

    pub fn music_enabled(&self) -> bool {
        self.music
    }

    pub fn set_music(&mut self, enabled: bool) {
        self.music = enabled;
    }

    pub fn audio_fingerprint(&self) -> Option<&str> {
        self.audio_fingerprint.as_deref()
    }

    pub fn set_audio_fingerprint(&mut self, fingerprint: String) {
        self.audio_fingerprint = Some(fingerprint);
    }

    pub fn pending_message(&self) -> Option<&str> {
        self.pending_message.as_deref()
    }

    pub fn set_pending_message(&mut self, text: impl Into<String>) {
        self.pending_message = Some(text.into());
    }

    /// Consume the pending auto-send message, leaving none behind.
    pub fn take_pending_message(&mut self) -> Option<String> {
        self.pending_message.take()
    }
}
