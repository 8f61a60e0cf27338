use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::debug;

use crate::command::NORMAL_SPEED;
use crate::error::ChatvoxError;
use crate::personality::Personality;
use crate::voice;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub transcription: TranscriptionConfig,
    #[serde(default)]
    pub tts: TtsConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_llm_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions".to_string()
}

fn default_llm_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_timeout_ms() -> u64 {
    30000
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            api_key: String::new(),
            model: default_llm_model(),
            timeout_ms: default_timeout_ms(),
            temperature: default_temperature(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranscriptionConfig {
    #[serde(default = "default_transcription_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_transcription_model")]
    pub model: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_transcription_endpoint() -> String {
    "http://localhost:8000/v1/audio/transcriptions".to_string()
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_transcription_endpoint(),
            api_key: String::new(),
            model: default_transcription_model(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TtsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_tts_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_tts_model")]
    pub model: String,
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Personalities that get spoken replies. Empty means all of them.
    #[serde(default)]
    pub personalities: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_tts_endpoint() -> String {
    "http://localhost:5050/v1/audio/speech".to_string()
}

fn default_tts_model() -> String {
    "tts-1".to_string()
}

fn default_max_chars() -> usize {
    500
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_tts_endpoint(),
            api_key: String::new(),
            model: default_tts_model(),
            max_chars: default_max_chars(),
            timeout_ms: default_timeout_ms(),
            personalities: Vec::new(),
        }
    }
}

impl TtsConfig {
    /// Whether replies of the named personality should be spoken.
    /// Custom personalities are voiced only when the list is empty.
    pub fn speaks_for(&self, personality: Option<Personality>) -> bool {
        if !self.enabled {
            return false;
        }
        if self.personalities.is_empty() {
            return true;
        }
        match personality {
            Some(p) => self
                .personalities
                .iter()
                .any(|name| name.trim().eq_ignore_ascii_case(p.name())),
            None => false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_player")]
    pub player: String,
    #[serde(default = "default_temp_dir")]
    pub temp_dir: String,
}

fn default_player() -> String {
    "auto".to_string()
}

fn default_temp_dir() -> String {
    std::env::temp_dir()
        .join("chatvox")
        .to_string_lossy()
        .to_string()
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            player: default_player(),
            temp_dir: default_temp_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    #[serde(default = "default_personality")]
    pub personality: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_voice")]
    pub voice: String,
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default)]
    pub music: bool,
}

fn default_personality() -> String {
    Personality::default().name().to_string()
}

fn default_language() -> String {
    voice::DEFAULT_LANGUAGE.to_string()
}

fn default_voice() -> String {
    voice::DEFAULT_VOICE.to_string()
}

fn default_speed() -> f32 {
    NORMAL_SPEED
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            personality: default_personality(),
            language: default_language(),
            voice: default_voice(),
            speed: default_speed(),
            music: false,
        }
    }
}

const PLAYERS: &[&str] = &["auto", "mpv", "ffplay"];

impl Config {
    pub async fn load(path: &Path) -> Result<Self> {
        Self::validate_config_path(path)?;

        if !path.exists() {
            debug!("Config file not found at {:?}, creating default", path);
            let config = Self::default();
            config.save(path).await?;
            return Ok(config);
        }

        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        config.validate()?;

        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Fill empty API keys from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|name| std::env::var(name).ok());
    }

    fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let first = |names: &[&str]| {
            names
                .iter()
                .filter_map(|n| lookup(*n))
                .find(|v| !v.trim().is_empty())
        };

        if self.llm.api_key.is_empty() {
            if let Some(key) = first(&["CHATVOX_API_KEY", "GEMINI_API_KEY"]) {
                debug!("Using language model API key from environment");
                self.llm.api_key = key;
            }
        }
        if self.transcription.api_key.is_empty() {
            if let Some(key) = first(&["CHATVOX_TRANSCRIPTION_API_KEY", "OPENAI_API_KEY"]) {
                self.transcription.api_key = key;
            }
        }
        if self.tts.api_key.is_empty() {
            if let Some(key) = first(&["CHATVOX_TTS_API_KEY", "OPENAI_API_KEY"]) {
                self.tts.api_key = key;
            }
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.llm.endpoint.is_empty() {
            return Err(ChatvoxError::Config("LLM endpoint cannot be empty".to_string()).into());
        }
        if self.llm.model.is_empty() {
            return Err(ChatvoxError::Config("LLM model cannot be empty".to_string()).into());
        }
        Self::validate_timeout("llm", self.llm.timeout_ms)?;
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ChatvoxError::Config(
                "LLM temperature must be between 0.0 and 2.0".to_string(),
            )
            .into());
        }

        if self.transcription.endpoint.is_empty() {
            return Err(ChatvoxError::Config(
                "transcription endpoint cannot be empty".to_string(),
            )
            .into());
        }
        Self::validate_timeout("transcription", self.transcription.timeout_ms)?;

        // Speech settings only matter when replies are spoken
        if self.tts.enabled {
            if self.tts.endpoint.is_empty() {
                return Err(ChatvoxError::Config(
                    "TTS endpoint cannot be empty when enabled".to_string(),
                )
                .into());
            }
            if self.tts.max_chars == 0 {
                return Err(ChatvoxError::Config(
                    "TTS max_chars must be greater than 0".to_string(),
                )
                .into());
            }
            Self::validate_timeout("tts", self.tts.timeout_ms)?;
            if let Some(unknown) = self
                .tts
                .personalities
                .iter()
                .find(|name| Personality::from_name(name).is_none())
            {
                return Err(ChatvoxError::Config(format!(
                    "unknown personality '{}' in tts.personalities",
                    unknown
                ))
                .into());
            }
        }

        if !PLAYERS.contains(&self.playback.player.as_str()) {
            return Err(ChatvoxError::Config(format!(
                "playback player must be one of {:?}",
                PLAYERS
            ))
            .into());
        }
        if self.playback.temp_dir.contains("..") {
            return Err(ChatvoxError::Config(
                "temp_dir cannot contain path traversal sequences".to_string(),
            )
            .into());
        }

        if Personality::from_name(&self.session.personality).is_none() {
            return Err(ChatvoxError::Config(format!(
                "unknown personality '{}'",
                self.session.personality
            ))
            .into());
        }
        if !voice::is_supported_language(&self.session.language) {
            return Err(ChatvoxError::Config(format!(
                "unsupported recognition language '{}'",
                self.session.language
            ))
            .into());
        }
        if self.session.voice.trim().is_empty() {
            return Err(ChatvoxError::Config("voice cannot be empty".to_string()).into());
        }
        if !(self.session.speed > 0.0 && self.session.speed <= 4.0) {
            return Err(ChatvoxError::Config(
                "speed must be greater than 0 and at most 4".to_string(),
            )
            .into());
        }

        Ok(())
    }

    fn validate_timeout(section: &str, timeout_ms: u64) -> Result<()> {
        if !(1000..=120000).contains(&timeout_ms) {
            return Err(ChatvoxError::Config(format!(
                "{} timeout_ms must be between 1000 and 120000",
                section
            ))
            .into());
        }
        Ok(())
    }

    /// Validate that a config path is safe
    fn validate_config_path(path: &Path) -> Result<()> {
        let path_str = path.to_string_lossy();
        if path_str.contains("..") {
            return Err(ChatvoxError::Config(
                "Config path cannot contain path traversal sequences".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
