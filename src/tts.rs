//! Speech synthesis for assistant replies.
//!
//! [`HttpSpeechSynthesizer`] talks to an OpenAI-compatible `/audio/speech`
//! endpoint that accepts neural voice names (for example an edge-tts bridge).
//! Before the request it looks at the Unicode blocks used by the text: when a
//! reply is written in Hangul, CJK ideographs, Arabic or Devanagari, the voice
//! requested by the session is swapped for one of the matching locale. The
//! first character from one of those blocks decides; there is no threshold.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::TtsConfig;
use crate::error::ChatvoxError;
use crate::llm::http_client;

const KOREAN_VOICE: &str = "ko-KR-SunHiNeural";
const CHINESE_VOICE: &str = "zh-CN-XiaoxiaoNeural";
const ARABIC_VOICE: &str = "ar-SA-ZariyahNeural";
const HINDI_VOICE: &str = "hi-IN-SwaraNeural";

/// Text-to-speech service returning playable audio bytes.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>, ChatvoxError>;
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

pub struct HttpSpeechSynthesizer {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    max_chars: usize,
}

impl HttpSpeechSynthesizer {
    pub fn new(config: &TtsConfig) -> Result<Self, ChatvoxError> {
        let client = http_client(config.timeout_ms, &config.api_key)?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            max_chars: config.max_chars,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSpeechSynthesizer {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>, ChatvoxError> {
        let input = truncate(text, self.max_chars);
        let voice = detect_script_voice(&input).unwrap_or(voice);
        debug!("Synthesizing {} chars with {}", input.chars().count(), voice);

        let request = SpeechRequest {
            model: &self.model,
            input: &input,
            voice,
            response_format: "mp3",
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatvoxError::Synthesis(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ChatvoxError::Synthesis(format!(
                "API returned status {}",
                response.status()
            )));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| ChatvoxError::Synthesis(format!("failed to read audio: {}", e)))?;

        if audio.is_empty() {
            return Err(ChatvoxError::Synthesis("service returned no audio".to_string()));
        }

        info!("Synthesized {} bytes of audio", audio.len());
        Ok(audio.to_vec())
    }
}

/// Cut `text` to at most `max_chars` characters, marking the cut with "...".
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Voice for the first character that belongs to a recognised script block.
pub fn detect_script_voice(text: &str) -> Option<&'static str> {
    text.chars().find_map(|c| match c as u32 {
        0xAC00..=0xD7AF | 0x1100..=0x11FF | 0x3130..=0x318F => Some(KOREAN_VOICE),
        0x4E00..=0x9FFF | 0x3400..=0x4DBF => Some(CHINESE_VOICE),
        0x0600..=0x06FF => Some(ARABIC_VOICE),
        0x0900..=0x097F => Some(HINDI_VOICE),
        _ => None,
    })
}
