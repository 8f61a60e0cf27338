use async_trait::async_trait;
use serde::Deserialize;
use std::io::Cursor;
use tracing::{debug, info, warn};

use crate::config::TranscriptionConfig;
use crate::error::ChatvoxError;
use crate::llm::http_client;
use crate::voice;

/// Recordings with less sample data than this are treated as silence.
const MIN_AUDIO_BYTES: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptionStatus {
    Success,
    Empty,
    Silent,
    NoSpeech,
    NetworkError,
    UnknownError,
}

impl std::fmt::Display for TranscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranscriptionStatus::Success => write!(f, "success"),
            TranscriptionStatus::Empty => write!(f, "empty"),
            TranscriptionStatus::Silent => write!(f, "silent"),
            TranscriptionStatus::NoSpeech => write!(f, "no_speech"),
            TranscriptionStatus::NetworkError => write!(f, "network_error"),
            TranscriptionStatus::UnknownError => write!(f, "unknown_error"),
        }
    }
}

/// Result of one transcription attempt. `text` is set only on success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub text: Option<String>,
    pub status: TranscriptionStatus,
}

impl Transcript {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            status: TranscriptionStatus::Success,
        }
    }

    pub fn failed(status: TranscriptionStatus) -> Self {
        Self { text: None, status }
    }
}

/// Speech-to-text service. Failures are reported through the status, never
/// as an error value.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &[u8], language: &str) -> Transcript;
}

/// Why a transcription request did not produce text.
enum RequestFailure {
    /// Service unreachable or answered with an error status.
    Network(String),
    /// Anything else: bad upload, unparsable body.
    Other(String),
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

/// Posts WAV recordings to an OpenAI-compatible `/audio/transcriptions` endpoint.
pub struct HttpTranscriber {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl HttpTranscriber {
    pub fn new(config: &TranscriptionConfig) -> Result<Self, ChatvoxError> {
        let client = http_client(config.timeout_ms, &config.api_key)?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
        })
    }

    async fn request(&self, audio: &[u8], language: &str) -> Result<String, RequestFailure> {
        let file = reqwest::multipart::Part::bytes(audio.to_vec())
            .file_name("recording.wav")
            .mime_str("audio/wav")
            .map_err(|e| RequestFailure::Other(format!("invalid upload: {}", e)))?;

        let form = reqwest::multipart::Form::new()
            .part("file", file)
            .text("model", self.model.clone())
            .text("language", voice::primary_language(language).to_string())
            .text("response_format", "json");

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| RequestFailure::Network(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(RequestFailure::Network(format!(
                "API returned status {}",
                response.status()
            )));
        }

        let body: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| RequestFailure::Other(format!("failed to parse transcription: {}", e)))?;

        Ok(body.text)
    }
}

#[async_trait]
impl Transcriber for HttpTranscriber {
    async fn transcribe(&self, audio: &[u8], language: &str) -> Transcript {
        if audio.is_empty() {
            return Transcript::failed(TranscriptionStatus::Empty);
        }

        match wav_data_len(audio) {
            Some(len) if len < MIN_AUDIO_BYTES => {
                debug!("Recording has only {} bytes of samples", len);
                return Transcript::failed(TranscriptionStatus::Silent);
            }
            Some(_) => {}
            None => {
                warn!("Recording is not a readable WAV file ({} bytes)", audio.len());
                return Transcript::failed(TranscriptionStatus::UnknownError);
            }
        }

        info!("Transcribing {} bytes ({})", audio.len(), language);

        match self.request(audio, language).await {
            Ok(text) if text.trim().is_empty() => {
                Transcript::failed(TranscriptionStatus::NoSpeech)
            }
            Ok(text) => {
                let text = text.trim().to_string();
                info!("Transcription completed: {} chars", text.len());
                Transcript::success(text)
            }
            Err(RequestFailure::Network(e)) => {
                warn!("Transcription service unavailable: {}", e);
                Transcript::failed(TranscriptionStatus::NetworkError)
            }
            Err(RequestFailure::Other(e)) => {
                warn!("Transcription failed: {}", e);
                Transcript::failed(TranscriptionStatus::UnknownError)
            }
        }
    }
}

/// Bytes of sample data in a WAV payload, or `None` when it cannot be parsed.
pub fn wav_data_len(audio: &[u8]) -> Option<usize> {
    let reader = hound::WavReader::new(Cursor::new(audio)).ok()?;
    let spec = reader.spec();
    let bytes_per_sample = (spec.bits_per_sample as usize).div_ceil(8);
    Some(reader.len() as usize * bytes_per_sample)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav(samples: usize) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for i in 0..samples {
                writer.write_sample((i % 100) as i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    fn unreachable_transcriber() -> HttpTranscriber {
        let config = TranscriptionConfig {
            endpoint: "http://127.0.0.1:9/v1/audio/transcriptions".to_string(),
            api_key: String::new(),
            model: "whisper-1".to_string(),
            timeout_ms: 1000,
        };
        HttpTranscriber::new(&config).unwrap()
    }

    #[test]
    fn test_wav_data_len() {
        assert_eq!(wav_data_len(&wav(100)), Some(200));
        assert_eq!(wav_data_len(&wav(16000)), Some(32000));
        assert_eq!(wav_data_len(b"not a wav file"), None);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(TranscriptionStatus::NoSpeech.to_string(), "no_speech");
        assert_eq!(TranscriptionStatus::NetworkError.to_string(), "network_error");
    }

    #[tokio::test]
    async fn test_empty_payload() {
        let transcript = unreachable_transcriber().transcribe(&[], "en-US").await;
        assert_eq!(transcript, Transcript::failed(TranscriptionStatus::Empty));
    }

    #[tokio::test]
    async fn test_short_recording_is_silent() {
        let transcript = unreachable_transcriber().transcribe(&wav(100), "en-US").await;
        assert_eq!(transcript.status, TranscriptionStatus::Silent);
        assert!(transcript.text.is_none());
    }

    #[tokio::test]
    async fn test_unreadable_payload_is_unknown_error() {
        let transcript = unreachable_transcriber()
            .transcribe(b"definitely not audio", "en-US")
            .await;
        assert_eq!(transcript.status, TranscriptionStatus::UnknownError);
    }

    #[tokio::test]
    async fn test_unreachable_service_is_network_error() {
        let transcript = unreachable_transcriber().transcribe(&wav(16000), "en-US").await;
        assert_eq!(transcript.status, TranscriptionStatus::NetworkError);
    }

    #[test]
    fn test_response_deserialization() {
        let body: TranscriptionResponse = serde_json::from_str(r#"{"text":" hello "}"#).unwrap();
        assert_eq!(body.text, " hello ");
        let body: TranscriptionResponse = serde_json::from_str("{}").unwrap();
        assert!(body.text.is_empty());
    }
}
