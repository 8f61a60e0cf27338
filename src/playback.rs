use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::PlaybackConfig;
use crate::error::ChatvoxError;

/// Plays synthesized speech. Autoplay is best effort.
#[async_trait]
pub trait Playback: Send + Sync {
    async fn play(&self, audio: &[u8], speed: f32) -> Result<(), ChatvoxError>;

    /// Stop whatever is playing and release its resources.
    async fn stop(&self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Player {
    Mpv,
    Ffplay,
}

impl Player {
    fn program(self) -> &'static str {
        match self {
            Player::Mpv => "mpv",
            Player::Ffplay => "ffplay",
        }
    }

    fn args(self, path: &Path, speed: f32) -> Vec<String> {
        let file = path.to_string_lossy().to_string();
        match self {
            Player::Mpv => vec![
                "--no-video".to_string(),
                "--really-quiet".to_string(),
                format!("--speed={}", speed),
                file,
            ],
            Player::Ffplay => vec![
                "-nodisp".to_string(),
                "-autoexit".to_string(),
                "-loglevel".to_string(),
                "quiet".to_string(),
                "-af".to_string(),
                format!("atempo={}", speed),
                file,
            ],
        }
    }
}

/// A running player process and the temp file it reads.
struct Playing {
    child: Child,
    path: PathBuf,
}

impl Playing {
    async fn stop(mut self) {
        let finished = matches!(self.child.try_wait(), Ok(Some(_)));
        if !finished {
            if let Err(e) = self.child.kill().await {
                debug!("Failed to stop player: {}", e);
            }
        }
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            debug!("Failed to remove {}: {}", self.path.display(), e);
        }
    }
}

/// Hands audio to an external command-line player found on `PATH`.
///
/// One reply plays at a time: starting a new one stops the previous player
/// and deletes its temp file.
pub struct CommandPlayback {
    config: PlaybackConfig,
    player: Option<Player>,
    current: Mutex<Option<Playing>>,
}

impl CommandPlayback {
    pub fn with_config(config: &PlaybackConfig) -> Self {
        let has_mpv = which::which("mpv").is_ok();
        let has_ffplay = which::which("ffplay").is_ok();

        debug!("Playback capabilities: mpv={}, ffplay={}", has_mpv, has_ffplay);

        let player = match config.player.as_str() {
            "mpv" if has_mpv => Some(Player::Mpv),
            "ffplay" if has_ffplay => Some(Player::Ffplay),
            "auto" if has_mpv => Some(Player::Mpv),
            "auto" if has_ffplay => Some(Player::Ffplay),
            _ => None,
        };

        if config.enabled && player.is_none() {
            warn!("No audio player found for '{}', replies will not be played", config.player);
        }

        Self {
            config: config.clone(),
            player,
            current: Mutex::new(None),
        }
    }

    pub fn player(&self) -> Option<Player> {
        self.player
    }

    async fn write_temp(&self, audio: &[u8]) -> Result<PathBuf, ChatvoxError> {
        tokio::fs::create_dir_all(&self.config.temp_dir).await?;
        let path =
            PathBuf::from(&self.config.temp_dir).join(format!("reply_{}.mp3", Uuid::new_v4()));
        tokio::fs::write(&path, audio).await?;
        Ok(path)
    }
}

#[async_trait]
impl Playback for CommandPlayback {
    async fn play(&self, audio: &[u8], speed: f32) -> Result<(), ChatvoxError> {
        if !self.config.enabled {
            debug!("Playback disabled, dropping {} bytes of audio", audio.len());
            return Ok(());
        }

        let Some(player) = self.player else {
            info!("[Playback] no player available, skipping {} bytes", audio.len());
            return Ok(());
        };

        let mut current = self.current.lock().await;
        if let Some(previous) = current.take() {
            previous.stop().await;
        }

        let path = self.write_temp(audio).await?;

        let child = match Command::new(player.program())
            .args(player.args(&path, speed))
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                let _ = tokio::fs::remove_file(&path).await;
                return Err(ChatvoxError::Playback(format!(
                    "failed to start {}: {}",
                    player.program(),
                    e
                )));
            }
        };

        info!("Playing reply with {} at {}x", player.program(), speed);
        *current = Some(Playing { child, path });

        Ok(())
    }

    async fn stop(&self) {
        if let Some(playing) = self.current.lock().await.take() {
            playing.stop().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_mpv_args() {
        let args = Player::Mpv.args(Path::new("/tmp/a.mp3"), 1.5);
        assert_eq!(args, vec!["--no-video", "--really-quiet", "--speed=1.5", "/tmp/a.mp3"]);
    }

    #[test]
    fn test_ffplay_args() {
        let args = Player::Ffplay.args(Path::new("/tmp/a.mp3"), 1.3);
        assert!(args.contains(&"atempo=1.3".to_string()));
        assert!(args.contains(&"-autoexit".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("/tmp/a.mp3"));
    }

    #[tokio::test]
    async fn test_disabled_playback_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let config = PlaybackConfig {
            enabled: false,
            player: "auto".to_string(),
            temp_dir: temp_dir.path().to_string_lossy().to_string(),
        };
        let playback = CommandPlayback::with_config(&config);
        assert!(playback.play(b"audio", 1.3).await.is_ok());
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_missing_player_is_not_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let config = PlaybackConfig {
            enabled: true,
            player: "auto".to_string(),
            temp_dir: temp_dir.path().to_string_lossy().to_string(),
        };
        let playback = CommandPlayback {
            config,
            player: None,
            current: Mutex::new(None),
        };
        assert!(playback.play(b"audio", 1.3).await.is_ok());
    }

    #[tokio::test]
    async fn test_write_temp() {
        let temp_dir = TempDir::new().unwrap();
        let config = PlaybackConfig {
            enabled: true,
            player: "auto".to_string(),
            temp_dir: temp_dir.path().join("sub").to_string_lossy().to_string(),
        };
        let playback = CommandPlayback {
            config,
            player: None,
            current: Mutex::new(None),
        };
        let path = playback.write_temp(b"mp3 bytes").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"mp3 bytes");
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("reply_"));
    }

    #[tokio::test]
    async fn test_stop_kills_player_and_removes_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = PlaybackConfig {
            enabled: true,
            player: "auto".to_string(),
            temp_dir: temp_dir.path().to_string_lossy().to_string(),
        };
        let playback = CommandPlayback {
            config,
            player: None,
            current: Mutex::new(None),
        };

        let path = playback.write_temp(b"mp3 bytes").await.unwrap();
        let child = Command::new("sleep").arg("30").spawn().unwrap();
        *playback.current.lock().await = Some(Playing {
            child,
            path: path.clone(),
        });

        playback.stop().await;

        assert!(!path.exists());
        assert!(playback.current.lock().await.is_none());
    }

    #[tokio::test]
    async fn test_stop_after_player_finished() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("reply_done.mp3");
        std::fs::write(&path, b"mp3").unwrap();

        let mut child = Command::new("true").spawn().unwrap();
        child.wait().await.unwrap();

        Playing {
            child,
            path: path.clone(),
        }
        .stop()
        .await;

        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_stop_without_playback_is_noop() {
        let playback = CommandPlayback::with_config(&PlaybackConfig {
            enabled: false,
            ..PlaybackConfig::default()
        });
        playback.stop().await;
    }
}
