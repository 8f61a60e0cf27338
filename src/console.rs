//! Line-oriented chat surface used by the `chat` subcommand.
//!
//! Plain lines are typed messages. Lines starting with `/` are direct actions
//! that bypass the voice command classifier.

use anyhow::{anyhow, bail, Result};
use std::path::PathBuf;

use crate::controller::Notice;
use crate::session::{Message, Role, SessionState};
use crate::voice;

pub const HELP: &str = "\
Type a message and press Enter, or use:
  /audio <file.wav>       send a recording as voice input
  /personality <name>     Professional | Clash Royale
  /custom <description>   talk to a personality you describe
  /language <tag>         recognition language, e.g. en-US, es-ES
  /voice <id>             speech voice, see `chatvox voices`
  /speed <factor>         playback speed, e.g. 1.3
  /music on|off           background music
  /clear                  clear the conversation
  /history                show the conversation
  /status                 show current settings
  /help                   show this help
  /quit                   leave

Voice commands work too: \"clear chat\", \"change personality to clash royale\",
\"speak faster\", \"slow down\", \"play music\", \"change voice to british female\".";

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleInput {
    Message(String),
    Audio(PathBuf),
    Personality(String),
    Custom(String),
    Language(String),
    Voice(String),
    Speed(f32),
    Music(bool),
    Clear,
    History,
    Status,
    Help,
    Quit,
}

pub fn parse(line: &str) -> Result<ConsoleInput> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(ConsoleInput::Message(line.to_string()));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    let required = |what: &str| -> Result<String> {
        if arg.is_empty() {
            bail!("/{} needs {}", name, what);
        }
        Ok(arg.to_string())
    };

    let input = match name.to_lowercase().as_str() {
        "audio" => ConsoleInput::Audio(PathBuf::from(required("a WAV file path")?)),
        "personality" => ConsoleInput::Personality(required("a personality name")?),
        "custom" => ConsoleInput::Custom(required("a description")?),
        "language" => ConsoleInput::Language(required("a language tag")?),
        "voice" => ConsoleInput::Voice(required("a voice id")?),
        "speed" => {
            let value = required("a number")?;
            let speed = value
                .parse::<f32>()
                .map_err(|_| anyhow!("'{}' is not a number", value))?;
            ConsoleInput::Speed(speed)
        }
        "music" => match arg.to_lowercase().as_str() {
            "on" => ConsoleInput::Music(true),
            "off" => ConsoleInput::Music(false),
            _ => bail!("/music needs on or off"),
        },
        "clear" => ConsoleInput::Clear,
        "history" => ConsoleInput::History,
        "status" => ConsoleInput::Status,
        "help" | "?" => ConsoleInput::Help,
        "quit" | "exit" => ConsoleInput::Quit,
        other => bail!("Unknown action /{} (try /help)", other),
    };

    Ok(input)
}

pub fn render_notice(notice: &Notice) -> String {
    match notice {
        Notice::Success(_) | Notice::Info(_) => notice.text().to_string(),
        Notice::Warning(_) => format!("[warning] {}", notice.text()),
        Notice::Error(_) => format!("[error] {}", notice.text()),
    }
}

pub fn render_message(message: &Message) -> String {
    let who = match message.role {
        Role::User => "you",
        Role::Assistant => "bot",
    };
    format!(
        "[{}] {}: {}",
        message.timestamp.format("%H:%M:%S"),
        who,
        message.content
    )
}

pub fn render_status(state: &SessionState) -> String {
    let personality = state.personality();
    let voice = state.voice();
    let language = state.language();
    format!(
        "Personality: {} {}\n\
         Voice:       {}\n\
         Language:    {}\n\
         Speed:       {}x\n\
         Music:       {}\n\
         Messages:    {}",
        personality.icon(),
        personality.display_name(),
        voice::voice_label(voice).unwrap_or(voice),
        voice::language_label(language).unwrap_or(language),
        state.speed(),
        if state.music_enabled() { "on" } else { "off" },
        state.history().len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_line_is_message() {
        assert_eq!(
            parse("  hello there ").unwrap(),
            ConsoleInput::Message("hello there".to_string())
        );
    }

    #[test]
    fn test_actions_with_arguments() {
        assert_eq!(
            parse("/audio /tmp/rec.wav").unwrap(),
            ConsoleInput::Audio(PathBuf::from("/tmp/rec.wav"))
        );
        assert_eq!(
            parse("/personality Clash Royale").unwrap(),
            ConsoleInput::Personality("Clash Royale".to_string())
        );
        assert_eq!(
            parse("/custom a sleepy wizard").unwrap(),
            ConsoleInput::Custom("a sleepy wizard".to_string())
        );
        assert_eq!(parse("/speed 1.5").unwrap(), ConsoleInput::Speed(1.5));
        assert_eq!(parse("/music ON").unwrap(), ConsoleInput::Music(true));
        assert_eq!(parse("/music off").unwrap(), ConsoleInput::Music(false));
    }

    #[test]
    fn test_actions_without_arguments() {
        assert_eq!(parse("/clear").unwrap(), ConsoleInput::Clear);
        assert_eq!(parse("/HISTORY").unwrap(), ConsoleInput::History);
        assert_eq!(parse("/status").unwrap(), ConsoleInput::Status);
        assert_eq!(parse("/?").unwrap(), ConsoleInput::Help);
        assert_eq!(parse("/exit").unwrap(), ConsoleInput::Quit);
    }

    #[test]
    fn test_invalid_actions() {
        assert!(parse("/speed fast").is_err());
        assert!(parse("/speed").is_err());
        assert!(parse("/music loud").is_err());
        assert!(parse("/audio").is_err());
        assert!(parse("/dance").is_err());
    }

    #[test]
    fn test_render_notice() {
        assert_eq!(render_notice(&Notice::Warning("careful".to_string())), "[warning] careful");
        assert_eq!(render_notice(&Notice::Success("done".to_string())), "done");
    }

    #[test]
    fn test_render_status() {
        let state = SessionState::default();
        let status = render_status(&state);
        assert!(status.contains("Professional Assistant"));
        assert!(status.contains("Aria (US female)"));
        assert!(status.contains("English (US)"));
        assert!(status.contains("1.3x"));
        assert!(status.contains("Music:       off"));
    }

    #[test]
    fn test_render_message() {
        let mut state = SessionState::default();
        state.push_user("hi");
        let line = render_message(&state.history()[0]);
        assert!(line.ends_with("you: hi"));
    }
}
