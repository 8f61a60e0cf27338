//! Voice command detection.
//!
//! Utterances are lowercased, trimmed and run through an ordered rule table.
//! The first rule that produces a command wins, so the order of [`RULES`] is
//! part of the behaviour:
//!
//! | # | Phrase pattern | Command |
//! |---|----------------|---------|
//! | 1 | "clear chat", "clear conversation", "delete history" | `ClearChat` |
//! | 2 | "change/switch personality" + "clash royale"/"professional" | `ChangePersonality` |
//! | 3 | "speak faster", "slow down", "normal speed", ... | `ChangeVoiceSpeed` |
//! | 4 | "play music", "stop music", ... | `ToggleMusic` |
//! | 5 | "change/switch voice" + gender / "british" | `ChangeVoice` |
//!
//! Anything else is conversation and goes to the language model.

use tracing::debug;

use crate::personality::Personality;
use crate::voice;

pub const FAST_SPEED: f32 = 1.5;
pub const SLOW_SPEED: f32 = 1.0;
pub const NORMAL_SPEED: f32 = 1.3;

/// A control directive extracted from an utterance.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ClearChat,
    ChangePersonality(Personality),
    ChangeVoiceSpeed(f32),
    ToggleMusic(bool),
    ChangeVoice(&'static str),
}

impl Command {
    /// Short confirmation shown after the command is applied.
    pub fn confirmation(&self) -> String {
        match self {
            Command::ClearChat => "Cleared conversation history!".to_string(),
            Command::ChangePersonality(p) => format!("Changed to {}!", p),
            Command::ChangeVoiceSpeed(speed) => format!("Voice speed set to {}x", speed),
            Command::ToggleMusic(true) => "Background music on".to_string(),
            Command::ToggleMusic(false) => "Background music off".to_string(),
            Command::ChangeVoice(id) => {
                format!("Voice changed to {}", voice::voice_label(id).unwrap_or(id))
            }
        }
    }
}

struct Rule {
    name: &'static str,
    matcher: fn(&str) -> Option<Command>,
}

const RULES: &[Rule] = &[
    Rule {
        name: "clear-chat",
        matcher: clear_chat,
    },
    Rule {
        name: "change-personality",
        matcher: change_personality,
    },
    Rule {
        name: "voice-speed",
        matcher: voice_speed,
    },
    Rule {
        name: "music",
        matcher: music,
    },
    Rule {
        name: "change-voice",
        matcher: change_voice,
    },
];

/// Classify an utterance. Returns `None` for conversation and for blank input.
pub fn classify(utterance: &str) -> Option<Command> {
    let text = utterance.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }

    RULES.iter().find_map(|rule| {
        let command = (rule.matcher)(&text)?;
        debug!("Utterance matched rule '{}': {:?}", rule.name, command);
        Some(command)
    })
}

fn contains_any(text: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| text.contains(p))
}

fn clear_chat(text: &str) -> Option<Command> {
    contains_any(text, &["clear chat", "clear conversation", "delete history"])
        .then_some(Command::ClearChat)
}

fn change_personality(text: &str) -> Option<Command> {
    if !contains_any(text, &["change personality", "switch personality"]) {
        return None;
    }
    if contains_any(text, &["clash royale", "clash royal"]) {
        Some(Command::ChangePersonality(Personality::ClashRoyale))
    } else if text.contains("professional") {
        Some(Command::ChangePersonality(Personality::Professional))
    } else {
        None
    }
}

fn voice_speed(text: &str) -> Option<Command> {
    if contains_any(text, &["speak faster", "talk faster", "speed up"]) {
        Some(Command::ChangeVoiceSpeed(FAST_SPEED))
    } else if contains_any(text, &["speak slower", "talk slower", "slow down"]) {
        Some(Command::ChangeVoiceSpeed(SLOW_SPEED))
    } else if contains_any(text, &["normal speed", "regular speed"]) {
        Some(Command::ChangeVoiceSpeed(NORMAL_SPEED))
    } else {
        None
    }
}

fn music(text: &str) -> Option<Command> {
    if contains_any(text, &["play music", "start music", "turn on music"]) {
        Some(Command::ToggleMusic(true))
    } else if contains_any(text, &["stop music", "pause music", "turn off music"]) {
        Some(Command::ToggleMusic(false))
    } else {
        None
    }
}

fn change_voice(text: &str) -> Option<Command> {
    if !contains_any(text, &["change voice", "switch voice"]) {
        return None;
    }

    // "female" and "woman" contain "male" and "man", so female goes first.
    let female = contains_any(text, &["female", "woman", "girl"]);
    let male = !female && contains_any(text, &["male", "man", "guy"]);

    let id = if text.contains("british") {
        if female {
            voice::BRITISH_FEMALE
        } else {
            voice::BRITISH_MALE
        }
    } else if female {
        voice::FEMALE
    } else if male {
        voice::MALE
    } else {
        return None;
    };

    Some(Command::ChangeVoice(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_chat_phrases() {
        assert_eq!(classify("clear chat"), Some(Command::ClearChat));
        assert_eq!(classify("Please CLEAR CONVERSATION now"), Some(Command::ClearChat));
        assert_eq!(classify("  delete history  "), Some(Command::ClearChat));
    }

    #[test]
    fn test_clear_chat_wins_over_later_rules() {
        assert_eq!(
            classify("clear chat and change personality to clash royale"),
            Some(Command::ClearChat)
        );
        assert_eq!(
            classify("Clear Chat, speak faster and play music"),
            Some(Command::ClearChat)
        );
    }

    #[test]
    fn test_change_personality_targets() {
        assert_eq!(
            classify("change personality to clash royale"),
            Some(Command::ChangePersonality(Personality::ClashRoyale))
        );
        assert_eq!(
            classify("Switch personality to Clash Royal"),
            Some(Command::ChangePersonality(Personality::ClashRoyale))
        );
        assert_eq!(
            classify("change personality to professional"),
            Some(Command::ChangePersonality(Personality::Professional))
        );
    }

    #[test]
    fn test_change_personality_unknown_target_is_not_a_command() {
        assert_eq!(classify("change personality to pirate"), None);
    }

    #[test]
    fn test_unknown_personality_target_still_reaches_later_rules() {
        assert_eq!(
            classify("change personality to pirate and speak faster"),
            Some(Command::ChangeVoiceSpeed(FAST_SPEED))
        );
    }

    #[test]
    fn test_personality_keyword_without_phrase_is_conversation() {
        assert_eq!(classify("tell me about clash royale decks"), None);
    }

    #[test]
    fn test_speed_phrases() {
        assert_eq!(classify("speak faster"), Some(Command::ChangeVoiceSpeed(1.5)));
        assert_eq!(classify("can you talk faster"), Some(Command::ChangeVoiceSpeed(1.5)));
        assert_eq!(classify("speed up"), Some(Command::ChangeVoiceSpeed(1.5)));
        assert_eq!(classify("slow down"), Some(Command::ChangeVoiceSpeed(1.0)));
        assert_eq!(classify("speak slower"), Some(Command::ChangeVoiceSpeed(1.0)));
        assert_eq!(classify("normal speed"), Some(Command::ChangeVoiceSpeed(1.3)));
        assert_eq!(classify("back to regular speed"), Some(Command::ChangeVoiceSpeed(1.3)));
    }

    #[test]
    fn test_music_phrases() {
        assert_eq!(classify("play music"), Some(Command::ToggleMusic(true)));
        assert_eq!(classify("Turn on music please"), Some(Command::ToggleMusic(true)));
        assert_eq!(classify("stop music"), Some(Command::ToggleMusic(false)));
        assert_eq!(classify("pause music"), Some(Command::ToggleMusic(false)));
        assert_eq!(classify("turn off music"), Some(Command::ToggleMusic(false)));
    }

    #[test]
    fn test_change_voice_gender() {
        assert_eq!(
            classify("change voice to female"),
            Some(Command::ChangeVoice(voice::FEMALE))
        );
        assert_eq!(
            classify("switch voice to a woman"),
            Some(Command::ChangeVoice(voice::FEMALE))
        );
        assert_eq!(
            classify("change voice to male"),
            Some(Command::ChangeVoice(voice::MALE))
        );
        assert_eq!(
            classify("switch voice to the guy"),
            Some(Command::ChangeVoice(voice::MALE))
        );
    }

    #[test]
    fn test_change_voice_british() {
        assert_eq!(
            classify("change voice to british female"),
            Some(Command::ChangeVoice(voice::BRITISH_FEMALE))
        );
        assert_eq!(
            classify("change voice to british male"),
            Some(Command::ChangeVoice(voice::BRITISH_MALE))
        );
        assert_eq!(
            classify("change voice to british"),
            Some(Command::ChangeVoice(voice::BRITISH_MALE))
        );
    }

    #[test]
    fn test_change_voice_without_keyword_is_not_a_command() {
        assert_eq!(classify("change voice to something nicer"), None);
    }

    #[test]
    fn test_blank_input() {
        assert_eq!(classify(""), None);
        assert_eq!(classify("   \n\t"), None);
    }

    #[test]
    fn test_conversation() {
        assert_eq!(classify("What is the capital of France?"), None);
    }

    #[test]
    fn test_confirmations() {
        assert_eq!(Command::ClearChat.confirmation(), "Cleared conversation history!");
        assert_eq!(
            Command::ChangePersonality(Personality::ClashRoyale).confirmation(),
            "Changed to Clash Royale!"
        );
        assert_eq!(
            Command::ChangeVoice(voice::BRITISH_FEMALE).confirmation(),
            "Voice changed to Sonia (British female)"
        );
        assert_eq!(Command::ToggleMusic(false).confirmation(), "Background music off");
    }
}
