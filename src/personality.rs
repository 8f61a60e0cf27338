//! Personality profiles handed to the language model as system instructions.
//!
//! Two presets ship with the binary. A custom personality synthesizes its
//! instruction from free text typed by the user instead of looking up a profile.

use std::fmt;

/// Static description of a preset personality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Profile {
    pub display_name: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
    pub system_instruction: &'static str,
}

const PROFESSIONAL: Profile = Profile {
    display_name: "Professional Assistant",
    icon: "💼",
    description: "A knowledgeable and professional AI assistant for business and general inquiries.",
    system_instruction: "\
You are a professional AI assistant. You provide:
- Clear, concise, and accurate information
- Well-structured responses with proper formatting
- Professional tone suitable for business and academic contexts
- Thoughtful analysis and recommendations
- Helpful guidance across various topics

Maintain a professional yet approachable demeanor. Be articulate, organized, and thorough in your responses.
Focus on providing value through accuracy, clarity, and practical insights. You can help with work-related tasks,
learning, problem-solving, and general knowledge questions while maintaining professionalism.",
};

const CLASH_ROYALE: Profile = Profile {
    display_name: "Clash Royale Champion",
    icon: "👑",
    description: "A battle-hardened warrior from the Arena who speaks in Clash Royale terms!",
    system_instruction: "\
You are a Clash Royale champion and enthusiastic player! You love talking about:
- Clash Royale cards, strategies, and deck building
- Arena battles and trophy pushing
- Elixir management and card combos
- Favorite troops like Hog Rider, P.E.K.K.A, Mega Knight, etc.
- Epic moments and clutch plays

Speak with energy and enthusiasm! Use Clash Royale terminology when appropriate.
Occasionally reference game mechanics like elixir, towers, king tower, princess towers, and legendary cards.
Be helpful, friendly, and passionate about the game. Express excitement with phrases like \"Positive Elixir Trade!\",
\"Good game, well played!\", or \"That's legendary!\". You can help with both Clash Royale questions
and general topics, but always maintain your enthusiastic champion personality!",
};

const CUSTOM_ICON: &str = "🎭";

/// The fixed set of preset personalities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Personality {
    #[default]
    Professional,
    ClashRoyale,
}

impl Personality {
    pub const ALL: [Personality; 2] = [Personality::Professional, Personality::ClashRoyale];

    /// Key used by commands, config and the console.
    pub fn name(self) -> &'static str {
        match self {
            Personality::Professional => "Professional",
            Personality::ClashRoyale => "Clash Royale",
        }
    }

    pub fn profile(self) -> &'static Profile {
        match self {
            Personality::Professional => &PROFESSIONAL,
            Personality::ClashRoyale => &CLASH_ROYALE,
        }
    }

    /// Case-insensitive lookup by key.
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = name.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(wanted))
    }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The personality currently steering the conversation.
///
/// A preset and a custom description cannot both be active: selecting one
/// replaces the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivePersonality {
    Preset(Personality),
    Custom(String),
}

impl Default for ActivePersonality {
    fn default() -> Self {
        ActivePersonality::Preset(Personality::default())
    }
}

impl ActivePersonality {
    pub fn display_name(&self) -> String {
        match self {
            ActivePersonality::Preset(p) => p.profile().display_name.to_string(),
            ActivePersonality::Custom(description) => format!("Custom: {}", description),
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ActivePersonality::Preset(p) => p.profile().icon,
            ActivePersonality::Custom(_) => CUSTOM_ICON,
        }
    }

    pub fn system_instruction(&self) -> String {
        match self {
            ActivePersonality::Preset(p) => p.profile().system_instruction.to_string(),
            ActivePersonality::Custom(description) => custom_instruction(description),
        }
    }

    pub fn preset(&self) -> Option<Personality> {
        match self {
            ActivePersonality::Preset(p) => Some(*p),
            ActivePersonality::Custom(_) => None,
        }
    }
}

fn custom_instruction(description: &str) -> String {
    format!(
        "You are {description}. Stay in character as {description} in every reply.\n\
         Match the tone, vocabulary and attitude this character would have, \
         while still answering the user's questions helpfully and accurately."
    )
}
