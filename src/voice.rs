//! Voice profiles for speech synthesis and recognition language tags.

pub const FEMALE: &str = "en-US-AriaNeural";
pub const MALE: &str = "en-US-GuyNeural";
pub const BRITISH_FEMALE: &str = "en-GB-SoniaNeural";
pub const BRITISH_MALE: &str = "en-GB-RyanNeural";

pub const DEFAULT_VOICE: &str = FEMALE;
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Selectable voices as (id, label).
pub const VOICES: &[(&str, &str)] = &[
    (FEMALE, "Aria (US female)"),
    (MALE, "Guy (US male)"),
    (BRITISH_FEMALE, "Sonia (British female)"),
    (BRITISH_MALE, "Ryan (British male)"),
];

/// Speech recognition languages as (label, tag).
pub const LANGUAGES: &[(&str, &str)] = &[
    ("English (US)", "en-US"),
    ("English (UK)", "en-GB"),
    ("Spanish", "es-ES"),
    ("French", "fr-FR"),
    ("German", "de-DE"),
    ("Italian", "it-IT"),
    ("Portuguese", "pt-PT"),
    ("Chinese (Mandarin)", "zh-CN"),
    ("Japanese", "ja-JP"),
    ("Korean", "ko-KR"),
    ("Hindi", "hi-IN"),
    ("Arabic", "ar-SA"),
];

pub fn is_known_voice(id: &str) -> bool {
    VOICES.iter().any(|(v, _)| *v == id)
}

pub fn voice_label(id: &str) -> Option<&'static str> {
    VOICES.iter().find(|(v, _)| *v == id).map(|(_, label)| *label)
}

pub fn is_supported_language(tag: &str) -> bool {
    LANGUAGES.iter().any(|(_, t)| *t == tag)
}

pub fn language_label(tag: &str) -> Option<&'static str> {
    LANGUAGES.iter().find(|(_, t)| *t == tag).map(|(label, _)| *label)
}

/// Primary subtag of a BCP 47 tag, e.g. `"es"` for `"es-ES"`.
pub fn primary_language(tag: &str) -> &str {
    tag.split(['-', '_']).next().unwrap_or(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_voice_is_known() {
        assert!(is_known_voice(DEFAULT_VOICE));
        assert_eq!(voice_label(BRITISH_MALE), Some("Ryan (British male)"));
        assert!(!is_known_voice("en-AU-NatashaNeural"));
    }

    #[test]
    fn test_language_lookup() {
        assert!(is_supported_language(DEFAULT_LANGUAGE));
        assert_eq!(language_label("ko-KR"), Some("Korean"));
        assert!(!is_supported_language("xx-YY"));
    }

    #[test]
    fn test_primary_language() {
        assert_eq!(primary_language("zh-CN"), "zh");
        assert_eq!(primary_language("en"), "en");
    }
}
