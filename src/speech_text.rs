use regex::Regex;

/// Line-level rules, run over the whole reply first.
const BLOCK_RULES: &[(&str, &str)] = &[
    (r"```[A-Za-z0-9_+-]*", ""),
    (r"(?m)^[ \t]{0,3}#{1,6}[ \t]*", ""),
];

/// Inline markdown rules, applied in order to text outside code spans.
/// Images go before links so the leading `!` does not survive, and bold goes
/// before italic. Emphasis needs a non-space just inside each delimiter, so
/// "2 * 3 * 4" stays arithmetic.
const INLINE_RULES: &[(&str, &str)] = &[
    (r"!\[([^\]]*)\]\([^)]*\)", "$1"),
    (r"\[([^\]]+)\]\([^)]*\)", "$1"),
    (r"\*\*([^\s*](?:[^*]*[^\s*])?)\*\*", "$1"),
    (r"__([^\s_](?:[^_]*[^\s_])?)__", "$1"),
    (r"\*([^\s*](?:[^*]*[^\s*])?)\*", "$1"),
    (r"\b_([^\s_](?:[^_]*[^\s_])?)_\b", "$1"),
];

fn compile(rules: &[(&str, &'static str)]) -> Result<Vec<(Regex, &'static str)>, regex::Error> {
    rules
        .iter()
        .map(|(pattern, replacement)| Ok((Regex::new(pattern)?, *replacement)))
        .collect()
}

/// Turns a markdown reply into plain text fit for speech synthesis.
pub struct SpeechCleaner {
    block: Vec<(Regex, &'static str)>,
    inline: Vec<(Regex, &'static str)>,
    code_span: Regex,
    whitespace: Regex,
}

impl SpeechCleaner {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            block: compile(BLOCK_RULES)?,
            inline: compile(INLINE_RULES)?,
            code_span: Regex::new(r"`([^`]*)`")?,
            whitespace: Regex::new(r"\s+")?,
        })
    }

    pub fn clean(&self, text: &str) -> String {
        let text = apply(&self.block, text);

        // Code span contents are spoken verbatim
        let mut result = String::with_capacity(text.len());
        let mut last = 0;
        for caps in self.code_span.captures_iter(&text) {
            let (Some(span), Some(inner)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            result.push_str(&apply(&self.inline, &text[last..span.start()]));
            result.push_str(inner.as_str());
            last = span.end();
        }
        result.push_str(&apply(&self.inline, &text[last..]));

        self.whitespace.replace_all(&result, " ").trim().to_string()
    }
}

fn apply(rules: &[(Regex, &'static str)], text: &str) -> String {
    let mut result = text.to_string();
    for (pattern, replacement) in rules {
        result = pattern.replace_all(&result, *replacement).to_string();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(text: &str) -> String {
        SpeechCleaner::new().unwrap().clean(text)
    }

    #[test]
    fn test_strips_emphasis() {
        assert_eq!(clean("This is **bold** and *italic*"), "This is bold and italic");
        assert_eq!(clean("__strong__ and _soft_"), "strong and soft");
    }

    #[test]
    fn test_keeps_snake_case_identifiers() {
        assert_eq!(clean("call my_function_name now"), "call my_function_name now");
    }

    #[test]
    fn test_strips_headers() {
        assert_eq!(clean("# Title\n## Subtitle\nBody"), "Title Subtitle Body");
    }

    #[test]
    fn test_keeps_link_label() {
        assert_eq!(
            clean("See [the docs](https://example.com/docs) for more"),
            "See the docs for more"
        );
        assert_eq!(clean("![a cat](cat.png)"), "a cat");
    }

    #[test]
    fn test_strips_code_spans_and_fences() {
        assert_eq!(clean("Run `cargo test` first"), "Run cargo test first");
        assert_eq!(clean("```rust\nfn main() {}\n```"), "fn main() {}");
    }

    #[test]
    fn test_keeps_arithmetic_operators() {
        assert_eq!(clean("5 * 3 = 15 and 2 * 4 = 8"), "5 * 3 = 15 and 2 * 4 = 8");
        assert_eq!(clean("a _ b _ c"), "a _ b _ c");
    }

    #[test]
    fn test_code_span_contents_are_verbatim() {
        assert_eq!(clean("Use `a*b*c` here"), "Use a*b*c here");
        assert_eq!(clean("`__init__` and *this*"), "__init__ and this");
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(clean("  one\n\n two\t\tthree  "), "one two three");
    }

    #[test]
    fn test_combined_reply() {
        let reply = "# Tips\n\n- Use **elixir** wisely\n- Read [this guide](http://x.io)\n\nGood `luck`!";
        assert_eq!(
            clean(reply),
            "Tips - Use elixir wisely - Read this guide Good luck!"
        );
    }

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(clean("Hello world."), "Hello world.");
    }
}
