//! Keyword-based prompt categorization

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse intent category of a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PromptType {
    Math,
    Creative,
    Reasoning,
    Knowledge,
    #[default]
    General,
}

/// Keyword sets in precedence order; the first set with a match wins
const KEYWORDS: [(PromptType, &[&str]); 4] = [
    (PromptType::Math, &["prove", "solve", "equation", "math", "calculate"]),
    (PromptType::Creative, &["story", "poem", "imagine", "creative"]),
    (PromptType::Reasoning, &["why", "how", "explain", "analyze", "reason"]),
    (PromptType::Knowledge, &["when", "where", "what", "who", "define", "describe"]),
];

impl PromptType {
    pub const ALL: [PromptType; 5] = [
        PromptType::Math,
        PromptType::Creative,
        PromptType::Reasoning,
        PromptType::Knowledge,
        PromptType::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PromptType::Math => "Math",
            PromptType::Creative => "Creative",
            PromptType::Reasoning => "Reasoning",
            PromptType::Knowledge => "Knowledge",
            PromptType::General => "General",
        }
    }
}

impl fmt::Display for PromptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PromptType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown prompt type: {}", s))
    }
}

/// Categorize a prompt by case-insensitive substring match.
///
/// Matching is on substrings, so "however" counts as Reasoning and
/// "somewhat" as Knowledge.
pub fn classify(prompt: &str) -> PromptType {
    let lower = prompt.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map_or(PromptType::General, |(kind, _)| *kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_examples() {
        assert_eq!(classify("Solve this equation for x"), PromptType::Math);
        assert_eq!(classify("Tell me a story about a dragon"), PromptType::Creative);
        assert_eq!(classify("What is the capital of France?"), PromptType::Knowledge);
        assert_eq!(classify("Explain the result"), PromptType::Reasoning);
        assert_eq!(classify("Hello there"), PromptType::General);
    }

    #[test]
    fn test_classify_precedence() {
        // math beats reasoning
        assert_eq!(classify("Explain how to solve it"), PromptType::Math);
        // creative beats knowledge
        assert_eq!(classify("What story do you like?"), PromptType::Creative);
        // reasoning beats knowledge
        assert_eq!(classify("Who knows why?"), PromptType::Reasoning);
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(classify("CALCULATE THE AREA"), PromptType::Math);
        assert_eq!(classify(""), PromptType::General);
    }

    #[test]
    fn test_prompt_type_parse() {
        assert_eq!("knowledge".parse::<PromptType>().unwrap(), PromptType::Knowledge);
        assert_eq!(" Math ".parse::<PromptType>().unwrap(), PromptType::Math);
        assert!("poetry".parse::<PromptType>().is_err());
    }
}
