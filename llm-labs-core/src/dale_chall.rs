//! Familiar-word list used by the Dale-Chall index

use std::collections::HashSet;

const WORD_LIST: &str = include_str!("../data/dale_chall_words.txt");

/// Suffixes stripped when a word is not found verbatim
const INFLECTIONS: [&str; 9] = ["ies", "es", "s", "ed", "d", "ing", "ly", "er", "est"];

/// Set of words considered familiar to a fourth-grade reader
#[derive(Debug, Clone)]
pub struct FamiliarWords {
    words: HashSet<&'static str>,
}

impl FamiliarWords {
    /// Load the bundled list
    pub fn bundled() -> Self {
        let words = WORD_LIST
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .flat_map(str::split_whitespace)
            .collect();
        Self { words }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Case-insensitive lookup; regular inflections of a listed word count as familiar
    pub fn is_familiar(&self, word: &str) -> bool {
        let lower = word.to_lowercase();
        if self.words.contains(lower.as_str()) {
            return true;
        }
        INFLECTIONS.iter().any(|suffix| {
            lower
                .strip_suffix(suffix)
                .filter(|stem| stem.len() >= 2)
                .is_some_and(|stem| self.stem_is_familiar(stem, suffix))
        })
    }

    fn stem_is_familiar(&self, stem: &str, suffix: &str) -> bool {
        if self.words.contains(stem) {
            return true;
        }
        match suffix {
            // stories -> story
            "ies" => self.words.contains(format!("{}y", stem).as_str()),
            // baked -> bake, nicer -> nice
            "ed" | "er" | "est" | "ing" => {
                self.words.contains(format!("{}e", stem).as_str()) || self.undoubled(stem)
            }
            _ => false,
        }
    }

    // stopped -> stop, running -> run
    fn undoubled(&self, stem: &str) -> bool {
        let mut chars = stem.chars().rev();
        match (chars.next(), chars.next()) {
            (Some(a), Some(b)) if a == b => self.words.contains(&stem[..stem.len() - a.len_utf8()]),
            _ => false,
        }
    }
}

impl Default for FamiliarWords {
    fn default() -> Self {
        Self::bundled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_list_is_loaded() {
        let words = FamiliarWords::bundled();
        assert!(words.len() > 2900);
    }

    #[test]
    fn test_standard_list_entries_are_familiar() {
        let words = FamiliarWords::bundled();
        for w in [
            "ache", "acorn", "acre", "admire", "adventure", "aim", "alike", "alive", "aloud",
            "alphabet", "amount", "angel", "ankle", "appear", "arithmetic", "bedtime", "bonnet",
            "bracelet",
        ] {
            assert!(words.is_familiar(w), "{} should be familiar", w);
        }
    }

    #[test]
    fn test_common_words_are_familiar() {
        let words = FamiliarWords::bundled();
        for w in ["the", "The", "cat", "dog", "house", "water", "school"] {
            assert!(words.is_familiar(w), "{} should be familiar", w);
        }
    }

    #[test]
    fn test_inflections_are_familiar() {
        let words = FamiliarWords::bundled();
        assert!(words.is_familiar("dogs"));
        assert!(words.is_familiar("jumped"));
        assert!(words.is_familiar("running"));
        assert!(words.is_familiar("baked"));
        assert!(words.is_familiar("stories"));
    }

    #[test]
    fn test_technical_words_are_difficult() {
        let words = FamiliarWords::bundled();
        assert!(!words.is_familiar("photosynthesis"));
        assert!(!words.is_familiar("epistemology"));
        assert!(!words.is_familiar("quantization"));
    }
}
