//! Surface statistics of a text: sentences, words, syllables

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Words with at least this many syllables count as polysyllables
pub const POLYSYLLABLE_MIN: usize = 3;

/// Counts derived from a single text, shared by every readability formula
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStatistics {
    pub sentence_count: usize,
    /// Alphabetic tokens only
    pub word_count: usize,
    pub syllable_count: usize,
    pub polysyllable_count: usize,
    /// Sum of the character lengths of the alphabetic tokens
    pub char_count: usize,
}

/// A word of the analyzed text with its syllable estimate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word<'t> {
    pub text: &'t str,
    pub syllables: usize,
}

impl Word<'_> {
    /// Length in characters
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// A text broken into sentences and words
#[derive(Debug, Clone)]
pub struct AnalyzedText<'t> {
    pub sentence_count: usize,
    pub words: Vec<Word<'t>>,
}

impl AnalyzedText<'_> {
    pub fn statistics(&self) -> TextStatistics {
        TextStatistics {
            sentence_count: self.sentence_count,
            word_count: self.words.len(),
            syllable_count: self.words.iter().map(|w| w.syllables).sum(),
            polysyllable_count: self
                .words
                .iter()
                .filter(|w| w.syllables >= POLYSYLLABLE_MIN)
                .count(),
            char_count: self.words.iter().map(Word::len).sum(),
        }
    }
}

/// Sentence and word segmentation rules
#[derive(Debug, Clone)]
pub struct Segmenter {
    sentence_break: Regex,
    word: Regex,
}

impl Segmenter {
    pub fn new() -> Self {
        Self {
            sentence_break: Regex::new(r#"[.!?]+["'”’)\]]*(?:\s+|$)|\n+"#)
                .expect("sentence pattern is valid"),
            word: Regex::new(r"\p{L}+").expect("word pattern is valid"),
        }
    }

    /// Split into sentences; fragments without a letter are dropped
    pub fn sentences<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.sentence_break
            .split(text)
            .map(str::trim)
            .filter(|s| s.chars().any(char::is_alphabetic))
            .collect()
    }

    pub fn words<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.word.find_iter(text).map(|m| m.as_str()).collect()
    }

    pub fn analyze<'t>(&self, text: &'t str) -> AnalyzedText<'t> {
        AnalyzedText {
            sentence_count: self.sentences(text).len(),
            words: self
                .words(text)
                .into_iter()
                .map(|w| Word {
                    text: w,
                    syllables: count_syllables(w),
                })
                .collect(),
        }
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new()
    }
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y')
}

/// Estimate the syllables of a single word.
///
/// Counts vowel groups, then removes a silent final `e` and the silent
/// vowel of `-es` / `-ed` endings. Every non-empty word has at least one.
pub fn count_syllables(word: &str) -> usize {
    let lower: Vec<char> = word
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_lowercase)
        .collect();

    if lower.is_empty() {
        return 0;
    }
    if lower.len() <= 3 {
        return 1;
    }

    let mut groups: usize = 0;
    let mut in_group = false;
    for (i, &c) in lower.iter().enumerate() {
        // a leading y is a consonant (yes, yellow)
        let vowel = is_vowel(c) && !(c == 'y' && i == 0);
        if vowel && !in_group {
            groups += 1;
        }
        in_group = vowel;
    }

    let n = lower.len();
    let last = lower[n - 1];
    let before_last = lower[n - 2];
    let third_last = lower[n - 3];

    if last == 'e' && !(before_last == 'l' && !is_vowel(third_last)) && !is_vowel(before_last) {
        // make, time; but not table, free
        groups = groups.saturating_sub(1);
    } else if last == 's' && before_last == 'e' && n >= 4 {
        let stem_end = lower[n - 3];
        let sibilant = matches!(stem_end, 's' | 'x' | 'z' | 'c' | 'g')
            || (stem_end == 'h' && matches!(lower[n - 4], 'c' | 's'));
        if !sibilant && !is_vowel(stem_end) {
            // makes, times; but not boxes, houses
            groups = groups.saturating_sub(1);
        }
    } else if last == 'd' && before_last == 'e' && !matches!(third_last, 't' | 'd') && !is_vowel(third_last) {
        // jumped, loved; but not wanted, needed
        groups = groups.saturating_sub(1);
    }

    groups.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syllables_common_words() {
        assert_eq!(count_syllables("cat"), 1);
        assert_eq!(count_syllables("make"), 1);
        assert_eq!(count_syllables("table"), 2);
        assert_eq!(count_syllables("jumped"), 1);
        assert_eq!(count_syllables("wanted"), 2);
        assert_eq!(count_syllables("boxes"), 2);
        assert_eq!(count_syllables("times"), 1);
        assert_eq!(count_syllables("yellow"), 2);
        assert_eq!(count_syllables("beautiful"), 3);
        assert_eq!(count_syllables("information"), 4);
        assert_eq!(count_syllables(""), 0);
    }

    #[test]
    fn test_sentence_segmentation() {
        let seg = Segmenter::new();
        assert_eq!(seg.sentences("The cat sat. The dog ran."), vec!["The cat sat", "The dog ran"]);
        assert_eq!(seg.sentences("Really?! Yes.").len(), 2);
        assert_eq!(seg.sentences("Version 3.5 is out. Try it").len(), 2);
        assert!(seg.sentences("").is_empty());
        assert!(seg.sentences("  ... 42 !").is_empty());
    }

    #[test]
    fn test_line_breaks_end_sentences() {
        let seg = Segmenter::new();
        let text = "Steps\n- mix the flour\n- bake it";
        assert_eq!(seg.sentences(text).len(), 3);
    }

    #[test]
    fn test_words_are_alphabetic_runs() {
        let seg = Segmenter::new();
        assert_eq!(seg.words("It costs $5, or 5 euros!"), vec!["It", "costs", "or", "euros"]);
    }

    #[test]
    fn test_statistics_simple_text() {
        let seg = Segmenter::new();
        let stats = seg.analyze("The cat sat. The dog ran.").statistics();
        assert_eq!(
            stats,
            TextStatistics {
                sentence_count: 2,
                word_count: 6,
                syllable_count: 6,
                polysyllable_count: 0,
                char_count: 18,
            }
        );
    }
}
