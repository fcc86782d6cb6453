//! Classic readability indices computed from surface statistics
//!
//! Every index is computed independently. A formula whose inputs would
//! divide by zero, or whose validity conditions are not met, yields
//! [`Score::Unavailable`] instead of an error. A text without any sentence
//! has every index unavailable.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::context::TextAnalysisContext;
use crate::dale_chall::FamiliarWords;
use crate::text::{AnalyzedText, TextStatistics, Word, POLYSYLLABLE_MIN};

/// Sample size of the FORCAST formula
pub const FORCAST_SAMPLE: usize = 150;
/// Sample size of the Linsear Write formula
pub const LINSEAR_SAMPLE: usize = 100;
/// Words longer than this many characters count as long (LIX, RIX)
pub const LONG_WORD_CHARS: usize = 6;

/// Marker used for an unavailable value in text output
pub const UNAVAILABLE: &str = "N/A";

/// Value of one readability index
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum Score {
    Value(f64),
    #[default]
    Unavailable,
}

impl Score {
    /// Wrap a raw formula result, rounded to 2 decimals
    pub fn rounded(value: f64) -> Self {
        if value.is_finite() {
            Score::Value(round2(value))
        } else {
            Score::Unavailable
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Score::Value(v) => Some(*v),
            Score::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Score::Value(_))
    }
}

impl From<Option<f64>> for Score {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Score::Unavailable, Score::Value)
    }
}

impl From<Score> for Option<f64> {
    fn from(score: Score) -> Self {
        score.value()
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Value(v) => write!(f, "{}", v),
            Score::Unavailable => f.write_str(UNAVAILABLE),
        }
    }
}

impl FromStr for Score {
    type Err = std::num::ParseFloatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(UNAVAILABLE) {
            return Ok(Score::Unavailable);
        }
        s.parse::<f64>().map(Score::from_parsed)
    }
}

impl Score {
    fn from_parsed(v: f64) -> Self {
        if v.is_finite() {
            Score::Value(v)
        } else {
            Score::Unavailable
        }
    }
}

/// Round to 2 decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The ten supported readability indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    FleschReadingEase,
    Smog,
    ColemanLiau,
    GunningFog,
    AutomatedReadability,
    DaleChall,
    Forcast,
    LinsearWrite,
    Lix,
    Rix,
}

impl Metric {
    pub const ALL: [Metric; 10] = [
        Metric::FleschReadingEase,
        Metric::Smog,
        Metric::ColemanLiau,
        Metric::GunningFog,
        Metric::AutomatedReadability,
        Metric::DaleChall,
        Metric::Forcast,
        Metric::LinsearWrite,
        Metric::Lix,
        Metric::Rix,
    ];

    /// Label used in the trial log (`<label>: <value>`)
    pub fn log_label(&self) -> &'static str {
        match self {
            Metric::FleschReadingEase => "Flesch Score",
            Metric::Smog => "SMOG Index",
            Metric::ColemanLiau => "Coleman-Liau Index",
            Metric::GunningFog => "Gunning Fog Index",
            Metric::AutomatedReadability => "Automated Readability Index",
            Metric::DaleChall => "Dale-Chall",
            Metric::Forcast => "FORCAST",
            Metric::LinsearWrite => "Linsear Write",
            Metric::Lix => "LIX",
            Metric::Rix => "RIX",
        }
    }

    /// Human-readable name used in reports
    pub fn display_name(&self) -> &'static str {
        match self {
            Metric::FleschReadingEase => "Flesch Reading Ease",
            Metric::Smog => "SMOG Index",
            Metric::ColemanLiau => "Coleman-Liau Index",
            Metric::GunningFog => "Gunning Fog Index",
            Metric::AutomatedReadability => "Automated Readability Index (ARI)",
            Metric::DaleChall => "Dale-Chall Index",
            Metric::Forcast => "FORCAST Index",
            Metric::LinsearWrite => "Linsear Write Index",
            Metric::Lix => "LIX",
            Metric::Rix => "RIX",
        }
    }

    pub fn higher_is_better(&self) -> bool {
        matches!(self, Metric::FleschReadingEase)
    }

    /// Static guidance printed next to the metric in reports
    pub fn interpretation(&self) -> &'static str {
        match self {
            Metric::FleschReadingEase => {
                "Higher is better (easier to read). 90-100 = very easy, 60-70 = standard, 0-30 = very difficult."
            }
            Metric::Smog => {
                "Lower is better (years of education needed). 7-9 = easily understood, >12 = college level."
            }
            Metric::ColemanLiau => {
                "Lower is better (grade level required). 8-10 = middle school, >12 = high school or college."
            }
            Metric::GunningFog => {
                "Lower is better (years of formal education). 7-8 = near-universal readability, 12+ = college level."
            }
            Metric::AutomatedReadability => {
                "Lower is better (grade level). 1-6 = elementary, 7-12 = middle/high school, 13+ = college level."
            }
            Metric::DaleChall => {
                "Lower is better (familiar vocabulary). <8 = easy, 8-10 = medium, >10 = difficult."
            }
            Metric::Forcast => {
                "Lower is better (technical text grade level). 9-10 = plain English, >12 = complex."
            }
            Metric::LinsearWrite => {
                "Lower is better (technical readability). <20 = easy, 20-30 = standard, >30 = difficult."
            }
            Metric::Lix => {
                "Lower is better (text density). <30 = very easy, 30-40 = easy, 40-50 = standard, 50+ = difficult."
            }
            Metric::Rix => {
                "Lower is better (long words per sentence). <2 = easy, 2-5 = standard, >5 = difficult."
            }
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// All ten indices for one text
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadabilityReport {
    pub flesch_reading_ease: Score,
    pub smog_index: Score,
    pub coleman_liau_index: Score,
    pub gunning_fog_index: Score,
    pub automated_readability_index: Score,
    pub dale_chall_index: Score,
    pub forcast_index: Score,
    pub linsear_write_index: Score,
    pub lix: Score,
    pub rix: Score,
}

impl ReadabilityReport {
    /// Report with every index unavailable
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn get(&self, metric: Metric) -> Score {
        match metric {
            Metric::FleschReadingEase => self.flesch_reading_ease,
            Metric::Smog => self.smog_index,
            Metric::ColemanLiau => self.coleman_liau_index,
            Metric::GunningFog => self.gunning_fog_index,
            Metric::AutomatedReadability => self.automated_readability_index,
            Metric::DaleChall => self.dale_chall_index,
            Metric::Forcast => self.forcast_index,
            Metric::LinsearWrite => self.linsear_write_index,
            Metric::Lix => self.lix,
            Metric::Rix => self.rix,
        }
    }

    pub fn set(&mut self, metric: Metric, score: Score) {
        let slot = match metric {
            Metric::FleschReadingEase => &mut self.flesch_reading_ease,
            Metric::Smog => &mut self.smog_index,
            Metric::ColemanLiau => &mut self.coleman_liau_index,
            Metric::GunningFog => &mut self.gunning_fog_index,
            Metric::AutomatedReadability => &mut self.automated_readability_index,
            Metric::DaleChall => &mut self.dale_chall_index,
            Metric::Forcast => &mut self.forcast_index,
            Metric::LinsearWrite => &mut self.linsear_write_index,
            Metric::Lix => &mut self.lix,
            Metric::Rix => &mut self.rix,
        };
        *slot = score;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, Score)> + '_ {
        Metric::ALL.iter().map(move |&m| (m, self.get(m)))
    }
}

/// Readability scores together with the statistics they were derived from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredText {
    pub statistics: TextStatistics,
    pub report: ReadabilityReport,
}

/// Computes [`ReadabilityReport`]s using the resources of a context
pub struct ReadabilityScorer<'ctx> {
    ctx: &'ctx TextAnalysisContext,
}

impl<'ctx> ReadabilityScorer<'ctx> {
    pub fn new(ctx: &'ctx TextAnalysisContext) -> Self {
        Self { ctx }
    }

    pub fn statistics(&self, text: &str) -> TextStatistics {
        self.ctx.segmenter().analyze(text).statistics()
    }

    /// Score a text. Never fails.
    pub fn score(&self, text: &str) -> ReadabilityReport {
        self.score_with_statistics(text).report
    }

    pub fn score_with_statistics(&self, text: &str) -> ScoredText {
        let analyzed = self.ctx.segmenter().analyze(text);
        let statistics = analyzed.statistics();

        let report = if statistics.sentence_count == 0 {
            ReadabilityReport::unavailable()
        } else {
            compute_all(&analyzed, &statistics, self.ctx.familiar_words())
        };

        ScoredText { statistics, report }
    }
}

fn compute_all(
    analyzed: &AnalyzedText<'_>,
    stats: &TextStatistics,
    familiar: &FamiliarWords,
) -> ReadabilityReport {
    let words = &analyzed.words;
    let long_words = words.iter().filter(|w| w.len() > LONG_WORD_CHARS).count();
    let difficult = words.iter().filter(|w| !familiar.is_familiar(w.text)).count();

    ReadabilityReport {
        flesch_reading_ease: flesch_reading_ease(stats),
        smog_index: smog(stats),
        coleman_liau_index: coleman_liau(stats),
        gunning_fog_index: gunning_fog(stats),
        automated_readability_index: automated_readability(stats),
        dale_chall_index: dale_chall(stats, difficult),
        forcast_index: forcast(words),
        linsear_write_index: linsear_write(words, stats.sentence_count),
        lix: lix(stats, long_words),
        rix: rix(stats, long_words),
    }
}

fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    (denominator > 0).then(|| numerator as f64 / denominator as f64)
}

pub fn flesch_reading_ease(s: &TextStatistics) -> Score {
    match (ratio(s.word_count, s.sentence_count), ratio(s.syllable_count, s.word_count)) {
        (Some(wps), Some(spw)) => Score::rounded(206.835 - 1.015 * wps - 84.6 * spw),
        _ => Score::Unavailable,
    }
}

pub fn smog(s: &TextStatistics) -> Score {
    if s.sentence_count < 3 || s.polysyllable_count == 0 {
        return Score::Unavailable;
    }
    let scaled = s.polysyllable_count as f64 * 30.0 / s.sentence_count as f64;
    Score::rounded(1.0430 * scaled.sqrt() + 3.1291)
}

pub fn coleman_liau(s: &TextStatistics) -> Score {
    if s.sentence_count == 0 {
        return Score::Unavailable;
    }
    match (ratio(s.char_count, s.word_count), ratio(s.sentence_count, s.word_count)) {
        (Some(l), Some(sw)) => Score::rounded(0.0588 * (l * 100.0) - 0.296 * (sw * 100.0) - 15.8),
        _ => Score::Unavailable,
    }
}

pub fn gunning_fog(s: &TextStatistics) -> Score {
    match (ratio(s.word_count, s.sentence_count), ratio(s.polysyllable_count, s.word_count)) {
        (Some(wps), Some(complex)) => Score::rounded(0.4 * (wps + 100.0 * complex)),
        _ => Score::Unavailable,
    }
}

pub fn automated_readability(s: &TextStatistics) -> Score {
    match (ratio(s.char_count, s.word_count), ratio(s.word_count, s.sentence_count)) {
        (Some(cpw), Some(wps)) => Score::rounded(4.71 * cpw + 0.5 * wps - 21.43),
        _ => Score::Unavailable,
    }
}

pub fn dale_chall(s: &TextStatistics, difficult_words: usize) -> Score {
    match (ratio(difficult_words, s.word_count), ratio(s.word_count, s.sentence_count)) {
        (Some(difficult), Some(wps)) => {
            let pct_difficult = difficult * 100.0;
            let mut score = 0.1579 * pct_difficult + 0.0496 * wps;
            if pct_difficult > 5.0 {
                score += 3.6365;
            }
            Score::rounded(score)
        }
        _ => Score::Unavailable,
    }
}

/// Uses the first 150 words, or all of them when the text is shorter
pub fn forcast(words: &[Word<'_>]) -> Score {
    let sample = &words[..words.len().min(FORCAST_SAMPLE)];
    let monosyllables = sample.iter().filter(|w| w.syllables == 1).count();
    Score::rounded(20.0 - monosyllables as f64 / 10.0)
}

/// Uses the first 100 words; the sentence count is floored at 1
pub fn linsear_write(words: &[Word<'_>], sentence_count: usize) -> Score {
    let sample = &words[..words.len().min(LINSEAR_SAMPLE)];
    let hard = sample.iter().filter(|w| w.syllables >= POLYSYLLABLE_MIN).count();
    let easy = sample.len() - hard;
    let raw = (easy + 3 * hard) as f64 / sentence_count.max(1) as f64;
    let score = if raw > 20.0 { raw / 2.0 } else { raw - 2.0 };
    Score::rounded(score)
}

pub fn lix(s: &TextStatistics, long_words: usize) -> Score {
    match ratio(long_words, s.word_count) {
        Some(long) => {
            let wps = s.word_count as f64 / s.sentence_count.max(1) as f64;
            Score::rounded(wps + 100.0 * long)
        }
        None => Score::Unavailable,
    }
}

pub fn rix(s: &TextStatistics, long_words: usize) -> Score {
    Score::rounded(long_words as f64 / s.sentence_count.max(1) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(sentences: usize, words: usize, syllables: usize, poly: usize, chars: usize) -> TextStatistics {
        TextStatistics {
            sentence_count: sentences,
            word_count: words,
            syllable_count: syllables,
            polysyllable_count: poly,
            char_count: chars,
        }
    }

    #[test]
    fn test_flesch_simple_sentences() {
        let s = stats(2, 6, 6, 0, 18);
        assert_eq!(flesch_reading_ease(&s), Score::Value(119.19));
    }

    #[test]
    fn test_formulas_guard_zero_counts() {
        let empty = stats(0, 0, 0, 0, 0);
        assert_eq!(flesch_reading_ease(&empty), Score::Unavailable);
        assert_eq!(coleman_liau(&empty), Score::Unavailable);
        assert_eq!(gunning_fog(&empty), Score::Unavailable);
        assert_eq!(automated_readability(&empty), Score::Unavailable);
        assert_eq!(dale_chall(&empty, 0), Score::Unavailable);
        assert_eq!(lix(&empty, 0), Score::Unavailable);
    }

    #[test]
    fn test_smog_needs_three_sentences() {
        assert_eq!(smog(&stats(2, 40, 80, 10, 200)), Score::Unavailable);
        assert_eq!(smog(&stats(3, 40, 80, 0, 200)), Score::Unavailable);
        // 1.043 * sqrt(3 * 30 / 3) + 3.1291
        assert_eq!(smog(&stats(3, 40, 80, 3, 200)), Score::Value(8.84));
    }

    #[test]
    fn test_coleman_liau_and_ari() {
        let s = stats(2, 10, 14, 1, 50);
        // L = 500, S = 20
        assert_eq!(coleman_liau(&s), Score::Value(7.68));
        // 4.71 * 5 + 0.5 * 5 - 21.43
        assert_eq!(automated_readability(&s), Score::Value(4.62));
    }

    #[test]
    fn test_gunning_fog() {
        // 0.4 * (10 + 100 * 0.1)
        assert_eq!(gunning_fog(&stats(2, 20, 30, 2, 90)), Score::Value(8.0));
    }

    #[test]
    fn test_dale_chall_adjustment_above_five_percent() {
        let s = stats(2, 20, 20, 0, 60);
        // no difficult words: 0.0496 * 10
        assert_eq!(dale_chall(&s, 0), Score::Value(0.5));
        // 10% difficult: 1.579 + 0.496 + 3.6365
        assert_eq!(dale_chall(&s, 2), Score::Value(5.71));
    }

    #[test]
    fn test_linsear_write_branches() {
        let short: Vec<Word> = (0..10).map(|_| Word { text: "cat", syllables: 1 }).collect();
        // 10 / 1 = 10 -> 10 - 2
        assert_eq!(linsear_write(&short, 1), Score::Value(8.0));

        let long: Vec<Word> = (0..30).map(|_| Word { text: "animal", syllables: 3 }).collect();
        // 90 / 2 = 45 -> 45 / 2
        assert_eq!(linsear_write(&long, 2), Score::Value(22.5));
        // zero sentences are floored at one
        assert_eq!(linsear_write(&short, 0), Score::Value(8.0));
    }

    #[test]
    fn test_forcast_uses_available_words() {
        let words: Vec<Word> = (0..40).map(|_| Word { text: "dog", syllables: 1 }).collect();
        assert_eq!(forcast(&words), Score::Value(16.0));

        let many: Vec<Word> = (0..400).map(|_| Word { text: "dog", syllables: 1 }).collect();
        assert_eq!(forcast(&many), Score::Value(5.0));
    }

    #[test]
    fn test_lix_and_rix() {
        let s = stats(2, 10, 12, 0, 40);
        // 5 + 100 * 0.3
        assert_eq!(lix(&s, 3), Score::Value(35.0));
        assert_eq!(rix(&s, 3), Score::Value(1.5));
        assert_eq!(rix(&stats(0, 0, 0, 0, 0), 0), Score::Value(0.0));
    }

    #[test]
    fn test_score_parse_and_display() {
        assert_eq!("N/A".parse::<Score>().unwrap(), Score::Unavailable);
        assert_eq!("-12.5".parse::<Score>().unwrap(), Score::Value(-12.5));
        assert!("abc".parse::<Score>().is_err());
        assert_eq!(Score::Value(61.2).to_string(), "61.2");
        assert_eq!(Score::Unavailable.to_string(), "N/A");
    }

    #[test]
    fn test_score_serializes_as_nullable_number() {
        let json = serde_json::to_string(&Score::Unavailable).unwrap();
        assert_eq!(json, "null");
        let back: Score = serde_json::from_str("4.25").unwrap();
        assert_eq!(back, Score::Value(4.25));
    }

    #[test]
    fn test_report_get_set_roundtrip() {
        let mut report = ReadabilityReport::unavailable();
        report.set(Metric::Lix, Score::Value(40.0));
        assert_eq!(report.get(Metric::Lix), Score::Value(40.0));
        assert_eq!(report.iter().filter(|(_, s)| s.is_available()).count(), 1);
    }
}
