//! Property-based and scenario tests for the readability scorer

use proptest::prelude::*;
use llm_labs::{Metric, PromptType, Score, TextAnalysisContext};

thread_local! {
    static CTX: &'static TextAnalysisContext =
        Box::leak(Box::new(TextAnalysisContext::new().expect("context")));
}

fn ctx() -> &'static TextAnalysisContext {
    CTX.with(|c| *c)
}

/// Text without sentence punctuation, line breaks or letters
fn arb_sentenceless_text() -> impl Strategy<Value = String> {
    "[0-9 ,;:+*/()=-]{0,80}"
}

fn arb_prose() -> impl Strategy<Value = String> {
    "[a-zA-Z .,!?'\n]{0,300}"
}

// =========================================================================
// Properties
// =========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn zero_sentences_are_all_unavailable(text in arb_sentenceless_text()) {
        let scored = ctx().scorer().score_with_statistics(&text);
        prop_assert_eq!(scored.statistics.sentence_count, 0);
        for (metric, score) in scored.report.iter() {
            prop_assert_eq!(score, Score::Unavailable, "{} should be unavailable", metric);
        }
    }

    #[test]
    fn counts_are_consistent(text in arb_prose()) {
        let stats = ctx().scorer().statistics(&text);
        let tokens = ctx().token_counter().count(&text);
        prop_assert!(stats.polysyllable_count <= stats.word_count);
        prop_assert!(stats.word_count <= tokens);
        prop_assert!(stats.syllable_count >= stats.word_count);
    }

    #[test]
    fn smog_needs_three_sentences(text in arb_prose()) {
        let scored = ctx().scorer().score_with_statistics(&text);
        if scored.statistics.sentence_count < 3 {
            prop_assert_eq!(scored.report.get(Metric::Smog), Score::Unavailable);
        }
    }

    #[test]
    fn scores_are_finite_and_rounded(text in arb_prose()) {
        let report = ctx().scorer().score(&text);
        for (_, score) in report.iter() {
            if let Score::Value(v) = score {
                prop_assert!(v.is_finite());
                prop_assert!(((v * 100.0).round() - v * 100.0).abs() < 1e-6);
            }
        }
    }
}

// =========================================================================
// Scenarios
// =========================================================================

#[test]
fn simple_text_is_very_easy() {
    let scored = ctx().scorer().score_with_statistics("The cat sat. The dog ran.");
    assert_eq!(scored.statistics.sentence_count, 2);
    assert_eq!(scored.statistics.word_count, 6);
    match scored.report.get(Metric::FleschReadingEase) {
        Score::Value(v) => assert!(v > 80.0, "flesch was {}", v),
        Score::Unavailable => panic!("flesch should be computable"),
    }
    assert_eq!(scored.report.get(Metric::Smog), Score::Unavailable);
    assert!(scored.report.get(Metric::DaleChall).is_available());
}

#[test]
fn empty_text_is_unavailable() {
    let scored = ctx().scorer().score_with_statistics("");
    assert_eq!(scored.statistics.sentence_count, 0);
    assert_eq!(scored.report.get(Metric::FleschReadingEase), Score::Unavailable);
}

#[test]
fn long_technical_text_scores_harder() {
    let easy = "The cat sat on the mat. The dog ran to the park. We had fun in the sun.";
    let hard = "Photosynthetic organisms metabolize atmospheric carbon dioxide. \
                Chlorophyll molecules facilitate electromagnetic absorption. \
                Subsequent biochemical reactions synthesize carbohydrates.";
    let easy_report = ctx().scorer().score(easy);
    let hard_report = ctx().scorer().score(hard);

    let flesch = |r: &llm_labs::ReadabilityReport| r.get(Metric::FleschReadingEase).value().unwrap();
    assert!(flesch(&easy_report) > flesch(&hard_report));
    assert!(hard_report.get(Metric::Smog).is_available());
    let dale = |r: &llm_labs::ReadabilityReport| r.get(Metric::DaleChall).value().unwrap();
    assert!(dale(&hard_report) > dale(&easy_report));
}

#[test]
fn classifier_scenarios() {
    assert_eq!(ctx().classify("Solve this equation for x"), PromptType::Math);
    assert_eq!(ctx().classify("Tell me a story about a dragon"), PromptType::Creative);
    assert_eq!(ctx().classify("What is the capital of France?"), PromptType::Knowledge);
}
