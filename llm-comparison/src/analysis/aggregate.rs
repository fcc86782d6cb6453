//! Per-(provider, model) aggregation of trial records

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use llm_labs::{round2, Metric, Score};

use crate::trial_log::TrialRecord;

/// Average of one readability index across a group
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub metric: Metric,
    /// Mean over the numeric values; unavailable when there are none
    pub average: Score,
    /// Records where the index was unavailable
    pub missing: usize,
}

/// All records sharing a (provider, model) key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateGroup {
    pub provider: String,
    pub model: String,
    pub trials: usize,
    pub failed: usize,
    pub avg_input_tokens: Option<f64>,
    pub avg_output_tokens: Option<f64>,
    pub avg_response_time: Option<f64>,
    pub metrics: Vec<MetricSummary>,
    #[serde(skip)]
    pub records: Vec<TrialRecord>,
}

impl AggregateGroup {
    fn from_records(provider: String, model: String, records: Vec<TrialRecord>) -> Self {
        let successful: Vec<&TrialRecord> = records.iter().filter(|r| r.is_success()).collect();

        let metrics = Metric::ALL
            .iter()
            .map(|&metric| {
                let scores: Vec<Score> = records.iter().map(|r| r.readability.get(metric)).collect();
                let values: Vec<f64> = scores.iter().filter_map(Score::value).collect();
                MetricSummary {
                    metric,
                    average: mean(&values).map_or(Score::Unavailable, Score::Value),
                    missing: scores.len() - values.len(),
                }
            })
            .collect();

        let input: Vec<f64> = successful.iter().map(|r| r.input_tokens as f64).collect();
        let output: Vec<f64> = successful.iter().map(|r| r.output_tokens as f64).collect();
        let times: Vec<f64> = records.iter().filter_map(|r| r.response_time_seconds).collect();

        Self {
            provider,
            model,
            trials: records.len(),
            failed: records.len() - successful.len(),
            avg_input_tokens: mean(&input),
            avg_output_tokens: mean(&output),
            avg_response_time: mean(&times),
            metrics,
            records,
        }
    }

    /// Display key, `provider::model`
    pub fn key(&self) -> String {
        format!("{}::{}", self.provider, self.model)
    }

    pub fn metric(&self, metric: Metric) -> Option<&MetricSummary> {
        self.metrics.iter().find(|m| m.metric == metric)
    }
}

/// Rounded arithmetic mean; `None` for an empty slice
fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(round2(values.iter().sum::<f64>() / values.len() as f64))
    }
}

/// Group records by (provider, model) in first-seen order
pub fn group_records(records: &[TrialRecord]) -> Vec<AggregateGroup> {
    let mut groups: IndexMap<(String, String), Vec<TrialRecord>> = IndexMap::new();
    for record in records {
        groups
            .entry((record.provider.clone(), record.model.clone()))
            .or_default()
            .push(record.clone());
    }
    groups
        .into_iter()
        .map(|((provider, model), records)| AggregateGroup::from_records(provider, model, records))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm_labs::{PromptType, ReadabilityReport};

    fn record(provider: &str, model: &str, time: Option<f64>, flesch: Score) -> TrialRecord {
        let mut readability = ReadabilityReport::unavailable();
        readability.flesch_reading_ease = flesch;
        TrialRecord {
            provider: provider.into(),
            model: model.into(),
            prompt: "zero_shot".into(),
            prompt_type: PromptType::General,
            input_tokens: 10,
            output_tokens: 30,
            total_tokens: 40,
            response_time_seconds: time,
            response_words: 25,
            readability,
            error: None,
        }
    }

    #[test]
    fn test_groups_keep_first_seen_order() {
        let records = vec![
            record("ollama", "llama3", Some(1.0), Score::Value(60.0)),
            record("groq", "llama-3.1", Some(1.0), Score::Value(60.0)),
            record("ollama", "llama3", Some(1.0), Score::Value(60.0)),
        ];
        let groups = group_records(&records);
        let keys: Vec<String> = groups.iter().map(|g| g.key()).collect();
        assert_eq!(keys, vec!["ollama::llama3", "groq::llama-3.1"]);
        assert_eq!(groups[0].trials, 2);
    }

    #[test]
    fn test_average_ignores_unavailable() {
        let records = vec![
            record("groq", "m", Some(1.0), Score::Value(50.0)),
            record("groq", "m", Some(3.0), Score::Value(71.0)),
            record("groq", "m", None, Score::Unavailable),
        ];
        let group = &group_records(&records)[0];
        assert_eq!(group.avg_response_time, Some(2.0));
        let flesch = group.metric(Metric::FleschReadingEase).unwrap();
        assert_eq!(flesch.average, Score::Value(60.5));
        assert_eq!(flesch.missing, 1);
        let smog = group.metric(Metric::Smog).unwrap();
        assert_eq!(smog.average, Score::Unavailable);
        assert_eq!(smog.missing, 3);
    }

    #[test]
    fn test_failed_records_do_not_dilute_tokens() {
        let mut failed = record("groq", "m", None, Score::Unavailable);
        failed.input_tokens = 0;
        failed.output_tokens = 0;
        failed.error = Some("API error: 500 - boom".into());
        let records = vec![record("groq", "m", Some(2.0), Score::Value(60.0)), failed];
        let group = &group_records(&records)[0];
        assert_eq!(group.failed, 1);
        assert_eq!(group.avg_input_tokens, Some(10.0));
        assert_eq!(group.avg_output_tokens, Some(30.0));
    }
}
