//! The sole persistent entity: a `Record`, plus its `Layer`/`Source` enums.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layer {
    Working,
    ShortTerm,
    LongTerm,
}

impl Layer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Working => "working",
            Layer::ShortTerm => "short-term",
            Layer::LongTerm => "long-term",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "working" => Some(Layer::Working),
            "short-term" => Some(Layer::ShortTerm),
            "long-term" => Some(Layer::LongTerm),
            _ => None,
        }
    }

    /// Initial layer assignment by importance (spec §4.D `store`).
    pub fn by_importance(importance: f64) -> Self {
        if importance >= 0.8 {
            Layer::LongTerm
        } else if importance >= 0.5 {
            Layer::ShortTerm
        } else {
            Layer::Working
        }
    }

    /// The next lower retention tier; `working` has no lower tier.
    pub fn demote(&self) -> Layer {
        match self {
            Layer::LongTerm => Layer::ShortTerm,
            Layer::ShortTerm => Layer::Working,
            Layer::Working => Layer::Working,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    User,
    Agent,
    System,
}

impl Source {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Source::User),
            "agent" => Some(Source::Agent),
            "system" => Some(Source::System),
            _ => None,
        }
    }
}

impl Default for Source {
    fn default() -> Self {
        Source::Agent
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    pub timestamp: i64,
    pub importance: f64,
    pub source: Source,
    pub tags: Vec<String>,
    pub access_count: u64,
    pub last_accessed: i64,
    pub layer: Layer,
}

/// Hard invariant floor: importance never drops below 0.1.
pub const MIN_IMPORTANCE: f64 = 0.1;
pub const MAX_IMPORTANCE: f64 = 1.0;

impl Record {
    pub fn new(content: String, importance: f64, source: Source, tags: Vec<String>, layer: Layer) -> Self {
        let now = now_millis();
        Record {
            id: uuid::Uuid::new_v4().to_string(),
            content,
            embedding: None,
            timestamp: now,
            importance: importance.clamp(MIN_IMPORTANCE, MAX_IMPORTANCE),
            source,
            tags,
            access_count: 0,
            last_accessed: now,
            layer,
        }
    }

    pub fn age_days(&self, now: i64) -> f64 {
        ((now - self.timestamp).max(0) as f64) / 86_400_000.0
    }

    /// `score = importance · exp(−decayRate · a_days/30) + 0.1 · ln(accessCount+1)`
    pub fn memory_score(&self, now: i64, decay_rate: f64) -> f64 {
        let age = self.age_days(now);
        self.importance * (-decay_rate * age / 30.0).exp() + 0.1 * ((self.access_count as f64) + 1.0).ln()
    }
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_layer_mapping() {
        assert_eq!(Layer::by_importance(0.3), Layer::Working);
        assert_eq!(Layer::by_importance(0.6), Layer::ShortTerm);
        assert_eq!(Layer::by_importance(0.9), Layer::LongTerm);
    }

    #[test]
    fn importance_is_clamped_at_construction() {
        let r = Record::new("x".into(), 5.0, Source::Agent, vec![], Layer::Working);
        assert!((r.importance - MAX_IMPORTANCE).abs() < 1e-9);
    }

    #[test]
    fn demote_chain() {
        assert_eq!(Layer::LongTerm.demote(), Layer::ShortTerm);
        assert_eq!(Layer::ShortTerm.demote(), Layer::Working);
        assert_eq!(Layer::Working.demote(), Layer::Working);
    }

    #[test]
    fn memory_score_matches_formula() {
        let mut r = Record::new("x".into(), 1.0, Source::Agent, vec![], Layer::Working);
        r.timestamp = now_millis() - 30 * 86_400_000;
        let score = r.memory_score(now_millis(), 0.1);
        let expected = 1.0 * (-0.1_f64).exp() + 0.1 * (0.0_f64 + 1.0).ln();
        assert!((score - expected).abs() < 1e-6);
    }
}
