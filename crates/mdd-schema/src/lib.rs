use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// One utterance as delivered by a transcript producer.
///
/// Timestamps are kept as the producer's strings (`H:MM:SS[.mmm]`); they are
/// only interpreted by the enricher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTurn {
    /// May be left empty by producers that only have `Name: text` lines.
    #[serde(default)]
    pub speaker: String,
    pub text: String,
    #[serde(default)]
    pub ts_start: Option<String>,
    #[serde(default)]
    pub ts_end: Option<String>,
}

impl RawTurn {
    pub fn new(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
            ts_start: None,
            ts_end: None,
        }
    }

    pub fn with_timestamps(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.ts_start = Some(start.into());
        self.ts_end = Some(end.into());
        self
    }
}

/// An enriched turn. Position in the table is transcript order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: String,
    pub text: String,
    #[serde(default)]
    pub ts_start: Option<String>,
    #[serde(default)]
    pub ts_end: Option<String>,
    /// Seconds between `ts_start` and `ts_end`, 0.0 when either is unusable.
    pub duration_s: f64,
    /// Whitespace-delimited word count of `text`.
    pub tokens: usize,
}

/// The four deliberation scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricScores {
    #[serde(rename = "E")]
    pub energy: f64,
    #[serde(rename = "s")]
    pub coherence: f64,
    #[serde(rename = "c2")]
    pub connection: f64,
    #[serde(rename = "I")]
    pub impact: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseStatus {
    Ignored,
    Ambiguous,
    Addressed,
}

impl fmt::Display for ClauseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClauseStatus::Ignored => write!(f, "ignored"),
            ClauseStatus::Ambiguous => write!(f, "ambiguous"),
            ClauseStatus::Addressed => write!(f, "addressed"),
        }
    }
}

/// How well the discussion addressed a single policy clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClauseDelta {
    pub duty: String,
    pub status: ClauseStatus,
    /// Rounded to two decimals, never above the configured ceiling.
    pub score: f64,
}

/// Clause id -> delta, flattened across corpora.
pub type PolicyDelta = BTreeMap<String, ClauseDelta>;

/// Scores recomputed over one contiguous window of turns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimelineBlock {
    /// Index of the first turn in the window.
    pub block_start: usize,
    #[serde(flatten)]
    pub scores: MetricScores,
}

/// One question row from a live-poll export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PollRow {
    #[serde(default)]
    pub question: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub votes: f64,
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub top_result: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollSummary {
    pub questions: usize,
    pub total_votes: u64,
    pub participation_index: f64,
    pub confidence_mean: Option<f64>,
    pub opt_out_selected: Option<bool>,
    pub top_risk: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMeta {
    /// RFC 3339 timestamp of when the signature was assembled.
    pub generated_at: String,
    pub turns: usize,
    pub speakers: usize,
}

/// The exportable record of one analysed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSignature {
    pub session_meta: SessionMeta,
    pub metrics: MetricScores,
    pub pp_delta: PolicyDelta,
    pub mentimeter_ingested: bool,
    pub mentimeter_summary: Option<PollSummary>,
}

// Poll exports carry `top_result` as text, a number, or a yes/no boolean.
fn scalar_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    let value = Option::<Scalar>::deserialize(deserializer)?;
    Ok(value.map(|scalar| match scalar {
        Scalar::Text(text) => text,
        Scalar::Int(n) => n.to_string(),
        Scalar::Float(n) => n.to_string(),
        Scalar::Bool(b) => if b { "yes" } else { "no" }.to_string(),
    }))
}
