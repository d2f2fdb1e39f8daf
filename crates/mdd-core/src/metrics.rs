//! The four deliberation scores.
//!
//! Every function here is a pure read of a turn table (or any contiguous
//! window of one) plus configuration. Denominators are guarded, so the
//! results are always finite and inside their documented ranges:
//!
//! | score | range | degenerate input |
//! |-------|-------|------------------|
//! | E  | `[0, 1]` | equity is 1.0 with at most one speaker |
//! | s  | `[0, 1]` | `fallback` (0.3) below `min_turns` or with no content terms |
//! | c2 | `[floor, 1]` | floor 0.05 |
//! | I  | `[0, 1]` | |

use std::collections::BTreeMap;

use mdd_schema::{MetricScores, Turn};

use crate::config::{CoherenceConfig, ConnectionConfig, EnergyConfig, EngineConfig};
use crate::readability::flesch_reading_ease;
use crate::text::{joined_text, normalize_for_match};
use crate::tfidf::{median, TfIdfMatrix};

/// Intermediate values behind an Energy score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyBreakdown {
    /// Summed durations, or the token-rate estimate when durations sum to 0.
    pub talk_time_s: f64,
    pub estimated_from_tokens: bool,
    pub norm_time: f64,
    /// Normalised Shannon entropy of per-speaker token shares.
    pub equity: f64,
    pub score: f64,
}

pub fn energy_breakdown(turns: &[Turn], config: &EnergyConfig) -> EnergyBreakdown {
    let total_tokens: usize = turns.iter().map(|turn| turn.tokens).sum();
    let measured: f64 = turns.iter().map(|turn| turn.duration_s).sum();
    let estimated_from_tokens = measured == 0.0;
    let talk_time_s = if estimated_from_tokens {
        total_tokens as f64 / config.tokens_per_second
    } else {
        measured
    };

    let mut per_speaker: BTreeMap<&str, usize> = BTreeMap::new();
    for turn in turns {
        *per_speaker.entry(turn.speaker.as_str()).or_default() += turn.tokens;
    }
    let equity = speaker_equity(per_speaker.values().copied(), total_tokens, per_speaker.len());

    let norm_time = (talk_time_s / config.talk_time_cap_s).min(1.0);
    let score = (config.time_weight * norm_time + (1.0 - config.time_weight) * equity).clamp(0.0, 1.0);

    EnergyBreakdown {
        talk_time_s,
        estimated_from_tokens,
        norm_time,
        equity,
        score,
    }
}

fn speaker_equity(shares: impl Iterator<Item = usize>, total_tokens: usize, speakers: usize) -> f64 {
    let max_entropy = (speakers.max(1) as f64).log2();
    if max_entropy <= 0.0 {
        return 1.0;
    }
    let total = total_tokens.max(1) as f64;
    let entropy: f64 = shares
        .map(|tokens| tokens as f64 / total)
        .filter(|&p| p > 0.0)
        .map(|p| -p * p.log2())
        .sum();
    (entropy / max_entropy).clamp(0.0, 1.0)
}

/// Activity and airtime balance, E.
pub fn energy(turns: &[Turn], config: &EnergyConfig) -> f64 {
    energy_breakdown(turns, config).score
}

/// Intermediate values behind a Symbolic Coherence score. `None` fields mean
/// the fallback applied: the table was too short or had no content terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoherenceBreakdown {
    pub stability: Option<f64>,
    pub readability: Option<f64>,
    pub jargon_hits: usize,
    pub penalty_factor: f64,
    pub score: f64,
}

pub fn coherence_breakdown(turns: &[Turn], config: &CoherenceConfig) -> CoherenceBreakdown {
    let fallback = CoherenceBreakdown {
        stability: None,
        readability: None,
        jargon_hits: 0,
        penalty_factor: 1.0,
        score: config.fallback,
    };
    if turns.len() < config.min_turns {
        return fallback;
    }

    let texts: Vec<&str> = turns.iter().map(|turn| turn.text.as_str()).collect();
    let matrix = TfIdfMatrix::fit(&texts, config.max_features);
    if matrix.vocabulary().is_empty() {
        tracing::debug!(turns = turns.len(), "no content terms, coherence falls back");
        return fallback;
    }
    let stability = median(&matrix.upper_triangle_similarities());

    let joined = joined_text(turns);
    let readability = (flesch_reading_ease(&joined) / 100.0).clamp(0.0, 1.0);

    let haystack = normalize_for_match(&joined);
    let jargon_hits = config
        .jargon
        .iter()
        .filter(|term| haystack.contains(&normalize_for_match(term)))
        .count();
    let penalty_factor =
        1.0 - (jargon_hits as f64 * config.jargon_penalty_per_term).min(config.jargon_penalty_cap);

    let raw = (config.stability_weight * stability + config.readability_weight * readability) * penalty_factor;
    let score = raw.clamp(0.0, 1.0);
    tracing::debug!(stability, readability, jargon_hits, score, "symbolic coherence");

    CoherenceBreakdown {
        stability: Some(stability),
        readability: Some(readability),
        jargon_hits,
        penalty_factor,
        score,
    }
}

/// Thematic stability, readability and jargon avoidance, s.
pub fn symbolic_coherence(turns: &[Turn], config: &CoherenceConfig) -> f64 {
    coherence_breakdown(turns, config).score
}

/// Intermediate values behind a Connection² score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionBreakdown {
    pub misreads: usize,
    /// Markers per 1000 tokens.
    pub misread_rate: f64,
    pub misread_norm: f64,
    /// Share of turns whose text ends with `?`.
    pub question_ratio: f64,
    pub velocity: f64,
    pub score: f64,
}

pub fn connection_breakdown(turns: &[Turn], config: &ConnectionConfig) -> ConnectionBreakdown {
    let haystack = normalize_for_match(&joined_text(turns));
    let misreads: usize = config
        .misread_markers
        .iter()
        .map(|marker| haystack.matches(normalize_for_match(marker).as_str()).count())
        .sum();

    let total_tokens = turns.iter().map(|turn| turn.tokens).sum::<usize>().max(1);
    let misread_rate = misreads as f64 / total_tokens as f64 * 1000.0;
    let misread_norm = (misread_rate / config.misread_saturation_per_1k).min(1.0);

    let questions = turns.iter().filter(|turn| turn.text.ends_with('?')).count();
    let question_ratio = questions as f64 / turns.len().max(1) as f64;
    let velocity = (1.0 - question_ratio).clamp(0.0, 1.0);

    let raw = config.misread_weight * misread_norm + (1.0 - config.misread_weight) * velocity;
    let score = raw.clamp(config.floor, 1.0);
    tracing::debug!(misreads, question_ratio, score, "connection");

    ConnectionBreakdown {
        misreads,
        misread_rate,
        misread_norm,
        question_ratio,
        velocity,
        score,
    }
}

/// Misunderstanding rate and resolution velocity, c2.
pub fn connection(turns: &[Turn], config: &ConnectionConfig) -> f64 {
    connection_breakdown(turns, config).score
}

/// `clip(E * s / c2, 0, 1)`. A non-positive `c2` is treated as the smallest
/// positive value rather than dividing by zero.
pub fn impact(energy: f64, coherence: f64, connection: f64) -> f64 {
    let value = energy * coherence / connection.max(f64::MIN_POSITIVE);
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// All four scores for one table or window.
pub fn score_turns(turns: &[Turn], config: &EngineConfig) -> MetricScores {
    let energy = energy(turns, &config.energy);
    let coherence = symbolic_coherence(turns, &config.coherence);
    let connection = connection(turns, &config.connection);
    MetricScores {
        energy,
        coherence,
        connection,
        impact: impact(energy, coherence, connection),
    }
}
