use std::{fs, path::Path};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

/// Every heuristic knob and lexicon the engine reads.
///
/// Each section defaults independently, so a YAML file only needs to name
/// the values it overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub energy: EnergyConfig,
    #[serde(default)]
    pub coherence: CoherenceConfig,
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub timeline: TimelineConfig,
    #[serde(default)]
    pub participation: ParticipationConfig,
    #[serde(default)]
    pub policy: PolicyWeights,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyConfig {
    /// Talk time (seconds) at which the time component saturates. 90 minutes.
    pub talk_time_cap_s: f64,
    /// Speaking rate used to estimate talk time when no durations exist.
    pub tokens_per_second: f64,
    /// Share of E taken by the time component; equity gets the remainder.
    pub time_weight: f64,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            talk_time_cap_s: 90.0 * 60.0,
            tokens_per_second: 2.5,
            time_weight: 0.5,
        }
    }
}

fn default_jargon() -> Vec<String> {
    [
        "operationalise",
        "utilise",
        "stakeholder",
        "synergy",
        "bandwidth",
        "scalable",
        "frameworking",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoherenceConfig {
    /// Tables shorter than this score `fallback`.
    pub min_turns: usize,
    pub fallback: f64,
    /// Vocabulary cap for the term weighting, most frequent terms kept.
    pub max_features: usize,
    pub stability_weight: f64,
    pub readability_weight: f64,
    pub jargon: Vec<String>,
    pub jargon_penalty_per_term: f64,
    pub jargon_penalty_cap: f64,
}

impl Default for CoherenceConfig {
    fn default() -> Self {
        Self {
            min_turns: 3,
            fallback: 0.3,
            max_features: 5000,
            stability_weight: 0.6,
            readability_weight: 0.4,
            jargon: default_jargon(),
            jargon_penalty_per_term: 0.05,
            jargon_penalty_cap: 0.4,
        }
    }
}

fn default_misread_markers() -> Vec<String> {
    [
        "that's not what i said",
        "you've misunderstood",
        "to be clear",
        "let me clarify",
        "i disagree",
        "misinterpret",
        "that’s incorrect",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Phrases signalling a misunderstanding. Apostrophes are folded before
    /// matching, so either quote style may be used here.
    pub misread_markers: Vec<String>,
    /// Markers per 1000 tokens at which the distortion term saturates.
    pub misread_saturation_per_1k: f64,
    pub misread_weight: f64,
    pub floor: f64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            misread_markers: default_misread_markers(),
            misread_saturation_per_1k: 5.0,
            misread_weight: 0.5,
            floor: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    pub window_turns: usize,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self { window_turns: 20 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticipationConfig {
    /// Vote count treated as full participation (expected audience size).
    pub vote_divisor: f64,
    /// Share of the blended E taken from the participation index.
    pub blend_weight: f64,
}

impl Default for ParticipationConfig {
    fn default() -> Self {
        Self {
            vote_divisor: 30.0,
            blend_weight: 0.15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyWeights {
    pub duty_weight: f64,
    pub synonym_weight: f64,
    pub max_score: f64,
    pub addressed_threshold: f64,
    pub ambiguous_threshold: f64,
}

impl Default for PolicyWeights {
    fn default() -> Self {
        Self {
            duty_weight: 0.35,
            synonym_weight: 0.2,
            max_score: 0.99,
            addressed_threshold: 0.7,
            ambiguous_threshold: 0.4,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        let energy = &self.energy;
        check_positive("energy.talk_time_cap_s", energy.talk_time_cap_s)?;
        check_positive("energy.tokens_per_second", energy.tokens_per_second)?;
        check_unit("energy.time_weight", energy.time_weight)?;

        let coherence = &self.coherence;
        if coherence.max_features == 0 {
            return Err(anyhow!("coherence.max_features must be > 0"));
        }
        check_unit("coherence.fallback", coherence.fallback)?;
        check_unit("coherence.stability_weight", coherence.stability_weight)?;
        check_unit("coherence.readability_weight", coherence.readability_weight)?;
        check_unit(
            "coherence.jargon_penalty_per_term",
            coherence.jargon_penalty_per_term,
        )?;
        check_unit("coherence.jargon_penalty_cap", coherence.jargon_penalty_cap)?;
        check_phrases("coherence.jargon", &coherence.jargon)?;

        let connection = &self.connection;
        check_positive(
            "connection.misread_saturation_per_1k",
            connection.misread_saturation_per_1k,
        )?;
        check_unit("connection.misread_weight", connection.misread_weight)?;
        if !(connection.floor > 0.0 && connection.floor <= 1.0) {
            return Err(anyhow!(
                "connection.floor must be in (0, 1], got {}",
                connection.floor
            ));
        }
        check_phrases("connection.misread_markers", &connection.misread_markers)?;

        if self.timeline.window_turns == 0 {
            return Err(anyhow!("timeline.window_turns must be > 0"));
        }

        check_positive("participation.vote_divisor", self.participation.vote_divisor)?;
        check_unit("participation.blend_weight", self.participation.blend_weight)?;

        let policy = &self.policy;
        check_unit("policy.max_score", policy.max_score)?;
        check_non_negative("policy.duty_weight", policy.duty_weight)?;
        check_non_negative("policy.synonym_weight", policy.synonym_weight)?;
        check_unit("policy.addressed_threshold", policy.addressed_threshold)?;
        check_unit("policy.ambiguous_threshold", policy.ambiguous_threshold)?;
        if policy.ambiguous_threshold > policy.addressed_threshold {
            return Err(anyhow!(
                "policy.ambiguous_threshold ({}) exceeds policy.addressed_threshold ({})",
                policy.ambiguous_threshold,
                policy.addressed_threshold
            ));
        }

        Ok(())
    }
}

fn check_unit(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(anyhow!("{name} must be in [0, 1], got {value}"));
    }
    Ok(())
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if !(value.is_finite() && value > 0.0) {
        return Err(anyhow!("{name} must be a finite number > 0, got {value}"));
    }
    Ok(())
}

fn check_non_negative(name: &str, value: f64) -> Result<()> {
    if !(value.is_finite() && value >= 0.0) {
        return Err(anyhow!("{name} must be a finite number >= 0, got {value}"));
    }
    Ok(())
}

fn check_phrases(name: &str, phrases: &[String]) -> Result<()> {
    if phrases.iter().any(|phrase| phrase.trim().is_empty()) {
        return Err(anyhow!("{name} contains an empty phrase"));
    }
    Ok(())
}

pub fn load_engine_config(path: &Path) -> Result<EngineConfig> {
    let config: EngineConfig = read_yaml_file(path)?;
    config
        .validate()
        .with_context(|| format!("invalid engine config: {}", path.display()))?;
    Ok(config)
}

/// Reads a YAML (or JSON) document into `T`.
pub fn read_yaml_file<T>(path: &Path) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse yaml file: {}", path.display()))
}
