//! Policy-to-practice matching.
//!
//! A policy document maps corpus name -> clause id -> clause. Each clause is
//! scored by phrase presence in the whole discussion: the duty phrase adds
//! `duty_weight`, every synonym present adds `synonym_weight`.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use mdd_schema::{ClauseDelta, ClauseStatus, PolicyDelta, Turn};

use crate::config::{read_yaml_file, PolicyWeights};
use crate::text::{joined_text, normalize_for_match};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyClause {
    pub duty: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
}

impl PolicyClause {
    pub fn new(duty: impl Into<String>, synonyms: &[&str]) -> Self {
        Self {
            duty: duty.into(),
            synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicySet {
    pub corpora: BTreeMap<String, BTreeMap<String, PolicyClause>>,
}

impl PolicySet {
    pub fn insert(&mut self, corpus: &str, clause_id: &str, clause: PolicyClause) {
        self.corpora
            .entry(corpus.to_string())
            .or_default()
            .insert(clause_id.to_string(), clause);
    }

    pub fn clause_count(&self) -> usize {
        self.corpora.values().map(BTreeMap::len).sum()
    }

    /// `(corpus, clause id, clause)` in corpus-name then clause-id order.
    pub fn clauses(&self) -> impl Iterator<Item = (&str, &str, &PolicyClause)> {
        self.corpora.iter().flat_map(|(corpus, clauses)| {
            clauses
                .iter()
                .map(move |(id, clause)| (corpus.as_str(), id.as_str(), clause))
        })
    }

    /// Clause ids must be unique across corpora and every phrase non-empty.
    pub fn validate(&self) -> Result<()> {
        let mut seen: HashMap<&str, &str> = HashMap::new();
        for (corpus, id, clause) in self.clauses() {
            if let Some(previous) = seen.insert(id, corpus) {
                return Err(anyhow!(
                    "duplicate clause id: {id} (in corpora {previous} and {corpus})"
                ));
            }
            if clause.duty.trim().is_empty() {
                return Err(anyhow!("empty duty for clause {corpus}/{id}"));
            }
            if clause.synonyms.iter().any(|s| s.trim().is_empty()) {
                return Err(anyhow!("empty synonym for clause {corpus}/{id}"));
            }
        }
        Ok(())
    }
}

/// Loads and validates a policy document (YAML or JSON).
pub fn load_policies(path: &Path) -> Result<PolicySet> {
    let policies: PolicySet = read_yaml_file(path)?;
    policies
        .validate()
        .with_context(|| format!("invalid policy file: {}", path.display()))?;
    tracing::info!(
        corpora = policies.corpora.len(),
        clauses = policies.clause_count(),
        "loaded policies"
    );
    Ok(policies)
}

/// Scores every clause against the whole discussion, keyed by clause id.
///
/// On an id collision across corpora the clause from the later corpus (by
/// name) wins; `load_policies` rejects such documents up front.
pub fn policy_delta(turns: &[Turn], policies: &PolicySet, weights: &PolicyWeights) -> PolicyDelta {
    let haystack = normalize_for_match(&joined_text(turns));
    let mut delta = PolicyDelta::new();
    for (corpus, id, clause) in policies.clauses() {
        let scored = score_clause(&haystack, clause, weights);
        if delta.insert(id.to_string(), scored).is_some() {
            tracing::warn!(clause = id, corpus, "clause id defined in several corpora, keeping the last");
        }
    }
    delta
}

/// `haystack` must already be normalised with `normalize_for_match`.
pub fn score_clause(haystack: &str, clause: &PolicyClause, weights: &PolicyWeights) -> ClauseDelta {
    let mut raw = 0.0;
    if haystack.contains(&normalize_for_match(&clause.duty)) {
        raw += weights.duty_weight;
    }
    for synonym in &clause.synonyms {
        if haystack.contains(&normalize_for_match(synonym)) {
            raw += weights.synonym_weight;
        }
    }

    let status = if raw >= weights.addressed_threshold {
        ClauseStatus::Addressed
    } else if raw >= weights.ambiguous_threshold {
        ClauseStatus::Ambiguous
    } else {
        ClauseStatus::Ignored
    };

    ClauseDelta {
        duty: clause.duty.clone(),
        status,
        score: round2(raw.min(weights.max_score)),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
