//! Composes the pure steps into one analysis of a session.

use chrono::Utc;

use mdd_schema::{
    MetricScores, PolicyDelta, PollRow, PollSummary, RawTurn, SessionSignature, TimelineBlock,
    Turn,
};

use crate::config::EngineConfig;
use crate::enrich::enrich_turns;
use crate::metrics::score_turns;
use crate::participation::{blend_participation, summarize_poll};
use crate::policy::{policy_delta, PolicySet};
use crate::signature::assemble_signature;
use crate::timeline::timeline;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisOptions {
    /// Fold the poll participation index into Energy when a poll is present.
    pub blend_participation: bool,
}

#[derive(Debug, Clone)]
pub struct SessionReport {
    pub turns: Vec<Turn>,
    /// Scores before any participation blend.
    pub base: MetricScores,
    /// Scores reported and exported; equal to `base` unless blended.
    pub scores: MetricScores,
    pub blended: bool,
    pub timeline: Vec<TimelineBlock>,
    pub pp_delta: PolicyDelta,
    pub poll_summary: Option<PollSummary>,
    pub signature: SessionSignature,
}

/// Runs enrich, scoring, timeline, policy matching and the opt-in blend.
///
/// `poll` is `None` when no export was supplied; an empty export counts as
/// ingested but carries no participation signal, so nothing is blended.
pub fn analyze_session(
    raw_turns: &[RawTurn],
    policies: &PolicySet,
    poll: Option<&[PollRow]>,
    options: AnalysisOptions,
    config: &EngineConfig,
) -> SessionReport {
    let turns = enrich_turns(raw_turns);
    let base = score_turns(&turns, config);
    let timeline = timeline(&turns, config);
    let pp_delta = policy_delta(&turns, policies, &config.policy);

    let poll_summary = poll.and_then(|rows| summarize_poll(rows, &config.participation));
    let (scores, blended) = match (&poll_summary, options.blend_participation) {
        (Some(summary), true) => {
            let scores = blend_participation(&base, summary.participation_index, &config.participation);
            tracing::info!(
                before = base.energy,
                after = scores.energy,
                "energy adjusted for participation"
            );
            (scores, true)
        }
        _ => (base, false),
    };

    tracing::info!(
        turns = turns.len(),
        energy = scores.energy,
        coherence = scores.coherence,
        connection = scores.connection,
        impact = scores.impact,
        blocks = timeline.len(),
        clauses = pp_delta.len(),
        "session analysed"
    );

    let signature = assemble_signature(
        &turns,
        scores,
        pp_delta.clone(),
        poll.is_some(),
        poll_summary.clone(),
        Utc::now(),
    );

    SessionReport {
        turns,
        base,
        scores,
        blended,
        timeline,
        pp_delta,
        poll_summary,
        signature,
    }
}
