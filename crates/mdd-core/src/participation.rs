//! Live-poll summary and its optional fusion into Energy.

use mdd_schema::{MetricScores, PollRow, PollSummary};

use crate::config::ParticipationConfig;
use crate::metrics::impact;

/// Summarises a poll export. `None` when there are no rows, meaning the
/// participation signal is absent.
pub fn summarize_poll(rows: &[PollRow], config: &ParticipationConfig) -> Option<PollSummary> {
    if rows.is_empty() {
        return None;
    }

    // Negative or NaN counts are export noise, not withdrawn votes.
    let votes: f64 = rows
        .iter()
        .map(|row| if row.votes.is_finite() && row.votes > 0.0 { row.votes } else { 0.0 })
        .sum();
    let participation_index = (votes / config.vote_divisor).min(1.0);

    let scale_values: Vec<f64> = rows
        .iter()
        .filter(|row| contains_ignore_case(&row.kind, "scale"))
        .filter_map(|row| row.top_result.as_deref()?.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .collect();
    let confidence_mean = (!scale_values.is_empty())
        .then(|| scale_values.iter().sum::<f64>() / scale_values.len() as f64);

    let opt_out_selected = rows
        .iter()
        .find(|row| contains_ignore_case(&row.kind, "yes"))
        .map(|row| {
            row.top_result
                .as_deref()
                .is_some_and(|top| top.trim().eq_ignore_ascii_case("yes"))
        });

    let top_risk = rows
        .iter()
        .find(|row| contains_ignore_case(&row.kind, "multiple") && contains_ignore_case(&row.question, "risk"))
        .and_then(|row| row.top_result.clone());

    let summary = PollSummary {
        questions: rows.len(),
        total_votes: votes as u64,
        participation_index,
        confidence_mean,
        opt_out_selected,
        top_risk,
    };
    tracing::info!(
        questions = summary.questions,
        total_votes = summary.total_votes,
        participation_index,
        "summarised poll export"
    );
    Some(summary)
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Folds a participation index into E and recomputes I.
///
/// `E' = min(1, (1 - w) * E + w * p)` with `w = blend_weight`. Always pass
/// the pre-blend scores: blending already-blended scores compounds.
pub fn blend_participation(
    base: &MetricScores,
    participation: f64,
    config: &ParticipationConfig,
) -> MetricScores {
    let p = participation.clamp(0.0, 1.0);
    let weight = config.blend_weight;
    let energy = ((1.0 - weight) * base.energy + weight * p).min(1.0);
    MetricScores {
        energy,
        impact: impact(energy, base.coherence, base.connection),
        ..*base
    }
}
