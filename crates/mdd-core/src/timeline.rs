use mdd_schema::{TimelineBlock, Turn};

use crate::config::EngineConfig;
use crate::metrics::score_turns;

/// Scores each consecutive, non-overlapping window of
/// `config.timeline.window_turns` turns independently. The last window may be
/// shorter; an empty table yields no blocks.
pub fn timeline(turns: &[Turn], config: &EngineConfig) -> Vec<TimelineBlock> {
    let window = config.timeline.window_turns.max(1);
    turns
        .chunks(window)
        .enumerate()
        .map(|(idx, chunk)| TimelineBlock {
            block_start: idx * window,
            scores: score_turns(chunk, config),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use mdd_schema::RawTurn;

    use super::*;
    use crate::enrich::enrich_turns;

    fn table(len: usize) -> Vec<Turn> {
        let raw: Vec<RawTurn> = (0..len)
            .map(|i| {
                let speaker = if i % 2 == 0 { "Alice" } else { "Bob" };
                RawTurn::new(speaker, format!("Point {i} about the housing budget."))
            })
            .collect();
        enrich_turns(&raw)
    }

    #[test]
    fn empty_table_has_no_blocks() {
        assert!(timeline(&[], &EngineConfig::default()).is_empty());
    }

    #[test]
    fn block_count_is_ceiling_of_windows() {
        let config = EngineConfig::default();
        for (len, expected) in [(1, 1), (19, 1), (20, 1), (21, 2), (45, 3), (60, 3)] {
            assert_eq!(timeline(&table(len), &config).len(), expected, "len = {len}");
        }
    }

    #[test]
    fn block_starts_step_by_window() {
        let blocks = timeline(&table(45), &EngineConfig::default());
        let starts: Vec<usize> = blocks.iter().map(|b| b.block_start).collect();
        assert_eq!(starts, vec![0, 20, 40]);
    }

    #[test]
    fn each_block_matches_scoring_its_window_alone() {
        let config = EngineConfig::default();
        let turns = table(45);
        let blocks = timeline(&turns, &config);
        assert_eq!(blocks[1].scores, score_turns(&turns[20..40], &config));
        // A 5-turn tail still has enough turns for coherence.
        assert_ne!(blocks[2].scores.coherence, config.coherence.fallback);
    }

    #[test]
    fn short_tail_window_uses_coherence_fallback() {
        let config = EngineConfig::default();
        let blocks = timeline(&table(22), &config);
        assert_eq!(blocks[1].scores.coherence, 0.3);
    }
}
