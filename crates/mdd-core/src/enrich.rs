use mdd_schema::{RawTurn, Turn};

use crate::text::whitespace_token_count;

/// Derives `duration_s` and `tokens` for every turn, preserving order.
pub fn enrich_turns(raw: &[RawTurn]) -> Vec<Turn> {
    let turns: Vec<Turn> = raw.iter().map(enrich_turn).collect();
    let timed = turns.iter().filter(|turn| turn.duration_s > 0.0).count();
    tracing::debug!(turns = turns.len(), timed, "enriched turn table");
    turns
}

pub fn enrich_turn(raw: &RawTurn) -> Turn {
    Turn {
        speaker: raw.speaker.clone(),
        text: raw.text.clone(),
        ts_start: raw.ts_start.clone(),
        ts_end: raw.ts_end.clone(),
        duration_s: duration_seconds(raw.ts_start.as_deref(), raw.ts_end.as_deref()),
        tokens: whitespace_token_count(&raw.text),
    }
}

/// `max(0, end - start)`, or 0.0 when either side is missing or malformed.
pub fn duration_seconds(start: Option<&str>, end: Option<&str>) -> f64 {
    match (start.and_then(parse_timestamp), end.and_then(parse_timestamp)) {
        (Some(a), Some(b)) => (b - a).max(0.0),
        _ => {
            if start.is_some() && end.is_some() {
                tracing::warn!(?start, ?end, "unparseable turn timestamps, duration set to 0");
            }
            0.0
        }
    }
}

/// Parses `H:MM:SS[.fff]` into seconds.
pub fn parse_timestamp(raw: &str) -> Option<f64> {
    let mut parts = raw.split(':');
    let (Some(h), Some(m), Some(s), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };

    let hours: i64 = h.trim().parse().ok()?;
    let minutes: i64 = m.trim().parse().ok()?;
    let seconds: f64 = s.trim().parse().ok()?;
    if !seconds.is_finite() {
        return None;
    }

    Some(hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_timestamp_accepts_fractional_seconds() {
        assert_eq!(parse_timestamp("00:00:01.500"), Some(1.5));
        assert_eq!(parse_timestamp("1:02:03"), Some(3723.0));
        assert_eq!(parse_timestamp("0:00:05.250000"), Some(5.25));
    }

    #[test]
    fn parse_timestamp_rejects_malformed_input() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("01:30"), None);
        assert_eq!(parse_timestamp("00:00:01,500"), None);
        assert_eq!(parse_timestamp("1:2:3:4"), None);
        assert_eq!(parse_timestamp("aa:00:01"), None);
        assert_eq!(parse_timestamp("00:00:nan"), None);
    }

    #[test]
    fn duration_is_zero_when_a_timestamp_is_missing_or_bad() {
        assert_eq!(duration_seconds(None, Some("00:00:05.000")), 0.0);
        assert_eq!(duration_seconds(Some("00:00:01.000"), None), 0.0);
        assert_eq!(duration_seconds(Some("garbage"), Some("00:00:05.000")), 0.0);
    }

    #[test]
    fn duration_never_goes_negative() {
        assert_eq!(duration_seconds(Some("00:00:09.000"), Some("00:00:05.000")), 0.0);
        assert_eq!(duration_seconds(Some("00:00:01.000"), Some("00:00:05.500")), 4.5);
    }

    #[test]
    fn enrich_turns_counts_tokens_and_preserves_order() {
        let raw = vec![
            RawTurn::new("Alice", "Hello, how are you?"),
            RawTurn::new("Bob", "I'm fine, thanks.").with_timestamps("00:00:02.000", "00:00:04.000"),
            RawTurn::new("Carol", ""),
        ];
        let turns = enrich_turns(&raw);

        assert_eq!(
            turns.iter().map(|t| t.speaker.as_str()).collect::<Vec<_>>(),
            vec!["Alice", "Bob", "Carol"]
        );
        assert_eq!(
            turns.iter().map(|t| t.tokens).collect::<Vec<_>>(),
            vec![4, 3, 0]
        );
        assert_eq!(turns[0].duration_s, 0.0);
        assert_eq!(turns[1].duration_s, 2.0);
    }
}
