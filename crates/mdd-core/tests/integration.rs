use std::path::PathBuf;

use mdd_core::*;
use mdd_schema::{ClauseStatus, PollRow, RawTurn};

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..")
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn demo_turns() -> Vec<RawTurn> {
    read_yaml_file(&workspace_root().join("demos/council_meeting.yaml")).unwrap()
}

fn demo_poll() -> Vec<PollRow> {
    read_yaml_file(&workspace_root().join("demos/poll.yaml")).unwrap()
}

fn demo_policies() -> PolicySet {
    load_policies(&workspace_root().join("config/policies.yaml")).unwrap()
}

fn synthetic_turns(len: usize) -> Vec<RawTurn> {
    let phrases = [
        "We should review the housing budget?",
        "To be clear, the budget covers repairs.",
        "I disagree with the repair estimate.",
        "Let me clarify the stakeholder synergy point.",
        "Residents asked about transport links.",
    ];
    (0..len)
        .map(|i| {
            let speaker = ["Ana", "Ben", "Cho"][i % 3];
            let start = format!("0:{:02}:{:02}", i / 60, i % 60);
            let end = format!("0:{:02}:{:02}.500", i / 60, i % 60);
            RawTurn::new(speaker, phrases[i % phrases.len()]).with_timestamps(start, end)
        })
        .collect()
}

#[test]
fn scores_stay_in_range_for_assorted_tables() {
    init_tracing();
    let config = EngineConfig::default();
    let tables = vec![
        vec![],
        vec![RawTurn::new("Solo", "")],
        vec![RawTurn::new("A", "Why?"), RawTurn::new("B", "Why not?")],
        synthetic_turns(7),
        synthetic_turns(64),
        demo_turns(),
    ];

    for raw in tables {
        let turns = enrich_turns(&raw);
        let scores = score_turns(&turns, &config);
        for value in [scores.energy, scores.coherence, scores.connection, scores.impact] {
            assert!(value.is_finite());
            assert!((0.0..=1.0).contains(&value), "{scores:?}");
        }
        assert!(scores.connection >= 0.05);
    }
}

#[test]
fn timeline_block_count_matches_window_ceiling() {
    let config = EngineConfig::default();
    for len in [0usize, 1, 20, 21, 64] {
        let turns = enrich_turns(&synthetic_turns(len));
        let blocks = timeline(&turns, &config);
        assert_eq!(blocks.len(), len.div_ceil(20), "len = {len}");
    }
}

#[test]
fn two_turn_transcript_end_to_end() {
    let raw = vec![
        RawTurn::new("Alice", "Alice: Hello, how are you?"),
        RawTurn::new("Bob", "Bob: I'm fine, thanks."),
    ];
    let report = analyze_session(
        &raw,
        &PolicySet::default(),
        None,
        AnalysisOptions::default(),
        &EngineConfig::default(),
    );

    let breakdown = energy_breakdown(&report.turns, &EngineConfig::default().energy);
    assert!(breakdown.estimated_from_tokens);
    assert_eq!(report.scores.coherence, 0.3);
    assert_eq!(report.scores.connection, 0.25);
    let expected = (report.scores.energy * 0.3 / 0.25).clamp(0.0, 1.0);
    assert!((report.scores.impact - expected).abs() < 1e-12);
    assert_eq!(report.timeline.len(), 1);
    assert!(!report.signature.mentimeter_ingested);
    assert!(report.signature.mentimeter_summary.is_none());
}

#[test]
fn demo_meeting_policy_delta() {
    let report = analyze_session(
        &demo_turns(),
        &demo_policies(),
        None,
        AnalysisOptions::default(),
        &EngineConfig::default(),
    );
    let delta = &report.pp_delta;

    assert_eq!(delta.len(), 4);
    assert_eq!(delta["P1"].score, 0.55);
    assert_eq!(delta["P1"].status, ClauseStatus::Ambiguous);
    assert_eq!(delta["P2"].score, 0.75);
    assert_eq!(delta["P2"].status, ClauseStatus::Addressed);
    assert_eq!(delta["C1"].status, ClauseStatus::Ambiguous);
    assert_eq!(delta["C2"].score, 0.0);
    assert_eq!(delta["C2"].status, ClauseStatus::Ignored);
}

#[test]
fn demo_meeting_uses_measured_talk_time() {
    let report = analyze_session(
        &demo_turns(),
        &PolicySet::default(),
        None,
        AnalysisOptions::default(),
        &EngineConfig::default(),
    );
    let breakdown = energy_breakdown(&report.turns, &EngineConfig::default().energy);
    assert!(!breakdown.estimated_from_tokens);
    assert!(breakdown.talk_time_s > 30.0 && breakdown.talk_time_s < 40.0);
    assert_eq!(report.signature.session_meta.turns, 7);
    assert_eq!(report.signature.session_meta.speakers, 3);
}

#[test]
fn blending_is_opt_in_and_keeps_base_scores() {
    let config = EngineConfig::default();
    let poll = demo_poll();

    let plain = analyze_session(
        &demo_turns(),
        &PolicySet::default(),
        Some(poll.as_slice()),
        AnalysisOptions::default(),
        &config,
    );
    assert!(!plain.blended);
    assert_eq!(plain.scores, plain.base);
    assert!(plain.signature.mentimeter_ingested);

    let blended = analyze_session(
        &demo_turns(),
        &PolicySet::default(),
        Some(poll.as_slice()),
        AnalysisOptions {
            blend_participation: true,
        },
        &config,
    );
    assert!(blended.blended);
    assert_eq!(blended.base, plain.base);

    let summary = blended.poll_summary.as_ref().unwrap();
    assert_eq!(summary.total_votes, 34);
    assert_eq!(summary.participation_index, 1.0);
    assert_eq!(summary.confidence_mean, Some(4.0));
    assert_eq!(summary.opt_out_selected, Some(true));
    assert_eq!(summary.top_risk.as_deref(), Some("Data breach"));

    let expected_energy = (0.85 * blended.base.energy + 0.15).min(1.0);
    assert!((blended.scores.energy - expected_energy).abs() < 1e-12);
    assert_eq!(
        blended.scores.impact,
        impact(blended.scores.energy, blended.base.coherence, blended.base.connection)
    );
    assert_eq!(blended.signature.metrics, blended.scores);
}

#[test]
fn empty_poll_export_skips_blend() {
    let report = analyze_session(
        &demo_turns(),
        &PolicySet::default(),
        Some(&[][..]),
        AnalysisOptions {
            blend_participation: true,
        },
        &EngineConfig::default(),
    );
    assert!(!report.blended);
    assert!(report.poll_summary.is_none());
    assert!(report.signature.mentimeter_ingested);
    assert_eq!(report.scores, report.base);
}

#[test]
fn signature_round_trips_through_disk() {
    let report = analyze_session(
        &demo_turns(),
        &demo_policies(),
        Some(demo_poll().as_slice()),
        AnalysisOptions {
            blend_participation: true,
        },
        &EngineConfig::default(),
    );
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("signature.json");

    let digest = save_signature(&report.signature, &path).unwrap();
    let loaded = load_signature(&path).unwrap();

    let (a, b) = (loaded.metrics, report.signature.metrics);
    for (x, y) in [
        (a.energy, b.energy),
        (a.coherence, b.coherence),
        (a.connection, b.connection),
        (a.impact, b.impact),
    ] {
        assert!((x - y).abs() < 1e-12);
    }
    assert_eq!(
        loaded.pp_delta.keys().collect::<Vec<_>>(),
        report.signature.pp_delta.keys().collect::<Vec<_>>()
    );
    for (id, clause) in &loaded.pp_delta {
        assert_eq!(clause.status, report.signature.pp_delta[id].status);
    }
    assert_eq!(digest, sha256_hex(&std::fs::read(&path).unwrap()));
}

#[test]
fn custom_window_from_engine_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engine.yaml");
    std::fs::write(&path, "timeline:\n  window_turns: 5\n").unwrap();
    let config = load_engine_config(&path).unwrap();

    let turns = enrich_turns(&synthetic_turns(12));
    let starts: Vec<usize> = timeline(&turns, &config).iter().map(|b| b.block_start).collect();
    assert_eq!(starts, vec![0, 5, 10]);
}

#[test]
fn invalid_engine_config_is_rejected_at_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engine.yaml");
    std::fs::write(&path, "participation:\n  vote_divisor: 0\n").unwrap();
    let err = load_engine_config(&path).unwrap_err();
    assert!(format!("{err:#}").contains("vote_divisor"));
}
