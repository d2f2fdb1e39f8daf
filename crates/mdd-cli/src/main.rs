use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use mdd_core::*;
use mdd_schema::{MetricScores, PolicyDelta, PollRow, RawTurn, TimelineBlock};

#[derive(Parser)]
#[command(name = "mdd", version, about = "Deliberation quality scoring for meeting transcripts")]
struct Cli {
    #[arg(long, help = "Engine config (YAML); built-in defaults when omitted")]
    config: Option<PathBuf>,

    #[arg(long, help = "Also write daily rolling logs into this directory")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Score a transcript, match policies and optionally export a signature")]
    Analyze {
        #[arg(long, help = "Turn table (YAML/JSON rows of speaker, text, ts_start, ts_end)")]
        transcript: PathBuf,
        #[arg(long, help = "Policy document (corpus -> clause id -> duty/synonyms)")]
        policies: Option<PathBuf>,
        #[arg(long, help = "Live-poll rows (YAML/JSON rows of question, type, votes, top_result)")]
        poll: Option<PathBuf>,
        #[arg(long, help = "Blend the poll participation index into Energy")]
        blend: bool,
        #[arg(long, help = "Write the session signature JSON to this path")]
        out: Option<PathBuf>,
    },
    #[command(about = "Print per-window scores")]
    Timeline {
        #[arg(long)]
        transcript: PathBuf,
    },
    #[command(about = "Print the policy-to-practice delta only")]
    PolicyCheck {
        #[arg(long)]
        transcript: PathBuf,
        #[arg(long)]
        policies: PathBuf,
    },
    #[command(about = "Validate engine config and policy files")]
    Validate {
        #[arg(long)]
        policies: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.log_dir.as_deref())?;

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = match &cli.config {
        Some(path) => load_engine_config(path)?,
        None => EngineConfig::default(),
    };

    match command {
        Commands::Analyze {
            transcript,
            policies,
            poll,
            blend,
            out,
        } => {
            let raw = load_turns(&transcript)?;
            let policies = match policies {
                Some(path) => load_policies(&path)?,
                None => PolicySet::default(),
            };
            let poll_rows = poll
                .map(|path| read_yaml_file::<Vec<PollRow>>(&path))
                .transpose()?;

            let report = analyze_session(
                &raw,
                &policies,
                poll_rows.as_deref(),
                AnalysisOptions {
                    blend_participation: blend,
                },
                &config,
            );

            print_scores(&report.scores);
            if report.blended {
                println!(
                    "Energy adjusted from {:.2} -> {:.2} based on participation.",
                    report.base.energy, report.scores.energy
                );
            }
            if let Some(summary) = &report.poll_summary {
                println!();
                println!(
                    "Poll: {} questions, {} votes, participation index {:.2}",
                    summary.questions, summary.total_votes, summary.participation_index
                );
            }
            println!();
            print_timeline(&report.timeline);
            if !report.pp_delta.is_empty() {
                println!();
                print_policy_delta(&report.pp_delta);
            }

            if let Some(out) = out {
                let digest = save_signature(&report.signature, &out)?;
                println!();
                println!("Saved -> {}", out.display());
                println!("SHA256: {digest}");
            }
        }
        Commands::Timeline { transcript } => {
            let turns = enrich_turns(&load_turns(&transcript)?);
            print_timeline(&timeline(&turns, &config));
        }
        Commands::PolicyCheck {
            transcript,
            policies,
        } => {
            let turns = enrich_turns(&load_turns(&transcript)?);
            let policies = load_policies(&policies)?;
            print_policy_delta(&policy_delta(&turns, &policies, &config.policy));
        }
        Commands::Validate { policies } => {
            config.validate()?;
            match policies {
                Some(path) => {
                    let policies = load_policies(&path)?;
                    println!(
                        "Config valid. {} corpora, {} clauses.",
                        policies.corpora.len(),
                        policies.clause_count()
                    );
                }
                None => println!("Config valid."),
            }
        }
    }

    Ok(())
}

fn init_logging(log_dir: Option<&Path>) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let stderr = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    match log_dir {
        Some(dir) => {
            prepare_log_dir(dir)?;
            let file_appender = tracing_appender::rolling::daily(dir, "mdd.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(stderr)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(non_blocking),
                )
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(stderr)
                .init();
            Ok(None)
        }
    }
}

fn prepare_log_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log dir: {}", dir.display()))
}

fn load_turns(path: &Path) -> Result<Vec<RawTurn>> {
    let mut turns: Vec<RawTurn> = read_yaml_file(path)?;
    for turn in &mut turns {
        if turn.speaker.trim().is_empty() {
            turn.speaker = mdd_core::text::infer_speaker(&turn.text);
        }
    }
    tracing::info!(path = %path.display(), turns = turns.len(), "loaded turn table");
    Ok(turns)
}

fn print_scores(scores: &MetricScores) {
    println!("Energy (E)              {:.2}", scores.energy);
    println!("Symbolic Coherence (s)  {:.2}", scores.coherence);
    println!("Connection² (c2)        {:.2}", scores.connection);
    println!("Impact (I)              {:.2}", scores.impact);
}

fn print_timeline(blocks: &[TimelineBlock]) {
    if blocks.is_empty() {
        println!("Not enough turns for a timeline.");
        return;
    }
    println!("{:<12} {:>6} {:>6} {:>6} {:>6}", "BLOCK_START", "E", "s", "c2", "I");
    for block in blocks {
        let s = &block.scores;
        println!(
            "{:<12} {:>6.2} {:>6.2} {:>6.2} {:>6.2}",
            block.block_start, s.energy, s.coherence, s.connection, s.impact
        );
    }
}

fn print_policy_delta(delta: &PolicyDelta) {
    println!("{:<12} {:<10} {:>5}  DUTY", "CLAUSE", "STATUS", "SCORE");
    for (id, clause) in delta {
        println!(
            "{:<12} {:<10} {:>5.2}  {}",
            id,
            clause.status.to_string(),
            clause.score,
            clause.duty
        );
    }
}
