use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};

use mdd_schema::{MetricScores, PolicyDelta, PollSummary, SessionMeta, SessionSignature, Turn};

/// Packages one session's results into its exportable record.
pub fn assemble_signature(
    turns: &[Turn],
    metrics: MetricScores,
    pp_delta: PolicyDelta,
    poll_ingested: bool,
    poll_summary: Option<PollSummary>,
    generated_at: DateTime<Utc>,
) -> SessionSignature {
    let speakers = turns
        .iter()
        .map(|turn| turn.speaker.as_str())
        .collect::<HashSet<_>>()
        .len();

    SessionSignature {
        session_meta: SessionMeta {
            generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            turns: turns.len(),
            speakers,
        },
        metrics,
        pp_delta,
        mentimeter_ingested: poll_ingested,
        mentimeter_summary: poll_summary,
    }
}

/// Indented JSON form of the signature; the bytes that get hashed.
pub fn signature_json(signature: &SessionSignature) -> Result<String> {
    serde_json::to_string_pretty(signature).context("failed to serialize session signature")
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// SHA-256 of the signature's serialized form, without writing it anywhere.
pub fn signature_digest(signature: &SessionSignature) -> Result<String> {
    Ok(sha256_hex(signature_json(signature)?.as_bytes()))
}

/// Writes the signature as indented JSON and returns the SHA-256 hex digest
/// of the bytes read back from disk.
pub fn save_signature(signature: &SessionSignature, path: &Path) -> Result<String> {
    let json = signature_json(signature)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, json.as_bytes())
        .with_context(|| format!("failed to write signature: {}", path.display()))?;
    let written = fs::read(path)
        .with_context(|| format!("failed to read back signature: {}", path.display()))?;
    let digest = sha256_hex(&written);
    tracing::info!(path = %path.display(), sha256 = %digest, "saved session signature");
    Ok(digest)
}

pub fn load_signature(path: &Path) -> Result<SessionSignature> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read signature: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse signature: {}", path.display()))
}
