use crate::core::corpus::{self, Corpus, LoadConfig, MergeAnomaly, MergeOutcome};
use anyhow::{Context, Result};
use std::fs::File;
use std::path::PathBuf;
use std::time::{Duration, Instant};

pub struct RunConfig {
    pub fasta: PathBuf,
    pub coverage: Option<PathBuf>,
    pub sample_name: String,
}

pub struct RunOutput {
    pub corpus: Corpus,
    pub merge: Option<MergeOutcome>,
    pub file_name: String,
    pub sample_name: String,
}

/// Loads the corpus and, when a coverage file was supplied, merges it in.
/// Only resource acquisition is fatal here; per-line annotation anomalies
/// become stderr diagnostics and the run continues.
pub fn run(cfg: &RunConfig) -> Result<RunOutput> {
    let stats = stats_enabled();
    let t_total = Instant::now();

    let file_name = cfg
        .fasta
        .file_name()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
        .context("failed to determine input filename")?;

    let t_load = Instant::now();
    let input = File::open(&cfg.fasta)
        .with_context(|| format!("failed to open {}", cfg.fasta.display()))?;
    let mut corpus = corpus::load_records(input, &LoadConfig::default())?;
    log_stage(stats, "engine.load_records", t_load);

    let merge = match &cfg.coverage {
        Some(path) => {
            let t_merge = Instant::now();
            let input =
                File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
            let outcome = corpus::merge_annotations(input, &mut corpus)?;
            log_stage(stats, "engine.merge_annotations", t_merge);
            for anomaly in &outcome.anomalies {
                match anomaly {
                    MergeAnomaly::Unmatched { line, id } => {
                        eprintln!("WARN: coverage line {line}: no contig named {id:?}");
                    }
                    MergeAnomaly::Malformed { line } => {
                        eprintln!("WARN: coverage line {line}: expected identifier<TAB>value");
                    }
                }
            }
            Some(outcome)
        }
        None => None,
    };

    if stats {
        eprintln!(
            "CONTIGLENS_STATS contigs={} annotated={}",
            corpus.len(),
            merge.as_ref().map(|m| m.applied).unwrap_or(0)
        );
    }
    log_stage(stats, "engine.total", t_total);

    Ok(RunOutput {
        corpus,
        merge,
        file_name,
        sample_name: cfg.sample_name.clone(),
    })
}

pub fn stats_enabled() -> bool {
    matches!(std::env::var("CONTIGLENS_STATS").as_deref(), Ok("1"))
}

pub fn log_stage(stats: bool, name: &str, t: Instant) {
    if stats {
        eprintln!("CONTIGLENS_STATS stage={} time={}", name, fmt_dur(t.elapsed()));
    }
}

pub fn fmt_dur(d: Duration) -> String {
    if d.as_secs_f64() < 1.0 {
        format!("{}ms", d.as_millis())
    } else {
        format!("{:.3}s", d.as_secs_f64())
    }
}
