use anyhow::{bail, Context, Result};
use clap::Parser;
use rbc::{FusionEngine, PresentSummary, Run, DEFAULT_DEPTH, DEFAULT_PHI, DEFAULT_RUN_ID};
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "rbc-combine", version, disable_version_flag = true)]
#[command(about = "Fuse TREC runs with rank-biased centroids", long_about = None)]
pub struct Options {
    /// User persistence in the range (0.0, 1.0)
    #[arg(short = 'p', long, default_value_t = DEFAULT_PHI)]
    pub phi: f64,
    /// Rank depth of output
    #[arg(short = 'd', long, default_value_t = DEFAULT_DEPTH)]
    pub depth: usize,
    /// Run identifier written on every output line
    #[arg(short = 'r', long = "run-id", default_value = DEFAULT_RUN_ID)]
    pub run_id: String,
    /// Display version and exit
    #[arg(short = 'v', long, action = clap::ArgAction::Version)]
    version: Option<bool>,
    /// Run files to fuse
    #[arg(required = true, num_args = 2.., value_name = "RUN")]
    pub runs: Vec<PathBuf>,
}

impl Options {
    pub fn new(runs: Vec<PathBuf>) -> Self {
        Self { phi: DEFAULT_PHI, depth: DEFAULT_DEPTH, run_id: DEFAULT_RUN_ID.to_string(), version: None, runs }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.phi > 0.0 && self.phi < 1.0) {
            bail!("persistence must be in (0, 1), got {}", self.phi);
        }
        if self.depth < 1 {
            bail!("depth must be at least 1");
        }
        if self.runs.len() < 2 {
            bail!("at least two run files are required, got {}", self.runs.len());
        }
        Ok(())
    }
}

/// Fuse every run in `opts.runs`, in order, and write the result to `out`.
pub fn combine<W: Write>(opts: &Options, out: &mut W) -> Result<PresentSummary> {
    opts.validate()?;
    let mut engine = FusionEngine::new();

    for path in &opts.runs {
        let run = Run::from_path(path).with_context(|| format!("reading run {}", path.display()))?;
        engine.register_topics(run.topics(), run.docs_per_topic())?;
        engine.extend_weights(opts.phi, run.max_rank() as usize)?;
        let stats = engine
            .accumulate(&run)
            .with_context(|| format!("accumulating run {}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            records = run.len(),
            topics = run.topics().len(),
            max_rank = run.max_rank(),
            skipped = stats.skipped,
            "ingested run"
        );
    }

    let summary = engine.present(out, &opts.run_id, opts.depth)?;
    out.flush()?;
    tracing::info!(
        topics = summary.topics,
        lines = summary.lines,
        late_topics = engine.late_topics().len(),
        weight_depth = engine.weights().len(),
        "fusion complete"
    );
    Ok(summary)
}
