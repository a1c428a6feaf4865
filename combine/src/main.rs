use anyhow::Result;
use clap::Parser;
use combine::{combine, Options};
use std::io::{self, BufWriter};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(io::stderr).init();
    let opts = Options::parse();

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    combine(&opts, &mut out)?;
    Ok(())
}
