use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "contiglens", version, about = "Contig-level stats and plots for FASTA assemblies")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    Run(RunArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// Assembly in FASTA format.
    pub fasta: PathBuf,

    /// Coverage file (identifier and coverage separated by tab).
    pub coverage: Option<PathBuf>,

    /// Output directory for plots and the report; required when plots are requested.
    #[arg(long)]
    pub out: Option<PathBuf>,

    #[arg(long)]
    pub sample_name: Option<String>,

    /// Print contig identifiers.
    #[arg(long)]
    pub header: bool,

    /// Print contig lengths.
    #[arg(long)]
    pub length: bool,

    /// Print the GC content of each contig.
    #[arg(long)]
    pub gc: bool,

    /// Print the number of ambiguous bases in each contig.
    #[arg(long)]
    pub ambiguous: bool,

    /// Plot GC content against length.
    #[arg(long)]
    pub len_gc_plot: bool,

    /// Plot GC content against coverage.
    #[arg(long)]
    pub cov_gc_plot: bool,

    /// Plot coverage against length.
    #[arg(long)]
    pub cov_len_plot: bool,

    /// Histogram over length.
    #[arg(long)]
    pub len_histogram: bool,

    /// Histogram over coverage.
    #[arg(long)]
    pub cov_histogram: bool,

    /// Shortcut enabling every metric and plot.
    #[arg(long)]
    pub all: bool,

    #[arg(long, default_value_t = false)]
    pub no_zip: bool,

    /// Also export each plot as PDF.
    #[arg(long, default_value_t = false)]
    pub export_pdf: bool,
}
