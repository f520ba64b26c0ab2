use crate::cli::args::{Cli, Commands, RunArgs};
use crate::core::engine::{self, RunConfig};
use crate::report;
use crate::report::plots::PlotSelection;
use crate::report::table::Columns;
use anyhow::{Context, Result, bail};
use clap::Parser;
use std::fs;
use std::io;
use std::time::Instant;

pub fn entry() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run(args),
    }
}

fn run(args: RunArgs) -> Result<()> {
    let stats = engine::stats_enabled();
    let t0 = Instant::now();

    if args.fasta.as_os_str() == "-" {
        bail!("stdin is not supported; provide a FASTA file path");
    }
    if !args.fasta.is_file() {
        bail!("input file not found: {}", args.fasta.display());
    }
    if let Some(cov) = &args.coverage {
        if !cov.is_file() {
            bail!("coverage file not found: {}", cov.display());
        }
    }

    let sample_name = match args.sample_name.clone() {
        Some(s) => s,
        None => args
            .fasta
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.to_string())
            .context("failed to determine sample name from input file")?,
    };

    let config = RunConfig {
        fasta: args.fasta.clone(),
        coverage: args.coverage.clone(),
        sample_name: sample_name.clone(),
    };
    let output = engine::run(&config)?;

    let has_coverage = args.coverage.is_some();
    let columns = resolve_columns(&args, has_coverage);
    let plots = resolve_plots(&args, has_coverage);

    let t_table = Instant::now();
    report::table::write(
        &mut io::stdout().lock(),
        &mut io::stderr().lock(),
        &output.corpus,
        &columns,
    )?;
    engine::log_stage(stats, "table", t_table);

    if plots.any() {
        let out_dir = match &args.out {
            Some(dir) => dir.clone(),
            None => bail!("--out is required when plots are requested"),
        };
        let report_dir = out_dir.join(format!("{}_contiglens", sample_name));
        fs::create_dir_all(&report_dir)
            .with_context(|| format!("failed to create output dir {}", report_dir.display()))?;

        let t_plots = Instant::now();
        let rendered = report::plots::render_all(&output.corpus, &plots);
        for plot in &rendered {
            let path = report_dir.join(plot.file);
            if let Err(e) = fs::write(&path, &plot.svg) {
                eprintln!("WARN: failed to write {}: {e}", path.display());
            }
        }
        engine::log_stage(stats, "plots", t_plots);

        let t_html = Instant::now();
        report::html::write(&report_dir.join("report.html"), &output, &rendered)?;
        engine::log_stage(stats, "html", t_html);

        if args.export_pdf {
            let t_pdf = Instant::now();
            report::pdf::export(&report_dir, &rendered)
                .with_context(|| "failed to export PDF plots")?;
            engine::log_stage(stats, "pdf", t_pdf);
        }

        if !args.no_zip {
            let t_zip = Instant::now();
            report::zip::write_zip(&out_dir, &sample_name)
                .with_context(|| "failed to create zip output")?;
            engine::log_stage(stats, "zip", t_zip);
        }
    }

    engine::log_stage(stats, "total", t0);
    Ok(())
}

fn resolve_columns(args: &RunArgs, has_coverage: bool) -> Columns {
    let mut cols = Columns {
        header: args.header,
        length: args.length,
        gc: args.gc,
        ambiguous: args.ambiguous,
        // Coverage is printed whenever a coverage file was supplied.
        coverage: has_coverage,
    };
    if args.all {
        cols.header = true;
        cols.length = true;
        cols.gc = true;
        cols.ambiguous = true;
    }
    cols
}

fn resolve_plots(args: &RunArgs, has_coverage: bool) -> PlotSelection {
    let mut sel = PlotSelection {
        len_gc: args.len_gc_plot,
        cov_gc: args.cov_gc_plot,
        cov_len: args.cov_len_plot,
        len_hist: args.len_histogram,
        cov_hist: args.cov_histogram,
    };
    if args.all {
        sel.len_gc = true;
        sel.len_hist = true;
        if has_coverage {
            sel.cov_gc = true;
            sel.cov_len = true;
            sel.cov_hist = true;
        }
    }
    if !has_coverage {
        let coverage_plots = [
            (&mut sel.cov_gc, "GC against coverage"),
            (&mut sel.cov_len, "coverage against length"),
            (&mut sel.cov_hist, "the coverage histogram"),
        ];
        for (flag, name) in coverage_plots {
            if *flag {
                eprintln!("WARN: cannot plot {name}: no coverage file supplied");
                *flag = false;
            }
        }
    }
    sel
}
