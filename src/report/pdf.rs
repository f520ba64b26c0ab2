use crate::report::plots::RenderedPlot;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use svg2pdf::usvg;
use svg2pdf::{ConversionOptions, PageOptions};

/// Converts each rendered plot to a PDF next to its SVG.
pub fn export(dir: &Path, plots: &[RenderedPlot]) -> Result<()> {
    for plot in plots {
        let pdf = svg_to_pdf(&plot.svg)
            .with_context(|| format!("failed to convert {} to PDF", plot.file))?;
        let name = plot.file.strip_suffix(".svg").unwrap_or(plot.file);
        let path = dir.join(format!("{}.pdf", name));
        fs::write(&path, pdf).with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(())
}

fn svg_to_pdf(svg: &str) -> Result<Vec<u8>> {
    let opt = usvg::Options::default();
    let tree =
        usvg::Tree::from_str(svg, &opt).map_err(|e| anyhow::anyhow!("usvg parse failed: {e}"))?;
    let pdf = svg2pdf::to_pdf(&tree, ConversionOptions::default(), PageOptions::default())
        .map_err(|e| anyhow::anyhow!("svg2pdf conversion failed: {e}"))?;
    Ok(pdf)
}
