use crate::core::engine::RunOutput;
use crate::report::plots::RenderedPlot;
use anyhow::{Context, Result};
use std::fmt::Write;
use std::fs;
use std::path::Path;

/// Writes the one-page overview: basic statistics plus the rendered plots.
pub fn write(path: &Path, output: &RunOutput, plots: &[RenderedPlot]) -> Result<()> {
    let mut html = String::with_capacity(64 * 1024);

    writeln!(html, "<!DOCTYPE html>")?;
    writeln!(html, "<html lang=\"en\">")?;
    writeln!(html, "<head>")?;
    writeln!(html, "<meta charset=\"utf-8\"/>")?;
    writeln!(
        html,
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"/>"
    )?;
    writeln!(html, "<title>contiglens report: {}</title>", output.sample_name)?;
    writeln!(html, "<style>")?;
    writeln!(
        html,
        "body{{font-family:Arial,Helvetica,sans-serif;margin:0;background:#eee;color:#222;}}"
    )?;
    writeln!(
        html,
        ".main{{max-width:1000px;margin:16px auto;background:#fff;border:1px solid #ddd;border-radius:4px;box-shadow:0 1px 3px rgba(0,0,0,0.08);padding:16px 20px;}}"
    )?;
    writeln!(html, "h1{{margin:0 0 6px 0;font-size:22px;}}")?;
    writeln!(html, "h2{{margin:20px 0 6px 0;font-size:18px;}}")?;
    writeln!(
        html,
        ".meta{{color:#555;font-size:12px;margin-bottom:12px;}}"
    )?;
    writeln!(
        html,
        ".module{{padding:8px 0 14px 0;border-bottom:1px solid #eee;}}"
    )?;
    writeln!(html, ".module:last-child{{border-bottom:none;}}")?;
    writeln!(html, ".plot{{margin:8px 0 6px 0;}}")?;
    writeln!(
        html,
        ".bs-table{{border-collapse:collapse;font-size:12px;width:420px;}}"
    )?;
    writeln!(
        html,
        ".bs-table th{{background:#3b6ea5;color:#fff;text-align:left;padding:4px 6px;border:1px solid #2f5a86;}}"
    )?;
    writeln!(
        html,
        ".bs-table td{{border:1px solid #ddd;padding:4px 6px;text-align:left;}}"
    )?;
    writeln!(html, "svg{{background:#fafafa;border:1px solid #e5e5e5;}}")?;
    writeln!(html, "</style>")?;
    writeln!(html, "</head>")?;
    writeln!(html, "<body>")?;
    writeln!(html, "<div class=\"main\">")?;
    writeln!(html, "<h1>contiglens report: {}</h1>", output.sample_name)?;
    writeln!(
        html,
        "<div class=\"meta\">Input: {} &middot; {} contigs</div>",
        output.file_name,
        fmt_int(output.corpus.len() as u64)
    )?;

    write_basic_stats(&mut html, output)?;

    for plot in plots {
        writeln!(html, "<section class=\"module\">")?;
        writeln!(html, "<h2>{}</h2>", plot.title)?;
        writeln!(html, "<div class=\"plot\">")?;
        html.push_str(&plot.svg);
        writeln!(html, "</div>")?;
        writeln!(html, "</section>")?;
    }

    writeln!(html, "</div>")?;
    writeln!(html, "</body>")?;
    writeln!(html, "</html>")?;

    fs::write(path, html).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn write_basic_stats(html: &mut String, output: &RunOutput) -> Result<()> {
    let corpus = &output.corpus;
    let mut total_bases = 0u64;
    let mut min_len = usize::MAX;
    let mut max_len = 0usize;
    let mut gc_total = 0u64;
    let mut at_total = 0u64;
    let mut covered = 0usize;
    for contig in corpus.iter() {
        let len = contig.length();
        total_bases += len as u64;
        min_len = min_len.min(len);
        max_len = max_len.max(len);
        let (gc, at) = contig.counted_bases();
        gc_total += gc;
        at_total += at;
        if !contig.coverage().is_nan() {
            covered += 1;
        }
    }
    let mean_len = if corpus.is_empty() {
        0.0
    } else {
        total_bases as f64 / corpus.len() as f64
    };
    let overall_gc = if gc_total + at_total == 0 {
        "NaN".to_string()
    } else {
        format!("{:.1}", gc_total as f64 / (gc_total + at_total) as f64 * 100.0)
    };

    writeln!(html, "<section class=\"module\">")?;
    writeln!(html, "<h2>Basic Statistics</h2>")?;
    writeln!(html, "<table class=\"bs-table\">")?;
    writeln!(html, "<tr><th>Measure</th><th>Value</th></tr>")?;
    writeln!(html, "<tr><td>Filename</td><td>{}</td></tr>", output.file_name)?;
    writeln!(
        html,
        "<tr><td>Total contigs</td><td>{}</td></tr>",
        fmt_int(corpus.len() as u64)
    )?;
    writeln!(
        html,
        "<tr><td>Total bases</td><td>{}</td></tr>",
        fmt_int(total_bases)
    )?;
    if !corpus.is_empty() {
        if min_len == max_len {
            writeln!(html, "<tr><td>Contig length</td><td>{}</td></tr>", min_len)?;
        } else {
            writeln!(
                html,
                "<tr><td>Contig length</td><td>{}-{}</td></tr>",
                min_len, max_len
            )?;
        }
        writeln!(
            html,
            "<tr><td>Mean length</td><td>{:.1}</td></tr>",
            mean_len
        )?;
    }
    writeln!(html, "<tr><td>%GC</td><td>{}</td></tr>", overall_gc)?;
    if output.merge.is_some() {
        writeln!(
            html,
            "<tr><td>Contigs with coverage</td><td>{}</td></tr>",
            fmt_int(covered as u64)
        )?;
    }
    writeln!(html, "</table>")?;
    writeln!(html, "</section>")?;
    Ok(())
}

fn fmt_int(v: u64) -> String {
    let s = v.to_string();
    let mut out = String::with_capacity(s.len() + s.len() / 3);
    let len = s.len();
    for (i, ch) in s.chars().enumerate() {
        if i != 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fmt_int_groups_thousands() {
        assert_eq!(fmt_int(0), "0");
        assert_eq!(fmt_int(999), "999");
        assert_eq!(fmt_int(1000), "1,000");
        assert_eq!(fmt_int(1234567), "1,234,567");
    }
}
