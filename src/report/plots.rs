use crate::core::corpus::Corpus;
use crate::core::series::{MetricKind, Series, scatter, values};
use anyhow::Result;
use std::fmt::Write;

// Size classes used to split the coverage scatters into legend series.
pub const LENGTH_SMALL: f64 = 10_000.0;
pub const LENGTH_LARGE: f64 = 100_000.0;
pub const GC_SMALL: f64 = 40.0;
pub const GC_LARGE: f64 = 55.0;

// Log-spaced histogram bins over 10^0.1 .. 10^7.
const HIST_BINS: usize = 200;
const HIST_LOG_MIN: f64 = 0.1;
const HIST_LOG_MAX: f64 = 7.0;

const PLOT_W: f64 = 760.0;
const PLOT_H: f64 = 420.0;

const CLASS_COLORS: [&str; 3] = ["#222222", "#3b6ea5", "#cc3333"];
const SINGLE_COLOR: &str = "#3b6ea5";

#[derive(Clone, Copy, Debug, Default)]
pub struct PlotSelection {
    pub len_gc: bool,
    pub cov_gc: bool,
    pub cov_len: bool,
    pub len_hist: bool,
    pub cov_hist: bool,
}

impl PlotSelection {
    pub fn any(&self) -> bool {
        self.len_gc || self.cov_gc || self.cov_len || self.len_hist || self.cov_hist
    }
}

#[derive(Clone, Debug)]
pub struct RenderedPlot {
    pub file: &'static str,
    pub title: &'static str,
    pub svg: String,
}

/// Renders every selected plot. A plot that fails to render is reported to
/// stderr and dropped; the rest of the run continues.
pub fn render_all(corpus: &Corpus, selection: &PlotSelection) -> Vec<RenderedPlot> {
    type Render = fn(&Corpus) -> Result<String>;
    let jobs: [(bool, &'static str, &'static str, Render); 5] = [
        (selection.len_gc, "len_gc.svg", "GC - Length", len_gc_svg),
        (selection.cov_gc, "cov_gc.svg", "Coverage - GC", cov_gc_svg),
        (selection.cov_len, "cov_len.svg", "Length - Coverage", cov_len_svg),
        (selection.len_hist, "len_hist.svg", "Length histogram", len_hist_svg),
        (selection.cov_hist, "cov_hist.svg", "Coverage histogram", cov_hist_svg),
    ];

    let mut rendered = Vec::new();
    for (enabled, file, title, render) in jobs {
        if !enabled {
            continue;
        }
        match render(corpus) {
            Ok(svg) => rendered.push(RenderedPlot { file, title, svg }),
            Err(e) => eprintln!("WARN: failed to render {title}: {e:#}"),
        }
    }
    rendered
}

fn len_gc_svg(corpus: &Corpus) -> Result<String> {
    let series = scatter(corpus, MetricKind::Length, MetricKind::GcRatio);
    svg_scatter(
        &[(series, SINGLE_COLOR, None)],
        "GC - Length",
        MetricKind::Length.axis_label(),
        MetricKind::GcRatio.axis_label(),
    )
}

fn cov_gc_svg(corpus: &Corpus) -> Result<String> {
    let [small, mid, large] = classed_scatter(
        corpus,
        MetricKind::Coverage,
        MetricKind::GcRatio,
        MetricKind::Length,
        LENGTH_SMALL,
        LENGTH_LARGE,
    );
    svg_scatter(
        &[
            (small, CLASS_COLORS[0], Some(format!("< {} bp", LENGTH_SMALL))),
            (
                mid,
                CLASS_COLORS[1],
                Some(format!("{} - {} bp", LENGTH_SMALL, LENGTH_LARGE)),
            ),
            (large, CLASS_COLORS[2], Some(format!("> {} bp", LENGTH_LARGE))),
        ],
        "Coverage - GC",
        MetricKind::Coverage.axis_label(),
        MetricKind::GcRatio.axis_label(),
    )
}

fn cov_len_svg(corpus: &Corpus) -> Result<String> {
    let [low, mid, high] = classed_scatter(
        corpus,
        MetricKind::Coverage,
        MetricKind::Length,
        MetricKind::GcRatio,
        GC_SMALL,
        GC_LARGE,
    );
    svg_scatter(
        &[
            (low, CLASS_COLORS[0], Some(format!("GC < {} %", GC_SMALL))),
            (
                mid,
                CLASS_COLORS[1],
                Some(format!("GC {} - {} %", GC_SMALL, GC_LARGE)),
            ),
            (high, CLASS_COLORS[2], Some(format!("GC > {} %", GC_LARGE))),
        ],
        "Length - Coverage",
        MetricKind::Coverage.axis_label(),
        MetricKind::Length.axis_label(),
    )
}

fn len_hist_svg(corpus: &Corpus) -> Result<String> {
    let data = values(corpus, MetricKind::Length);
    svg_log_histogram(&data, "Length histogram", MetricKind::Length.axis_label())
}

fn cov_hist_svg(corpus: &Corpus) -> Result<String> {
    let data = values(corpus, MetricKind::Coverage);
    svg_log_histogram(&data, "Coverage histogram", MetricKind::Coverage.axis_label())
}

/// Splits the (x, y) scatter into three series by a third metric:
/// below `lo`, between `lo` and `hi` inclusive, above `hi`. Points with an
/// undefined coordinate or class metric are omitted.
fn classed_scatter(
    corpus: &Corpus,
    x: MetricKind,
    y: MetricKind,
    class: MetricKind,
    lo: f64,
    hi: f64,
) -> [Series; 3] {
    let mut out = [Series::default(), Series::default(), Series::default()];
    for contig in corpus.iter() {
        let (xv, yv, cv) = (x.value(contig), y.value(contig), class.value(contig));
        if xv.is_nan() || yv.is_nan() || cv.is_nan() {
            continue;
        }
        let idx = if cv < lo {
            0
        } else if cv <= hi {
            1
        } else {
            2
        };
        out[idx].push(xv, yv, contig.id());
    }
    out
}

fn svg_scatter(
    classes: &[(Series, &str, Option<String>)],
    title: &str,
    x_label: &str,
    y_label: &str,
) -> Result<String> {
    let mut out = String::with_capacity(16 * 1024);
    let (w, h) = (PLOT_W, PLOT_H);
    let left = 60.0;
    let right = 20.0;
    let top = 34.0;
    let bottom = 40.0;
    let plot_w = w - left - right;
    let plot_h = h - top - bottom;

    let xs = classes.iter().flat_map(|(s, _, _)| s.xs.iter().copied());
    let ys = classes.iter().flat_map(|(s, _, _)| s.ys.iter().copied());
    let (x_min, x_max) = padded_range(xs);
    let (y_min, y_max) = padded_range(ys);

    svg_open(&mut out, w, h, title)?;
    writeln!(
        out,
        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"#fff\" stroke=\"#ddd\"/>",
        left, top, plot_w, plot_h
    )?;
    draw_y_axis_ticks(&mut out, left, top, plot_w, plot_h, y_min, y_max, 5)?;
    draw_x_axis_ticks(&mut out, left, top, plot_w, plot_h, x_min, x_max, 6)?;
    draw_axis_labels(&mut out, left, top, plot_w, plot_h, x_label, y_label)?;

    for (series, color, _) in classes {
        for (x, y) in series.xs.iter().zip(&series.ys) {
            let px = left + (x - x_min) / (x_max - x_min).max(1e-6) * plot_w;
            let py = top + plot_h - (y - y_min) / (y_max - y_min).max(1e-6) * plot_h;
            writeln!(
                out,
                "<circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"3\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.2\"/>",
                px, py, color
            )?;
        }
    }

    let legends: Vec<(&str, &str)> = classes
        .iter()
        .filter_map(|(_, color, label)| label.as_deref().map(|l| (*color, l)))
        .collect();
    if !legends.is_empty() {
        draw_legend(&mut out, left + plot_w, top, &legends)?;
    }

    writeln!(out, "</svg>")?;
    Ok(out)
}

fn svg_log_histogram(data: &[f64], title: &str, x_label: &str) -> Result<String> {
    let edges = log_bin_edges();
    let counts = bin_counts(data, &edges);

    let mut out = String::with_capacity(32 * 1024);
    let (w, h) = (PLOT_W, PLOT_H);
    let left = 60.0;
    let right = 20.0;
    let top = 34.0;
    let bottom = 40.0;
    let plot_w = w - left - right;
    let plot_h = h - top - bottom;

    let max_y = counts.iter().copied().max().unwrap_or(0) as f64;

    svg_open(&mut out, w, h, title)?;
    writeln!(
        out,
        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"#fff\" stroke=\"#ddd\"/>",
        left, top, plot_w, plot_h
    )?;
    draw_y_axis_ticks(&mut out, left, top, plot_w, plot_h, 0.0, max_y.max(1.0), 5)?;
    draw_log_x_axis_ticks(&mut out, left, top, plot_w, plot_h)?;
    draw_axis_labels(&mut out, left, top, plot_w, plot_h, x_label, "Frequency")?;

    let log_span = HIST_LOG_MAX - HIST_LOG_MIN;
    for (i, &count) in counts.iter().enumerate() {
        if count == 0 {
            continue;
        }
        let x0 = left + (edges[i].log10() - HIST_LOG_MIN) / log_span * plot_w;
        let x1 = left + (edges[i + 1].log10() - HIST_LOG_MIN) / log_span * plot_w;
        let bar_h = if max_y == 0.0 {
            0.0
        } else {
            count as f64 / max_y * plot_h
        };
        writeln!(
            out,
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"#7db8da\"/>",
            x0,
            top + plot_h - bar_h,
            (x1 - x0).max(0.5),
            bar_h
        )?;
    }

    writeln!(out, "</svg>")?;
    Ok(out)
}

fn log_bin_edges() -> Vec<f64> {
    (0..=HIST_BINS)
        .map(|i| {
            let exp = HIST_LOG_MIN + (HIST_LOG_MAX - HIST_LOG_MIN) * i as f64 / HIST_BINS as f64;
            10f64.powf(exp)
        })
        .collect()
}

/// Counts values per bin; values outside the binned range are dropped.
fn bin_counts(data: &[f64], edges: &[f64]) -> Vec<u64> {
    let mut counts = vec![0u64; edges.len() - 1];
    let last = edges.len() - 1;
    for &v in data {
        if v < edges[0] || v > edges[last] {
            continue;
        }
        let idx = edges.partition_point(|&e| e <= v).min(last) - 1;
        counts[idx] += 1;
    }
    counts
}

fn padded_range<I: Iterator<Item = f64>>(values: I) -> (f64, f64) {
    let mut min_v = f64::INFINITY;
    let mut max_v = f64::NEG_INFINITY;
    for v in values {
        if v < min_v {
            min_v = v;
        }
        if v > max_v {
            max_v = v;
        }
    }
    if !min_v.is_finite() || !max_v.is_finite() {
        return (0.0, 1.0);
    }
    let span = (max_v - min_v).max(1e-6);
    let pad = span * 0.05;
    (min_v - pad, max_v + pad)
}

fn svg_open(out: &mut String, w: f64, h: f64, title: &str) -> Result<()> {
    writeln!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\">",
        w, h, w, h
    )?;
    writeln!(
        out,
        "<rect x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" fill=\"#fafafa\"/>",
        w, h
    )?;
    writeln!(
        out,
        "<text x=\"{}\" y=\"20\" font-size=\"15\" fill=\"#222\" text-anchor=\"middle\" font-family=\"Arial,Helvetica,sans-serif\">{}</text>",
        w / 2.0,
        title
    )?;
    Ok(())
}

fn draw_legend(out: &mut String, plot_right: f64, top: f64, entries: &[(&str, &str)]) -> Result<()> {
    let box_w = 150.0;
    let box_h = 16.0 * entries.len() as f64 + 10.0;
    let x = plot_right - box_w - 8.0;
    let y = top + 8.0;
    writeln!(
        out,
        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"#fff\" fill-opacity=\"0.5\" stroke=\"#ccc\"/>",
        x, y, box_w, box_h
    )?;
    for (i, (color, label)) in entries.iter().enumerate() {
        let ly = y + 13.0 + 16.0 * i as f64;
        writeln!(
            out,
            "<circle cx=\"{}\" cy=\"{}\" r=\"3\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.2\"/>",
            x + 10.0,
            ly - 3.0,
            color
        )?;
        writeln!(
            out,
            "<text x=\"{}\" y=\"{}\" font-size=\"10\" fill=\"#444\">{}</text>",
            x + 20.0,
            ly,
            label
        )?;
    }
    Ok(())
}

fn draw_y_axis_ticks(
    out: &mut String,
    left: f64,
    top: f64,
    plot_w: f64,
    plot_h: f64,
    min_y: f64,
    max_y: f64,
    ticks: usize,
) -> Result<()> {
    if ticks < 2 || (max_y - min_y).abs() < 1e-9 {
        return Ok(());
    }
    let (start, step, count) = nice_ticks(min_y, max_y, ticks);
    for i in 0..count {
        let v = start + step * i as f64;
        if v < min_y || v > max_y {
            continue;
        }
        let y = top + plot_h - ((v - min_y) / (max_y - min_y).max(1e-6)) * plot_h;
        writeln!(
            out,
            "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#eee\"/>",
            left,
            y,
            left + plot_w,
            y
        )?;
        writeln!(
            out,
            "<text x=\"{}\" y=\"{}\" font-size=\"10\" fill=\"#666\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>",
            left - 4.0,
            y,
            fmt_tick(v)
        )?;
    }
    Ok(())
}

fn draw_x_axis_ticks(
    out: &mut String,
    left: f64,
    top: f64,
    plot_w: f64,
    plot_h: f64,
    min_x: f64,
    max_x: f64,
    ticks: usize,
) -> Result<()> {
    if ticks < 2 || (max_x - min_x).abs() < 1e-9 {
        return Ok(());
    }
    let (start, step, count) = nice_ticks(min_x, max_x, ticks);
    for i in 0..count {
        let v = start + step * i as f64;
        if v < min_x || v > max_x {
            continue;
        }
        let x = left + ((v - min_x) / (max_x - min_x).max(1e-6)) * plot_w;
        writeln!(
            out,
            "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#eee\"/>",
            x,
            top,
            x,
            top + plot_h
        )?;
        writeln!(
            out,
            "<text x=\"{}\" y=\"{}\" font-size=\"10\" fill=\"#666\" text-anchor=\"middle\" dominant-baseline=\"hanging\">{}</text>",
            x,
            top + plot_h + 4.0,
            fmt_tick(v)
        )?;
    }
    Ok(())
}

/// Decade gridlines and labels for the log-scaled histogram axis.
fn draw_log_x_axis_ticks(
    out: &mut String,
    left: f64,
    top: f64,
    plot_w: f64,
    plot_h: f64,
) -> Result<()> {
    let log_span = HIST_LOG_MAX - HIST_LOG_MIN;
    for exp in 1..=(HIST_LOG_MAX as i32) {
        let x = left + (exp as f64 - HIST_LOG_MIN) / log_span * plot_w;
        writeln!(
            out,
            "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#eee\"/>",
            x,
            top,
            x,
            top + plot_h
        )?;
        writeln!(
            out,
            "<text x=\"{}\" y=\"{}\" font-size=\"10\" fill=\"#666\" text-anchor=\"middle\" dominant-baseline=\"hanging\">{}</text>",
            x,
            top + plot_h + 4.0,
            fmt_pow10(exp)
        )?;
    }
    Ok(())
}

fn draw_axis_labels(
    out: &mut String,
    left: f64,
    top: f64,
    plot_w: f64,
    plot_h: f64,
    x_label: &str,
    y_label: &str,
) -> Result<()> {
    let x = left + plot_w / 2.0;
    let y = top + plot_h + 30.0;
    writeln!(
        out,
        "<text x=\"{}\" y=\"{}\" font-size=\"11\" fill=\"#444\" text-anchor=\"middle\">{}</text>",
        x, y, x_label
    )?;
    let yx = left - 40.0;
    let yy = top + plot_h / 2.0;
    writeln!(
        out,
        "<text x=\"{}\" y=\"{}\" font-size=\"11\" fill=\"#444\" text-anchor=\"middle\" transform=\"rotate(-90 {} {})\">{}</text>",
        yx, yy, yx, yy, y_label
    )?;
    Ok(())
}

fn fmt_tick(v: f64) -> String {
    if (v - v.round()).abs() < 0.001 {
        format!("{}", v.round() as i64)
    } else if v.abs() < 10.0 {
        format!("{:.2}", v)
    } else {
        format!("{:.1}", v)
    }
}

fn fmt_pow10(exp: i32) -> String {
    if exp <= 4 {
        format!("{}", 10f64.powi(exp) as u64)
    } else {
        format!("1e{}", exp)
    }
}

fn nice_ticks(min: f64, max: f64, ticks: usize) -> (f64, f64, usize) {
    let range = (max - min).abs().max(1e-9);
    let rough = range / (ticks as f64 - 1.0);
    let mag = 10f64.powf(rough.abs().log10().floor());
    let norm = rough / mag;
    let step = if norm <= 1.0 {
        1.0
    } else if norm <= 2.0 {
        2.0
    } else if norm <= 5.0 {
        5.0
    } else {
        10.0
    } * mag;
    let start = (min / step).floor() * step;
    let end = (max / step).ceil() * step;
    let count = ((end - start) / step).round() as usize + 1;
    (start, step, count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::corpus::{LoadConfig, load_records, merge_annotations};
    use std::io::Cursor;

    fn corpus() -> Corpus {
        let mut corpus = load_records(
            Cursor::new(">small\nAT\n>mid\nGCGC\n>big\nGGAT\n"),
            &LoadConfig::default(),
        )
        .unwrap();
        merge_annotations(Cursor::new("small\t5\nmid\t50\nbig\t500\n"), &mut corpus).unwrap();
        corpus
    }

    #[test]
    fn log_bin_edges_span_the_configured_range() {
        let edges = log_bin_edges();
        assert_eq!(edges.len(), HIST_BINS + 1);
        assert!((edges[0] - 10f64.powf(HIST_LOG_MIN)).abs() < 1e-9);
        assert!((edges[HIST_BINS] - 10f64.powf(HIST_LOG_MAX)).abs() < 1e-3);
        assert!(edges.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn bin_counts_drop_out_of_range_values() {
        let edges = log_bin_edges();
        let counts = bin_counts(&[0.5, 100.0, 1e8], &edges);
        assert_eq!(counts.iter().sum::<u64>(), 1);
    }

    #[test]
    fn classed_scatter_partitions_by_thresholds() {
        let corpus = corpus();
        let [low, mid, high] = classed_scatter(
            &corpus,
            MetricKind::Coverage,
            MetricKind::Length,
            MetricKind::GcRatio,
            GC_SMALL,
            GC_LARGE,
        );
        // small is 0% GC, mid is 100% GC, big is 50% GC.
        assert_eq!(low.labels, ["small"]);
        assert_eq!(mid.labels, ["big"]);
        assert_eq!(high.labels, ["mid"]);
    }

    #[test]
    fn render_all_skips_unselected_plots() {
        let corpus = corpus();
        let selection = PlotSelection {
            len_gc: true,
            cov_hist: true,
            ..PlotSelection::default()
        };
        let rendered = render_all(&corpus, &selection);
        let files: Vec<&str> = rendered.iter().map(|p| p.file).collect();
        assert_eq!(files, ["len_gc.svg", "cov_hist.svg"]);
        assert!(rendered.iter().all(|p| p.svg.starts_with("<svg")));
    }
}
