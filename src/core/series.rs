use crate::core::contig::Contig;
use crate::core::corpus::Corpus;

/// Per-contig metric selectable by downstream consumers.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricKind {
    Length,
    GcRatio,
    Coverage,
}

impl MetricKind {
    pub fn axis_label(self) -> &'static str {
        match self {
            MetricKind::Length => "Length (nt)",
            MetricKind::GcRatio => "GC content (%)",
            MetricKind::Coverage => "Coverage",
        }
    }

    pub fn value(self, contig: &Contig) -> f64 {
        match self {
            MetricKind::Length => contig.length() as f64,
            MetricKind::GcRatio => contig.gc_ratio(),
            MetricKind::Coverage => contig.coverage(),
        }
    }
}

/// Parallel coordinates and labels for one scatter request, ordered by
/// identifier. Points where either axis is undefined are omitted.
#[derive(Clone, Debug, Default)]
pub struct Series {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    pub labels: Vec<String>,
}

impl Series {
    pub fn push(&mut self, x: f64, y: f64, label: &str) {
        self.xs.push(x);
        self.ys.push(y);
        self.labels.push(label.to_string());
    }
}

pub fn scatter(corpus: &Corpus, x: MetricKind, y: MetricKind) -> Series {
    let mut series = Series::default();
    for contig in corpus.iter() {
        let (xv, yv) = (x.value(contig), y.value(contig));
        if xv.is_nan() || yv.is_nan() {
            continue;
        }
        series.push(xv, yv, contig.id());
    }
    series
}

/// A single metric across the corpus, undefined values omitted.
pub fn values(corpus: &Corpus, kind: MetricKind) -> Vec<f64> {
    corpus
        .iter()
        .map(|c| kind.value(c))
        .filter(|v| !v.is_nan())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::corpus::{LoadConfig, load_records, merge_annotations};
    use std::io::Cursor;

    fn corpus_with_coverage() -> Corpus {
        let mut corpus = load_records(
            Cursor::new(">a\nACGT\n>b\nGGCC\n>c\nNNNN\n"),
            &LoadConfig::default(),
        )
        .unwrap();
        merge_annotations(Cursor::new("a\t10\nb\t20\n"), &mut corpus).unwrap();
        corpus
    }

    #[test]
    fn scatter_omits_undefined_points() {
        let corpus = corpus_with_coverage();
        // c has no coverage and a NaN GC ratio.
        let series = scatter(&corpus, MetricKind::Coverage, MetricKind::GcRatio);
        assert_eq!(series.labels, ["a", "b"]);
        assert_eq!(series.xs, [10.0, 20.0]);
        assert_eq!(series.ys, [50.0, 100.0]);
    }

    #[test]
    fn scatter_keeps_points_defined_on_both_axes() {
        let corpus = corpus_with_coverage();
        let series = scatter(&corpus, MetricKind::Length, MetricKind::Coverage);
        assert_eq!(series.labels, ["a", "b"]);
    }

    #[test]
    fn values_filter_nan() {
        let corpus = corpus_with_coverage();
        assert_eq!(values(&corpus, MetricKind::Coverage), [10.0, 20.0]);
        assert_eq!(values(&corpus, MetricKind::Length), [4.0, 4.0, 4.0]);
        assert_eq!(values(&corpus, MetricKind::GcRatio), [50.0, 100.0]);
    }
}
