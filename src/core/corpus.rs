use crate::core::contig::Contig;
use anyhow::{Context, Result};
use memchr::memchr;
use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};

/// Loader settings shared by every pass over the primary stream.
#[derive(Clone, Copy, Debug)]
pub struct LoadConfig {
    /// First byte of a record header line.
    pub marker: u8,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self { marker: b'>' }
    }
}

/// The full set of contigs loaded from one input stream, keyed by
/// identifier. Iteration is in ascending identifier order.
#[derive(Clone, Debug, Default)]
pub struct Corpus {
    contigs: BTreeMap<String, Contig>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.contigs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contigs.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Contig> {
        self.contigs.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Contig> {
        self.contigs.values()
    }

    /// Last write wins on duplicate identifiers.
    fn insert(&mut self, contig: Contig) {
        self.contigs.insert(contig.id().to_string(), contig);
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Contig> {
        self.contigs.get_mut(id)
    }
}

/// Parses a record stream into a corpus.
///
/// Rewinds the stream first, then scans line by line: a line whose first
/// byte is the boundary marker finalizes the record being accumulated and
/// starts the next one; every other line is appended verbatim to the current
/// sequence buffer. Lines before the first marker are ignored; a stream with
/// no marker at all yields an empty corpus.
pub fn load_records<R: Read + Seek>(input: R, config: &LoadConfig) -> Result<Corpus> {
    let mut reader = BufReader::new(input);
    reader
        .seek(SeekFrom::Start(0))
        .context("failed to rewind record stream")?;

    let mut corpus = Corpus::new();
    let mut header: Option<String> = None;
    let mut seq = String::new();
    let mut line = String::new();
    loop {
        line.clear();
        let n = reader
            .read_line(&mut line)
            .context("failed to read record stream")?;
        if n == 0 {
            break;
        }
        if line.as_bytes().first() == Some(&config.marker) {
            if let Some(h) = header.take() {
                corpus.insert(Contig::from_raw(&h, &seq));
            }
            header = Some(line.clone());
            seq.clear();
        } else if header.is_some() {
            seq.push_str(&line);
        }
    }
    if let Some(h) = header {
        corpus.insert(Contig::from_raw(&h, &seq));
    }
    Ok(corpus)
}

/// One annotation-pass anomaly, kept for caller-side diagnostics.
#[derive(Clone, Debug, PartialEq)]
pub enum MergeAnomaly {
    /// The identifier did not match any loaded record.
    Unmatched { line: usize, id: String },
    /// The line had no tab separator.
    Malformed { line: usize },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MergeOutcome {
    /// Lines whose identifier matched a record (value set, possibly to NaN).
    pub applied: usize,
    pub anomalies: Vec<MergeAnomaly>,
}

/// Merges a tab-separated `identifier<TAB>value` stream into the corpus.
///
/// Rewinds the stream, splits each line on the first tab and sets the
/// matching record's coverage. Unparseable values store NaN; unmatched
/// identifiers and tab-less lines are recorded with their 1-based line
/// number and skipped, never aborting the pass. Re-running with the same
/// stream reproduces the same coverage values (last line wins).
pub fn merge_annotations<R: Read + Seek>(input: R, corpus: &mut Corpus) -> Result<MergeOutcome> {
    let mut reader = BufReader::new(input);
    reader
        .seek(SeekFrom::Start(0))
        .context("failed to rewind annotation stream")?;

    let mut outcome = MergeOutcome::default();
    let mut line = String::new();
    let mut lineno = 0usize;
    loop {
        line.clear();
        let n = reader
            .read_line(&mut line)
            .context("failed to read annotation stream")?;
        if n == 0 {
            break;
        }
        lineno += 1;
        let record = line.trim_end_matches(['\n', '\r']);
        if record.is_empty() {
            continue;
        }
        let Some(tab) = memchr(b'\t', record.as_bytes()) else {
            outcome.anomalies.push(MergeAnomaly::Malformed { line: lineno });
            continue;
        };
        let (id, value) = (&record[..tab], &record[tab + 1..]);
        match corpus.get_mut(id) {
            Some(contig) => {
                contig.set_coverage_str(value);
                outcome.applied += 1;
            }
            None => outcome.anomalies.push(MergeAnomaly::Unmatched {
                line: lineno,
                id: id.to_string(),
            }),
        }
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn load(input: &str) -> Corpus {
        load_records(Cursor::new(input), &LoadConfig::default()).unwrap()
    }

    #[test]
    fn splits_records_on_boundary_marker() {
        let corpus = load(">c1\nAAAA\n>c2\nCCGG\n");
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.get("c1").unwrap().length(), 4);
        assert_eq!(corpus.get("c1").unwrap().gc_ratio(), 0.0);
        assert_eq!(corpus.get("c2").unwrap().length(), 4);
        assert_eq!(corpus.get("c2").unwrap().gc_ratio(), 100.0);
    }

    #[test]
    fn final_record_needs_no_trailing_marker() {
        let corpus = load(">c1\nACGT\nACGT");
        assert_eq!(corpus.get("c1").unwrap().length(), 8);
    }

    #[test]
    fn multi_line_sequences_keep_terminators() {
        let corpus = load(">c1\nACGT\nACGT\n");
        assert_eq!(corpus.get("c1").unwrap().seq(), "acgt\nacgt\n");
        assert_eq!(corpus.get("c1").unwrap().length(), 8);
    }

    #[test]
    fn stream_without_marker_yields_empty_corpus() {
        let corpus = load("no records here\njust text\n");
        assert!(corpus.is_empty());
    }

    #[test]
    fn consecutive_markers_yield_empty_record() {
        let corpus = load(">empty\n>c1\nACGT\n");
        let empty = corpus.get("empty").unwrap();
        assert_eq!(empty.length(), 0);
        assert!(empty.gc_ratio().is_nan());
        assert_eq!(empty.ambiguous_count(), 0);
    }

    #[test]
    fn duplicate_identifier_last_write_wins() {
        let corpus = load(">c1\nAAA\n>c1\nCCC\n");
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.get("c1").unwrap().seq(), "ccc\n");
    }

    #[test]
    fn iteration_is_in_ascending_identifier_order() {
        let corpus = load(">b\nAA\n>a\nCC\n>c\nGG\n");
        let ids: Vec<&str> = corpus.iter().map(|c| c.id()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn tolerates_partially_read_stream() {
        let mut stream = Cursor::new(">c1\nACGT\n");
        stream.set_position(4);
        let corpus = load_records(stream, &LoadConfig::default()).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.get("c1").unwrap().length(), 4);
    }

    #[test]
    fn roundtrip_reload_is_identical() {
        let corpus = load(">c2\nCCGG\nTTaa\n>c1\nNNNN\n");
        let mut serialized = String::new();
        for contig in corpus.iter() {
            serialized.push('>');
            serialized.push_str(contig.id());
            serialized.push('\n');
            serialized.push_str(contig.seq());
        }
        let reloaded = load(&serialized);
        let pairs = |c: &Corpus| -> Vec<(String, String)> {
            c.iter()
                .map(|c| (c.id().to_string(), c.seq().to_string()))
                .collect()
        };
        assert_eq!(pairs(&corpus), pairs(&reloaded));
    }

    #[test]
    fn merge_sets_matching_coverage_and_reports_unmatched() {
        let mut corpus = load(">c1\nACGT\n");
        let outcome = merge_annotations(Cursor::new("c1\t1000\nc9\t50\n"), &mut corpus).unwrap();
        assert_eq!(corpus.get("c1").unwrap().coverage(), 1000.0);
        assert_eq!(outcome.applied, 1);
        assert_eq!(
            outcome.anomalies,
            [MergeAnomaly::Unmatched {
                line: 2,
                id: "c9".to_string()
            }]
        );
    }

    #[test]
    fn merge_degrades_bad_values_to_nan() {
        let mut corpus = load(">c1\nACGT\n>c2\nACGT\n");
        merge_annotations(Cursor::new("c1\tabc\nc2\t\n"), &mut corpus).unwrap();
        assert!(corpus.get("c1").unwrap().coverage().is_nan());
        assert!(corpus.get("c2").unwrap().coverage().is_nan());
    }

    #[test]
    fn merge_reports_tabless_lines_and_continues() {
        let mut corpus = load(">c1\nACGT\n");
        let outcome =
            merge_annotations(Cursor::new("garbage\nc1\t7.5\n\n"), &mut corpus).unwrap();
        assert_eq!(outcome.anomalies, [MergeAnomaly::Malformed { line: 1 }]);
        assert_eq!(corpus.get("c1").unwrap().coverage(), 7.5);
    }

    #[test]
    fn merge_is_idempotent_and_last_line_wins() {
        let mut corpus = load(">c1\nACGT\n");
        let stream = "c1\t10\nc1\t20\n";
        merge_annotations(Cursor::new(stream), &mut corpus).unwrap();
        assert_eq!(corpus.get("c1").unwrap().coverage(), 20.0);
        merge_annotations(Cursor::new(stream), &mut corpus).unwrap();
        assert_eq!(corpus.get("c1").unwrap().coverage(), 20.0);
    }

    #[test]
    fn merge_splits_on_first_tab_only() {
        let mut corpus = load(">c1\nACGT\n");
        merge_annotations(Cursor::new("c1\t5\textra\n"), &mut corpus).unwrap();
        // The remainder after the first tab fails to parse and degrades.
        assert!(corpus.get("c1").unwrap().coverage().is_nan());
    }
}
