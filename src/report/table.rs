use crate::core::corpus::Corpus;
use anyhow::Result;
use std::io::Write;

/// Which per-contig columns to print, in fixed order: identifier, length,
/// GC content, ambiguous count, coverage.
#[derive(Clone, Copy, Debug, Default)]
pub struct Columns {
    pub header: bool,
    pub length: bool,
    pub gc: bool,
    pub ambiguous: bool,
    pub coverage: bool,
}

impl Columns {
    pub fn any(&self) -> bool {
        self.header || self.length || self.gc || self.ambiguous || self.coverage
    }
}

/// Writes selected metrics as tab-separated rows in ascending identifier
/// order. Contigs with unknown coverage have their coverage routed to the
/// error stream instead of the table.
pub fn write(
    out: &mut dyn Write,
    err: &mut dyn Write,
    corpus: &Corpus,
    cols: &Columns,
) -> Result<()> {
    if !cols.any() {
        return Ok(());
    }
    for contig in corpus.iter() {
        let mut fields: Vec<String> = Vec::new();
        if cols.header {
            fields.push(contig.id().to_string());
        }
        if cols.length {
            fields.push(contig.length().to_string());
        }
        if cols.gc {
            fields.push(format!("{:.1}", contig.gc_ratio()));
        }
        if cols.ambiguous {
            fields.push(contig.ambiguous_count().to_string());
        }
        if cols.coverage {
            let cov = contig.coverage();
            if cov.is_nan() {
                writeln!(err, "{}\tNaN", contig.id())?;
            } else {
                fields.push(cov.to_string());
            }
        }
        if !fields.is_empty() {
            writeln!(out, "{}", fields.join("\t"))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::corpus::{LoadConfig, load_records, merge_annotations};
    use std::io::Cursor;

    fn render(input: &str, annotations: Option<&str>, cols: Columns) -> (String, String) {
        let mut corpus = load_records(Cursor::new(input), &LoadConfig::default()).unwrap();
        if let Some(ann) = annotations {
            merge_annotations(Cursor::new(ann), &mut corpus).unwrap();
        }
        let mut out = Vec::new();
        let mut err = Vec::new();
        write(&mut out, &mut err, &corpus, &cols).unwrap();
        (
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn prints_selected_columns_in_identifier_order() {
        let cols = Columns {
            header: true,
            length: true,
            gc: true,
            ..Columns::default()
        };
        let (out, err) = render(">c2\nCCGG\n>c1\nAAAA\n", None, cols);
        assert_eq!(out, "c1\t4\t0.0\nc2\t4\t100.0\n");
        assert!(err.is_empty());
    }

    #[test]
    fn unknown_coverage_goes_to_the_error_stream() {
        let cols = Columns {
            header: true,
            coverage: true,
            ..Columns::default()
        };
        let (out, err) = render(">c1\nAAAA\n>c2\nCCGG\n", Some("c1\t12.5\n"), cols);
        assert_eq!(out, "c1\t12.5\nc2\n");
        assert_eq!(err, "c2\tNaN\n");
    }

    #[test]
    fn no_columns_prints_nothing() {
        let (out, err) = render(">c1\nAAAA\n", None, Columns::default());
        assert!(out.is_empty());
        assert!(err.is_empty());
    }

    #[test]
    fn nan_gc_ratio_renders_as_nan_text() {
        let cols = Columns {
            gc: true,
            ..Columns::default()
        };
        let (out, _) = render(">c1\nNNNN\n", None, cols);
        assert_eq!(out, "NaN\n");
    }
}
