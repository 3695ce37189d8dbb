//! # Tab-Delimited Tables
//!
//! The corrected-read table consumed by the pipeline and the per-window
//! overlap table it emits. Both are tab-delimited with a header row and
//! CR-LF line endings.

use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

use crate::data::read::Read;
use crate::data::variant::{encode_pattern, parse_pattern};
use crate::error::{QuasihapError, Result};
use crate::io::fasta::open_maybe_gz;
use crate::model::chain::CatalogChain;

/// Read the corrected-read table: `name`, `start`, `stop`, `pattern`
/// columns, tab-separated. The pattern column holds the comma-joined event
/// list and may be empty. A leading header row and `#` comments are
/// skipped.
pub fn read_read_table(path: &Path) -> Result<Vec<Read>> {
    let reader = open_maybe_gz(path)?;
    let mut reads = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line_no == 0 && line.starts_with("name\t") {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 4 {
            return Err(QuasihapError::parse(
                line_no + 1,
                format!("expected 4 tab-separated columns, found {}", fields.len()),
            ));
        }
        let start: f64 = fields[1].parse().map_err(|_| {
            QuasihapError::parse(line_no + 1, format!("invalid start '{}'", fields[1]))
        })?;
        let stop: f64 = fields[2].parse().map_err(|_| {
            QuasihapError::parse(line_no + 1, format!("invalid stop '{}'", fields[2]))
        })?;
        if !(stop > start) {
            return Err(QuasihapError::parse(
                line_no + 1,
                format!("read span {start}-{stop} is empty"),
            ));
        }
        let events = parse_pattern(fields[3])
            .map_err(|e| QuasihapError::parse(line_no + 1, e.to_string()))?;
        reads.push(Read::new(fields[0], start, stop, events));
    }
    Ok(reads)
}

/// Write the overlap table for one catalog chain: a row per retained
/// pattern per window, window bounds rounded for display.
pub fn write_overlap_table(path: &Path, chain: &CatalogChain) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write!(
        out,
        "window_index\tstart\toverlap_left_bound\toverlap_right_bound\tstop\t\
         left_overlap_pattern\tcore_pattern\tright_overlap_pattern\tfull_pattern\tfrequency\r\n"
    )?;
    for (index, catalog) in chain.catalogs().iter().enumerate() {
        let bounds = catalog.bounds();
        for pattern in catalog.patterns() {
            write!(
                out,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\r\n",
                index,
                bounds.start.round() as i64,
                bounds.mid_prev.round() as i64,
                bounds.mid_next.round() as i64,
                bounds.stop.round() as i64,
                encode_pattern(&pattern.left),
                encode_pattern(&pattern.core),
                encode_pattern(&pattern.right),
                encode_pattern(&pattern.events),
                pattern.frequency,
            )?;
        }
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::read::ReadPopulation;
    use crate::model::partition::Window;
    use std::io::Write as _;

    fn write_temp(contents: &[u8]) -> tempfile::TempPath {
        let mut file = tempfile::Builder::new().suffix(".tsv").tempfile().unwrap();
        file.write_all(contents).unwrap();
        file.into_temp_path()
    }

    #[test]
    fn test_read_table_with_header_and_comments() {
        let path = write_temp(
            b"name\tstart\tstop\tpattern\r\n\
              # corrected reads\r\n\
              r1\t1\t100\t\r\n\
              r2\t1.5\t101.5\tC_50_T,G_70_A\r\n",
        );
        let reads = read_read_table(&path).unwrap();
        assert_eq!(reads.len(), 2);
        assert_eq!(reads[0].name, "r1");
        assert!(reads[0].events().is_empty());
        assert!((reads[1].start - 1.5).abs() < 1e-12);
        assert_eq!(reads[1].events().len(), 2);
    }

    #[test]
    fn test_read_table_reports_line_numbers() {
        let path = write_temp(b"r1\t1\t100\t\r\nr2\tx\t100\t\r\n");
        let err = read_read_table(&path).unwrap_err();
        assert!(err.to_string().contains("line 2"));
        assert!(err.to_string().contains("invalid start"));

        let path = write_temp(b"r1\t100\t1\t\r\n");
        let err = read_read_table(&path).unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_read_table_rejects_short_rows() {
        let path = write_temp(b"r1\t1\t100\r\n");
        assert!(read_read_table(&path).is_err());
    }

    #[test]
    fn test_overlap_table_layout() {
        let reads: Vec<Read> = (0..3)
            .map(|i| Read::new(format!("a{i}"), 1.0, 110.0, Vec::new()))
            .chain((0..2).map(|i| {
                Read::new(
                    format!("b{i}"),
                    1.0,
                    110.0,
                    parse_pattern("T_90_C").unwrap(),
                )
            }))
            .collect();
        let population = ReadPopulation::new(reads).unwrap();
        let windows = vec![Window::new(1.0, 100.0)];
        let chain = CatalogChain::build(&population, &windows);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overlaps.tsv");
        write_overlap_table(&path, &chain).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = written.split("\r\n").collect();
        assert!(lines[0].starts_with("window_index\tstart\t"));
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "0\t1\t1\t100\t100\t\t\t\t\t60");
        assert_eq!(lines[2], "0\t1\t1\t100\t100\t\tT_90_C\t\tT_90_C\t40");
    }
}
