//! # FASTA Reading and Writing
//!
//! Single-record FASTA input for the reference genome, optionally gzipped,
//! and FASTA output for reconstructed haplotypes. Output records carry the
//! haplotype ordinal and frequency in the header and are CR-LF terminated
//! for compatibility with the downstream tables.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::data::haplotype::Haplotype;
use crate::data::reference::Reference;
use crate::error::{QuasihapError, Result};

/// Open a file as a buffered reader, transparently decoding `.gz` input.
pub fn open_maybe_gz(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).map_err(|_| QuasihapError::file_not_found(path))?;
    let reader: Box<dyn BufRead> = if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        Box::new(BufReader::new(MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(reader)
}

/// Read the reference genome. Exactly one record is expected; its name is
/// the first whitespace-delimited token of the header line.
pub fn read_reference(path: &Path) -> Result<Reference> {
    let reader = open_maybe_gz(path)?;
    let mut name: Option<String> = None;
    let mut seq = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        if let Some(header) = line.strip_prefix('>') {
            if name.is_some() {
                return Err(QuasihapError::parse(
                    line_no + 1,
                    "reference FASTA must hold a single record",
                ));
            }
            name = Some(
                header
                    .split_whitespace()
                    .next()
                    .unwrap_or_default()
                    .to_string(),
            );
        } else {
            if name.is_none() {
                return Err(QuasihapError::parse(line_no + 1, "expected FASTA header"));
            }
            seq.extend_from_slice(line.trim_end().as_bytes());
        }
    }
    match name {
        Some(name) => Reference::new(name, seq),
        None => Err(QuasihapError::invalid_data(format!(
            "no FASTA record in {}",
            path.display()
        ))),
    }
}

/// Write haplotypes as `>{ordinal}_{frequency}` records.
pub fn write_haplotypes(path: &Path, haplotypes: &[Haplotype]) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for (ordinal, hap) in haplotypes.iter().enumerate() {
        write!(out, ">{}_{}\r\n{}\r\n", ordinal, hap.frequency, hap.sequence())?;
    }
    out.flush()?;
    Ok(())
}
