use std::{
    collections::{HashMap, TryReserveError},
    io::BufRead,
    ops::Deref,
    path::Path,
    sync::Arc,
};

use anyhow::Context;
use compress_io::compress::CompressIo;
use utils::{get_next_line, is_blank};

use crate::error::CovError;

/// Dense per base depth for one reference sequence.  Index 0 is position 1
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ChromosomeCoverage(Vec<f64>);

impl ChromosomeCoverage {
    pub fn new(v: Vec<f64>) -> Self {
        Self(v)
    }

    /// Depth values for 1-based inclusive range start..=end, or None if outside the array
    pub fn range(&self, start: usize, end: usize) -> Option<&[f64]> {
        if start == 0 || end < start {
            None
        } else {
            self.0.get(start - 1..end)
        }
    }
}

impl Deref for ChromosomeCoverage {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.0
    }
}

pub type CoverageMap = HashMap<Arc<str>, ChromosomeCoverage>;

/// Highest position accepted in a depth report (longer than any known chromosome)
pub const MAX_POSITION: u64 = 1 << 34;

/// Value stored for the very first record of a depth report.
///
/// Earlier versions of the pipeline stored the position rather than the depth for the
/// first line of the file.  `Position` keeps outputs identical to those runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FirstRecord {
    #[default]
    Position,
    Depth,
}

/// Coverage for the sequence currently being read
struct CoverageBuilder {
    ctg: Arc<str>,
    cov: Vec<f64>,
}

impl CoverageBuilder {
    fn new(ctg: &str) -> Self {
        Self {
            ctg: Arc::from(ctg),
            cov: Vec::new(),
        }
    }

    // Pad with zeros up to pos - 1 and then add the value for pos
    fn add(&mut self, pos: usize, x: f64) -> Result<(), TryReserveError> {
        self.cov.try_reserve(pos - self.cov.len())?;
        self.cov.resize(pos - 1, 0.0);
        self.cov.push(x);
        Ok(())
    }
}

/// Decode a sparse depth report (`<seq>\t<pos>\t<depth>`) into dense coverage arrays.
///
/// Positions must be ascending within a sequence and the records for a sequence must be
/// contiguous.  Missing positions are filled with zero, and each array runs from position
/// 1 to the last position reported for the sequence.
pub fn decode_coverage<R: BufRead>(
    rdr: &mut R,
    name: &str,
    first: FirstRecord,
) -> Result<CoverageMap, CovError> {
    let mut buf = String::new();
    let mut line = 0;
    let mut cmap = CoverageMap::new();
    let mut curr: Option<CoverageBuilder> = None;

    while let Some(fields) = get_next_line(rdr, &mut buf)? {
        line += 1;
        if is_blank(&fields) {
            continue;
        }
        if fields.len() != 3 {
            return Err(CovError::parse(
                name,
                line,
                format!("Expected 3 fields, found {}", fields.len()),
            ));
        }
        let pos = fields[1]
            .parse::<u64>()
            .ok()
            .filter(|x| *x > 0)
            .ok_or_else(|| {
                CovError::parse(name, line, format!("Error reading position {}", fields[1]))
            })?;
        let pos = usize::try_from(pos)
            .ok()
            .filter(|_| pos <= MAX_POSITION)
            .ok_or_else(|| {
                CovError::parse(
                    name,
                    line,
                    format!("Position {} is larger than the maximum ({})", pos, MAX_POSITION),
                )
            })?;
        let depth = fields[2].parse::<f64>().map_err(|_| {
            CovError::parse(name, line, format!("Error reading depth {}", fields[2]))
        })?;

        let x = match (curr.as_ref(), first) {
            (None, FirstRecord::Position) => pos as f64,
            _ => depth,
        };

        let ctg = fields[0];
        let mut builder = match curr.take() {
            Some(b) if &*b.ctg == ctg => {
                if pos <= b.cov.len() {
                    return Err(CovError::parse(
                        name,
                        line,
                        format!("Position {} for {} is not in ascending order", pos, ctg),
                    ));
                }
                b
            }
            prev => {
                if let Some(b) = prev {
                    trace!("{}: finished {} ({} positions)", name, b.ctg, b.cov.len());
                    cmap.insert(b.ctg, ChromosomeCoverage(b.cov));
                }
                if cmap.contains_key(ctg) {
                    return Err(CovError::parse(
                        name,
                        line,
                        format!("Records for {} are not contiguous", ctg),
                    ));
                }
                CoverageBuilder::new(ctg)
            }
        };
        builder.add(pos, x).map_err(|e| {
            CovError::parse(name, line, format!("Could not store position {}: {}", pos, e))
        })?;
        curr = Some(builder);
    }

    match curr {
        Some(b) => {
            cmap.insert(b.ctg, ChromosomeCoverage(b.cov));
            debug!(
                "{}: read {} lines, coverage for {} sequences",
                name,
                line,
                cmap.len()
            );
            Ok(cmap)
        }
        None => Err(CovError::EmptyInput(name.to_owned())),
    }
}

/// Open (possibly compressed) depth report and decode it
pub fn read_coverage_file(p: &Path, first: FirstRecord) -> anyhow::Result<CoverageMap> {
    trace!("Opening coverage file {} for reading", p.display());
    let mut rdr = CompressIo::new()
        .path(p)
        .bufreader()
        .with_context(|| format!("Could not open coverage file {}", p.display()))?;
    let name = p.display().to_string();
    Ok(decode_coverage(&mut rdr, &name, first)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(s: &str, first: FirstRecord) -> Result<CoverageMap, CovError> {
        decode_coverage(&mut s.as_bytes(), "test", first)
    }

    #[test]
    fn gap_fill() {
        let m = decode("ctgA\t2\t2\nctgA\t3\t2\nctgA\t5\t7\n", FirstRecord::Position).unwrap();
        let c = &m["ctgA"];
        assert_eq!(c.len(), 5);
        assert_eq!(&c[..], &[0.0, 2.0, 2.0, 0.0, 7.0]);
        assert_eq!(c.range(2, 5), Some(&[2.0, 2.0, 0.0, 7.0][..]));
    }

    #[test]
    fn first_record_uses_position() {
        let m = decode("ctgA\t1\t9\nctgA\t2\t9\n", FirstRecord::Position).unwrap();
        assert_eq!(&m["ctgA"][..], &[1.0, 9.0]);
        let m = decode("ctgA\t1\t9\nctgA\t2\t9\n", FirstRecord::Depth).unwrap();
        assert_eq!(&m["ctgA"][..], &[9.0, 9.0]);
    }

    #[test]
    fn first_record_only_applies_once() {
        let m = decode("ctgA\t3\t5\nctgB\t2\t6\n", FirstRecord::Position).unwrap();
        assert_eq!(&m["ctgA"][..], &[0.0, 0.0, 3.0]);
        assert_eq!(&m["ctgB"][..], &[0.0, 6.0]);
    }

    #[test]
    fn sequence_transition() {
        let s = "ctgA\t1\t4\nctgA\t2\t5\nctgB\t1\t8\nctgB\t4\t1\n\n";
        let m = decode(s, FirstRecord::Depth).unwrap();
        assert_eq!(m.len(), 2);
        assert_eq!(&m["ctgA"][..], &[4.0, 5.0]);
        assert_eq!(&m["ctgB"][..], &[8.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn malformed_lines() {
        let e = decode("ctgA\t1\t4\nctgA\t2\n", FirstRecord::Depth).unwrap_err();
        assert!(matches!(e, CovError::Parse { line: 2, .. }));
        let e = decode("ctgA\tx\t4\n", FirstRecord::Depth).unwrap_err();
        assert!(matches!(e, CovError::Parse { line: 1, .. }));
        let e = decode("ctgA\t0\t4\n", FirstRecord::Depth).unwrap_err();
        assert!(matches!(e, CovError::Parse { line: 1, .. }));
        let e = decode("ctgA\t1\tdeep\n", FirstRecord::Depth).unwrap_err();
        assert!(matches!(e, CovError::Parse { line: 1, .. }));
    }

    #[test]
    fn order_violations() {
        let e = decode("ctgA\t2\t4\nctgA\t2\t5\n", FirstRecord::Depth).unwrap_err();
        assert!(matches!(e, CovError::Parse { line: 2, .. }));
        let e = decode("ctgA\t1\t4\nctgB\t1\t5\nctgA\t2\t1\n", FirstRecord::Depth).unwrap_err();
        assert!(matches!(e, CovError::Parse { line: 3, .. }));
    }

    #[test]
    fn huge_position() {
        let e = decode("ctgA\t3000000000000000000\t1\n", FirstRecord::Depth).unwrap_err();
        assert!(matches!(e, CovError::Parse { line: 1, .. }));
        let s = format!("ctgA\t1\t1\nctgA\t{}\t1\n", MAX_POSITION + 1);
        let e = decode(&s, FirstRecord::Depth).unwrap_err();
        assert!(matches!(e, CovError::Parse { line: 2, .. }));
    }

    #[test]
    fn empty_input() {
        assert!(matches!(
            decode("", FirstRecord::Position),
            Err(CovError::EmptyInput(_))
        ));
        assert!(matches!(
            decode("\n\n", FirstRecord::Position),
            Err(CovError::EmptyInput(_))
        ));
    }

    #[test]
    fn range_bounds() {
        let c = ChromosomeCoverage::new(vec![1.0, 2.0, 3.0]);
        assert_eq!(c.range(1, 3), Some(&[1.0, 2.0, 3.0][..]));
        assert_eq!(c.range(3, 3), Some(&[3.0][..]));
        assert!(c.range(0, 2).is_none());
        assert!(c.range(2, 4).is_none());
        assert!(c.range(3, 2).is_none());
    }
}
