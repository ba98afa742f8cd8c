use std::{fmt, io, sync::Arc};

/// Errors from decoding depth reports, loading annotation and summarizing profiles
#[derive(thiserror::Error, Debug)]
pub enum CovError {
    /// Malformed input line
    #[error("{source_name}:{line} {msg}")]
    Parse {
        source_name: String,
        line: usize,
        msg: String,
    },
    /// Input contained no usable records
    #[error("No records found in {0}")]
    EmptyInput(String),
    /// Exon refers to a transcript that has not been registered.  Not fatal for the loader
    #[error("line {line}: exon parent {parent} not found")]
    MissingParent { parent: String, line: usize },
    /// Zero length profile at summary time.  Only affects the transcript concerned
    #[error("Empty coverage profile for transcript {0}")]
    EmptyProfile(Arc<str>),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl CovError {
    pub(crate) fn parse<S: Into<String>>(source_name: &str, line: usize, msg: S) -> Self {
        Self::Parse {
            source_name: source_name.to_owned(),
            line,
            msg: msg.into(),
        }
    }
}

/// Why a transcript could not be projected for a sample.
///
/// These are expected outcomes (i.e., transcripts on sequences with no coverage in
/// a sample) and are counted rather than treated as errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingSequence,
    NoExons,
    ExonOutOfBounds { start: usize, end: usize, len: usize },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSequence => f.write_str("no coverage for reference sequence"),
            Self::NoExons => f.write_str("no exons"),
            Self::ExonOutOfBounds { start, end, len } => write!(
                f,
                "exon {}-{} outside of coverage range 1-{}",
                start, end, len
            ),
        }
    }
}

/// Counts of recoverable skips for one sample
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SkipStats {
    pub projected: usize,
    pub missing_sequence: usize,
    pub no_exons: usize,
    pub out_of_bounds: usize,
    pub empty_profile: usize,
}

impl SkipStats {
    pub fn add_skip(&mut self, reason: &SkipReason) {
        match reason {
            SkipReason::MissingSequence => self.missing_sequence += 1,
            SkipReason::NoExons => self.no_exons += 1,
            SkipReason::ExonOutOfBounds { .. } => self.out_of_bounds += 1,
        }
    }

    pub fn skipped(&self) -> usize {
        self.missing_sequence + self.no_exons + self.out_of_bounds
    }

    /// Add counts from `other`
    pub fn merge(&mut self, other: &Self) {
        self.projected += other.projected;
        self.missing_sequence += other.missing_sequence;
        self.no_exons += other.no_exons;
        self.out_of_bounds += other.out_of_bounds;
        self.empty_profile += other.empty_profile;
    }
}

impl fmt::Display for SkipStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} projected, {} skipped (no coverage: {}, no exons: {}, out of bounds: {}), {} empty profiles",
            self.projected,
            self.skipped(),
            self.missing_sequence,
            self.no_exons,
            self.out_of_bounds,
            self.empty_profile
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_stats() {
        let mut a = SkipStats {
            empty_profile: 1,
            ..Default::default()
        };
        let mut b = SkipStats::default();
        b.projected = 4;
        b.add_skip(&SkipReason::NoExons);
        b.add_skip(&SkipReason::MissingSequence);
        a.merge(&b);
        assert_eq!(a.projected, 4);
        assert_eq!(a.skipped(), 2);
        assert_eq!(a.empty_profile, 1);
    }
}
