use std::ops::Deref;

use crate::summary::SampleSummary;

pub const N_BINS: usize = 101;

/// Histogram bin for a percentage covered value.
///
/// Bin k counts transcripts whose percentage truncates to k + 1, so 100.0 is in bin 99.
/// Values that truncate to 0 are placed in the last bin (100), as with earlier outputs
pub fn bin_index(pct: f64) -> usize {
    match pct.trunc() as usize {
        0 => N_BINS - 1,
        x => (x - 1).min(N_BINS - 1),
    }
}

/// Distribution of percentage covered over all transcripts of a sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageHistogram([usize; N_BINS]);

impl Default for CoverageHistogram {
    fn default() -> Self {
        Self([0; N_BINS])
    }
}

impl CoverageHistogram {
    pub fn add(&mut self, pct: f64) {
        self.0[bin_index(pct)] += 1
    }

    pub fn from_summary(s: &SampleSummary) -> Self {
        let mut h = Self::default();
        for x in s.covered().values() {
            h.add(*x)
        }
        h
    }
}

impl Deref for CoverageHistogram {
    type Target = [usize];

    fn deref(&self) -> &[usize] {
        &self.0
    }
}

/// One histogram per sample, sorted on sample name.  Samples are never merged
pub fn aggregate(samples: &[SampleSummary]) -> Vec<(String, CoverageHistogram)> {
    let mut v: Vec<_> = samples
        .iter()
        .map(|s| (s.name().to_owned(), CoverageHistogram::from_summary(s)))
        .collect();
    v.sort_by(|a, b| a.0.cmp(&b.0));
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::TranscriptSummary;
    use std::sync::Arc;

    fn summary(name: &str, v: &[(&str, f64)]) -> SampleSummary {
        let mut s = SampleSummary::new(name);
        for (id, x) in v {
            s.insert(
                &Arc::from(*id),
                TranscriptSummary {
                    percent_covered: *x,
                    supported: false,
                },
            )
        }
        s
    }

    #[test]
    fn bins() {
        assert_eq!(bin_index(100.0), 99);
        assert_eq!(bin_index(49.6), 48);
        assert_eq!(bin_index(90.0), 89);
        assert_eq!(bin_index(1.0), 0);
        assert_eq!(bin_index(0.5), 100);
        assert_eq!(bin_index(0.0), 100);
    }

    #[test]
    fn samples_kept_separate() {
        let b = summary("B", &[("t1", 90.0)]);
        let a = summary("A", &[("t1", 100.0), ("t2", 49.6)]);
        let h = aggregate(&[b, a]);
        assert_eq!(h.len(), 2);
        assert_eq!(h[0].0, "A");
        assert_eq!(h[1].0, "B");

        let ha = &h[0].1;
        assert_eq!(ha.len(), N_BINS);
        assert_eq!(ha[99], 1);
        assert_eq!(ha[48], 1);
        assert_eq!(ha.iter().sum::<usize>(), 2);

        let hb = &h[1].1;
        assert_eq!(hb[89], 1);
        assert_eq!(hb.iter().sum::<usize>(), 1);
    }
}
