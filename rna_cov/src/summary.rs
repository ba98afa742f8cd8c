use std::{collections::BTreeMap, sync::Arc};

use crate::error::{CovError, SkipStats};

/// Coverage summary for one transcript in one sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TranscriptSummary {
    pub percent_covered: f64,
    pub supported: bool,
}

/// Percentage of profile positions with depth >= mincov.  The transcript is supported
/// if this percentage is >= cutoff
pub fn summarize(
    id: &Arc<str>,
    prof: &[f64],
    mincov: f64,
    cutoff: f64,
) -> Result<TranscriptSummary, CovError> {
    if prof.is_empty() {
        return Err(CovError::EmptyProfile(Arc::clone(id)));
    }
    let n = prof.iter().filter(|x| **x >= mincov).count();
    let percent_covered = 100.0 * (n as f64) / (prof.len() as f64);
    Ok(TranscriptSummary {
        percent_covered,
        supported: percent_covered >= cutoff,
    })
}

pub const N_SUMMARY_BINS: usize = 10;

/// Per transcript results for one sample
#[derive(Debug, Clone, Default)]
pub struct SampleSummary {
    name: String,
    covered: BTreeMap<Arc<str>, f64>,
    supported: Vec<Arc<str>>,
    stats: SkipStats,
}

impl SampleSummary {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Percentage covered for each summarized transcript, sorted on transcript id
    pub fn covered(&self) -> &BTreeMap<Arc<str>, f64> {
        &self.covered
    }

    /// Ids of supported transcripts in sorted order
    pub fn supported(&self) -> Vec<&Arc<str>> {
        let mut v: Vec<_> = self.supported.iter().collect();
        v.sort_unstable();
        v
    }

    pub fn stats(&self) -> &SkipStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut SkipStats {
        &mut self.stats
    }

    pub fn len(&self) -> usize {
        self.covered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.covered.is_empty()
    }

    pub fn insert(&mut self, id: &Arc<str>, s: TranscriptSummary) {
        if self.covered.insert(Arc::clone(id), s.percent_covered).is_none() && s.supported {
            self.supported.push(Arc::clone(id))
        }
    }

    /// Summarize a profile and add the result.  Empty profiles are counted and
    /// the error is handed back to the caller
    pub fn add_profile(
        &mut self,
        id: &Arc<str>,
        prof: &[f64],
        mincov: f64,
        cutoff: f64,
    ) -> Result<TranscriptSummary, CovError> {
        match summarize(id, prof, mincov, cutoff) {
            Ok(s) => {
                self.insert(id, s);
                Ok(s)
            }
            Err(e) => {
                self.stats.empty_profile += 1;
                Err(e)
            }
        }
    }

    /// Histogram of percentage covered in bins of width 10.  A value of 100 goes to the last bin
    pub fn histogram(&self) -> [usize; N_SUMMARY_BINS] {
        let mut h = [0; N_SUMMARY_BINS];
        for x in self.covered.values() {
            let i = ((*x / 10.0) as usize).min(N_SUMMARY_BINS - 1);
            h[i] += 1
        }
        h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROF: [f64; 10] = [0.0, 2.0, 0.0, 3.0, 4.0, 0.0, 5.0, 0.0, 0.0, 9.0];

    #[test]
    fn threshold() {
        let id: Arc<str> = Arc::from("t1");
        let s = summarize(&id, &PROF, 1.0, 50.0).unwrap();
        assert_eq!(s.percent_covered, 50.0);
        assert!(s.supported);
        let s = summarize(&id, &PROF, 1.0, 51.0).unwrap();
        assert!(!s.supported);
        // mincov is inclusive
        let s = summarize(&id, &PROF, 4.0, 90.0).unwrap();
        assert_eq!(s.percent_covered, 30.0);
    }

    #[test]
    fn empty_profile() {
        let id: Arc<str> = Arc::from("t1");
        assert!(matches!(
            summarize(&id, &[], 1.0, 90.0),
            Err(CovError::EmptyProfile(_))
        ));
        let mut ss = SampleSummary::new("s");
        assert!(ss.add_profile(&id, &[], 1.0, 90.0).is_err());
        assert_eq!(ss.stats().empty_profile, 1);
        assert!(ss.is_empty());
    }

    #[test]
    fn sample_summary() {
        let mut ss = SampleSummary::new("s1");
        let ids: Vec<Arc<str>> = ["t3", "t1", "t2"].iter().map(|s| Arc::from(*s)).collect();
        ss.add_profile(&ids[0], &[1.0, 1.0], 1.0, 90.0).unwrap();
        ss.add_profile(&ids[1], &PROF, 1.0, 90.0).unwrap();
        ss.add_profile(&ids[2], &[0.0, 5.0, 5.0, 5.0], 1.0, 75.0).unwrap();
        assert_eq!(ss.name(), "s1");
        assert_eq!(ss.len(), 3);
        let v: Vec<_> = ss.covered().iter().map(|(k, x)| (k.to_string(), *x)).collect();
        assert_eq!(
            v,
            vec![
                ("t1".to_string(), 50.0),
                ("t2".to_string(), 75.0),
                ("t3".to_string(), 100.0)
            ]
        );
        let sup: Vec<_> = ss.supported().iter().map(|k| k.to_string()).collect();
        assert_eq!(sup, vec!["t2", "t3"]);

        let h = ss.histogram();
        assert_eq!(h[5], 1);
        assert_eq!(h[7], 1);
        assert_eq!(h[9], 1);
        assert_eq!(h.iter().sum::<usize>(), 3);
    }
}
