use std::{collections::BTreeMap, convert::Infallible, sync::Arc};

use crate::{
    coverage::CoverageMap,
    error::{SkipReason, SkipStats},
    transcript::{Exon, Strand, TranscriptModel, TranscriptSet},
};

/// Order in which exons are joined before strand correction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExonOrder {
    /// As listed in the annotation
    #[default]
    Annotation,
    /// Sorted on start coordinate
    Genomic,
}

/// Per base coverage along a transcript, 5' to 3'
pub type Profile = Vec<f64>;

/// Collect coverage for the exons of a transcript.
///
/// Exon slices are concatenated and, for minus strand transcripts, the whole concatenated
/// profile is reversed.  If the transcript's sequence has no coverage or any exon falls
/// outside the coverage array then no profile is produced
pub fn project(
    cmap: &CoverageMap,
    tr: &TranscriptModel,
    order: ExonOrder,
) -> Result<Profile, SkipReason> {
    let cov = cmap.get(tr.chrom()).ok_or(SkipReason::MissingSequence)?;
    if tr.exons().is_empty() {
        return Err(SkipReason::NoExons);
    }

    let mut sorted: Vec<Exon>;
    let exons = match order {
        ExonOrder::Annotation => tr.exons(),
        ExonOrder::Genomic => {
            sorted = tr.exons().to_vec();
            sorted.sort_by_key(|e| e.start);
            &sorted
        }
    };

    let mut prof = Vec::with_capacity(tr.exon_len());
    for e in exons {
        let s = cov
            .range(e.start, e.end)
            .ok_or(SkipReason::ExonOutOfBounds {
                start: e.start,
                end: e.end,
                len: cov.len(),
            })?;
        prof.extend_from_slice(s);
    }
    if tr.strand() == Strand::Minus {
        prof.reverse()
    }
    Ok(prof)
}

/// Project each transcript from `trs` in turn, counting skipped transcripts in `stats`.
/// Profiles are passed to `f` as they are produced and are not kept
pub fn project_each<'a, I, F, E>(
    cmap: &CoverageMap,
    trs: I,
    order: ExonOrder,
    stats: &mut SkipStats,
    mut f: F,
) -> Result<(), E>
where
    I: IntoIterator<Item = &'a TranscriptModel>,
    F: FnMut(&'a TranscriptModel, Profile) -> Result<(), E>,
{
    for tr in trs {
        match project(cmap, tr, order) {
            Ok(p) => {
                stats.projected += 1;
                f(tr, p)?
            }
            Err(r) => {
                trace!("Transcript {} skipped: {}", tr.id(), r);
                stats.add_skip(&r)
            }
        }
    }
    Ok(())
}

/// Project all transcripts in `tset`.  Results are sorted on transcript id
pub fn project_all(
    cmap: &CoverageMap,
    tset: &TranscriptSet,
    order: ExonOrder,
) -> (BTreeMap<Arc<str>, Profile>, SkipStats) {
    let mut stats = SkipStats::default();
    let mut res = BTreeMap::new();
    let r: Result<(), Infallible> = project_each(cmap, tset.iter(), order, &mut stats, |tr, p| {
        res.insert(Arc::clone(tr.id()), p);
        Ok(())
    });
    match r {
        Ok(()) => (res, stats),
        Err(e) => match e {},
    }
}
