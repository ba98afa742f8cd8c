use anyhow::Context;
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use compress_io::compress::CompressIo;

use crate::{
    aggregate::CoverageHistogram,
    config::Config,
    summary::{SampleSummary, N_SUMMARY_BINS},
};

pub const PROFILE_SUFFIX: &str = "cov_per_transcript.txt";
pub const SUMMARY_SUFFIX: &str = "summary.txt";
pub const SUPPORTED_SUFFIX: &str = "supported.txt";
pub const SUMMARY_HIST_SUFFIX: &str = "summary_hist.txt";
pub const COMPARATIVE_FILE: &str = "comparative_hist.txt";

pub fn get_file_path(cfg: &Config, sample: &str, suffix: &str) -> PathBuf {
    cfg.output_dir().join(format!("{}.{}", sample, suffix))
}

/// Create output directory if required
pub fn setup_output(cfg: &Config) -> anyhow::Result<()> {
    let d = cfg.output_dir();
    if !d.exists() {
        debug!("Creating output directory {}", d.display());
        fs::create_dir_all(d)
            .with_context(|| format!("Error creating output directory {}", d.display()))?;
    }
    Ok(())
}

pub fn open_output(p: &Path) -> anyhow::Result<impl Write> {
    trace!("Opening {} for output", p.display());
    CompressIo::new()
        .path(p)
        .bufwriter()
        .with_context(|| format!("Could not open output file {}", p.display()))
}

/// Write `<id>\t<v1>,<v2>,...` line for a transcript profile
pub fn write_profile<W: Write>(wrt: &mut W, id: &str, prof: &[f64]) -> io::Result<()> {
    write!(wrt, "{}\t", id)?;
    for (i, x) in prof.iter().enumerate() {
        if i > 0 {
            write!(wrt, ",")?
        }
        write!(wrt, "{:?}", x)?
    }
    writeln!(wrt)
}

pub fn write_summary<W: Write>(wrt: &mut W, s: &SampleSummary) -> io::Result<()> {
    writeln!(wrt, "TranscriptID\tPercentageCovered")?;
    for (id, x) in s.covered().iter() {
        writeln!(wrt, "{}\t{:?}", id, x)?
    }
    Ok(())
}

pub fn write_supported<W: Write>(wrt: &mut W, s: &SampleSummary) -> io::Result<()> {
    for id in s.supported() {
        writeln!(wrt, "{}", id)?
    }
    Ok(())
}

pub fn write_summary_histogram<W: Write>(wrt: &mut W, s: &SampleSummary) -> io::Result<()> {
    writeln!(wrt, "Bin\tCount")?;
    let width = 100 / N_SUMMARY_BINS;
    for (i, n) in s.histogram().iter().enumerate() {
        writeln!(wrt, "{}-{}\t{}", i * width, (i + 1) * width, n)?
    }
    Ok(())
}

/// Write one column per sample with the counts for each histogram bin
pub fn write_comparative<W: Write>(
    wrt: &mut W,
    hist: &[(String, CoverageHistogram)],
) -> io::Result<()> {
    write!(wrt, "Bin")?;
    for (name, _) in hist.iter() {
        write!(wrt, "\t{}", name)?
    }
    writeln!(wrt)?;
    let n_bins = hist.first().map(|(_, h)| h.len()).unwrap_or(0);
    for i in 0..n_bins {
        write!(wrt, "{}", i)?;
        for (_, h) in hist.iter() {
            write!(wrt, "\t{}", h[i])?
        }
        writeln!(wrt)?
    }
    Ok(())
}

/// Write summary, supported list and histogram files for a sample
pub fn output_sample_summary(cfg: &Config, s: &SampleSummary) -> anyhow::Result<()> {
    let p = get_file_path(cfg, s.name(), SUMMARY_SUFFIX);
    let mut wrt = open_output(&p)?;
    write_summary(&mut wrt, s)
        .and_then(|_| wrt.flush())
        .with_context(|| format!("Error writing summary to {}", p.display()))?;

    let p = get_file_path(cfg, s.name(), SUPPORTED_SUFFIX);
    let mut wrt = open_output(&p)?;
    write_supported(&mut wrt, s)
        .and_then(|_| wrt.flush())
        .with_context(|| format!("Error writing supported transcripts to {}", p.display()))?;

    let p = get_file_path(cfg, s.name(), SUMMARY_HIST_SUFFIX);
    let mut wrt = open_output(&p)?;
    write_summary_histogram(&mut wrt, s)
        .and_then(|_| wrt.flush())
        .with_context(|| format!("Error writing histogram to {}", p.display()))
}

pub fn output_comparative(cfg: &Config, hist: &[(String, CoverageHistogram)]) -> anyhow::Result<()> {
    let p = cfg.output_dir().join(COMPARATIVE_FILE);
    let mut wrt = open_output(&p)?;
    write_comparative(&mut wrt, hist)
        .and_then(|_| wrt.flush())
        .with_context(|| format!("Error writing comparative histogram to {}", p.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{aggregate::aggregate, summary::TranscriptSummary};
    use std::sync::Arc;

    fn sample() -> SampleSummary {
        let mut s = SampleSummary::new("s1");
        for (id, x, sup) in [("tB", 100.0, true), ("tA", 33.0, false)] {
            s.insert(
                &Arc::from(id),
                TranscriptSummary {
                    percent_covered: x,
                    supported: sup,
                },
            )
        }
        s
    }

    #[test]
    fn profile_line() {
        let mut v = Vec::new();
        write_profile(&mut v, "t1", &[0.0, 2.0, 1.5]).unwrap();
        assert_eq!(String::from_utf8(v).unwrap(), "t1\t0.0,2.0,1.5\n");
    }

    #[test]
    fn summary_file() {
        let mut v = Vec::new();
        write_summary(&mut v, &sample()).unwrap();
        assert_eq!(
            String::from_utf8(v).unwrap(),
            "TranscriptID\tPercentageCovered\ntA\t33.0\ntB\t100.0\n"
        );
        let mut v = Vec::new();
        write_supported(&mut v, &sample()).unwrap();
        assert_eq!(String::from_utf8(v).unwrap(), "tB\n");
    }

    #[test]
    fn histograms() {
        let mut v = Vec::new();
        write_summary_histogram(&mut v, &sample()).unwrap();
        let s = String::from_utf8(v).unwrap();
        let lines: Vec<_> = s.lines().collect();
        assert_eq!(lines.len(), N_SUMMARY_BINS + 1);
        assert_eq!(lines[4], "30-40\t1");
        assert_eq!(lines[10], "90-100\t1");

        let mut v = Vec::new();
        write_comparative(&mut v, &aggregate(&[sample()])).unwrap();
        let s = String::from_utf8(v).unwrap();
        let lines: Vec<_> = s.lines().collect();
        assert_eq!(lines.len(), 102);
        assert_eq!(lines[0], "Bin\ts1");
        assert_eq!(lines[33], "32\t1");
        assert_eq!(lines[100], "99\t1");
        assert_eq!(lines[101], "100\t0");
    }
}
