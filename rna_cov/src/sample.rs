use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use anyhow::Context;
use compress_io::compress::CompressIo;
use utils::get_next_line;

/// Input sample
///
/// name - used to generate output file names
/// cov_path - path to per base depth report
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    name: String,
    cov_path: PathBuf,
}

impl Sample {
    pub fn new<P: AsRef<Path>>(name: &str, cov_path: P) -> Self {
        Self {
            name: name.to_owned(),
            cov_path: cov_path.as_ref().to_owned(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cov_path(&self) -> &Path {
        &self.cov_path
    }
}

/// Reading sample list file
/// Each line should contain the sample name and the path to the depth report for the
/// sample, separated by a tab.  Relative paths are taken relative to the current directory
pub fn read_sample_list_from_file<P: AsRef<Path>>(fname: P) -> anyhow::Result<Vec<Sample>> {
    debug!("Reading in sample list from {}", fname.as_ref().display());

    trace!("Opening sample file for reading");
    let mut rdr = CompressIo::new().path(&fname).bufreader()?;

    trace!("Reading from file");
    let mut buf = String::new();
    let mut line = 0;
    let mut sample_vec = Vec::new();

    while let Some(fields) = get_next_line(&mut rdr, &mut buf).with_context(|| {
        format!(
            "Error after reading {} lines from {}",
            line,
            fname.as_ref().display()
        )
    })? {
        line += 1;
        // Skip short lines
        if fields.len() >= 2 {
            sample_vec.push(Sample::new(fields[0], fields[1]));
        }
    }

    debug!(
        "Finished reading in {} lines; found {} samples",
        line,
        sample_vec.len()
    );

    check_samples(&sample_vec)?;
    Ok(sample_vec)
}

/// Make samples from a list of depth reports and (optionally) sample names.
/// If names are not given, the samples are numbered from 0
pub fn samples_from_lists(covs: &[PathBuf], names: Option<&[String]>) -> anyhow::Result<Vec<Sample>> {
    let v: Vec<_> = match names {
        Some(n) if n.len() != covs.len() => {
            return Err(anyhow!(
                "Number of sample names ({}) does not match number of coverage files ({})",
                n.len(),
                covs.len()
            ))
        }
        Some(n) => n
            .iter()
            .zip(covs.iter())
            .map(|(s, p)| Sample::new(s, p))
            .collect(),
        None => covs
            .iter()
            .enumerate()
            .map(|(i, p)| Sample::new(&format!("{}", i), p))
            .collect(),
    };
    check_samples(&v)?;
    Ok(v)
}

// Sample names are used for output file names so must be unique
fn check_samples(v: &[Sample]) -> anyhow::Result<()> {
    if v.is_empty() {
        return Err(anyhow!("No samples found"));
    }
    let mut h = HashSet::new();
    for s in v.iter() {
        if !h.insert(s.name()) {
            return Err(anyhow!("Duplicate sample name {}", s.name()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn from_lists() {
        let covs = vec![PathBuf::from("a.cov"), PathBuf::from("b.cov")];
        let v = samples_from_lists(&covs, None).unwrap();
        assert_eq!(v[0].name(), "0");
        assert_eq!(v[1].cov_path(), Path::new("b.cov"));

        let names = vec!["leaf".to_string(), "root".to_string()];
        let v = samples_from_lists(&covs, Some(&names)).unwrap();
        assert_eq!(v[1].name(), "root");

        assert!(samples_from_lists(&covs, Some(&names[..1])).is_err());
        let names = vec!["x".to_string(), "x".to_string()];
        assert!(samples_from_lists(&covs, Some(&names)).is_err());
        assert!(samples_from_lists(&[], None).is_err());
    }

    #[test]
    fn from_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("samples.txt");
        let mut f = std::fs::File::create(&p).unwrap();
        writeln!(f, "s1\tdata/s1.cov\n\ns2\tdata/s2.cov.gz").unwrap();
        drop(f);
        let v = read_sample_list_from_file(&p).unwrap();
        assert_eq!(
            v,
            vec![
                Sample::new("s1", "data/s1.cov"),
                Sample::new("s2", "data/s2.cov.gz")
            ]
        );
    }
}
