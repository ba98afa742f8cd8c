use std::path::{Path, PathBuf};

use crate::{coverage::FirstRecord, project::ExonOrder, sample::Sample};

/// Config
///
/// Configuration info for the program
/// This is generated from the command line arguments
/// Once set it is read only
///
/// sample_list - list of input samples
/// gff - path to annotation (GFF3) file
/// output_dir - output directory
/// id_tag - annotation attribute giving the transcript id
/// mincov - minimum depth for a position to count as covered
/// cutoff - minimum percentage covered for a transcript to be supported
/// exon_order - order in which exons are joined
/// first_record - value stored for the first record of each depth report
/// threads - number of worker threads
///
pub struct Config {
    sample_list: Vec<Sample>,
    gff: PathBuf,
    output_dir: PathBuf,
    id_tag: String,
    mincov: f64,
    cutoff: f64,
    exon_order: ExonOrder,
    first_record: FirstRecord,
    threads: usize,
}

impl Config {
    pub fn new(sample_list: Vec<Sample>, gff: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            sample_list,
            gff,
            output_dir,
            id_tag: "ID".to_string(),
            mincov: 1.0,
            cutoff: 90.0,
            exon_order: ExonOrder::Annotation,
            first_record: FirstRecord::Position,
            threads: 1,
        }
    }

    pub fn set_id_tag(&mut self, s: &str) {
        self.id_tag = s.to_owned()
    }

    pub fn set_mincov(&mut self, x: f64) -> anyhow::Result<()> {
        if x.is_finite() && x >= 0.0 {
            self.mincov = x;
            Ok(())
        } else {
            Err(anyhow!("Invalid minimum coverage {}", x))
        }
    }

    pub fn set_cutoff(&mut self, x: f64) -> anyhow::Result<()> {
        if (0.0..=100.0).contains(&x) {
            self.cutoff = x;
            Ok(())
        } else {
            Err(anyhow!("Invalid cutoff {} - must be between 0 and 100", x))
        }
    }

    pub fn set_exon_order(&mut self, o: ExonOrder) {
        self.exon_order = o
    }

    pub fn set_first_record(&mut self, f: FirstRecord) {
        self.first_record = f
    }

    pub fn set_threads(&mut self, x: usize) {
        self.threads = x.max(1)
    }

    pub fn sample_list(&self) -> &[Sample] {
        &self.sample_list
    }

    pub fn gff(&self) -> &Path {
        &self.gff
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn id_tag(&self) -> &str {
        &self.id_tag
    }

    pub fn mincov(&self) -> f64 {
        self.mincov
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    pub fn exon_order(&self) -> ExonOrder {
        self.exon_order
    }

    pub fn first_record(&self) -> FirstRecord {
        self.first_record
    }

    pub fn threads(&self) -> usize {
        self.threads
    }
}
