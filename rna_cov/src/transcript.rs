use std::{
    collections::{HashMap, HashSet},
    fmt,
    io::BufRead,
    path::Path,
    str::FromStr,
    sync::Arc,
};

use anyhow::Context;
use compress_io::compress::CompressIo;
use utils::{get_next_record, is_blank};

use crate::error::CovError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Plus,
    Minus,
}

/// Only '-' gives a reverse strand transcript; '+', '.' and '?' are all read as Plus
impl FromStr for Strand {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "-" => Ok(Self::Minus),
            "+" | "." | "?" => Ok(Self::Plus),
            _ => Err("Illegal strand"),
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plus => f.write_str("+"),
            Self::Minus => f.write_str("-"),
        }
    }
}

/// Exon interval, 1-based inclusive coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exon {
    pub start: usize,
    pub end: usize,
}

impl Exon {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        (self.end + 1).saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptModel {
    id: Arc<str>,
    chrom: Arc<str>,
    strand: Strand,
    // Exons in the order they were found in the annotation
    exons: Vec<Exon>,
}

impl TranscriptModel {
    pub fn new(id: &str, chrom: Arc<str>, strand: Strand) -> Self {
        Self {
            id: Arc::from(id),
            chrom,
            strand,
            exons: Vec::new(),
        }
    }

    pub fn id(&self) -> &Arc<str> {
        &self.id
    }
    pub fn chrom(&self) -> &str {
        &self.chrom
    }
    pub fn strand(&self) -> Strand {
        self.strand
    }
    pub fn exons(&self) -> &[Exon] {
        &self.exons
    }
    pub fn add_exon(&mut self, exon: Exon) {
        self.exons.push(exon)
    }
    /// Sum of exon lengths
    pub fn exon_len(&self) -> usize {
        self.exons.iter().map(|e| e.len()).sum()
    }
}

/// All transcript models from an annotation file
///
/// Built once and then only read.  Transcripts are kept in the order they were
/// first registered, with a lookup from id to position
#[derive(Debug, Default)]
pub struct TranscriptSet {
    transcripts: Vec<TranscriptModel>,
    index: HashMap<Arc<str>, usize>,
    skipped_exons: usize,
}

impl TranscriptSet {
    pub fn len(&self) -> usize {
        self.transcripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transcripts.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&TranscriptModel> {
        self.index.get(id).map(|i| &self.transcripts[*i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &TranscriptModel> {
        self.transcripts.iter()
    }

    /// Transcripts sorted on id
    pub fn sorted(&self) -> Vec<&TranscriptModel> {
        let mut v: Vec<_> = self.transcripts.iter().collect();
        v.sort_unstable_by(|a, b| a.id.cmp(&b.id));
        v
    }

    /// Number of exons dropped because their parent was not found
    pub fn skipped_exons(&self) -> usize {
        self.skipped_exons
    }

    /// Add new transcript.  A transcript with an existing id replaces the previous entry
    fn register(&mut self, tr: TranscriptModel) {
        if let Some(i) = self.index.get(&tr.id).copied() {
            warn!("Transcript {} defined more than once; exons reset", tr.id);
            self.transcripts[i] = tr
        } else {
            self.index.insert(Arc::clone(&tr.id), self.transcripts.len());
            self.transcripts.push(tr)
        }
    }

    fn add_exon(&mut self, parent: &str, exon: Exon) -> bool {
        match self.index.get(parent) {
            Some(i) => {
                self.transcripts[*i].add_exon(exon);
                true
            }
            None => false,
        }
    }
}

/// Look up `key` in a GFF3 attribute column (`key=value;key2=value2`)
fn get_attribute<'a>(attr: &'a str, key: &str) -> Option<&'a str> {
    attr.split(';').find_map(|s| {
        let (k, v) = s.split_once('=')?;
        if k.trim() == key {
            Some(v.trim())
        } else {
            None
        }
    })
}

fn is_model_feature(ftype: &str) -> bool {
    matches!(ftype, "mRNA" | "transcript" | "exon")
}

/// Read transcript models from a GFF3 stream.
///
/// `mRNA` and `transcript` features register a transcript under the value of the `id_tag`
/// attribute, and `exon` features are appended to the transcript(s) listed in their `Parent`
/// attribute.  Exons with an unknown parent are reported and skipped.
pub fn load_transcripts<R: BufRead>(
    rdr: &mut R,
    name: &str,
    id_tag: &str,
) -> Result<TranscriptSet, CovError> {
    let mut buf = String::new();
    let mut line = 0;
    let mut tset = TranscriptSet::default();
    let mut ctg_hash: HashSet<Arc<str>> = HashSet::new();

    while let Some(fields) = get_next_record(rdr, &mut buf)? {
        line += 1;
        if is_blank(&fields) {
            continue;
        }
        if fields[0].starts_with('#') {
            // Sequence section at the end of a GFF3 file
            if fields[0].starts_with("##FASTA") {
                debug!("{}:{} FASTA section found; stop reading", name, line);
                break;
            }
            continue;
        }
        let ftype = fields.get(2).copied().unwrap_or_default();
        if fields.len() != 9 && (fields.len() < 3 || is_model_feature(ftype)) {
            return Err(CovError::parse(
                name,
                line,
                format!("Expected 9 fields, found {}", fields.len()),
            ));
        }
        match ftype {
            "mRNA" | "transcript" => {
                let id = get_attribute(fields[8], id_tag).ok_or_else(|| {
                    CovError::parse(name, line, format!("Missing {} attribute", id_tag))
                })?;
                let strand = fields[6].parse::<Strand>().map_err(|e| {
                    CovError::parse(name, line, format!("{} {}", e, fields[6]))
                })?;
                let chrom = match ctg_hash.get(fields[0]) {
                    Some(c) => Arc::clone(c),
                    None => {
                        trace!("Adding reference sequence {}", fields[0]);
                        let c: Arc<str> = Arc::from(fields[0]);
                        ctg_hash.insert(Arc::clone(&c));
                        c
                    }
                };
                tset.register(TranscriptModel::new(id, chrom, strand))
            }
            "exon" => {
                let parse_coord = |s: &str| {
                    s.parse::<usize>().map_err(|_| {
                        CovError::parse(name, line, format!("Error reading coordinate {}", s))
                    })
                };
                let exon = Exon::new(parse_coord(fields[3])?, parse_coord(fields[4])?);
                let parents = get_attribute(fields[8], "Parent").unwrap_or("");
                for parent in parents.split(',') {
                    if !tset.add_exon(parent, exon) {
                        let e = CovError::MissingParent {
                            parent: parent.to_owned(),
                            line,
                        };
                        warn!("{}: {}", name, e);
                        tset.skipped_exons += 1;
                    }
                }
            }
            _ => (),
        }
    }
    debug!(
        "{}: read {} lines, found {} transcripts",
        name,
        line,
        tset.len()
    );
    if tset.skipped_exons > 0 {
        warn!(
            "{}: {} exons skipped as parent transcript not found",
            name, tset.skipped_exons
        )
    }
    Ok(tset)
}

/// Open (possibly compressed) GFF3 file and read transcript models
pub fn read_transcript_file(p: &Path, id_tag: &str) -> anyhow::Result<TranscriptSet> {
    debug!("Reading in transcript models from {}", p.display());
    let mut rdr = CompressIo::new()
        .path(p)
        .bufreader()
        .with_context(|| format!("Could not open annotation file {}", p.display()))?;
    let name = p.display().to_string();
    Ok(load_transcripts(&mut rdr, &name, id_tag)?)
}
