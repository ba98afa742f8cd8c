//! Transcript level coverage analysis for RNA-seq.
//!
//! Sparse per base depth reports (one per sample) are decoded into dense coverage arrays
//! and projected onto transcript models read from a GFF3 file.  Each transcript is
//! summarized as the percentage of its bases with at least a minimum depth, and the
//! samples are compared using per sample histograms of these percentages.
pub mod aggregate;
pub mod config;
pub mod coverage;
pub mod error;
pub mod output;
pub mod process;
pub mod project;
pub mod sample;
pub mod summary;
pub mod transcript;

#[macro_use]
extern crate log;
#[macro_use]
extern crate anyhow;
