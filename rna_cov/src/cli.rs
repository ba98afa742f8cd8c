use std::{num::NonZeroUsize, path::PathBuf};

use clap::{
    crate_authors, crate_description, crate_name, crate_version, value_parser, Arg, ArgAction,
    ArgGroup, Command,
};

use anyhow::Context;

use utils::{init_log, LogLevel};

use rna_cov::{config::Config, coverage::FirstRecord, project::ExonOrder, sample::*};

/// Set up definition of command options for clap
fn cli_model() -> Command {
    Command::new(crate_name!())
        .about(crate_description!())
        .version(crate_version!())
        .author(crate_authors!())
        .arg(
            Arg::new("timestamp")
                .short('X')
                .long("timestamp")
                .value_parser(value_parser!(stderrlog::Timestamp))
                .value_name("GRANULARITY")
                .default_value("none")
                .help("Prepend log entries with a timestamp"),
        )
        .arg(
            Arg::new("loglevel")
                .short('l')
                .long("loglevel")
                .value_name("LOGLEVEL")
                .value_parser(value_parser!(LogLevel))
                .ignore_case(true)
                .default_value("warn")
                .help("Set log level"),
        )
        .arg(
            Arg::new("quiet")
                .action(ArgAction::SetTrue)
                .long("quiet")
                .conflicts_with("loglevel")
                .help("Silence all output"),
        )
        .arg(
            Arg::new("threads")
                .short('t')
                .long("threads")
                .value_parser(value_parser!(NonZeroUsize))
                .value_name("INT")
                .help("Set number of samples processed in parallel [default: available cores]"),
        )
        .arg(
            Arg::new("cutoff")
                .short('C')
                .long("cutoff")
                .value_parser(value_parser!(f64))
                .value_name("FLOAT")
                .default_value("90")
                .help("Minimum percentage of a transcript covered for it to be supported"),
        )
        .arg(
            Arg::new("mincov")
                .short('m')
                .long("mincov")
                .value_parser(value_parser!(f64))
                .value_name("FLOAT")
                .default_value("1")
                .help("Minimum depth for a position to be counted as covered"),
        )
        .arg(
            Arg::new("id_tag")
                .short('i')
                .long("id-tag")
                .value_parser(value_parser!(String))
                .value_name("STRING")
                .default_value("ID")
                .help("Attribute with transcript id in annotation file"),
        )
        .arg(
            Arg::new("sort_exons")
                .long("sort-exons")
                .action(ArgAction::SetTrue)
                .help("Sort exons on genomic position before joining"),
        )
        .arg(
            Arg::new("first_record_depth")
                .long("first-record-depth")
                .action(ArgAction::SetTrue)
                .help("Use depth for the first line of depth reports (earlier versions used the position)"),
        )
        .arg(
            Arg::new("output_dir")
                .short('o')
                .long("out")
                .value_parser(value_parser!(PathBuf))
                .value_name("PATH")
                .required(true)
                .help("Set output directory"),
        )
        .arg(
            Arg::new("gff")
                .short('g')
                .long("gff")
                .value_parser(value_parser!(PathBuf))
                .value_name("PATH")
                .required(true)
                .help("Annotation file (GFF3) with transcript models"),
        )
        .arg(
            Arg::new("cov")
                .short('c')
                .long("cov")
                .value_parser(value_parser!(PathBuf))
                .value_name("PATH")
                .value_delimiter(',')
                .action(ArgAction::Append)
                .help("Per base depth report(s), comma separated"),
        )
        .arg(
            Arg::new("sample")
                .short('s')
                .long("sample")
                .value_parser(value_parser!(String))
                .value_name("NAME")
                .value_delimiter(',')
                .action(ArgAction::Append)
                .requires("cov")
                .help("Sample names for depth reports, comma separated [default: 0, 1, ...]"),
        )
        .arg(
            Arg::new("sample_list")
                .short('S')
                .long("sample-list")
                .value_parser(value_parser!(PathBuf))
                .value_name("PATH")
                .help("File with sample names and depth report paths"),
        )
        .group(
            ArgGroup::new("input")
                .args(["cov", "sample_list"])
                .required(true),
        )
}

/// Handle command line options.  Set up Config structure
pub fn handle_cli() -> anyhow::Result<Config> {
    // Get matches from command line
    let m = cli_model().get_matches();

    // Setup logging
    init_log(&m)?;

    debug!("Processing command line options");

    let nt = m
        .get_one::<NonZeroUsize>("threads")
        .map(|x| usize::from(*x))
        .unwrap_or_else(num_cpus::get);

    // Read in sample list
    let samples = if let Some(p) = m.get_one::<PathBuf>("sample_list") {
        read_sample_list_from_file(p).with_context(|| "Could not read from sample list file")?
    } else {
        let covs: Vec<PathBuf> = m
            .get_many::<PathBuf>("cov")
            .map(|v| v.cloned().collect())
            .unwrap_or_default();
        let names: Option<Vec<String>> = m.get_many::<String>("sample").map(|v| v.cloned().collect());
        samples_from_lists(&covs, names.as_deref())?
    };
    debug!("Number of samples: {}", samples.len());

    let gff = m
        .get_one::<PathBuf>("gff")
        .ok_or_else(|| anyhow!("Missing annotation file"))?
        .clone();
    let output_dir = m
        .get_one::<PathBuf>("output_dir")
        .ok_or_else(|| anyhow!("Missing output directory"))?
        .clone();

    let mut cfg = Config::new(samples, gff, output_dir);

    if let Some(x) = m.get_one::<f64>("mincov") {
        cfg.set_mincov(*x)?
    }
    if let Some(x) = m.get_one::<f64>("cutoff") {
        cfg.set_cutoff(*x)?
    }
    if let Some(s) = m.get_one::<String>("id_tag") {
        cfg.set_id_tag(s)
    }
    if m.get_flag("sort_exons") {
        cfg.set_exon_order(ExonOrder::Genomic)
    }
    if m.get_flag("first_record_depth") {
        cfg.set_first_record(FirstRecord::Depth)
    }
    cfg.set_threads(nt);

    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_valid() {
        cli_model().debug_assert()
    }

    #[test]
    fn requires_input() {
        let r = cli_model().try_get_matches_from(["rna_cov", "-g", "a.gff", "-o", "out"]);
        assert!(r.is_err());
        let m = cli_model()
            .try_get_matches_from([
                "rna_cov", "-g", "a.gff", "-o", "out", "-c", "a.cov,b.cov", "-s", "x,y",
            ])
            .unwrap();
        assert_eq!(m.get_many::<PathBuf>("cov").unwrap().count(), 2);
        assert_eq!(m.get_one::<f64>("cutoff").copied(), Some(90.0));
        assert!(!m.get_flag("sort_exons"));
    }
}
