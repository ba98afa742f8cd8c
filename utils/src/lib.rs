use std::{
    fmt,
    io::{self, BufRead},
    str::FromStr,
};

use clap::ArgMatches;

/// LogLevel
///
/// Represents minimum level of messages that will be logged
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLevel {
    pub level: usize,
}

impl FromStr for LogLevel {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(LogLevel { level: 0 }),
            "warn" => Ok(LogLevel { level: 1 }),
            "info" => Ok(LogLevel { level: 2 }),
            "debug" => Ok(LogLevel { level: 3 }),
            "trace" => Ok(LogLevel { level: 4 }),
            "none" => Ok(LogLevel { level: 5 }),
            _ => Err("no match"),
        }
    }
}

impl LogLevel {
    pub fn is_none(&self) -> bool {
        self.level > 4
    }
    pub fn get_level(&self) -> usize {
        if self.level > 4 {
            0
        } else {
            self.level
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let level_str = ["error", "warn", "info", "debug", "trace", "none"];
        if self.level < 6 {
            write!(f, "{}", level_str[self.level])
        } else {
            write!(f, "unknown")
        }
    }
}

/// Initialize logging from command line arguments
pub fn init_log(m: &ArgMatches) -> anyhow::Result<()> {
    let verbose = m
        .get_one::<LogLevel>("loglevel")
        .copied()
        .unwrap_or(LogLevel { level: 2 });
    let quiet = verbose.is_none() || m.get_flag("quiet");
    let ts = m
        .get_one::<stderrlog::Timestamp>("timestamp")
        .copied()
        .unwrap_or(stderrlog::Timestamp::Off);

    stderrlog::new()
        .quiet(quiet)
        .verbosity(verbose.get_level())
        .timestamp(ts)
        .init()?;
    Ok(())
}

/// Read in next line and split on tabs after trimming white space
///
/// Returns None at EOF.  A blank line gives a single empty field, see [is_blank]
pub fn get_next_line<'a, R: BufRead>(
    rdr: &mut R,
    buf: &'a mut String,
) -> io::Result<Option<Vec<&'a str>>> {
    buf.clear();
    if rdr.read_line(buf)? == 0 {
        Ok(None)
    } else {
        Ok(Some(buf.trim().split('\t').collect()))
    }
}

/// Read in next line and split on tabs, removing only the line ending
///
/// Unlike [get_next_line], empty fields at the end of the line are kept
pub fn get_next_record<'a, R: BufRead>(
    rdr: &mut R,
    buf: &'a mut String,
) -> io::Result<Option<Vec<&'a str>>> {
    buf.clear();
    if rdr.read_line(buf)? == 0 {
        Ok(None)
    } else {
        Ok(Some(buf.trim_end_matches(['\n', '\r']).split('\t').collect()))
    }
}

/// True if the fields from [get_next_line] or [get_next_record] came from an empty
/// (or all white space) line
pub fn is_blank(fields: &[&str]) -> bool {
    match fields {
        [] => true,
        [s] => s.trim().is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_parse() {
        assert_eq!(LogLevel::from_str("WARN").unwrap().level, 1);
        assert_eq!(LogLevel::from_str("trace").unwrap().get_level(), 4);
        let none = LogLevel::from_str("none").unwrap();
        assert!(none.is_none());
        assert_eq!(none.get_level(), 0);
        assert!(LogLevel::from_str("loud").is_err());
        assert_eq!(format!("{}", LogLevel { level: 3 }), "debug");
    }

    #[test]
    fn next_line_splits_on_tabs() {
        let mut rdr = "chr1\t10\t4\n\nlast\n".as_bytes();
        let mut buf = String::new();
        let f = get_next_line(&mut rdr, &mut buf).unwrap().unwrap();
        assert_eq!(f, vec!["chr1", "10", "4"]);
        let f = get_next_line(&mut rdr, &mut buf).unwrap().unwrap();
        assert!(is_blank(&f));
        let f = get_next_line(&mut rdr, &mut buf).unwrap().unwrap();
        assert_eq!(f, vec!["last"]);
        assert!(!is_blank(&f));
        assert!(get_next_line(&mut rdr, &mut buf).unwrap().is_none());
    }

    #[test]
    fn record_keeps_empty_fields() {
        let mut rdr = "a\tb\t\r\n  \nc\n".as_bytes();
        let mut buf = String::new();
        let f = get_next_record(&mut rdr, &mut buf).unwrap().unwrap();
        assert_eq!(f, vec!["a", "b", ""]);
        let f = get_next_record(&mut rdr, &mut buf).unwrap().unwrap();
        assert!(is_blank(&f));
        let f = get_next_record(&mut rdr, &mut buf).unwrap().unwrap();
        assert_eq!(f, vec!["c"]);
        assert!(get_next_record(&mut rdr, &mut buf).unwrap().is_none());
    }
}
