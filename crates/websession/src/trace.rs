//! Workload traces for replaying recorded cloudlet streams.
//!
//! A trace holds one cloudlet per line in the form
//! `ideal_start_time:length`. Blank lines and lines starting with `#` are
//! skipped.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use crate::clock::SimTime;
use crate::cloudlet::Cloudlet;
use crate::scheduled::ScheduledGenerator;

/// A single parsed trace entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceEntry {
    pub ideal_start_time: SimTime,
    pub length: u64,
}

impl TraceEntry {
    pub fn into_cloudlet(self) -> Cloudlet {
        Cloudlet::new(self.ideal_start_time, self.length)
    }
}

/// Errors that can occur while parsing or reading a trace.
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    /// Start time was not a finite, non-negative number.
    #[error("line {line}: invalid start time: {value}")]
    InvalidTime { line: usize, value: String },
    /// Length was not an unsigned integer.
    #[error("line {line}: invalid length: {value}")]
    InvalidLength { line: usize, value: String },
    /// Input was missing the expected separator.
    #[error("line {line}: missing separator ':' in trace entry")]
    MissingSeparator { line: usize },
    /// I/O error encountered while reading the trace.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Parses one trace line. `line_no` is only used for error reporting.
///
/// Whitespace around both fields is trimmed.
pub fn parse_trace_line(line: &str, line_no: usize) -> Result<TraceEntry, TraceError> {
    let (time_part, length_part) = line
        .split_once(':')
        .ok_or(TraceError::MissingSeparator { line: line_no })?;
    let (time_part, length_part) = (time_part.trim(), length_part.trim());

    let ideal_start_time = time_part
        .parse::<SimTime>()
        .ok()
        .filter(|t| t.is_finite() && *t >= 0.0)
        .ok_or_else(|| TraceError::InvalidTime {
            line: line_no,
            value: time_part.to_string(),
        })?;
    let length = length_part
        .parse::<u64>()
        .map_err(|_| TraceError::InvalidLength {
            line: line_no,
            value: length_part.to_string(),
        })?;

    Ok(TraceEntry {
        ideal_start_time,
        length,
    })
}

/// Reads every entry from `reader`, stopping at the first malformed line.
pub fn parse_trace<R: BufRead>(reader: R) -> Result<Vec<TraceEntry>, TraceError> {
    let mut entries = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let raw_line = line?;
        let trimmed = raw_line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        entries.push(parse_trace_line(trimmed, idx + 1)?);
    }
    Ok(entries)
}

/// Loads a trace file into a replay generator.
pub fn read_trace<P: AsRef<Path>>(path: P) -> Result<ScheduledGenerator<Cloudlet>, TraceError> {
    let path = path.as_ref();
    let entries = parse_trace(BufReader::new(File::open(path)?))?;
    debug!(path = %path.display(), entries = entries.len(), "loaded trace");
    Ok(entries.into_iter().map(TraceEntry::into_cloudlet).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloudlet::WorkUnit;
    use crate::generator::Generator;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn parses_trace_lines_with_whitespace() {
        let entry = parse_trace_line(" 4.5 : 1200 ", 1).expect("parse should succeed");
        assert_eq!(entry.ideal_start_time, 4.5);
        assert_eq!(entry.length, 1200);
    }

    #[test]
    fn rejects_missing_separator() {
        let err = parse_trace_line("42 100", 3).unwrap_err();
        assert!(matches!(err, TraceError::MissingSeparator { line: 3 }));
    }

    #[test]
    fn rejects_negative_or_non_numeric_times() {
        assert!(matches!(
            parse_trace_line("-1:10", 1),
            Err(TraceError::InvalidTime { .. })
        ));
        assert!(matches!(
            parse_trace_line("inf:10", 1),
            Err(TraceError::InvalidTime { .. })
        ));
        assert!(matches!(
            parse_trace_line("1:ten", 2),
            Err(TraceError::InvalidLength { line: 2, .. })
        ));
    }

    #[test]
    fn skips_comments_and_reports_real_line_numbers() {
        let input = "# app tier\n0:10\n\n3:oops\n";
        let err = parse_trace(input.as_bytes()).unwrap_err();
        assert!(matches!(err, TraceError::InvalidLength { line: 4, .. }));
    }

    #[test]
    fn reads_trace_file_into_generator() {
        let mut temp = NamedTempFile::new().expect("temp file should create");
        writeln!(temp, "5:200").unwrap();
        writeln!(temp, "# comment").unwrap();
        writeln!(temp, "1:100").unwrap();

        let mut generator = read_trace(temp.path()).expect("reading should succeed");
        let first = generator.poll().unwrap();
        assert_eq!(first.ideal_start_time(), 1.0);
        assert_eq!(first.length(), 100);
        assert_eq!(generator.poll().unwrap().ideal_start_time(), 5.0);
        assert!(generator.is_empty());
    }
}
