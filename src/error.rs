//! 错误类型。
//!
//! Every fallible library operation returns [`Result`]. Match misses are not
//! errors; they are reported through [`crate::align::MatchOutcome`].

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrnaError>;

#[derive(Error, Debug)]
pub enum TrnaError {
    /// Invalid or missing configuration value
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Malformed input row or header
    #[error("cannot parse '{}' line {line}: {reason}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// Modification code with no entry in the modification table
    #[error("unknown modification code '{code}' (not present in the modification table)")]
    UnknownModification { code: char },

    /// Destination directory of a fresh run already exists
    #[error("output directory '{}' already exists", .0.display())]
    OutputConflict(PathBuf),

    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// External primitive exited unsuccessfully or produced unreadable output
    #[error("external command `{command}` failed (exit code {}): {stderr}", .code.map_or_else(|| "none".to_string(), |c| c.to_string()))]
    ExternalTool {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("cannot build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl TrnaError {
    pub fn parse(path: impl Into<PathBuf>, line: usize, reason: impl Into<String>) -> Self {
        TrnaError::Parse { path: path.into(), line, reason: reason.into() }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TrnaError::Io { path: path.into(), source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_names_file_and_line() {
        let err = TrnaError::parse("mods.tsv", 3, "expected 4 tab-separated fields, found 2");
        let msg = format!("{err}");
        assert!(msg.contains("mods.tsv"));
        assert!(msg.contains("line 3"));
        assert!(msg.contains("found 2"));
    }

    #[test]
    fn external_tool_error_reports_command_and_code() {
        let err = TrnaError::ExternalTool {
            command: "blastn -query q.fa".to_string(),
            code: Some(2),
            stderr: "bad input".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("blastn -query q.fa"));
        assert!(msg.contains("exit code 2"));
        assert!(msg.contains("bad input"));
    }

    #[test]
    fn external_tool_error_without_exit_code() {
        let err = TrnaError::ExternalTool { command: "usearch".to_string(), code: None, stderr: String::new() };
        assert!(format!("{err}").contains("exit code none"));
    }

    #[test]
    fn output_conflict_names_directory() {
        let err = TrnaError::OutputConflict(PathBuf::from("/tmp/run1"));
        assert_eq!(format!("{err}"), "output directory '/tmp/run1' already exists");
    }
}
