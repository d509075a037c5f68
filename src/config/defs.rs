use std::collections::HashSet;
use std::path::PathBuf;
use lazy_static::lazy_static;
use thiserror::Error;

// External software
pub const SAMTOOLS_TAG: &str = "samtools";
pub const VALIDATOR_TAG: &str = "picard";

// Alignment file extensions
pub const SAM_EXT: &str = ".sam";
pub const BAM_EXT: &str = ".bam";
pub const BAI_EXT: &str = ".bai";

/// Substring the validator emits when it blew up internally rather than
/// finishing its report. Its presence fails validation unconditionally.
pub const VALIDATION_FAILURE_MARKER: &str = "Exception";

lazy_static! {
    /// Known-benign validator warnings that do not fail validation unless the
    /// caller supplies their own ignore set.
    pub static ref DEFAULT_VALIDATION_IGNORE: HashSet<String> = {
        let mut s = HashSet::new();
        s.insert("MATE_NOT_FOUND".to_string());
        s.insert("MISSING_READ_GROUP".to_string());
        s.insert("INVALID_MAPPING_QUALITY".to_string());
        s
    };
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Input file does not exist: {0}")]
    FileNotFound(PathBuf),

    #[error("{tool} command not found in your PATH environment variable. PATH={path_env}")]
    ToolNotFound { tool: String, path_env: String },

    #[error("Malformed flagstat report: {field} (line {index}): {detail}")]
    MalformedReport {
        field: &'static str,
        index: usize,
        detail: String,
    },

    #[error("Failed to launch {tool}: {error}")]
    PipelineLaunch { tool: String, error: String },

    #[error("IO error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for PipelineError {
    fn from(e: std::io::Error) -> Self {
        PipelineError::IOError(e.to_string())
    }
}
