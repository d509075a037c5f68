/// Functions and structs for locating external tools and building their
/// command-line arguments
use std::env;
use std::path::{Path, PathBuf};

use crate::config::defs::PipelineError;

/// Locates `tool` the way the shell would.
///
/// A bare name is searched across the PATH components; anything containing a
/// path separator is taken as a direct location and only checked for
/// existence. Returns None if the executable cannot be found.
pub fn locate_tool(tool: &str) -> Option<PathBuf> {
    let as_path = Path::new(tool);
    if as_path.components().count() > 1 {
        return as_path.is_file().then(|| as_path.to_path_buf());
    }

    let path_env = env::var_os("PATH")?;
    env::split_paths(&path_env)
        .map(|dir| dir.join(tool))
        .find(|candidate| candidate.is_file())
}

/// Checks that `tool` is reachable before any pipeline depends on it.
/// Carries the current PATH in the error so a missing tool can be diagnosed
/// without re-running.
pub fn ensure_tool_available(tool: &str) -> Result<PathBuf, PipelineError> {
    locate_tool(tool).ok_or_else(|| PipelineError::ToolNotFound {
        tool: tool.to_string(),
        path_env: env::var("PATH").unwrap_or_default(),
    })
}

pub mod samtools {
    use std::path::Path;

    /// `samtools view -bS <input>`: SAM in, uncompressed BAM records to stdout.
    pub fn view_bam_args(input: &Path) -> Vec<String> {
        vec![
            "view".to_string(),
            "-bS".to_string(),
            input.to_string_lossy().to_string(),
        ]
    }

    /// `samtools view -h <input>`: BAM in, headered SAM text to stdout.
    pub fn view_sam_args(input: &Path) -> Vec<String> {
        vec![
            "view".to_string(),
            "-h".to_string(),
            input.to_string_lossy().to_string(),
        ]
    }

    /// `samtools sort -l 9 -O BAM`: reads records from stdin, writes maximally
    /// compressed sorted BAM to stdout.
    pub fn sort_bam_args() -> Vec<String> {
        vec![
            "sort".to_string(),
            "-l".to_string(),
            "9".to_string(),
            "-O".to_string(),
            "BAM".to_string(),
        ]
    }

    /// `samtools index <input> <output>`
    pub fn index_args(input: &Path, output: &Path) -> Vec<String> {
        vec![
            "index".to_string(),
            input.to_string_lossy().to_string(),
            output.to_string_lossy().to_string(),
        ]
    }

    /// `samtools flagstat <input>`
    pub fn flagstat_args(input: &Path) -> Vec<String> {
        vec![
            "flagstat".to_string(),
            input.to_string_lossy().to_string(),
        ]
    }
}

pub mod validator {
    use std::path::Path;

    /// `ValidateSamFile I=<input> MODE=SUMMARY`: one ERROR:<TOKEN> line per
    /// detected problem class.
    pub fn validate_summary_args(input: &Path) -> Vec<String> {
        vec![
            "ValidateSamFile".to_string(),
            format!("I={}", input.display()),
            "MODE=SUMMARY".to_string(),
        ]
    }
}
