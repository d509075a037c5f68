/// Input/output path resolution for the samtools-facing operations.
///
/// All defaulting rules live here so the pipelines only ever see absolute,
/// fully-joined paths. Nothing in this module touches the filesystem.
use std::path::{Path, PathBuf};

use crate::config::defs::PipelineError;

/// Resolved file locations for one operation. Built fresh per call and
/// immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePathSpec {
    pub input: PathBuf,
    pub output: PathBuf,
    pub out_dir: PathBuf,
}

/// Derives the absolute input and output paths for one operation.
///
/// # Arguments
///
/// * `input_name` - Bare input file name.
/// * `input_dir` - Directory holding the input; required.
/// * `output_name` - Optional output file name. When absent it is derived from
///   `input_name`: a trailing `input_ext` is replaced by `output_ext`,
///   otherwise `output_ext` is appended to the full name.
/// * `output_dir` - Optional output directory; must be absolute when given,
///   defaults to `input_dir`.
/// * `input_ext` - Extension expected on the input (e.g. ".sam").
/// * `output_ext` - Extension for the derived output (e.g. ".bam").
///
/// # Returns
/// A `FilePathSpec` with joined input/output paths and the effective
/// output directory.
pub fn resolve(
    input_name: &str,
    input_dir: Option<&Path>,
    output_name: Option<&str>,
    output_dir: Option<&Path>,
    input_ext: &str,
    output_ext: &str,
) -> Result<FilePathSpec, PipelineError> {
    let input_dir = input_dir.ok_or_else(|| {
        PipelineError::InvalidArgument(
            "Expected an absolute path to the input file. Cannot be none.".to_string(),
        )
    })?;

    if let Some(out) = output_dir {
        if !out.is_absolute() {
            return Err(PipelineError::InvalidArgument(format!(
                "Output path must be an absolute path. Provided: {}",
                out.display()
            )));
        }
    }
    let out_dir = output_dir.unwrap_or(input_dir).to_path_buf();

    let output_name = match output_name {
        Some(name) => name.to_string(),
        None => match input_name.strip_suffix(input_ext) {
            Some(stem) => format!("{}{}", stem, output_ext),
            // No recognizable extension: append rather than replace.
            None => format!("{}{}", input_name, output_ext),
        },
    };

    Ok(FilePathSpec {
        input: input_dir.join(input_name),
        output: out_dir.join(&output_name),
        out_dir,
    })
}
