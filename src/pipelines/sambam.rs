/// The samtools-facing operations: format conversion, indexing, statistics
/// and validation.
///
/// Everything here pivots around the bam format. A caller holding a sam file
/// is expected to convert it to bam before running the other operations on
/// it. The wrapped tools are treated as black boxes that do not validate
/// their input, so operations report success or failure through a 0/1 status
/// and surface only launch-level problems as errors.
use std::collections::HashSet;
use std::path::Path;

use log::{error, info};

use crate::config::defs::{
    BAI_EXT, BAM_EXT, DEFAULT_VALIDATION_IGNORE, PipelineError, SAM_EXT, SAMTOOLS_TAG,
    VALIDATOR_TAG,
};
use crate::utils::command::{ensure_tool_available, samtools, validator};
use crate::utils::flagstat::{AlignmentStats, parse_flagstat};
use crate::utils::paths::resolve;
use crate::utils::streams::{
    PipelineStage, ProcessResult, run_capture, run_piped_to_file, run_to_file,
};
use crate::utils::validate::classify;

pub struct SamTools {
    samtools: String,
    validator: String,
    /// Legacy policy: log subprocess launch failures and report a status code
    /// instead of surfacing `PipelineLaunch` to the caller.
    swallow_launch_errors: bool,
}

impl Default for SamTools {
    fn default() -> Self {
        Self::new()
    }
}

impl SamTools {
    pub fn new() -> Self {
        Self::with_commands(SAMTOOLS_TAG, VALIDATOR_TAG)
    }

    /// Overrides the commands used for the alignment toolkit and the
    /// validator. Either may be a bare name looked up on PATH or a direct
    /// path to the executable.
    pub fn with_commands(samtools: impl Into<String>, validator: impl Into<String>) -> Self {
        Self {
            samtools: samtools.into(),
            validator: validator.into(),
            swallow_launch_errors: false,
        }
    }

    pub fn swallow_launch_errors(mut self, swallow: bool) -> Self {
        self.swallow_launch_errors = swallow;
        self
    }

    /// Applies the launch-failure policy to a finished pipeline invocation.
    /// `legacy_status` is what the operation historically reported after a
    /// swallowed failure; it differs between operations and both behaviors
    /// are kept distinct on purpose.
    fn absorb(
        &self,
        result: Result<ProcessResult, PipelineError>,
        context: &str,
        legacy_status: i32,
    ) -> Result<i32, PipelineError> {
        match result {
            Ok(_) => Ok(0),
            Err(e) if self.swallow_launch_errors => {
                error!("failed to {}. {}", context, e);
                Ok(legacy_status)
            }
            Err(e) => Err(e),
        }
    }

    /// Converts a sam file to a sorted bam file via
    /// `samtools view -bS <in> | samtools sort -l 9 -O BAM > <out>`.
    ///
    /// # Arguments
    ///
    /// * `input_name` - sam file name.
    /// * `input_dir` - absolute path to the sam file's directory.
    /// * `output_name` - sorted bam file name; defaults to `input_name` with a
    ///   trailing `.sam` replaced by `.bam`.
    /// * `output_dir` - absolute output directory; defaults to `input_dir`.
    /// * `validate` - validate the input before converting.
    /// * `ignore` - validator tokens to ignore; defaults to the known-benign set.
    ///
    /// # Returns
    /// 0 on success, 1 if pre-validation failed.
    pub async fn convert_sam_to_sorted_bam(
        &self,
        input_name: &str,
        input_dir: Option<&Path>,
        output_name: Option<&str>,
        output_dir: Option<&Path>,
        validate: bool,
        ignore: Option<&HashSet<String>>,
    ) -> Result<i32, PipelineError> {
        let spec = resolve(input_name, input_dir, output_name, output_dir, SAM_EXT, BAM_EXT)?;
        if !spec.input.exists() {
            return Err(PipelineError::FileNotFound(spec.input));
        }
        if validate {
            // resolve() already rejected a missing input dir.
            if let Some(dir) = input_dir {
                if self.validate(input_name, dir, ignore).await? == 1 {
                    return Ok(1);
                }
            }
        }

        ensure_tool_available(&self.samtools)?;

        info!(
            "Converting sam to sorted bam for file: {} with cwd: {}",
            spec.input.display(),
            spec.out_dir.display()
        );
        let view = PipelineStage::new(self.samtools.as_str(), samtools::view_bam_args(&spec.input));
        let sort = PipelineStage::new(self.samtools.as_str(), samtools::sort_bam_args());
        let result = run_piped_to_file(&view, &sort, &spec.output, Some(&spec.out_dir)).await;
        self.absorb(
            result,
            &format!(
                "convert {} to {}",
                spec.input.display(),
                spec.output.display()
            ),
            0,
        )
    }

    /// Converts a bam file to a sam file via `samtools view -h <in> > <out>`.
    /// Same argument contract as [`convert_sam_to_sorted_bam`], with the
    /// extension pair reversed (`.bam` in, `.sam` out).
    ///
    /// [`convert_sam_to_sorted_bam`]: SamTools::convert_sam_to_sorted_bam
    pub async fn convert_bam_to_sam(
        &self,
        input_name: &str,
        input_dir: Option<&Path>,
        output_name: Option<&str>,
        output_dir: Option<&Path>,
        validate: bool,
        ignore: Option<&HashSet<String>>,
    ) -> Result<i32, PipelineError> {
        let spec = resolve(input_name, input_dir, output_name, output_dir, BAM_EXT, SAM_EXT)?;
        if !spec.input.exists() {
            return Err(PipelineError::FileNotFound(spec.input));
        }
        if validate {
            if let Some(dir) = input_dir {
                if self.validate(input_name, dir, ignore).await? == 1 {
                    return Ok(1);
                }
            }
        }

        ensure_tool_available(&self.samtools)?;

        info!(
            "Converting bam to sam for file: {} with output file: {} and cwd: {}",
            spec.input.display(),
            spec.output.display(),
            spec.out_dir.display()
        );
        let view = PipelineStage::new(self.samtools.as_str(), samtools::view_sam_args(&spec.input));
        let result = run_to_file(&view, &spec.output, Some(&spec.out_dir)).await;
        self.absorb(
            result,
            &format!(
                "convert {} to {}",
                spec.input.display(),
                spec.output.display()
            ),
            0,
        )
    }

    /// Creates a bai index from a bam file via `samtools index <in> <out>`.
    ///
    /// Unlike the conversions, a swallowed launch failure here reports 1.
    pub async fn create_bai_from_bam(
        &self,
        input_name: &str,
        input_dir: Option<&Path>,
        output_name: Option<&str>,
        output_dir: Option<&Path>,
        validate: bool,
        ignore: Option<&HashSet<String>>,
    ) -> Result<i32, PipelineError> {
        let spec = resolve(input_name, input_dir, output_name, output_dir, BAM_EXT, BAI_EXT)?;
        if !spec.input.exists() {
            return Err(PipelineError::FileNotFound(spec.input));
        }
        if validate {
            if let Some(dir) = input_dir {
                if self.validate(input_name, dir, ignore).await? == 1 {
                    return Ok(1);
                }
            }
        }

        ensure_tool_available(&self.samtools)?;

        info!(
            "Creating bai from bam for file: {} with output file: {} and cwd: {}",
            spec.input.display(),
            spec.output.display(),
            spec.out_dir.display()
        );
        let index = PipelineStage::new(self.samtools.as_str(), samtools::index_args(&spec.input, &spec.output));
        let result = run_capture(&index, Some(&spec.out_dir)).await;
        self.absorb(
            result,
            &format!(
                "index {} to {}",
                spec.input.display(),
                spec.output.display()
            ),
            1,
        )
    }

    /// Collects simple alignment statistics from a bam file via
    /// `samtools flagstat <in>`.
    ///
    /// `input_dir` must be absolute; no default-pathing is applied here.
    /// Launch failures always surface from this operation.
    pub async fn get_stats(
        &self,
        input_name: &str,
        input_dir: &Path,
    ) -> Result<AlignmentStats, PipelineError> {
        if !input_dir.is_absolute() {
            return Err(PipelineError::InvalidArgument(format!(
                "Input path must be an absolute path. Provided: {}",
                input_dir.display()
            )));
        }
        let input = input_dir.join(input_name);
        if !input.exists() {
            return Err(PipelineError::FileNotFound(input));
        }

        ensure_tool_available(&self.samtools)?;

        let flagstat = PipelineStage::new(self.samtools.as_str(), samtools::flagstat_args(&input));
        let result = run_capture(&flagstat, None).await?;
        parse_flagstat(&result.stdout)
    }

    /// Validates a bam/sam file and logs any errors found.
    ///
    /// # Arguments
    ///
    /// * `input_name` - file name.
    /// * `input_dir` - absolute path to the file's directory.
    /// * `ignore` - error tokens that must not fail validation; defaults to
    ///   the known-benign set.
    ///
    /// # Returns
    /// 0 if the file passed validation, else 1.
    pub async fn validate(
        &self,
        input_name: &str,
        input_dir: &Path,
        ignore: Option<&HashSet<String>>,
    ) -> Result<i32, PipelineError> {
        if !input_dir.is_absolute() {
            return Err(PipelineError::InvalidArgument(format!(
                "Input path must be an absolute path. Provided: {}",
                input_dir.display()
            )));
        }
        let input = input_dir.join(input_name);
        if !input.exists() {
            return Err(PipelineError::FileNotFound(input));
        }

        ensure_tool_available(&self.validator)?;

        let stage = PipelineStage::new(self.validator.as_str(), validator::validate_summary_args(&input));
        let result = match run_capture(&stage, None).await {
            Ok(result) => result,
            Err(e) if self.swallow_launch_errors => {
                error!("{} failed validation. {}", input.display(), e);
                return Ok(1);
            }
            Err(e) => return Err(e),
        };

        let ignore = ignore.unwrap_or(&DEFAULT_VALIDATION_IGNORE);
        let verdict = classify(&result.stdout, Some(ignore));
        if verdict.passed {
            info!("{} passed validation", input.display());
            Ok(0)
        } else {
            error!(
                "{} failed validation with errors: {}",
                input.display(),
                verdict.report
            );
            Ok(1)
        }
    }
}
