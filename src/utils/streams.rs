/// Subprocess plumbing: single commands and two-stage pipelines where one
/// tool's stdout feeds the next tool's stdin over an OS pipe.
///
/// The wrapped tools do not reliably signal bad input through their exit
/// codes, so a finished process is never treated as a failure here. Non-zero
/// statuses are logged for post-hoc diagnosis only. Spawn failures are real
/// errors and become `PipelineError::PipelineLaunch`.
use std::fs::File;
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use log::{debug, warn};
use tokio::process::Command;

use crate::config::defs::PipelineError;

/// One stage of an external pipeline: a program and its arguments.
#[derive(Debug, Clone)]
pub struct PipelineStage {
    pub program: String,
    pub args: Vec<String>,
}

impl PipelineStage {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

/// Captured outcome of one subprocess invocation. Ephemeral: lives only for
/// the duration of the call that produced it.
#[derive(Debug)]
pub struct ProcessResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

fn launch_error(tool: &str, e: &std::io::Error) -> PipelineError {
    PipelineError::PipelineLaunch {
        tool: tool.to_string(),
        error: e.to_string(),
    }
}

fn log_status(tool: &str, status: &ExitStatus, stderr: &str) {
    if status.success() {
        debug!("{} finished: {}", tool, status);
    } else {
        // Garbage-in-garbage-out policy: record it, do not fail on it.
        warn!("{} exited with {}; stderr: {}", tool, status, stderr.trim());
    }
}

fn base_command(stage: &PipelineStage, cwd: Option<&Path>) -> Command {
    let mut cmd = Command::new(&stage.program);
    cmd.args(&stage.args)
        .stdin(Stdio::null())
        .stderr(Stdio::piped());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    cmd
}

/// Runs a single command, capturing stdout and stderr as text.
pub async fn run_capture(
    stage: &PipelineStage,
    cwd: Option<&Path>,
) -> Result<ProcessResult, PipelineError> {
    debug!("running: {} {}", stage.program, stage.args.join(" "));
    let child = base_command(stage, cwd)
        .stdout(Stdio::piped())
        .spawn()
        .map_err(|e| launch_error(&stage.program, &e))?;

    let output = child.wait_with_output().await?;
    let result = ProcessResult {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    };
    log_status(&stage.program, &result.status, &result.stderr);
    Ok(result)
}

/// Runs a single command with stdout redirected to a freshly created file.
pub async fn run_to_file(
    stage: &PipelineStage,
    out_path: &Path,
    cwd: Option<&Path>,
) -> Result<ProcessResult, PipelineError> {
    debug!(
        "running: {} {} > {}",
        stage.program,
        stage.args.join(" "),
        out_path.display()
    );
    let out_file = File::create(out_path)?;
    let child = base_command(stage, cwd)
        .stdout(Stdio::from(out_file))
        .spawn()
        .map_err(|e| launch_error(&stage.program, &e))?;

    let output = child.wait_with_output().await?;
    let result = ProcessResult {
        status: output.status,
        stdout: String::new(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    };
    log_status(&stage.program, &result.status, &result.stderr);
    Ok(result)
}

/// Runs `first | second > out_path`.
///
/// The first stage's stdout is handed to the second stage's stdin as a raw
/// pipe descriptor, so the data never crosses this process and the pipe is
/// drained exactly as fast as stage two reads it. Both children are awaited
/// together; both are reaped on every exit path, including a failed launch of
/// stage two.
pub async fn run_piped_to_file(
    first: &PipelineStage,
    second: &PipelineStage,
    out_path: &Path,
    cwd: Option<&Path>,
) -> Result<ProcessResult, PipelineError> {
    debug!(
        "running: {} {} | {} {} > {}",
        first.program,
        first.args.join(" "),
        second.program,
        second.args.join(" "),
        out_path.display()
    );

    let mut first_child = base_command(first, cwd)
        .stdout(Stdio::piped())
        .spawn()
        .map_err(|e| launch_error(&first.program, &e))?;

    let first_stdout = first_child
        .stdout
        .take()
        .ok_or_else(|| PipelineError::PipelineLaunch {
            tool: first.program.clone(),
            error: "no stdout handle on spawned child".to_string(),
        })?;
    let pipe: Stdio = first_stdout
        .try_into()
        .map_err(|e: std::io::Error| launch_error(&first.program, &e))?;

    let out_file = match File::create(out_path) {
        Ok(f) => f,
        Err(e) => {
            reap(&mut first_child).await;
            return Err(e.into());
        }
    };

    let second_child = match base_command(second, cwd)
        .stdin(pipe)
        .stdout(Stdio::from(out_file))
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            reap(&mut first_child).await;
            return Err(launch_error(&second.program, &e));
        }
    };

    let (first_output, second_output) = tokio::join!(
        first_child.wait_with_output(),
        second_child.wait_with_output()
    );
    let first_output = first_output?;
    let second_output = second_output?;

    let first_stderr = String::from_utf8_lossy(&first_output.stderr).to_string();
    let second_stderr = String::from_utf8_lossy(&second_output.stderr).to_string();
    log_status(&first.program, &first_output.status, &first_stderr);
    log_status(&second.program, &second_output.status, &second_stderr);

    Ok(ProcessResult {
        status: second_output.status,
        stdout: String::new(),
        stderr: format!("{}{}", first_stderr, second_stderr),
    })
}

/// Kills and waits on a child whose partner stage could not be started, so no
/// zombie is left behind on the error path.
async fn reap(child: &mut tokio::process::Child) {
    let _ = child.kill().await;
    let _ = child.wait().await;
}
