use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use anyhow::Result;
use sambam_pipelines::SamTools;
use sambam_pipelines::config::defs::PipelineError;

/// Writes an executable shell script standing in for an external tool.
fn write_stub(dir: &Path, name: &str, body: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body))?;
    let mut perms = std::fs::metadata(&path)?.permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms)?;
    Ok(path)
}

/// A samtools stand-in: view cats the named file, sort cats stdin, index
/// writes a marker to its output argument, flagstat prints a fixed report.
fn stub_samtools(dir: &Path) -> Result<PathBuf> {
    write_stub(
        dir,
        "samtools",
        r#"cmd="$1"
shift
case "$cmd" in
  view)
    cat "$2"
    ;;
  sort)
    cat
    ;;
  index)
    printf 'BAI' > "$2"
    ;;
  flagstat)
    cat <<'EOF'
10 + 2 in total (QC-passed reads + QC-failed reads)
0 + 0 secondary
0 + 0 supplementary
0 + 0 duplicates
8 + 0 mapped (66.67% : N/A)
12 + 0 paired in sequencing
6 + 0 read1
6 + 0 read2
6 + 0 properly paired (50.00% : N/A)
7 + 0 with itself and mate mapped
1 + 0 singletons (8.33% : N/A)
EOF
    ;;
esac"#,
    )
}

#[tokio::test]
async fn test_sam_to_sorted_bam_stages_bytes_through_the_pipe() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let samtools = stub_samtools(dir.path())?;
    std::fs::write(dir.path().join("reads.sam"), "r1\tdata\nr2\tdata\n")?;

    let tools = SamTools::with_commands(samtools.to_string_lossy(), "unused");
    let status = tools
        .convert_sam_to_sorted_bam("reads.sam", Some(dir.path()), None, None, false, None)
        .await?;
    assert_eq!(status, 0);

    let out = dir.path().join("reads.bam");
    assert_eq!(std::fs::read_to_string(&out)?, "r1\tdata\nr2\tdata\n");

    // Deterministic stub tools must give byte-identical output across runs.
    let first = std::fs::read(&out)?;
    let status = tools
        .convert_sam_to_sorted_bam("reads.sam", Some(dir.path()), None, None, false, None)
        .await?;
    assert_eq!(status, 0);
    assert_eq!(std::fs::read(&out)?, first);
    Ok(())
}

#[tokio::test]
async fn test_bam_to_sam_redirects_stdout_to_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let samtools = stub_samtools(dir.path())?;
    std::fs::write(dir.path().join("reads.bam"), "bam bytes")?;

    let tools = SamTools::with_commands(samtools.to_string_lossy(), "unused");
    let status = tools
        .convert_bam_to_sam("reads.bam", Some(dir.path()), None, None, false, None)
        .await?;
    assert_eq!(status, 0);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("reads.sam"))?,
        "bam bytes"
    );
    Ok(())
}

#[tokio::test]
async fn test_create_bai_from_bam() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let samtools = stub_samtools(dir.path())?;
    std::fs::write(dir.path().join("reads.bam"), "bam bytes")?;

    let tools = SamTools::with_commands(samtools.to_string_lossy(), "unused");
    let status = tools
        .create_bai_from_bam("reads.bam", Some(dir.path()), None, None, false, None)
        .await?;
    assert_eq!(status, 0);
    assert_eq!(std::fs::read_to_string(dir.path().join("reads.bai"))?, "BAI");
    Ok(())
}

#[tokio::test]
async fn test_get_stats_parses_flagstat_output() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let samtools = stub_samtools(dir.path())?;
    std::fs::write(dir.path().join("reads.bam"), "bam bytes")?;

    let tools = SamTools::with_commands(samtools.to_string_lossy(), "unused");
    let stats = tools.get_stats("reads.bam", dir.path()).await?;
    assert_eq!(stats.total_reads, 12);
    assert_eq!(stats.mapped_reads, 8);
    assert_eq!(stats.unmapped_reads, 4);
    assert!((stats.alignment_rate - 66.666_666_666_666_67).abs() < 1e-9);
    assert_eq!(stats.properly_paired, 6);
    assert_eq!(stats.singletons, 1);
    Ok(())
}

#[tokio::test]
async fn test_validate_with_benign_and_unlisted_tokens() -> Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("reads.bam"), "bam bytes")?;

    let benign = write_stub(dir.path(), "validator-pass", "echo 'ERROR:MATE_NOT_FOUND'")?;
    let tools = SamTools::with_commands("unused", benign.to_string_lossy());
    assert_eq!(tools.validate("reads.bam", dir.path(), None).await?, 0);

    let failing = write_stub(dir.path(), "validator-fail", "echo 'ERROR:SOMETHING_ELSE'")?;
    let tools = SamTools::with_commands("unused", failing.to_string_lossy());
    assert_eq!(tools.validate("reads.bam", dir.path(), None).await?, 1);
    Ok(())
}

#[tokio::test]
async fn test_failed_pre_validation_aborts_conversion() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let samtools = stub_samtools(dir.path())?;
    std::fs::write(dir.path().join("reads.sam"), "sam bytes")?;
    let failing = write_stub(dir.path(), "validator", "echo 'ERROR:SOMETHING_ELSE'")?;

    let tools = SamTools::with_commands(samtools.to_string_lossy(), failing.to_string_lossy());
    let status = tools
        .convert_sam_to_sorted_bam("reads.sam", Some(dir.path()), None, None, true, None)
        .await?;
    assert_eq!(status, 1);
    assert!(!dir.path().join("reads.bam").exists());
    Ok(())
}

#[tokio::test]
async fn test_launch_failure_surfaces_by_default() -> Result<()> {
    let dir = tempfile::tempdir()?;
    // Present on disk so the availability check passes, but not executable,
    // so the spawn itself fails.
    let broken = dir.path().join("samtools");
    std::fs::write(&broken, "not a program")?;
    std::fs::write(dir.path().join("reads.sam"), "sam bytes")?;

    let tools = SamTools::with_commands(broken.to_string_lossy(), "unused");
    let err = tools
        .convert_sam_to_sorted_bam("reads.sam", Some(dir.path()), None, None, false, None)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::PipelineLaunch { .. }));
    Ok(())
}

#[tokio::test]
async fn test_legacy_swallow_keeps_per_operation_status_codes() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let broken = dir.path().join("samtools");
    std::fs::write(&broken, "not a program")?;
    std::fs::write(dir.path().join("reads.sam"), "sam bytes")?;
    std::fs::write(dir.path().join("reads.bam"), "bam bytes")?;

    let tools = SamTools::with_commands(broken.to_string_lossy(), "unused")
        .swallow_launch_errors(true);

    // Conversions historically reported success after a swallowed failure;
    // index creation reported failure. Both behaviors are kept distinct.
    let status = tools
        .convert_sam_to_sorted_bam("reads.sam", Some(dir.path()), None, None, false, None)
        .await?;
    assert_eq!(status, 0);

    let status = tools
        .create_bai_from_bam("reads.bam", Some(dir.path()), None, None, false, None)
        .await?;
    assert_eq!(status, 1);
    Ok(())
}

#[tokio::test]
async fn test_explicit_ignore_set_overrides_default() -> Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("reads.bam"), "bam bytes")?;
    let stub = write_stub(dir.path(), "validator", "echo 'ERROR:MATE_NOT_FOUND'")?;

    // MATE_NOT_FOUND is benign by default, but an explicit ignore set that
    // omits it must fail the file.
    let tools = SamTools::with_commands("unused", stub.to_string_lossy());
    let ignore = ["INVALID_MAPPING_QUALITY".to_string()].into_iter().collect();
    assert_eq!(
        tools
            .validate("reads.bam", dir.path(), Some(&ignore))
            .await?,
        1
    );
    Ok(())
}
