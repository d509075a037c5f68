use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

use anyhow::{Result, anyhow};
use env_logger::Builder;
use log::{LevelFilter, error};

use sambam_pipelines::SamTools;
use sambam_pipelines::cli::{Arguments, parse};

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse();

    let log_level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    Builder::new()
        .filter_level(log_level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();

    match run(&args).await {
        Ok(status) => {
            if status != 0 {
                std::process::exit(status);
            }
            Ok(())
        }
        Err(e) => {
            error!("Pipeline failed: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run(args: &Arguments) -> Result<i32> {
    let in_dir = args.in_dir.as_deref().map(Path::new);
    let out_dir = args.out_dir.as_deref().map(Path::new);
    let ignore: Option<HashSet<String>> =
        args.ignore.clone().map(|tokens| tokens.into_iter().collect());

    let tools = SamTools::with_commands(&args.samtools, &args.validator)
        .swallow_launch_errors(args.legacy_swallow_launch_errors);

    let status = match args.module.as_str() {
        "sam_to_bam" => {
            tools
                .convert_sam_to_sorted_bam(
                    &args.file,
                    in_dir,
                    args.out_file.as_deref(),
                    out_dir,
                    args.validate,
                    ignore.as_ref(),
                )
                .await?
        }
        "bam_to_sam" => {
            tools
                .convert_bam_to_sam(
                    &args.file,
                    in_dir,
                    args.out_file.as_deref(),
                    out_dir,
                    args.validate,
                    ignore.as_ref(),
                )
                .await?
        }
        "index" => {
            tools
                .create_bai_from_bam(
                    &args.file,
                    in_dir,
                    args.out_file.as_deref(),
                    out_dir,
                    args.validate,
                    ignore.as_ref(),
                )
                .await?
        }
        "stats" => {
            let dir = in_dir.ok_or_else(|| anyhow!("--in-dir is required for stats"))?;
            let stats = tools.get_stats(&args.file, dir).await?;
            println!("total_reads\t{}", stats.total_reads);
            println!("mapped_reads\t{}", stats.mapped_reads);
            println!("unmapped_reads\t{}", stats.unmapped_reads);
            println!("alignment_rate\t{:.2}", stats.alignment_rate);
            println!("properly_paired\t{}", stats.properly_paired);
            println!("singletons\t{}", stats.singletons);
            println!("multiple_alignments\t{}", stats.multiple_alignments);
            0
        }
        "validate" => {
            let dir = in_dir.ok_or_else(|| anyhow!("--in-dir is required for validate"))?;
            tools.validate(&args.file, dir, ignore.as_ref()).await?
        }
        _ => return Err(anyhow!("Invalid module: {}", args.module)),
    };

    Ok(status)
}
