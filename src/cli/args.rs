use clap::Parser;

use crate::config::defs::{SAMTOOLS_TAG, VALIDATOR_TAG};

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "sambam-pipelines", version)]
pub struct Arguments {
    #[arg(
        short,
        long,
        help = "Operation to run: sam_to_bam, bam_to_sam, index, stats or validate"
    )]
    pub module: String,

    #[arg(short = 'v', long = "verbose", action)]
    pub verbose: bool,

    #[arg(short = 'i', long = "file", help = "Input file name")]
    pub file: String,

    #[arg(long = "in-dir", help = "Absolute path to the input file's directory")]
    pub in_dir: Option<String>,

    #[arg(short = 'o', long = "out", help = "Output file name. Defaults to the input name with its extension rewritten for the operation.")]
    pub out_file: Option<String>,

    #[arg(long = "out-dir", help = "Absolute output directory. Defaults to the input directory.")]
    pub out_dir: Option<String>,

    #[arg(long, default_value_t = false, help = "Validate the input file before running the operation")]
    pub validate: bool,

    #[clap(
        long,
        value_delimiter = ',',
        help = "Comma-separated validator error tokens to ignore (e.g., MATE_NOT_FOUND,MISSING_READ_GROUP)"
    )]
    pub ignore: Option<Vec<String>>,

    #[arg(long, default_value = SAMTOOLS_TAG, help = "samtools command or path")]
    pub samtools: String,

    #[arg(long, default_value = VALIDATOR_TAG, help = "Validator command or path")]
    pub validator: String,

    #[arg(
        long,
        default_value_t = false,
        help = "Log subprocess launch failures instead of failing the run (legacy behavior)"
    )]
    pub legacy_swallow_launch_errors: bool,
}
