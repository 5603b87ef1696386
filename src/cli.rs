use clap::Parser;
use std::path::PathBuf;

use crate::media::MEDIA_PREFIX;

/// Input looked for in the working directory when none is given.
pub const DEFAULT_INPUT: &str = "document.docx";

/// Output directory used when `-d` is not given.
pub const DEFAULT_OUTPUT_DIR: &str = "images";

#[derive(Parser, Debug)]
#[command(name = "docximg")]
#[command(version)]
#[command(about = "Extract embedded images from a .docx document", long_about = None)]
#[command(after_help = "Examples:\n  \
  docximg                       extract document.docx into ./images\n  \
  docximg report.docx -d out    extract report.docx into ./out\n  \
  docximg -l report.docx        show what would be extracted")]
pub struct Cli {
    /// Document container (.docx) to read
    #[arg(value_name = "FILE", default_value = DEFAULT_INPUT)]
    pub file: PathBuf,

    /// Extract images into DIR
    #[arg(short = 'd', value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Archive directory holding the images
    #[arg(long, value_name = "PREFIX", default_value = MEDIA_PREFIX)]
    pub prefix: String,

    /// List images and their output names without extracting
    #[arg(short = 'l', long)]
    pub list: bool,

    /// Quiet mode, no per-image progress
    #[arg(short = 'q')]
    pub quiet: bool,
}
