use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "scan-recombine",
    version,
    about = "Rebuild clean page images from paired, inverted duplicate scans in a PDF"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Recombine(RecombineArgs),
    Status(StatusArgs),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum LayoutMode {
    /// One book page per scan.
    SinglePage,
    /// Two book pages side by side per scan.
    Spread,
}

impl LayoutMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SinglePage => "single-page",
            Self::Spread => "spread",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum MergeFailurePolicy {
    /// Record the failed page, keep going, and fail the run at the end.
    SkipPage,
    /// Stop at the first failed merge.
    Abort,
}

impl MergeFailurePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SkipPage => "skip-page",
            Self::Abort => "abort",
        }
    }
}

pub fn default_tmp_dir() -> PathBuf {
    std::env::temp_dir().join("split_pdf_tmp")
}

#[derive(Args, Debug, Clone)]
pub struct RecombineArgs {
    /// Path to the pdf file to process.
    pub pdf_scan: PathBuf,

    /// Directory receiving the cleaned page images.
    pub output_dir: PathBuf,

    /// Path of the align_and_merge binary.
    pub align_and_merge: PathBuf,

    #[arg(long, value_enum, default_value_t = LayoutMode::SinglePage)]
    pub mode: LayoutMode,

    #[arg(long, default_value_os_t = default_tmp_dir())]
    pub tmp_dir: PathBuf,

    #[arg(long, default_value = "pdfimages")]
    pub pdfimages_bin: PathBuf,

    #[arg(long, default_value = "convert")]
    pub convert_bin: PathBuf,

    #[arg(long, default_value_t = 14.0)]
    pub black_point: f32,

    #[arg(long, default_value_t = 86.0)]
    pub white_point: f32,

    #[arg(long, value_enum, default_value_t = MergeFailurePolicy::SkipPage)]
    pub on_merge_failure: MergeFailurePolicy,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value_os_t = default_tmp_dir())]
    pub tmp_dir: PathBuf,
}
