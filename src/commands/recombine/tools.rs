use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("failed to execute {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} returned non-zero exit status {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("expected output was not produced: {}", .0.display())]
    MissingOutput(PathBuf),
}

/// Pulls the raster images out of a PDF.
pub trait ImageExtractor {
    /// Writes `<output_root>-<index>.<ext>` files next to `output_root`.
    fn extract(&self, pdf_path: &Path, output_root: &Path) -> Result<(), ToolError>;

    fn version(&self) -> Option<String> {
        None
    }
}

pub trait RasterToolkit {
    fn rotate(&self, source: &Path, degrees: i32, destination: &Path) -> Result<(), ToolError>;

    /// Cuts `source` into a 2x1 grid. `output_pattern` carries a `%02d`
    /// placeholder that receives the tile number, left tile first.
    fn crop_halves(&self, source: &Path, output_pattern: &Path) -> Result<(), ToolError>;

    fn level(
        &self,
        source: &Path,
        black_percent: f32,
        white_percent: f32,
        destination: &Path,
    ) -> Result<(), ToolError>;

    fn version(&self) -> Option<String> {
        None
    }
}

/// Registers `first` onto `second` and averages the two into `destination`.
pub trait MergeTool {
    fn merge(&self, first: &Path, second: &Path, destination: &Path) -> Result<(), ToolError>;
}

pub struct Toolchain<'a> {
    pub extractor: &'a dyn ImageExtractor,
    pub raster: &'a dyn RasterToolkit,
    pub merger: &'a dyn MergeTool,
}

pub struct Pdfimages {
    program: PathBuf,
}

impl Pdfimages {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl ImageExtractor for Pdfimages {
    fn extract(&self, pdf_path: &Path, output_root: &Path) -> Result<(), ToolError> {
        let mut command = Command::new(&self.program);
        command.arg("-j").arg(pdf_path).arg(output_root);
        run_tool(&mut command)
    }

    fn version(&self) -> Option<String> {
        command_version_optional(&self.program, &["-v"])
    }
}

pub struct ImageMagick {
    program: PathBuf,
}

impl ImageMagick {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl RasterToolkit for ImageMagick {
    fn rotate(&self, source: &Path, degrees: i32, destination: &Path) -> Result<(), ToolError> {
        let mut command = Command::new(&self.program);
        command
            .arg(source)
            .arg("-rotate")
            .arg(degrees.to_string())
            .arg(destination);
        run_tool(&mut command)
    }

    fn crop_halves(&self, source: &Path, output_pattern: &Path) -> Result<(), ToolError> {
        let mut command = Command::new(&self.program);
        command
            .arg(source)
            .arg("-crop")
            .arg("2x1@")
            .arg("+repage")
            .arg(output_pattern);
        run_tool(&mut command)
    }

    fn level(
        &self,
        source: &Path,
        black_percent: f32,
        white_percent: f32,
        destination: &Path,
    ) -> Result<(), ToolError> {
        let mut command = Command::new(&self.program);
        command
            .arg(source)
            .arg("-level")
            .arg(format!("{black_percent}%,{white_percent}%"))
            .arg(destination);
        run_tool(&mut command)
    }

    fn version(&self) -> Option<String> {
        command_version_optional(&self.program, &["-version"])
    }
}

pub struct AlignAndMerge {
    program: PathBuf,
}

impl AlignAndMerge {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl MergeTool for AlignAndMerge {
    fn merge(&self, first: &Path, second: &Path, destination: &Path) -> Result<(), ToolError> {
        let mut command = Command::new(&self.program);
        command
            .arg("--grayscale")
            .arg(first)
            .arg(second)
            .arg(destination);
        run_tool(&mut command)
    }
}

pub fn render_command(command: &Command) -> String {
    let mut parts = vec![command.get_program().to_string_lossy().into_owned()];
    parts.extend(
        command
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned()),
    );
    parts.join(" ")
}

fn run_tool(command: &mut Command) -> Result<(), ToolError> {
    let program = command.get_program().to_string_lossy().into_owned();
    info!(command = %render_command(command), "running");

    let output = command.output().map_err(|source| ToolError::Spawn {
        program: program.clone(),
        source,
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ToolError::Failed {
            program,
            status: output.status.to_string(),
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(())
}

fn command_version_optional(program: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let source = if stdout.trim().is_empty() {
        stderr.trim()
    } else {
        stdout.trim()
    };

    source
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
}
