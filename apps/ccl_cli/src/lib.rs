//! Driver for the semantic analyser: reads a surface JSON program from disk,
//! lowers it, and runs it through `ccl_analysis::analyse`.

pub mod lower;
pub mod surface;

use std::fs;
use std::path::Path;

use ccl_base::Interner;
use ccl_analysis::Diagnostic;

#[derive(Debug)]
pub enum CliError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Lowering(lower::LowerError),
    Analysis(Diagnostic),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Io(e) => write!(f, "could not read input file: {e}"),
            CliError::Json(e) => write!(f, "could not parse surface JSON: {e}"),
            CliError::Lowering(e) => write!(f, "could not lower surface program: {e}"),
            CliError::Analysis(d) => write!(f, "{d}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Json(e)
    }
}

impl From<lower::LowerError> for CliError {
    fn from(e: lower::LowerError) -> Self {
        CliError::Lowering(e)
    }
}

/// Reads, lowers, and analyses the program at `path`. Logs pass boundaries at
/// debug level; the caller is responsible for printing the outcome.
pub fn check_file(path: &Path) -> Result<(), CliError> {
    log::debug!("reading {}", path.display());
    let text = fs::read_to_string(path)?;
    let surface_program: surface::Program = serde_json::from_str(&text)?;

    let mut interner = Interner::new();
    let arenas = lower::Arenas::default();
    let program = lower::lower(&arenas, &mut interner, &surface_program)?;

    ccl_analysis::analyse(&program, &interner).map(|_| ()).map_err(CliError::Analysis)
}
