use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

/// Type-checks a CCL program and reports the first diagnostic found, if any.
#[derive(Parser, Debug)]
#[command(name = "ccl-check", version, about)]
struct Args {
    /// Path to a surface JSON program (see `ccl_cli::surface`).
    program: PathBuf,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match ccl_cli::check_file(&args.program) {
        Ok(()) => {
            println!("{}: ok", args.program.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", args.program.display(), e);
            ExitCode::FAILURE
        }
    }
}
