use clap::Parser;
use isuprof::{Config, Instrumenter, IsuprofError, Report, Result};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "isuprof")]
#[command(about = "Wrap every function call of a Go package with a timing profiler", long_about = None)]
struct Cli {
    /// Directory containing the Go package to instrument
    dir: PathBuf,
}

/// Logs go to stderr; `RUST_LOG` overrides the default `info` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}

fn run(cli: &Cli) -> Result<Report> {
    let config = Config::load(&cli.dir)?;
    let cwd = std::env::current_dir()
        .map_err(|e| IsuprofError::Load(format!("failed to get current directory: {}", e)))?;
    let output_dir = cwd.join(&config.output_dir);
    Instrumenter::new(config, output_dir).run(&cli.dir)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(&cli) {
        Ok(report) => {
            println!(
                "instrumented {} call(s) in {} file(s) with {} wrapper(s)",
                report.rewritten, report.files, report.wrappers
            );
            if report.skipped > 0 {
                println!("left {} call(s) uninstrumented", report.skipped);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
