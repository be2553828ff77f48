//! fxlab - image filter harness console
//!
//! Runs the built-in filters on synthetic sample images through
//! interchangeable backends and verifies them against the reference.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod commands;
mod console;

#[derive(Parser)]
#[command(name = "fxlab")]
#[command(author, version, about = "Image filter harness")]
#[command(long_about = "
Runs image filters on sample images with a choice of backends and checks
the result against the reference implementation.

Every run parameter can also be given as an FXLAB_* environment variable.

Examples:
  fxlab run -f blur -b reference          # Reference blur on baboon
  fxlab run -f sobel -b halide_cpu        # Compiled CPU, verified
  fxlab run -f sharpen -b opencl -w 16x8  # Parallel compute, 16x8 groups
  fxlab run -i doughnuts -s 1024 -f bilateral -b halide_gpu
  fxlab run -f blur -b halide_gpu -d 1    # Second GPU adapter
  FXLAB_FILTER=copy FXLAB_BACKEND=opencl fxlab run
  fxlab backends                          # Show available backends
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Number of threads (0 = auto)
    #[arg(short = 'j', long, global = true, default_value = "0")]
    threads: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one filter on one backend
    #[command(visible_alias = "r")]
    Run(RunArgs),

    /// List filters in index order
    Filters,

    /// List backends and their availability
    Backends,

    /// List sample images
    Images,
}

#[derive(Args)]
struct RunArgs {
    /// Sample image: peppers, baboon, lena, doughnuts
    #[arg(short, long, env = "FXLAB_IMAGE")]
    image: Option<String>,

    /// Filter name (see `fxlab filters`)
    #[arg(short, long, env = "FXLAB_FILTER")]
    filter: Option<String>,

    /// Backend: reference, halide_cpu, halide_gpu, opencl
    #[arg(short, long, env = "FXLAB_BACKEND")]
    backend: Option<String>,

    /// Verify output against the reference (true/false)
    #[arg(long, env = "FXLAB_VERIFY")]
    verify: Option<String>,

    /// Work-group shape, e.g. 16x16
    #[arg(short, long, env = "FXLAB_WORK_GROUP")]
    work_group: Option<String>,

    /// Square image size in pixels
    #[arg(short, long, env = "FXLAB_SIZE")]
    size: Option<String>,

    /// Timed iterations per run
    #[arg(short = 'n', long, env = "FXLAB_ITERATIONS")]
    iterations: Option<String>,

    /// GPU adapter index (see `fxlab backends`)
    #[arg(short, long, env = "FXLAB_DEVICE")]
    device: Option<String>,
}

/// Installs the stderr subscriber. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: bool) -> WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(false)
        .with_writer(writer)
        .init();
    guard
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.verbose);

    // Configure thread pool
    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    match cli.command {
        Commands::Run(args) => commands::run::run(args, cli.verbose),
        Commands::Filters => commands::list::filters(),
        Commands::Backends => commands::list::backends(),
        Commands::Images => commands::list::images(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_flags_parse() {
        let cli = Cli::try_parse_from([
            "fxlab", "-j", "2", "run", "-f", "blur", "-b", "opencl", "-w", "8x8", "-n", "3", "-d",
            "0",
        ])
        .unwrap();
        assert_eq!(cli.threads, 2);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.filter.as_deref(), Some("blur"));
                assert_eq!(args.backend.as_deref(), Some("opencl"));
                assert_eq!(args.work_group.as_deref(), Some("8x8"));
                assert_eq!(args.iterations.as_deref(), Some("3"));
                assert_eq!(args.device.as_deref(), Some("0"));
            }
            _ => panic!("expected run"),
        }
    }
}
