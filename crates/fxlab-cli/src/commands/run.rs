//! Run command.
//!
//! Resolves launch parameters, renders the sample image and drives one job
//! through the harness. A job starts only when both filter and backend were
//! given and matched.

use anyhow::{Context, Result, bail};
use fxlab_compute::{NativeProcessor, ProcessingBoundary};
use fxlab_harness::{Harness, JobOutcome, LaunchParams, LaunchPlan};
use tracing::{info, warn};

use crate::RunArgs;
use crate::console::ConsolePresenter;

impl From<RunArgs> for LaunchParams {
    fn from(args: RunArgs) -> Self {
        Self {
            image: args.image,
            filter: args.filter,
            backend: args.backend,
            verify: args.verify,
            work_group: args.work_group,
            size: args.size,
            iterations: args.iterations,
            device: args.device,
        }
    }
}

pub fn run(args: RunArgs, verbose: bool) -> Result<()> {
    let mut processor = NativeProcessor::new();
    let plan = LaunchParams::from(args).resolve(&processor.list_filters());
    info!(?plan, "launch plan");
    processor.set_gpu_adapter(plan.device);

    let image = plan
        .image
        .render(plan.size, plan.size)
        .with_context(|| format!("Failed to render {} at {}", plan.image.name(), plan.size))?;

    if verbose {
        print_plan(&plan);
    }

    let mut harness = Harness::new(processor, ConsolePresenter::new(verbose), image)
        .context("Failed to start harness")?;

    if harness.apply_launch(&plan)?.is_none() {
        warn!("no run started: both --filter and --backend must name a known value");
        println!("Nothing to run. See `fxlab filters` and `fxlab backends`.");
        harness.shutdown()?;
        return Ok(());
    }

    let outcome = harness.wait();
    harness.shutdown()?;

    match outcome {
        Some(JobOutcome::Success) | None => Ok(()),
        Some(JobOutcome::VerificationFailure) => bail!("verification failed"),
        Some(JobOutcome::ExecutionError(msg)) => bail!("execution failed: {msg}"),
    }
}

fn print_plan(plan: &LaunchPlan) {
    println!("Image:      {} {}x{}", plan.image.label(), plan.size, plan.size);
    println!("Filter:     #{}", plan.filter_index);
    match plan.backend {
        Some(backend) => println!("Backend:    {}", backend.label()),
        None => println!("Backend:    -"),
    }
    println!("Verify:     {}", plan.verify);
    match plan.work_group {
        Some(shape) => println!("Work group: {shape}"),
        None => println!("Work group: default"),
    }
    if let Some(n) = plan.iterations {
        println!("Iterations: {n}");
    }
    if let Some(index) = plan.device {
        println!("Device:     #{index}");
    }
}
