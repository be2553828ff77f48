//! Listing commands: filters, backends, sample images.

use anyhow::Result;
use fxlab_compute::{NativeProcessor, ProcessingBoundary, describe_backends, gpu_adapters};
use fxlab_core::SampleImage;

/// Prints filters with the index used by `--filter`.
pub fn filters() -> Result<()> {
    for (index, name) in NativeProcessor::new().list_filters().iter().enumerate() {
        println!("{index:>2}  {name}");
    }
    Ok(())
}

/// Prints every backend with its availability marker, then the GPU
/// adapters accepted by `--device`.
pub fn backends() -> Result<()> {
    print!("{}", describe_backends());
    let adapters = gpu_adapters();
    if !adapters.is_empty() {
        println!();
        println!("GPU adapters:");
        for (index, name) in adapters.iter().enumerate() {
            println!("{index:>2}  {name}");
        }
    }
    Ok(())
}

pub fn images() -> Result<()> {
    for sample in SampleImage::all() {
        let default = if *sample == SampleImage::default() {
            "  (default)"
        } else {
            ""
        };
        println!("{:<10} {}{}", sample.name(), sample.label(), default);
    }
    Ok(())
}
