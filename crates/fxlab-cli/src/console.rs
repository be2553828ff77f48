//! Console presentation adapter.
//!
//! Status lines go to stdout as they arrive; errors go to stderr.

use fxlab_core::RgbaImage;
use fxlab_core::image::CHANNELS;
use fxlab_core::pixel::{luma_rec601, unorm};
use fxlab_harness::PresentationAdapter;
use tracing::trace;

/// Prints harness output to the terminal.
pub struct ConsolePresenter {
    verbose: bool,
}

impl ConsolePresenter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl PresentationAdapter for ConsolePresenter {
    fn show_image(&mut self, image: &RgbaImage) {
        if self.verbose {
            println!(
                "  Image: {}x{}, mean luma {:.4}",
                image.width(),
                image.height(),
                mean_luma(image)
            );
        }
    }

    fn show_status(&mut self, text: &str) {
        println!("{text}");
    }

    fn show_outcome(&mut self, success: bool) {
        println!("Result: {}", if success { "success" } else { "failure" });
    }

    fn set_controls_enabled(&mut self, enabled: bool) {
        trace!(enabled, "controls");
    }

    fn show_error(&mut self, text: &str) {
        eprintln!("error: {text}");
    }
}

/// Average Rec.601 luma in [0, 1].
fn mean_luma(image: &RgbaImage) -> f64 {
    let count = image.pixel_count();
    if count == 0 {
        return 0.0;
    }
    let sum: f64 = image
        .data()
        .chunks_exact(CHANNELS)
        .map(|px| luma_rec601(unorm(px[0]), unorm(px[1]), unorm(px[2])) as f64)
        .sum();
    sum / count as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_luma_of_white_is_one() {
        let white = RgbaImage::filled(4, 4, [255, 255, 255, 255]).unwrap();
        assert!((mean_luma(&white) - 1.0).abs() < 1e-4);
    }
}
