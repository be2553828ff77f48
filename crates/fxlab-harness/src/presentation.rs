//! Presentation adapter seam.
//!
//! Everything the user sees goes through [`PresentationAdapter`], and only
//! ever from the interactive thread.

use fxlab_core::RgbaImage;

/// Renders harness state to the user.
pub trait PresentationAdapter {
    /// Shows an image (the input after selection, the output after a run).
    fn show_image(&mut self, image: &RgbaImage);

    /// Shows one progress line.
    fn show_status(&mut self, text: &str);

    /// Shows the pass/fail result of a job.
    fn show_outcome(&mut self, success: bool);

    /// Enables or disables the run controls.
    fn set_controls_enabled(&mut self, enabled: bool);

    /// Shows a hard-failure diagnostic. Defaults to a status line.
    fn show_error(&mut self, text: &str) {
        self.show_status(text);
    }
}

impl<P: PresentationAdapter + ?Sized> PresentationAdapter for Box<P> {
    fn show_image(&mut self, image: &RgbaImage) {
        (**self).show_image(image)
    }

    fn show_status(&mut self, text: &str) {
        (**self).show_status(text)
    }

    fn show_outcome(&mut self, success: bool) {
        (**self).show_outcome(success)
    }

    fn set_controls_enabled(&mut self, enabled: bool) {
        (**self).set_controls_enabled(enabled)
    }

    fn show_error(&mut self, text: &str) {
        (**self).show_error(text)
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl PresentationAdapter for NullPresenter {
    fn show_image(&mut self, _image: &RgbaImage) {}
    fn show_status(&mut self, _text: &str) {}
    fn show_outcome(&mut self, _success: bool) {}
    fn set_controls_enabled(&mut self, _enabled: bool) {}
}
