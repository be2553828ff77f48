//! Launch parameters.
//!
//! Startup configuration arrives as raw strings (command line or
//! environment). Each value is parsed independently; anything invalid or
//! unmatched is logged and ignored, so a bad parameter never prevents the
//! harness from starting.

use std::str::FromStr;

use fxlab_compute::{Backend, WorkGroupShape};
use fxlab_core::SampleImage;
use fxlab_core::sample::DEFAULT_SAMPLE_SIZE;
use tracing::warn;

/// Largest accepted square image size.
pub const MAX_IMAGE_SIZE: u32 = 8192;

/// Raw, unvalidated launch parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchParams {
    /// Sample image name.
    pub image: Option<String>,
    /// Filter name, matched against the boundary's filter list.
    pub filter: Option<String>,
    /// Backend name.
    pub backend: Option<String>,
    /// Verification flag.
    pub verify: Option<String>,
    /// Work-group shape, "XxY" or "X,Y".
    pub work_group: Option<String>,
    /// Square image size in pixels.
    pub size: Option<String>,
    /// Timed iterations.
    pub iterations: Option<String>,
    /// GPU adapter index.
    pub device: Option<String>,
}

/// Launch parameters after validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchPlan {
    pub image: SampleImage,
    pub size: u32,
    /// Index of the matched filter, 0 when unmatched.
    pub filter_index: usize,
    pub backend: Option<Backend>,
    pub verify: bool,
    pub work_group: Option<WorkGroupShape>,
    pub iterations: Option<u32>,
    /// GPU adapter index, `None` for the default adapter.
    pub device: Option<usize>,
    /// True only when both filter and backend matched.
    pub auto_run: bool,
}

impl Default for LaunchPlan {
    fn default() -> Self {
        Self {
            image: SampleImage::default(),
            size: DEFAULT_SAMPLE_SIZE,
            filter_index: 0,
            backend: None,
            verify: true,
            work_group: None,
            iterations: None,
            device: None,
            auto_run: false,
        }
    }
}

impl LaunchParams {
    /// Validates every parameter against `filters`.
    pub fn resolve(&self, filters: &[String]) -> LaunchPlan {
        let defaults = LaunchPlan::default();

        let image = parse_logged("image", self.image.as_deref(), |s| s.parse::<SampleImage>().ok())
            .unwrap_or(defaults.image);
        let size = parse_logged("size", self.size.as_deref(), parse_size).unwrap_or(defaults.size);

        let filter_index = parse_logged("filter", self.filter.as_deref(), |s| {
            let s = s.trim();
            filters.iter().position(|f| f.eq_ignore_ascii_case(s))
        });
        let backend = parse_logged("backend", self.backend.as_deref(), |s| {
            s.parse::<Backend>().ok()
        });
        let verify = parse_logged("verify", self.verify.as_deref(), parse_bool)
            .unwrap_or(defaults.verify);
        let work_group = parse_logged("work_group", self.work_group.as_deref(), parse_work_group);
        let iterations = parse_logged("iterations", self.iterations.as_deref(), |s| {
            s.trim().parse::<u32>().ok().filter(|&n| n >= 1)
        });

        let device = parse_logged("device", self.device.as_deref(), |s| {
            s.trim().parse::<usize>().ok()
        });

        LaunchPlan {
            image,
            size,
            filter_index: filter_index.unwrap_or(defaults.filter_index),
            backend,
            verify,
            work_group,
            iterations,
            device,
            auto_run: filter_index.is_some() && backend.is_some(),
        }
    }
}

/// Parses `raw` with `parse`, logging values that do not parse.
fn parse_logged<T>(name: &str, raw: Option<&str>, parse: impl FnOnce(&str) -> Option<T>) -> Option<T> {
    let raw = raw?;
    let parsed = parse(raw);
    if parsed.is_none() {
        warn!(parameter = name, value = raw, "invalid launch parameter ignored");
    }
    parsed
}

/// Accepts true/false, 1/0, yes/no, on/off.
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Accepts "XxY", "X,Y" or "X Y" with both dimensions at least 1.
pub fn parse_work_group(s: &str) -> Option<WorkGroupShape> {
    let mut parts = s
        .trim()
        .split(|c: char| c == 'x' || c == 'X' || c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty());
    let x = u32::from_str(parts.next()?).ok()?;
    let y = u32::from_str(parts.next()?).ok()?;
    if parts.next().is_some() {
        return None;
    }
    WorkGroupShape::new(x, y)
}

fn parse_size(s: &str) -> Option<u32> {
    s.trim()
        .parse::<u32>()
        .ok()
        .filter(|&n| (1..=MAX_IMAGE_SIZE).contains(&n))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters() -> Vec<String> {
        ["Copy", "Bilateral", "Blur", "Sharpen", "Sobel"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn params() -> LaunchParams {
        LaunchParams::default()
    }

    #[test]
    fn empty_params_give_defaults() {
        assert_eq!(params().resolve(&filters()), LaunchPlan::default());
    }

    #[test]
    fn filter_and_backend_auto_run() {
        let plan = LaunchParams {
            filter: Some("blur".into()),
            backend: Some("HALIDE_CPU".into()),
            ..params()
        }
        .resolve(&filters());
        assert_eq!(plan.filter_index, 2);
        assert_eq!(plan.backend, Some(Backend::CompiledCpu));
        assert!(plan.auto_run);
    }

    #[test]
    fn unmatched_filter_falls_back_without_run() {
        let plan = LaunchParams {
            filter: Some("emboss".into()),
            backend: Some("opencl".into()),
            ..params()
        }
        .resolve(&filters());
        assert_eq!(plan.filter_index, 0);
        assert_eq!(plan.backend, Some(Backend::ParallelCompute));
        assert!(!plan.auto_run);
    }

    #[test]
    fn filter_without_backend_does_not_run() {
        let plan = LaunchParams {
            filter: Some("Sobel".into()),
            backend: Some("cuda".into()),
            ..params()
        }
        .resolve(&filters());
        assert_eq!(plan.filter_index, 4);
        assert_eq!(plan.backend, None);
        assert!(!plan.auto_run);
    }

    #[test]
    fn invalid_values_are_ignored() {
        let plan = LaunchParams {
            image: Some("mandrill".into()),
            verify: Some("maybe".into()),
            work_group: Some("0x8".into()),
            size: Some("0".into()),
            iterations: Some("-3".into()),
            device: Some("gpu0".into()),
            ..params()
        }
        .resolve(&filters());
        assert_eq!(plan, LaunchPlan::default());
    }

    #[test]
    fn valid_values_are_applied() {
        let plan = LaunchParams {
            image: Some("Lena".into()),
            verify: Some("off".into()),
            work_group: Some("16x8".into()),
            size: Some("256".into()),
            iterations: Some("3".into()),
            device: Some("1".into()),
            ..params()
        }
        .resolve(&filters());
        assert_eq!(plan.image, SampleImage::Lena);
        assert!(!plan.verify);
        assert_eq!(plan.work_group, WorkGroupShape::new(16, 8));
        assert_eq!(plan.size, 256);
        assert_eq!(plan.iterations, Some(3));
        assert_eq!(plan.device, Some(1));
    }

    #[test]
    fn work_group_formats() {
        assert_eq!(parse_work_group("32,4"), WorkGroupShape::new(32, 4));
        assert_eq!(parse_work_group(" 8 X 8 "), WorkGroupShape::new(8, 8));
        assert_eq!(parse_work_group("8x8x8"), None);
        assert_eq!(parse_work_group("8"), None);
    }
}
