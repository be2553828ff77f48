//! Output verification and timing report.

use std::time::Duration;

use fxlab_core::RgbaImage;
use fxlab_core::image::CHANNELS;

use crate::{ComputeResult, StatusReporter};

/// Per-channel tolerance in 8-bit code values.
pub const TOLERANCE: u8 = 1;

/// Mismatches reported individually before the rest are suppressed.
pub const MAX_REPORTED_MISMATCHES: u64 = 16;

/// Upper bound on decimal places in the timing report.
const MAX_DECIMALS: usize = 6;

/// Compares `output` against `reference` channel by channel.
///
/// Reports the first [`MAX_REPORTED_MISMATCHES`] differences larger than
/// `tolerance` as "Mismatch at (x,y,c): r vs o", then one suppression notice.
/// Returns the total number of mismatching channels.
pub fn compare(
    reference: &RgbaImage,
    output: &RgbaImage,
    tolerance: u8,
    status: &mut StatusReporter<'_>,
) -> ComputeResult<u64> {
    reference.ensure_same_dimensions(output)?;
    let width = reference.width() as usize;

    let mut errors = 0u64;
    for (i, (&r, &o)) in reference.data().iter().zip(output.data()).enumerate() {
        if r.abs_diff(o) <= tolerance {
            continue;
        }
        if errors < MAX_REPORTED_MISMATCHES {
            let px = i / CHANNELS;
            let (x, y, c) = (px % width, px / width, i % CHANNELS);
            status.report(format!("Mismatch at ({x},{y},{c}): {r} vs {o}"));
        }
        errors += 1;
        if errors == MAX_REPORTED_MISMATCHES {
            status.report("Suppressing further errors");
        }
    }
    Ok(errors)
}

/// Decimal places that show roughly two significant figures of `ms`.
pub fn decimals_for(ms: f64) -> usize {
    if !ms.is_finite() || ms <= 0.0 {
        return MAX_DECIMALS;
    }
    let dp = 1.0 - ms.log10().floor();
    dp.clamp(0.0, MAX_DECIMALS as f64) as usize
}

/// Average time per iteration in milliseconds.
pub fn average_ms(total: Duration, iterations: u32) -> f64 {
    total.as_secs_f64() * 1e3 / iterations.max(1) as f64
}

/// "Finished in N ms", followed by the verification verdict when one exists.
pub fn finish_message(ms: f64, verified: Option<bool>) -> String {
    let dp = decimals_for(ms);
    match verified {
        Some(true) => format!("Finished in {ms:.dp$} ms (verification passed)"),
        Some(false) => format!("Finished in {ms:.dp$} ms (verification failed)"),
        None => format!("Finished in {ms:.dp$} ms"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn collect(reference: &RgbaImage, output: &RgbaImage) -> (u64, Vec<String>) {
        let mut seen = Vec::new();
        let mut sink = |m: String| seen.push(m);
        let errors = {
            let mut status = StatusReporter::new(&mut sink);
            compare(reference, output, TOLERANCE, &mut status).unwrap()
        };
        (errors, seen)
    }

    #[test]
    fn within_tolerance_passes() {
        let a = RgbaImage::filled(4, 4, [10, 10, 10, 255]).unwrap();
        let b = RgbaImage::filled(4, 4, [11, 9, 10, 254]).unwrap();
        let (errors, msgs) = collect(&a, &b);
        assert_eq!(errors, 0);
        assert!(msgs.is_empty());
    }

    #[test]
    fn reports_location_and_values() {
        let a = RgbaImage::filled(4, 3, [10, 10, 10, 255]).unwrap();
        let mut b = a.clone();
        b.put_pixel(2, 1, [10, 10, 40, 255]);
        let (errors, msgs) = collect(&a, &b);
        assert_eq!(errors, 1);
        assert_eq!(msgs, vec!["Mismatch at (2,1,2): 10 vs 40"]);
    }

    #[test]
    fn suppresses_after_sixteen() {
        let a = RgbaImage::filled(8, 8, [0, 0, 0, 0]).unwrap();
        let b = RgbaImage::filled(8, 8, [9, 9, 9, 9]).unwrap();
        let (errors, msgs) = collect(&a, &b);
        assert_eq!(errors, 8 * 8 * 4);
        assert_eq!(msgs.len(), 17);
        assert_eq!(msgs[0], "Mismatch at (0,0,0): 0 vs 9");
        assert_eq!(msgs[16], "Suppressing further errors");
    }

    #[test]
    fn decimals_give_two_significant_figures() {
        assert_eq!(decimals_for(0.0123), 3);
        assert_eq!(decimals_for(1.5), 1);
        assert_eq!(decimals_for(42.0), 0);
        assert_eq!(decimals_for(1234.0), 0);
        assert_eq!(decimals_for(0.0), MAX_DECIMALS);
    }

    #[test]
    fn finish_messages() {
        assert_eq!(
            finish_message(2.345, Some(true)),
            "Finished in 2.3 ms (verification passed)"
        );
        assert_eq!(
            finish_message(150.0, Some(false)),
            "Finished in 150 ms (verification failed)"
        );
        assert_eq!(finish_message(0.5, None), "Finished in 0.50 ms");
    }

    #[test]
    fn average_divides_by_iterations() {
        assert_relative_eq!(average_ms(Duration::from_millis(80), 8), 10.0, epsilon = 1e-9);
        assert_relative_eq!(average_ms(Duration::from_millis(5), 0), 5.0, epsilon = 1e-9);
    }
}
