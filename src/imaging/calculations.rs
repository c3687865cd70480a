//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Fit `original` inside a `bound`×`bound` box, preserving aspect ratio.
///
/// Images already within the bound keep their size (no upscaling). Otherwise
/// the longer edge becomes `bound` and the shorter edge is `bound / aspect`
/// rounded down, never below 1px. Square images land on `bound`×`bound`.
///
/// # Examples
/// ```text
/// (3000, 2000), 1600 → (1600, 1066)
/// (2000, 3000), 1600 → (1066, 1600)
/// (800, 600),   1600 → (800, 600)
/// ```
pub fn fit_within(original: (u32, u32), bound: u32) -> (u32, u32) {
    let (width, height) = original;
    if width <= bound && height <= bound {
        return original;
    }

    let aspect = width as f64 / height as f64;
    if aspect > 1.0 {
        // Landscape: width is the long edge
        let h = (bound as f64 / aspect).floor() as u32;
        (bound, h.max(1))
    } else {
        // Portrait or square: height is the long edge
        let w = (bound as f64 * aspect).floor() as u32;
        (w.max(1), bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_over_bound() {
        // 3000x2000 (1.5) → 1600 x 1066.67 → 1066
        assert_eq!(fit_within((3000, 2000), 1600), (1600, 1066));
    }

    #[test]
    fn portrait_over_bound() {
        assert_eq!(fit_within((2000, 3000), 1600), (1066, 1600));
    }

    #[test]
    fn square_over_bound() {
        assert_eq!(fit_within((4000, 4000), 1600), (1600, 1600));
    }

    #[test]
    fn within_bound_is_unchanged() {
        assert_eq!(fit_within((800, 600), 1600), (800, 600));
        assert_eq!(fit_within((1600, 1600), 1600), (1600, 1600));
    }

    #[test]
    fn only_one_edge_over_bound() {
        // 1700x100: only the width exceeds
        assert_eq!(fit_within((1700, 100), 1600), (1600, 94));
        assert_eq!(fit_within((100, 1700), 1600), (94, 1600));
    }

    #[test]
    fn extreme_aspect_never_collapses_to_zero() {
        assert_eq!(fit_within((100_000, 1), 1600), (1600, 1));
        assert_eq!(fit_within((1, 100_000), 1600), (1, 1600));
    }

    #[test]
    fn aspect_preserved_within_one_pixel() {
        let cases = [(3000, 2000), (4032, 3024), (1601, 900), (5000, 3333), (2048, 1365)];
        for (w, h) in cases {
            let (ow, oh) = fit_within((w, h), 1600);
            assert_eq!(ow.max(oh), 1600, "long edge for {w}x{h}");
            let expected_short = 1600.0 * w.min(h) as f64 / w.max(h) as f64;
            let short = ow.min(oh) as f64;
            assert!(
                (short - expected_short).abs() <= 1.0,
                "{w}x{h} → {ow}x{oh}, expected short edge ≈ {expected_short}"
            );
        }
    }
}
