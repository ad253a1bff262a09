//! Colormaps for heatmaps and digit images.

use plotters::style::RGBColor;

/// Anchor colors of the diverging `seismic` map (dark blue, blue, white, red, dark red).
const SEISMIC: [(f64, [f64; 3]); 5] = [
    (0.0, [0.0, 0.0, 0.3]),
    (0.25, [0.0, 0.0, 1.0]),
    (0.5, [1.0, 1.0, 1.0]),
    (0.75, [1.0, 0.0, 0.0]),
    (1.0, [0.5, 0.0, 0.0]),
];

/// Diverging blue-white-red color for `v` on `[lo, hi]`; values outside are clamped.
pub fn seismic(v: f64, lo: f64, hi: f64) -> RGBColor {
    let u = if hi > lo && v.is_finite() {
        ((v - lo) / (hi - lo)).clamp(0.0, 1.0)
    } else {
        0.5
    };
    let upper = SEISMIC.iter().position(|&(pos, _)| pos >= u).unwrap_or(SEISMIC.len() - 1).max(1);
    let (p0, c0) = SEISMIC[upper - 1];
    let (p1, c1) = SEISMIC[upper];
    let t = (u - p0) / (p1 - p0);
    let channel = |i: usize| to_u8(c0[i] + t * (c1[i] - c0[i]));
    RGBColor(channel(0), channel(1), channel(2))
}

/// Reversed grayscale: 0 is white, 1 is black.
pub fn gray_r(v: f64) -> RGBColor {
    let level = to_u8(1.0 - if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 });
    RGBColor(level, level, level)
}

fn to_u8(c: f64) -> u8 {
    (c * 255.0).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seismic_anchors() {
        assert_eq!(seismic(0.0, -1.0, 1.0), RGBColor(255, 255, 255));
        assert_eq!(seismic(-1.0, -1.0, 1.0), RGBColor(0, 0, 77));
        assert_eq!(seismic(1.0, -1.0, 1.0), RGBColor(128, 0, 0));
        assert_eq!(seismic(-0.5, -1.0, 1.0), RGBColor(0, 0, 255));
        // clamped
        assert_eq!(seismic(7.0, -1.0, 1.0), seismic(1.0, -1.0, 1.0));
    }

    #[test]
    fn gray_r_is_inverted() {
        assert_eq!(gray_r(0.0), RGBColor(255, 255, 255));
        assert_eq!(gray_r(1.0), RGBColor(0, 0, 0));
    }
}
