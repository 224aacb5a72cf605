//! Chromaticity math used to steer the search.
//!
//! The XYZ to RGB matrix is fixed and unnormalized: its results are only ever
//! compared with each other, never displayed.

use crate::types::{Rgb, XY};

#[rustfmt::skip]
const XYZ_TO_RGB: [[f64; 3]; 3] = [
    [  0.41847,    -0.15866,   -0.082835 ],
    [ -0.091169,    0.25243,    0.015708 ],
    [  0.00092090, -0.0025498,  0.17860  ],
];

/// Convert a chromaticity at unit luminance to linear RGB.
///
/// `xy.y` must not be zero. Measurements and configured targets are checked
/// with [`XY::is_valid`] before they get here.
#[must_use]
pub fn xy_to_rgb(xy: XY) -> Rgb {
    let (x, z) = (xy.x / xy.y, (1.0 - xy.x - xy.y) / xy.y);
    let [r, g, b] = XYZ_TO_RGB.map(|row| row[0].mul_add(x, row[2].mul_add(z, row[1])));
    Rgb::new(r, g, b)
}

#[must_use]
pub fn distance(a: XY, b: XY) -> f64 {
    a.distance(b)
}

#[must_use]
pub fn difference(a: Rgb, b: Rgb) -> Rgb {
    Rgb::new(a.r - b.r, a.g - b.g, a.b - b.b)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Linear RGB of the D65 white point.
    const D65_RGB: Rgb = Rgb {
        r: 0.148_866_771_168_925_9,
        g: 0.182_884_826_971_004_8,
        b: 0.192_803_055_871_983_5,
    };

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-12, "{a} != {b}");
    }

    #[test]
    fn d65_to_rgb_is_stable() {
        let first = xy_to_rgb(XY::D65_WHITE_POINT);
        let second = xy_to_rgb(XY::D65_WHITE_POINT);
        assert_eq!(first, second);

        assert_close(first.r, D65_RGB.r);
        assert_close(first.g, D65_RGB.g);
        assert_close(first.b, D65_RGB.b);
    }

    #[test]
    fn distance_properties() {
        let points = [
            XY::D65_WHITE_POINT,
            XY::new(0.64, 0.33),
            XY::new(0.3, 0.6),
            XY::new(0.15, 0.06),
        ];

        for a in points {
            assert_eq!(distance(a, a), 0.0);
            for b in points {
                assert_eq!(distance(a, b), distance(b, a));
            }
        }

        assert_close(distance(XY::new(0.0, 0.0), XY::new(0.3, 0.4)), 0.5);
    }

    #[test]
    fn difference_is_componentwise() {
        let diff = difference(Rgb::new(1.0, 0.5, 0.25), Rgb::new(0.5, 0.5, 1.0));
        assert_eq!(diff, Rgb::new(0.5, 0.0, -0.75));
    }
}
