use std::fmt;

use serde::{Deserialize, Serialize};

use crate::colorimetry::{difference, xy_to_rgb};
use crate::types::{Rgb, Rgb8, XY};

/// Value of the pinned channel for the whole run.
pub const PINNED_VALUE: u8 = 255;

#[derive(Copy, Debug, Clone, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which two channels are searched. The remaining one stays at [`PINNED_VALUE`].
#[derive(Copy, Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChannelPair {
    GreenBlue,
    RedBlue,
    RedGreen,
}

impl ChannelPair {
    #[must_use]
    pub const fn pinned(self) -> Channel {
        match self {
            Self::GreenBlue => Channel::Red,
            Self::RedBlue => Channel::Green,
            Self::RedGreen => Channel::Blue,
        }
    }

    #[must_use]
    pub const fn channels(self) -> [Channel; 2] {
        match self {
            Self::GreenBlue => [Channel::Green, Channel::Blue],
            Self::RedBlue => [Channel::Red, Channel::Blue],
            Self::RedGreen => [Channel::Red, Channel::Green],
        }
    }

    /// Build the full color for the given values of the searched channels.
    #[must_use]
    pub const fn compose(self, values: [u8; 2]) -> Rgb8 {
        let [a, b] = values;
        match self {
            Self::GreenBlue => Rgb8::new(PINNED_VALUE, a, b),
            Self::RedBlue => Rgb8::new(a, PINNED_VALUE, b),
            Self::RedGreen => Rgb8::new(a, b, PINNED_VALUE),
        }
    }

    /// Extract the searched channel values from a full color.
    #[must_use]
    pub const fn project(self, color: Rgb8) -> [u8; 2] {
        match self {
            Self::GreenBlue => [color.g, color.b],
            Self::RedBlue => [color.r, color.b],
            Self::RedGreen => [color.r, color.g],
        }
    }

    const fn pinning(channel: Channel) -> Self {
        match channel {
            Channel::Red => Self::GreenBlue,
            Channel::Green => Self::RedBlue,
            Channel::Blue => Self::RedGreen,
        }
    }
}

impl fmt::Display for ChannelPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b] = self.channels();
        write!(f, "{a} and {b}")
    }
}

/// Rule for choosing the channel that stays pinned.
///
/// `Largest` pins the channel with the largest error component, assuming it is
/// already closest to correct at full output. This is an empirical choice, so
/// `Smallest` is available for comparison.
#[derive(
    Copy, Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Pinning {
    #[default]
    Largest,
    Smallest,
}

impl Pinning {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Largest => "largest",
            Self::Smallest => "smallest",
        }
    }
}

/// Pick the searched pair from a linear RGB error vector.
///
/// Ties go to the first channel in red, green, blue order.
#[must_use]
pub fn select_from_error(err: Rgb, pinning: Pinning) -> ChannelPair {
    let wins = |a: f64, b: f64| match pinning {
        Pinning::Largest => a >= b,
        Pinning::Smallest => a <= b,
    };

    let pinned = if wins(err.r, err.g) && wins(err.r, err.b) {
        Channel::Red
    } else if wins(err.g, err.r) && wins(err.g, err.b) {
        Channel::Green
    } else {
        Channel::Blue
    };

    ChannelPair::pinning(pinned)
}

/// Pick the searched pair from the target and the chromaticity measured at
/// full white.
#[must_use]
pub fn select(target: XY, measured: XY, pinning: Pinning) -> ChannelPair {
    let err = difference(xy_to_rgb(target), xy_to_rgb(measured));
    log::debug!(
        "Linear RGB error at full white: r={:.6} g={:.6} b={:.6}",
        err.r,
        err.g,
        err.b
    );
    select_from_error(err, pinning)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_resolve_red_green_blue() {
        let cases = [
            (Rgb::new(1.0, 1.0, 0.0), ChannelPair::GreenBlue),
            (Rgb::new(1.0, 0.0, 1.0), ChannelPair::GreenBlue),
            (Rgb::new(0.0, 1.0, 1.0), ChannelPair::RedBlue),
        ];

        for (err, expected) in cases {
            assert_eq!(select_from_error(err, Pinning::Largest), expected);
        }
    }

    #[test]
    fn dominant_component_is_pinned() {
        assert_eq!(
            select_from_error(Rgb::new(0.3, 0.1, -0.2), Pinning::Largest),
            ChannelPair::GreenBlue
        );
        assert_eq!(
            select_from_error(Rgb::new(-0.3, 0.1, -0.2), Pinning::Largest),
            ChannelPair::RedBlue
        );
        assert_eq!(
            select_from_error(Rgb::new(-0.3, 0.1, 0.2), Pinning::Largest),
            ChannelPair::RedGreen
        );
    }

    #[test]
    fn smallest_pinning() {
        assert_eq!(
            select_from_error(Rgb::new(1.0, 1.0, 0.0), Pinning::Smallest),
            ChannelPair::RedGreen
        );
        assert_eq!(
            select_from_error(Rgb::new(0.0, 0.0, 1.0), Pinning::Smallest),
            ChannelPair::GreenBlue
        );
        assert_eq!(
            select_from_error(Rgb::new(1.0, 0.0, 0.0), Pinning::Smallest),
            ChannelPair::RedBlue
        );
    }

    #[test]
    fn compose_keeps_pinned_channel() {
        assert_eq!(ChannelPair::GreenBlue.compose([10, 20]), Rgb8::new(255, 10, 20));
        assert_eq!(ChannelPair::RedBlue.compose([10, 20]), Rgb8::new(10, 255, 20));
        assert_eq!(ChannelPair::RedGreen.compose([10, 20]), Rgb8::new(10, 20, 255));

        for pair in [
            ChannelPair::GreenBlue,
            ChannelPair::RedBlue,
            ChannelPair::RedGreen,
        ] {
            assert_eq!(pair.project(pair.compose([7, 9])), [7, 9]);
        }
    }

    #[test]
    fn measured_target_selects_from_zero_error() {
        /* zero error everywhere: red wins the tie */
        let pair = select(XY::D65_WHITE_POINT, XY::D65_WHITE_POINT, Pinning::Largest);
        assert_eq!(pair, ChannelPair::GreenBlue);
        assert_eq!(pair.to_string(), "green and blue");
    }
}
