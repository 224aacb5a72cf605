//! Closed-loop searches over the two free channels.
//!
//! Both strategies drive a [`Plant`] (paint, then measure) and converge the
//! channel pair towards the target chromaticity. They keep a best-so-far
//! record and leave the plant painted at the best pair when they return.

pub mod descent;
pub mod secant;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::colorimetry::distance;
use crate::config::SearchConfig;
use crate::error::CalResult;
use crate::types::XY;

/// The system under control: two channel values in, one chromaticity out.
pub trait Plant {
    fn apply(&mut self, channels: [u8; 2]) -> CalResult<()>;

    fn measure(&mut self) -> CalResult<XY>;

    fn probe(&mut self, channels: [u8; 2]) -> CalResult<XY> {
        self.apply(channels)?;
        self.measure()
    }
}

#[derive(
    Copy, Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Coordinate descent, one channel step at a time
    Descent,
    /// Quasi-Newton secant solver
    #[default]
    Secant,
}

impl Strategy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Descent => "descent",
            Self::Secant => "secant",
        }
    }
}

/// A measured point of the search.
#[derive(Copy, Debug, Clone, PartialEq)]
pub struct Sample {
    pub channels: [u8; 2],
    pub xy: XY,
    pub distance: f64,
}

impl Sample {
    #[must_use]
    pub fn new(channels: [u8; 2], xy: XY, target: XY) -> Self {
        Self {
            channels,
            xy,
            distance: distance(xy, target),
        }
    }
}

/// Best-so-far record. Its distance never increases.
#[derive(Copy, Debug, Clone, PartialEq)]
pub struct Best(Sample);

impl Best {
    #[must_use]
    pub const fn new(start: Sample) -> Self {
        Self(start)
    }

    /// Record `sample` if it is strictly closer than the current best.
    pub fn offer(&mut self, sample: Sample) -> bool {
        if sample.distance < self.0.distance {
            self.0 = sample;
            true
        } else {
            false
        }
    }

    #[must_use]
    pub const fn sample(&self) -> &Sample {
        &self.0
    }

    #[must_use]
    pub const fn distance(&self) -> f64 {
        self.0.distance
    }
}

#[derive(Copy, Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub best: Sample,
    pub iterations: usize,
}

/// Run `strategy` from `start` (the pair and its measured chromaticity).
///
/// A start already within `conf.threshold` of the target is returned as is,
/// without touching the plant.
pub fn search<P: Plant, R: Rng>(
    strategy: Strategy,
    plant: &mut P,
    start: Sample,
    target: XY,
    conf: &SearchConfig,
    rng: &mut R,
) -> CalResult<SearchResult> {
    if start.distance <= conf.threshold {
        log::info!(
            "Start distance {:.6} already within {:.6}, nothing to do",
            start.distance,
            conf.threshold
        );
        return Ok(SearchResult {
            best: start,
            iterations: 0,
        });
    }

    log::info!(
        "Starting {} search at {:?} (distance {:.6})",
        strategy.as_str(),
        start.channels,
        start.distance
    );

    let res = match strategy {
        Strategy::Descent => descent::run(plant, start, target, &conf.descent)?,
        Strategy::Secant => secant::run(plant, start, target, conf, rng)?,
    };

    log::info!(
        "Search finished after {} iterations: {:?} at distance {:.6}",
        res.iterations,
        res.best.channels,
        res.best.distance
    );

    Ok(res)
}
