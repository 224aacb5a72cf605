//! Quasi-Newton search.
//!
//! Treats the calibration as root finding on `(c0, c1) -> measured - target`
//! and keeps an estimate `H` of the inverse Jacobian of that map, refined from
//! consecutive measurements with Broyden's "bad" secant update. No numeric
//! differentiation is done, every measurement is a slow instrument round
//! trip.

use rand::Rng;

use crate::config::SearchConfig;
use crate::error::CalResult;
use crate::search::{Best, Plant, Sample, SearchResult};
use crate::types::XY;

/// Secant updates with `|dy|^2` below this are skipped.
pub const SECANT_FLOOR: f64 = 1e-10;

/// Random starting points are drawn from this range.
const START_RANGE: core::ops::RangeInclusive<u8> = 128..=255;

/// Row-major 2x2 matrix.
#[derive(Copy, Debug, Clone, PartialEq)]
pub struct Mat2(pub [[f64; 2]; 2]);

impl Mat2 {
    #[must_use]
    pub const fn diagonal(a: f64, b: f64) -> Self {
        Self([[a, 0.0], [0.0, b]])
    }

    #[must_use]
    pub fn apply(&self, v: [f64; 2]) -> [f64; 2] {
        let [row1, row2] = &self.0;
        [
            row1[0].mul_add(v[0], row1[1] * v[1]),
            row2[0].mul_add(v[0], row2[1] * v[1]),
        ]
    }

    /// Bad Broyden update: afterwards `self.apply(dy) == dc`, and vectors
    /// orthogonal to `dy` map as before.
    ///
    /// Returns false (leaving the matrix untouched) when `dy` is too small.
    pub fn secant_update(&mut self, dc: [f64; 2], dy: [f64; 2]) -> bool {
        let sp = dy[0].mul_add(dy[0], dy[1] * dy[1]);
        if sp.abs() < SECANT_FLOOR {
            return false;
        }

        let hy = self.apply(dy);
        let residual = [dc[0] - hy[0], dc[1] - hy[1]];
        for (row, r) in self.0.iter_mut().zip(residual) {
            for (cell, y) in row.iter_mut().zip(dy) {
                *cell += r * y / sp;
            }
        }
        true
    }
}

fn error(xy: XY, target: XY) -> [f64; 2] {
    [xy.x - target.x, xy.y - target.y]
}

fn to_f64(channels: [u8; 2]) -> [f64; 2] {
    [f64::from(channels[0]), f64::from(channels[1])]
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Two random starting pairs that differ from each other in both channels,
/// and whose own channels differ.
pub fn starting_pairs<R: Rng>(rng: &mut R) -> ([u8; 2], [u8; 2]) {
    loop {
        let p0 = [rng.gen_range(START_RANGE), rng.gen_range(START_RANGE)];
        let p1 = [rng.gen_range(START_RANGE), rng.gen_range(START_RANGE)];
        if p0[0] != p1[0] && p0[1] != p1[1] && p0[0] != p0[1] && p1[0] != p1[1] {
            return (p0, p1);
        }
    }
}

/// Nudge a degenerate proposal by random unit steps until it neither repeats
/// `current` nor has two equal channels. Values at 0 or 255 only move inward.
pub fn unstick<R: Rng>(mut proposal: [u8; 2], current: [u8; 2], rng: &mut R) -> [u8; 2] {
    while proposal == current || proposal[0] == proposal[1] {
        for value in &mut proposal {
            *value = match *value {
                0 => 1,
                255 => 254,
                v if rng.gen::<bool>() => v + 1,
                v => v - 1,
            };
        }
        log::trace!("Perturbed degenerate proposal to {proposal:?}");
    }
    proposal
}

pub fn run<P: Plant, R: Rng>(
    plant: &mut P,
    start: Sample,
    target: XY,
    conf: &SearchConfig,
    rng: &mut R,
) -> CalResult<SearchResult> {
    let mut best = Best::new(start);

    let (mut prev, mut cur) = starting_pairs(rng);
    log::debug!("Secant starting pairs {prev:?} and {cur:?}");

    let mut prev_xy = plant.probe(prev)?;
    best.offer(Sample::new(prev, prev_xy, target));

    /* crude sensitivity guess from the second starting point */
    let c = to_f64(cur);
    let mut h = Mat2::diagonal(1.0 / c[0], 1.0 / c[1]);

    let mut iterations = 0;
    while iterations < conf.secant.max_iterations && best.distance() > conf.threshold {
        iterations += 1;

        let xy = plant.probe(cur)?;
        if best.offer(Sample::new(cur, xy, target)) {
            log::trace!("New best {cur:?} at {:.6}", best.distance());
        }
        if best.distance() <= conf.threshold {
            break;
        }

        let e_prev = error(prev_xy, target);
        let e_cur = error(xy, target);
        let (c_prev, c_cur) = (to_f64(prev), to_f64(cur));
        let dc = [c_cur[0] - c_prev[0], c_cur[1] - c_prev[1]];
        let dy = [e_cur[0] - e_prev[0], e_cur[1] - e_prev[1]];
        if !h.secant_update(dc, dy) {
            log::debug!("Secant update skipped, |dy| too small at {cur:?}");
        }

        let step = h.apply(e_cur);
        let raw = [to_channel(c_cur[0] - step[0]), to_channel(c_cur[1] - step[1])];
        let next = unstick(raw, cur, rng);

        prev = cur;
        cur = next;
        prev_xy = xy;
    }

    plant.apply(best.sample().channels)?;

    Ok(SearchResult {
        best: *best.sample(),
        iterations,
    })
}
