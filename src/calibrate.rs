use std::fmt;
use std::io::Write;

use rand::Rng;

use crate::channel::{self, ChannelPair};
use crate::config::AppConfig;
use crate::device::{Colorimeter, Display};
use crate::error::CalResult;
use crate::rig::Rig;
use crate::search::{search, Sample, Strategy};
use crate::types::{Rgb8, XY};

/// Outcome of a calibration run.
#[derive(Copy, Debug, Clone, PartialEq)]
pub struct Report {
    pub strategy: Strategy,
    pub pair: ChannelPair,
    pub color: Rgb8,
    pub xy: XY,
    pub distance: f64,
    pub iterations: usize,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Rgb8 { r, g, b } = self.color;
        write!(
            f,
            "r={r} g={g} b={b} xy=({:.5}, {:.5}) distance={:.6} after {} {} iterations",
            self.xy.x,
            self.xy.y,
            self.distance,
            self.iterations,
            self.strategy.as_str()
        )
    }
}

/// Paint full white, measure, pick the channel pair and run the configured
/// search. Leaves the display at the best color found.
///
/// Progress rows go to `progress`. The meter is not shut down here.
pub fn calibrate<D, M, W, R>(
    display: &mut D,
    meter: &mut M,
    progress: W,
    conf: &AppConfig,
    rng: &mut R,
) -> CalResult<Report>
where
    D: Display,
    M: Colorimeter,
    W: Write,
    R: Rng,
{
    let target = conf.target;

    display.paint(Rgb8::WHITE)?;
    let initial = meter.measure()?;
    log::info!(
        "Measured ({:.5}, {:.5}) at full white, target is ({:.5}, {:.5})",
        initial.x,
        initial.y,
        target.x,
        target.y
    );

    let pair = channel::select(target, initial, conf.search.pinning);
    log::info!("adjusting {pair}");

    let start = Sample::new(pair.project(Rgb8::WHITE), initial, target);
    let mut rig = Rig::new(&mut *display, &mut *meter, pair, target, progress);
    let res = search(
        conf.search.strategy,
        &mut rig,
        start,
        target,
        &conf.search,
        rng,
    )?;

    let report = Report {
        strategy: conf.search.strategy,
        pair,
        color: pair.compose(res.best.channels),
        xy: res.best.xy,
        distance: res.best.distance,
        iterations: res.iterations,
    };
    log::info!("Best: {report}");

    Ok(report)
}
