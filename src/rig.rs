use std::io::Write;

use crate::channel::ChannelPair;
use crate::device::{Colorimeter, Display};
use crate::error::CalResult;
use crate::search::Plant;
use crate::types::XY;

/// Display and meter wired up as a [`Plant`] over one channel pair.
///
/// Every measurement writes a progress row `x y target_x target_y distance`
/// to `progress`.
pub struct Rig<D, M, W> {
    display: D,
    meter: M,
    pair: ChannelPair,
    target: XY,
    progress: W,
}

impl<D: Display, M: Colorimeter, W: Write> Rig<D, M, W> {
    pub fn new(display: D, meter: M, pair: ChannelPair, target: XY, progress: W) -> Self {
        Self {
            display,
            meter,
            pair,
            target,
            progress,
        }
    }

    pub fn into_parts(self) -> (D, M, W) {
        (self.display, self.meter, self.progress)
    }
}

impl<D: Display, M: Colorimeter, W: Write> Plant for Rig<D, M, W> {
    fn apply(&mut self, channels: [u8; 2]) -> CalResult<()> {
        self.display.paint(self.pair.compose(channels))
    }

    fn measure(&mut self) -> CalResult<XY> {
        let xy = self.meter.measure()?;
        writeln!(
            self.progress,
            "{} {} {} {} {}",
            xy.x,
            xy.y,
            self.target.x,
            self.target.y,
            xy.distance(self.target)
        )?;
        Ok(xy)
    }
}
