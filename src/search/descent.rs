use crate::config::DescentConfig;
use crate::error::CalResult;
use crate::search::{Best, Plant, Sample, SearchResult};
use crate::types::XY;

/// Which of the two searched channels is being stepped.
#[derive(Copy, Debug, Clone, PartialEq, Eq)]
enum Axis {
    First,
    Second,
}

impl Axis {
    const fn index(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }

    const fn swapped(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }
}

/// Coordinate descent: lower one channel by one step at a time, switch to
/// the other channel when a step makes things worse, stop when both do.
///
/// A step is rejected when its distance exceeds the best distance by more
/// than `conf.tolerance`, which lets the search ride through meter noise.
pub fn run<P: Plant>(
    plant: &mut P,
    start: Sample,
    target: XY,
    conf: &DescentConfig,
) -> CalResult<SearchResult> {
    let mut channels = start.channels;
    let mut best = Best::new(start);
    let mut axis = Axis::First;
    let mut rejected = false;
    let mut iterations = 0;

    while iterations < conf.max_iterations {
        iterations += 1;

        let step = match channels[axis.index()].checked_sub(1) {
            Some(value) => {
                let mut trial = channels;
                trial[axis.index()] = value;
                let xy = plant.probe(trial)?;
                let sample = Sample::new(trial, xy, target);
                (sample.distance <= best.distance() + conf.tolerance).then_some(sample)
            }
            None => None,
        };

        if let Some(sample) = step {
            rejected = false;
            channels = sample.channels;
            if best.offer(sample) {
                log::trace!("New best {:?} at {:.6}", sample.channels, sample.distance);
            }
            continue;
        }

        if rejected {
            log::debug!("Both channels rejected at {channels:?}, stopping");
            break;
        }
        rejected = true;
        axis = axis.swapped();
        log::trace!("Step rejected at {channels:?}, switching channel");
    }

    plant.apply(best.sample().channels)?;

    Ok(SearchResult {
        best: *best.sample(),
        iterations,
    })
}
