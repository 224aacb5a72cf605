pub mod framebuffer;
pub mod spotread;

use crate::error::CalResult;
use crate::types::{Rgb8, XY};

/// Something that can be painted with a single flat color.
pub trait Display {
    fn paint(&mut self, color: Rgb8) -> CalResult<()>;
}

/// A blocking chromaticity meter.
pub trait Colorimeter {
    /// Take one reading.
    fn measure(&mut self) -> CalResult<XY>;

    /// Ask the meter to quit and wait for it.
    fn shutdown(&mut self) -> CalResult<()>;
}

impl<T: Display + ?Sized> Display for &mut T {
    fn paint(&mut self, color: Rgb8) -> CalResult<()> {
        (**self).paint(color)
    }
}

impl<T: Colorimeter + ?Sized> Colorimeter for &mut T {
    fn measure(&mut self) -> CalResult<XY> {
        (**self).measure()
    }

    fn shutdown(&mut self) -> CalResult<()> {
        (**self).shutdown()
    }
}
