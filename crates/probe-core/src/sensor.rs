use crate::reading::Reading;

/// A source of raw measurements.
///
/// A failed physical read is reported as [`Reading::Missing`], never as an
/// error. Implementations must not touch channel statistics.
pub trait Sensor: Send {
    fn sample(&mut self) -> Reading;
}

impl<S: Sensor + ?Sized> Sensor for Box<S> {
    fn sample(&mut self) -> Reading {
        (**self).sample()
    }
}
