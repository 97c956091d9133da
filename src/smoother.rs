//! Per-axis smoothing of the raw motion samples.

use crate::error::SignalError;
use crate::window::SampleWindow;

/// One accelerometer reading (x, y, z).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Rolling means of the three axes. `x`, `y` and `z` are rounded and are the only
/// values the flight state machine looks at; `raw` keeps the unrounded means.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SmoothedSignal {
    pub raw: [f32; 3],
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Sample {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Sample { x, y, z }
    }
}

impl SmoothedSignal {
    /// Builds an already-rounded signal, mostly useful when driving the state machine directly.
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        SmoothedSignal {
            raw: [x, y, z],
            x,
            y,
            z,
        }
    }
}

pub struct AxisSmoother {
    x: SampleWindow,
    y: SampleWindow,
    z: SampleWindow,
    decimals: u32,
}

impl AxisSmoother {
    pub fn new(capacity: usize, decimals: u32) -> Self {
        AxisSmoother {
            x: SampleWindow::new(capacity),
            y: SampleWindow::new(capacity),
            z: SampleWindow::new(capacity),
            decimals,
        }
    }

    /// Pushes one sample and returns the rounded means. Fails only if a window is
    /// still empty afterwards, which a zero capacity would cause.
    pub fn ingest(&mut self, sample: Sample) -> Result<SmoothedSignal, SignalError> {
        self.x.push(sample.x);
        self.y.push(sample.y);
        self.z.push(sample.z);
        let raw = [self.x.mean()?, self.y.mean()?, self.z.mean()?];
        Ok(SmoothedSignal {
            raw,
            x: round_to(raw[0], self.decimals),
            y: round_to(raw[1], self.decimals),
            z: round_to(raw[2], self.decimals),
        })
    }

    /// Number of samples currently held per axis.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn reset(&mut self) {
        self.x.clear();
        self.y.clear();
        self.z.clear();
    }
}

/// Rounds half away from zero to `decimals` places.
pub fn round_to(value: f32, decimals: u32) -> f32 {
    let scale = 10f32.powi(decimals as i32);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(round_to(0.204, 2), 0.2);
        assert_eq!(round_to(0.206, 2), 0.21);
        assert_eq!(round_to(-0.634, 2), -0.63);
        assert_eq!(round_to(-0.636, 2), -0.64);
        assert_eq!(round_to(1.23456, 0), 1.0);
    }

    #[test]
    fn ingest_returns_rounded_means_and_keeps_raw_values() {
        let mut smoother = AxisSmoother::new(30, 2);
        smoother.ingest(Sample::new(0.1, 0.3, -0.5)).unwrap();
        let smoothed = smoother.ingest(Sample::new(0.2, 0.2, -0.6)).unwrap();

        assert_eq!(smoothed.x, 0.15);
        assert_eq!(smoothed.y, 0.25);
        assert_eq!(smoothed.z, -0.55);
        assert!((smoothed.raw[0] - 0.15).abs() < 1e-6);
        assert_eq!(smoother.len(), 2);
    }

    #[test]
    fn raw_means_are_the_window_means() {
        let mut smoother = AxisSmoother::new(3, 2);
        let mut smoothed = smoother.ingest(Sample::new(0.0, 0.0, 0.0)).unwrap();
        for value in [0.3, -0.7, 1.1, 0.25] {
            smoothed = smoother.ingest(Sample::new(value, -value, value * 2.0)).unwrap();
        }
        assert_eq!(smoothed.raw[0], smoother.x.mean().unwrap());
        assert_eq!(smoothed.raw[1], smoother.y.mean().unwrap());
        assert_eq!(smoothed.raw[2], smoother.z.mean().unwrap());
        assert_eq!(smoothed.y, round_to(smoother.y.mean().unwrap(), 2));
    }

    #[test]
    fn axes_are_smoothed_independently() {
        let mut smoother = AxisSmoother::new(2, 2);
        smoother.ingest(Sample::new(1.0, 0.0, 0.0)).unwrap();
        smoother.ingest(Sample::new(1.0, 0.0, 0.0)).unwrap();
        let smoothed = smoother.ingest(Sample::new(0.0, 1.0, 0.0)).unwrap();

        assert_eq!(smoothed.x, 0.5);
        assert_eq!(smoothed.y, 0.5);
        assert_eq!(smoothed.z, 0.0);
    }

    #[test]
    fn reset_discards_history() {
        let mut smoother = AxisSmoother::new(30, 2);
        smoother.ingest(Sample::new(0.9, 0.9, 0.9)).unwrap();
        smoother.reset();
        assert!(smoother.is_empty());
        let smoothed = smoother.ingest(Sample::new(0.1, 0.1, 0.1)).unwrap();
        assert_eq!(smoothed.y, 0.1);
    }
}
