use crate::error::ConfigError;
use crate::reading::Reading;
use crate::sensor::Sensor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::marker::PhantomData;

pub const DEFAULT_ERROR_PERCENT: u8 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unchecked;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checked;

/// Bounds and failure rate of a [`BoundedRandomSensor`].
///
/// Values are drawn from the half-open range `[min_value, max_value)`.
/// Only a `SensorConfig<Checked>` can build a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorConfig<State = Unchecked> {
    min_value: i32,
    max_value: i32,
    error_percent: u8,
    _state: PhantomData<State>,
}

impl SensorConfig<Unchecked> {
    pub fn new(min_value: i32, max_value: i32) -> Self {
        Self {
            min_value,
            max_value,
            error_percent: DEFAULT_ERROR_PERCENT,
            _state: PhantomData,
        }
    }

    pub fn with_error_percent(mut self, error_percent: u8) -> Self {
        self.error_percent = error_percent;
        self
    }

    pub fn validate(self) -> Result<SensorConfig<Checked>, ConfigError> {
        if self.error_percent > 100 {
            return Err(ConfigError::ErrorPercentOutOfRange {
                error_percent: self.error_percent,
            });
        }
        if self.min_value >= self.max_value {
            return Err(ConfigError::EmptyRange {
                min_value: self.min_value,
                max_value: self.max_value,
            });
        }

        Ok(SensorConfig {
            min_value: self.min_value,
            max_value: self.max_value,
            error_percent: self.error_percent,
            _state: PhantomData,
        })
    }
}

impl<State> SensorConfig<State> {
    pub fn min_value(&self) -> i32 {
        self.min_value
    }

    pub fn max_value(&self) -> i32 {
        self.max_value
    }

    pub fn error_percent(&self) -> u8 {
        self.error_percent
    }
}

/// Pseudo-random sensor that fails a configurable share of reads.
///
/// Each sample draws a check from `[0, 100)`. A check strictly greater than
/// `error_percent` yields a concrete value, anything else yields
/// [`Reading::Missing`]. An `error_percent` of 0 never fails.
#[derive(Debug, Clone)]
pub struct BoundedRandomSensor<R = StdRng> {
    config: SensorConfig<Checked>,
    rng: R,
}

impl BoundedRandomSensor<StdRng> {
    pub fn from_entropy(config: SensorConfig<Checked>) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn seeded(config: SensorConfig<Checked>, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> BoundedRandomSensor<R> {
    pub fn with_rng(config: SensorConfig<Checked>, rng: R) -> Self {
        Self { config, rng }
    }

    pub fn config(&self) -> &SensorConfig<Checked> {
        &self.config
    }
}

impl<R: Rng + Send> Sensor for BoundedRandomSensor<R> {
    fn sample(&mut self) -> Reading {
        let error_percent = self.config.error_percent;
        let check: u8 = self.rng.gen_range(0..100);

        if error_percent == 0 || check > error_percent {
            Reading::Concrete(
                self.rng
                    .gen_range(self.config.min_value..self.config.max_value),
            )
        } else {
            Reading::Missing
        }
    }
}

/// Replays a fixed sequence of readings, then reports `Missing` forever.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSensor {
    script: VecDeque<Reading>,
}

impl ScriptedSensor {
    pub fn new(script: impl IntoIterator<Item = Reading>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Sensor for ScriptedSensor {
    fn sample(&mut self) -> Reading {
        self.script.pop_front().unwrap_or(Reading::Missing)
    }
}
