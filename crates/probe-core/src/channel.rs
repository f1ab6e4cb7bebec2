use crate::channels::ChannelSpec;
use crate::error::{ConfigError, StatsError};
use crate::reading::{ChannelState, Reading};
use crate::report::ChannelReport;
use crate::sensor::Sensor;
use tracing::debug;

/// A drawn reading and the state it leads to, not yet stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StagedSample {
    reading: Reading,
    next: ChannelState,
}

impl StagedSample {
    pub fn reading(&self) -> Reading {
        self.reading
    }
}

/// One measurement stream: its sensor and the statistics it feeds.
///
/// The state is private and only advances through [`Reading::apply`].
pub struct Channel {
    name: String,
    label: String,
    sensor: Box<dyn Sensor>,
    state: ChannelState,
}

impl Channel {
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        sensor: impl Sensor + 'static,
        seed: ChannelState,
    ) -> Result<Self, ConfigError> {
        if !seed.running_mean.is_finite() {
            return Err(ConfigError::NonFiniteSeed {
                seed_mean: seed.running_mean,
            });
        }

        Ok(Self {
            name: name.into(),
            label: label.into(),
            sensor: Box::new(sensor),
            state: seed,
        })
    }

    pub fn from_spec(spec: &ChannelSpec, sensor: impl Sensor + 'static) -> Result<Self, ConfigError> {
        Self::new(spec.key, spec.label, sensor, spec.seed())
    }

    /// Draws one reading and folds it into the running statistics.
    pub fn sample(&mut self) -> Result<ChannelReport, StatsError> {
        let staged = self.stage()?;
        Ok(self.commit(staged))
    }

    /// Draws one reading and computes the next state without storing it.
    pub fn stage(&mut self) -> Result<StagedSample, StatsError> {
        let reading = self.sensor.sample();
        if reading.is_missing() {
            debug!(channel = %self.name, "reading missing, keeping last value");
        }

        Ok(StagedSample {
            reading,
            next: reading.apply(self.state)?,
        })
    }

    pub fn commit(&mut self, staged: StagedSample) -> ChannelReport {
        self.state = staged.next;

        ChannelReport {
            name: self.name.clone(),
            label: self.label.clone(),
            last_value: self.state.last_value,
            running_mean: self.state.running_mean,
            sample_count: self.state.sample_count,
            missing: staged.reading.is_missing(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
