use crate::reading::ChannelState;
use crate::sensor_sim::{SensorConfig, Unchecked};

/// Static description of one logical measurement stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub min_value: i32,
    pub max_value: i32,
    pub seed_value: i32,
    pub seed_mean: f64,
}

impl ChannelSpec {
    pub fn sensor_config(&self, error_percent: u8) -> SensorConfig<Unchecked> {
        SensorConfig::new(self.min_value, self.max_value).with_error_percent(error_percent)
    }

    pub fn seed(&self) -> ChannelState {
        ChannelState::seeded(self.seed_value, self.seed_mean)
    }
}

pub const TEMPERATURE: ChannelSpec = ChannelSpec {
    key: "temperature",
    label: "temp",
    min_value: -200,
    max_value: 200,
    seed_value: 0,
    seed_mean: 0.0,
};

pub const PRESSURE: ChannelSpec = ChannelSpec {
    key: "pressure",
    label: "pres",
    min_value: 0,
    max_value: 1000,
    seed_value: 500,
    seed_mean: 500.0,
};

pub const GROUND_PH: ChannelSpec = ChannelSpec {
    key: "ground_ph",
    label: "Ph",
    min_value: 0,
    max_value: 10,
    seed_value: 5,
    seed_mean: 5.0,
};

pub const SEISMIC: ChannelSpec = ChannelSpec {
    key: "seismic",
    label: "seis",
    min_value: 0,
    max_value: 10,
    seed_value: 5,
    seed_mean: 5.0,
};

pub const HUMIDITY: ChannelSpec = ChannelSpec {
    key: "humidity",
    label: "hum",
    min_value: 0,
    max_value: 100,
    seed_value: 5,
    seed_mean: 5.0,
};

/// Sampling order of the probe's sensor suite.
pub const PROBE_SUITE: [ChannelSpec; 5] = [TEMPERATURE, PRESSURE, GROUND_PH, SEISMIC, HUMIDITY];
