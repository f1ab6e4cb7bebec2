pub mod acquisition_loop;
pub mod channel;
pub mod channels;
pub mod error;
pub mod reading;
pub mod report;
pub mod sensor;
pub mod sensor_sim;

pub use acquisition_loop::{
    AcquisitionConfig, AcquisitionLoop, AcquisitionStats, Delay, ThreadDelay, Tick, Ticker,
};
pub use channel::Channel;
pub use channels::{ChannelSpec, PROBE_SUITE};
pub use error::{ConfigError, StatsError};
pub use reading::{round_mean, ChannelState, Reading};
pub use report::{ChannelReport, CycleReport, FanOut, ReportSink};
pub use sensor::Sensor;
pub use sensor_sim::{BoundedRandomSensor, Checked, ScriptedSensor, SensorConfig, Unchecked};
