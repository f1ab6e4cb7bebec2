use thiserror::Error;

/// Rejected construction-time configuration. Never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    #[error("error percent {error_percent} is outside [0, 100]")]
    ErrorPercentOutOfRange { error_percent: u8 },

    #[error("sensor range [{min_value}, {max_value}) is empty")]
    EmptyRange { min_value: i32, max_value: i32 },

    #[error("seed mean {seed_mean} is not finite")]
    NonFiniteSeed { seed_mean: f64 },

    #[error("cycle time must be non-zero")]
    ZeroCycleTime,
}

/// Failure while advancing a channel's running statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StatsError {
    #[error("sample count overflow: {count} samples already accumulated")]
    SampleCountOverflow { count: u64 },
}
