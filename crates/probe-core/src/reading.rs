use crate::error::StatsError;
use serde::Serialize;

/// Decimal places kept by the running mean after every update.
pub const MEAN_DECIMALS: i32 = 3;

/// Running statistics of one channel: `(last_value, sample_count, running_mean)`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ChannelState {
    pub last_value: i32,
    pub sample_count: u64,
    pub running_mean: f64,
}

impl ChannelState {
    /// State before any concrete sample was accepted.
    pub fn seeded(last_value: i32, running_mean: f64) -> Self {
        Self {
            last_value,
            sample_count: 0,
            running_mean,
        }
    }
}

/// Outcome of a single sampling attempt.
///
/// `Missing` is a null object: applying it is the identity on
/// [`ChannelState`], so callers never branch on success or failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reading {
    Concrete(i32),
    Missing,
}

impl Reading {
    /// Folds this reading into `state` and returns the advanced state.
    ///
    /// For `Concrete(value)` the mean is updated incrementally as
    /// `mean * n/(n+1) + value/(n+1)`, both ratios taken in `f64`, and
    /// rounded to [`MEAN_DECIMALS`] places. The sample count is checked
    /// rather than wrapped.
    pub fn apply(self, state: ChannelState) -> Result<ChannelState, StatsError> {
        let value = match self {
            Reading::Missing => return Ok(state),
            Reading::Concrete(value) => value,
        };

        let count = state.sample_count;
        let next_count = count
            .checked_add(1)
            .ok_or(StatsError::SampleCountOverflow { count })?;

        let divisor = next_count as f64;
        let coefficient = count as f64 / divisor;
        let contribution = f64::from(value) / divisor;

        Ok(ChannelState {
            last_value: value,
            sample_count: next_count,
            running_mean: round_mean(state.running_mean * coefficient + contribution),
        })
    }

    pub fn value(&self) -> Option<i32> {
        match self {
            Reading::Concrete(value) => Some(*value),
            Reading::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Reading::Missing)
    }
}

/// Rounds to [`MEAN_DECIMALS`] places, ties to even.
pub fn round_mean(mean: f64) -> f64 {
    let scale = 10f64.powi(MEAN_DECIMALS);
    (mean * scale).round_ties_even() / scale
}
