use crate::channel::Channel;
use crate::error::{ConfigError, StatsError};
use crate::report::{CycleReport, ReportSink};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// "Sleep for a duration" collaborator. The loop never sleeps on its own.
pub trait Delay {
    fn sleep(&mut self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadDelay;

impl Delay for ThreadDelay {
    fn sleep(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

impl<D: Delay + ?Sized> Delay for &mut D {
    fn sleep(&mut self, duration: Duration) {
        (**self).sleep(duration);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub index: u64,
    pub timestamp_us: u64,
}

/// Issues cycle ticks separated by a fixed delay.
///
/// The first tick fires immediately. Later ticks wait a full period after the
/// previous one was consumed; there is no catch-up for slow cycles.
pub struct Ticker<D: Delay> {
    period: Duration,
    delay: D,
    issued: u64,
    start: Instant,
}

impl<D: Delay> Ticker<D> {
    pub fn new(period: Duration, delay: D) -> Self {
        Self {
            period,
            delay,
            issued: 0,
            start: Instant::now(),
        }
    }

    pub fn next_tick(&mut self) -> Tick {
        if self.issued > 0 {
            self.delay.sleep(self.period);
        }
        let tick = Tick {
            index: self.issued,
            timestamp_us: self.start.elapsed().as_micros() as u64,
        };
        self.issued += 1;
        tick
    }

    pub fn issued(&self) -> u64 {
        self.issued
    }
}

#[derive(Clone, Debug)]
pub struct AcquisitionConfig {
    pub cycle_time: Duration,
    /// Stop after this many cycles. `None` runs until the stop flag is set.
    pub max_cycles: Option<u64>,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            cycle_time: Duration::from_secs(1),
            max_cycles: None,
        }
    }
}

#[derive(Clone, Default, Debug)]
pub struct AcquisitionStats {
    pub cycles_executed: u64,
    pub cycles_overrun: u64,
    pub readings_concrete: u64,
    pub readings_missing: u64,
    pub last_cycle_us: u64,
    pub max_cycle_us: u64,
}

/// Single-threaded sampling loop that owns every channel it drives.
pub struct AcquisitionLoop<D: Delay = ThreadDelay> {
    channels: Vec<Channel>,
    config: AcquisitionConfig,
    ticker: Ticker<D>,
    stats: AcquisitionStats,
}

impl<D: Delay> AcquisitionLoop<D> {
    pub fn new(
        channels: Vec<Channel>,
        config: AcquisitionConfig,
        delay: D,
    ) -> Result<Self, ConfigError> {
        if config.cycle_time.is_zero() {
            return Err(ConfigError::ZeroCycleTime);
        }
        let ticker = Ticker::new(config.cycle_time, delay);
        Ok(Self {
            channels,
            config,
            ticker,
            stats: AcquisitionStats::default(),
        })
    }

    /// Runs until `stop` is set, `max_cycles` is reached, the sink closes, or
    /// a channel's statistics can no longer advance.
    pub fn run<S: ReportSink + ?Sized>(
        &mut self,
        stop: &AtomicBool,
        sink: &mut S,
    ) -> Result<(), StatsError> {
        info!(
            cycle_time_ms = self.config.cycle_time.as_millis() as u64,
            channels = self.channels.len(),
            max_cycles = ?self.config.max_cycles,
            "Starting acquisition loop"
        );

        while !stop.load(Ordering::Relaxed) && !self.budget_exhausted() {
            let tick = self.ticker.next_tick();
            if stop.load(Ordering::Relaxed) {
                break;
            }

            let report = match self.run_cycle(tick) {
                Ok(report) => report,
                Err(e) => {
                    error!(error = %e, cycle = tick.index, "Channel statistics overflowed");
                    return Err(e);
                }
            };
            sink.publish(&report);
            if sink.is_closed() {
                info!(cycle = tick.index, "Report sink closed");
                break;
            }
        }

        info!(
            cycles_executed = self.stats.cycles_executed,
            cycles_overrun = self.stats.cycles_overrun,
            readings_missing = self.stats.readings_missing,
            "Acquisition loop stopped"
        );
        Ok(())
    }

    /// Samples every channel once, in order, and records cycle timing.
    pub fn run_cycle(&mut self, tick: Tick) -> Result<CycleReport, StatsError> {
        let cycle_start = Instant::now();

        // All channels are staged before any is committed, so a failing
        // channel leaves the whole cycle unapplied.
        let staged = self
            .channels
            .iter_mut()
            .map(Channel::stage)
            .collect::<Result<Vec<_>, _>>()?;

        let mut channels = Vec::with_capacity(staged.len());
        for (channel, sample) in self.channels.iter_mut().zip(staged) {
            let report = channel.commit(sample);
            if report.missing {
                self.stats.readings_missing += 1;
            } else {
                self.stats.readings_concrete += 1;
            }
            channels.push(report);
        }

        let cycle_duration = cycle_start.elapsed();
        let cycle_us = cycle_duration.as_micros() as u64;
        self.stats.last_cycle_us = cycle_us;
        self.stats.max_cycle_us = self.stats.max_cycle_us.max(cycle_us);
        let overrun = cycle_duration > self.config.cycle_time;
        if overrun {
            self.stats.cycles_overrun += 1;
            warn!(
                cycle = tick.index,
                cycle_us,
                cycle_time_ms = self.config.cycle_time.as_millis() as u64,
                "Cycle overran its period"
            );
        }
        self.stats.cycles_executed += 1;

        Ok(CycleReport {
            cycle: tick.index,
            timestamp_us: tick.timestamp_us,
            duration_us: cycle_us,
            overrun,
            channels,
        })
    }

    fn budget_exhausted(&self) -> bool {
        self.config
            .max_cycles
            .is_some_and(|max| self.stats.cycles_executed >= max)
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn stats(&self) -> &AcquisitionStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::{ChannelState, Reading};
    use crate::sensor::Sensor;
    use crate::sensor_sim::ScriptedSensor;

    #[derive(Default)]
    struct RecordingDelay {
        sleeps: Vec<Duration>,
    }

    impl Delay for RecordingDelay {
        fn sleep(&mut self, duration: Duration) {
            self.sleeps.push(duration);
        }
    }

    fn scripted(name: &str, script: Vec<Reading>, seed: ChannelState) -> Channel {
        Channel::new(name, name, ScriptedSensor::new(script), seed).unwrap()
    }

    struct SlowSensor {
        latency: Duration,
    }

    impl Sensor for SlowSensor {
        fn sample(&mut self) -> Reading {
            thread::sleep(self.latency);
            Reading::Concrete(1)
        }
    }

    struct ClosesAfter {
        reports: Vec<CycleReport>,
        limit: usize,
    }

    impl ReportSink for ClosesAfter {
        fn publish(&mut self, report: &CycleReport) {
            self.reports.push(report.clone());
        }

        fn is_closed(&self) -> bool {
            self.reports.len() >= self.limit
        }
    }

    fn config(max_cycles: u64) -> AcquisitionConfig {
        AcquisitionConfig {
            cycle_time: Duration::from_millis(250),
            max_cycles: Some(max_cycles),
        }
    }

    #[test]
    fn ticker_sleeps_between_ticks_only() {
        let mut delay = RecordingDelay::default();
        let mut ticker = Ticker::new(Duration::from_millis(5), &mut delay);
        let first = ticker.next_tick();
        let second = ticker.next_tick();
        assert_eq!((first.index, second.index), (0, 1));
        assert_eq!(ticker.issued(), 2);
        drop(ticker);
        assert_eq!(delay.sleeps, vec![Duration::from_millis(5)]);
    }

    #[test]
    fn rejects_zero_cycle_time() {
        let config = AcquisitionConfig {
            cycle_time: Duration::ZERO,
            max_cycles: None,
        };
        let res = AcquisitionLoop::new(Vec::new(), config, ThreadDelay);
        assert!(matches!(res, Err(ConfigError::ZeroCycleTime)));
    }

    #[test]
    fn runs_channels_in_order_with_missing_fallback() {
        let channels = vec![
            scripted(
                "temp",
                vec![Reading::Concrete(10), Reading::Concrete(20)],
                ChannelState::default(),
            ),
            scripted(
                "ph",
                vec![Reading::Missing, Reading::Concrete(7)],
                ChannelState::seeded(5, 5.0),
            ),
        ];
        let mut delay = RecordingDelay::default();
        let mut acquisition = AcquisitionLoop::new(channels, config(2), &mut delay).unwrap();

        let mut reports: Vec<CycleReport> = Vec::new();
        acquisition
            .run(&AtomicBool::new(false), &mut reports)
            .unwrap();

        assert_eq!(reports.len(), 2);
        let names: Vec<_> = reports[0].channels.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["temp", "ph"]);

        let ph = reports[0].channel("ph").unwrap();
        assert!(ph.missing);
        assert_eq!((ph.last_value, ph.running_mean, ph.sample_count), (5, 5.0, 0));

        let temp = reports[1].channel("temp").unwrap();
        assert_eq!((temp.last_value, temp.running_mean), (20, 15.0));
        let ph = reports[1].channel("ph").unwrap();
        assert_eq!((ph.last_value, ph.running_mean, ph.sample_count), (7, 7.0, 1));

        let stats = acquisition.stats().clone();
        assert_eq!(stats.cycles_executed, 2);
        assert_eq!(stats.readings_missing, 1);
        assert_eq!(stats.readings_concrete, 3);

        drop(acquisition);
        assert_eq!(delay.sleeps, vec![Duration::from_millis(250)]);
    }

    #[test]
    fn stop_flag_prevents_any_cycle() {
        let channels = vec![scripted("a", vec![Reading::Concrete(1)], ChannelState::default())];
        let mut acquisition =
            AcquisitionLoop::new(channels, config(10), RecordingDelay::default()).unwrap();

        let mut reports: Vec<CycleReport> = Vec::new();
        acquisition.run(&AtomicBool::new(true), &mut reports).unwrap();

        assert!(reports.is_empty());
        assert_eq!(acquisition.channels()[0].state(), ChannelState::default());
    }

    #[test]
    fn overflow_stops_the_loop() {
        let seed = ChannelState {
            last_value: 0,
            sample_count: u64::MAX,
            running_mean: 0.0,
        };
        let channels = vec![scripted("a", vec![Reading::Missing, Reading::Concrete(1)], seed)];
        let mut acquisition =
            AcquisitionLoop::new(channels, config(5), RecordingDelay::default()).unwrap();

        let mut reports: Vec<CycleReport> = Vec::new();
        let res = acquisition.run(&AtomicBool::new(false), &mut reports);

        assert_eq!(
            res,
            Err(StatsError::SampleCountOverflow { count: u64::MAX })
        );
        assert_eq!(reports.len(), 1);
    }

    #[test]
    fn slow_sampling_counts_overruns() {
        let sensor = SlowSensor {
            latency: Duration::from_millis(15),
        };
        let channels = vec![Channel::new("slow", "slow", sensor, ChannelState::default()).unwrap()];
        let config = AcquisitionConfig {
            cycle_time: Duration::from_millis(5),
            max_cycles: Some(2),
        };
        let mut acquisition =
            AcquisitionLoop::new(channels, config, RecordingDelay::default()).unwrap();

        let mut reports: Vec<CycleReport> = Vec::new();
        acquisition.run(&AtomicBool::new(false), &mut reports).unwrap();

        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.overrun));
        assert!(reports.iter().all(|r| r.duration_us >= 15_000));
        assert_eq!(acquisition.stats().cycles_executed, 2);
        assert_eq!(acquisition.stats().cycles_overrun, 2);
    }

    #[test]
    fn overflow_in_later_channel_commits_nothing() {
        let at_limit = ChannelState {
            last_value: 0,
            sample_count: u64::MAX,
            running_mean: 0.0,
        };
        let channels = vec![
            scripted("first", vec![Reading::Concrete(9)], ChannelState::default()),
            scripted("second", vec![Reading::Concrete(1)], at_limit),
        ];
        let mut acquisition =
            AcquisitionLoop::new(channels, config(1), RecordingDelay::default()).unwrap();

        let mut reports: Vec<CycleReport> = Vec::new();
        let res = acquisition.run(&AtomicBool::new(false), &mut reports);

        assert!(res.is_err());
        assert!(reports.is_empty());
        assert_eq!(acquisition.channels()[0].state(), ChannelState::default());
        assert_eq!(acquisition.channels()[1].state(), at_limit);
        let stats = acquisition.stats();
        assert_eq!((stats.readings_concrete, stats.readings_missing), (0, 0));
        assert_eq!(stats.cycles_executed, 0);
    }

    #[test]
    fn closed_sink_stops_the_loop() {
        let channels = vec![scripted("a", Vec::new(), ChannelState::default())];
        let mut delay = RecordingDelay::default();
        let mut acquisition = AcquisitionLoop::new(channels, config(10), &mut delay).unwrap();

        let mut sink = ClosesAfter {
            reports: Vec::new(),
            limit: 1,
        };
        acquisition.run(&AtomicBool::new(false), &mut sink).unwrap();

        assert_eq!(sink.reports.len(), 1);
        assert_eq!(acquisition.stats().cycles_executed, 1);
        drop(acquisition);
        assert!(delay.sleeps.is_empty());
    }

    #[test]
    fn tick_index_becomes_cycle_number() {
        let channels = vec![scripted("a", Vec::new(), ChannelState::default())];
        let mut acquisition =
            AcquisitionLoop::new(channels, config(3), RecordingDelay::default()).unwrap();

        let mut reports: Vec<CycleReport> = Vec::new();
        acquisition.run(&AtomicBool::new(false), &mut reports).unwrap();

        let cycles: Vec<_> = reports.iter().map(|r| r.cycle).collect();
        assert_eq!(cycles, [0, 1, 2]);
    }
}
