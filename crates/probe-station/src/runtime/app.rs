use crate::runtime::config::RuntimeConfig;
use crate::runtime::error::StationError;
use crate::runtime::logging::init_tracing;
use crate::runtime::telemetry;
use probe_core::{
    AcquisitionLoop, AcquisitionStats, BoundedRandomSensor, Channel, FanOut, ThreadDelay,
    PROBE_SUITE,
};
use probe_io::{ConsoleFormat, ConsoleReporter, MetricsReporter};
use std::process::ExitCode;
use std::sync::{atomic::AtomicBool, Arc};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

pub fn run_from_args() -> ExitCode {
    let config = match RuntimeConfig::from_env().map_err(StationError::from) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!("Run with --help for usage.");
            return ExitCode::from(exit_status(&e));
        }
    };
    if config.show_help {
        RuntimeConfig::print_help();
        return ExitCode::SUCCESS;
    }

    init_tracing(config.json_logs);
    match run(config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "probe-station failed");
            eprintln!("error: {e}");
            ExitCode::from(exit_status(&e))
        }
    }
}

/// Usage errors exit with 2, everything else with 1.
fn exit_status(err: &StationError) -> u8 {
    match err {
        StationError::Args(_) => 2,
        _ => 1,
    }
}

/// Runs the station until the cycle budget, the time budget, or a fatal
/// statistics error ends it. Expects tracing to be initialized.
pub fn run(config: RuntimeConfig) -> Result<AcquisitionStats, StationError> {
    telemetry::init();
    let _metrics_handle = telemetry::start_metrics_server(&config.metrics_addr)?;

    let channels = build_channels(&config)?;
    let mut acquisition =
        AcquisitionLoop::new(channels, config.acquisition_config(), ThreadDelay)?;
    let mut sink = build_sink(&config);

    info!(
        cycle_ms = config.cycle_ms,
        error_percent = config.error_percent,
        seed = ?config.seed,
        metrics_enabled = config.metrics_addr.is_some(),
        "Starting probe station"
    );

    let stop = Arc::new(AtomicBool::new(false));
    let stop_loop = Arc::clone(&stop);
    let loop_handle = thread::spawn(move || {
        let result = acquisition.run(&stop_loop, &mut sink);
        (result, acquisition.stats().clone())
    });

    if let Some(seconds) = config.run_seconds {
        info!(seconds, "Running for limited duration");
        let deadline = Instant::now() + Duration::from_secs(seconds);
        while Instant::now() < deadline && !loop_handle.is_finished() {
            thread::sleep(Duration::from_millis(20));
        }
        stop.store(true, std::sync::atomic::Ordering::Relaxed);
    }

    let (result, stats) = loop_handle
        .join()
        .map_err(|_| StationError::LoopPanicked)?;
    result?;

    info!(
        cycles_executed = stats.cycles_executed,
        cycles_overrun = stats.cycles_overrun,
        readings_concrete = stats.readings_concrete,
        readings_missing = stats.readings_missing,
        max_cycle_us = stats.max_cycle_us,
        "Run complete"
    );
    Ok(stats)
}

/// One bounded-random sensor per channel of the probe suite.
///
/// A seeded run derives each channel's seed from its position so channels
/// do not replay the same draws.
fn build_channels(config: &RuntimeConfig) -> Result<Vec<Channel>, StationError> {
    PROBE_SUITE
        .iter()
        .enumerate()
        .map(|(index, spec)| {
            let sensor_config = spec.sensor_config(config.error_percent).validate()?;
            let sensor = match config.seed {
                Some(seed) => {
                    BoundedRandomSensor::seeded(sensor_config, seed.wrapping_add(index as u64))
                }
                None => BoundedRandomSensor::from_entropy(sensor_config),
            };
            let range = sensor.config();
            debug!(
                channel = spec.key,
                min_value = range.min_value(),
                max_value = range.max_value(),
                error_percent = range.error_percent(),
                "Configured sensor"
            );
            Ok(Channel::from_spec(spec, sensor)?)
        })
        .collect()
}

fn build_sink(config: &RuntimeConfig) -> FanOut {
    let format = if config.json_report {
        ConsoleFormat::JsonLines
    } else {
        ConsoleFormat::Table
    };
    let sink = FanOut::new().with(ConsoleReporter::stdout(format, config.clear_screen));
    if config.metrics_addr.is_some() {
        sink.with(MetricsReporter)
    } else {
        sink
    }
}
