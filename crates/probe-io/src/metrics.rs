//! Prometheus metrics for the sampling station.
//!
//! Channel gauges are labelled with the channel key so the probe suite can
//! grow without new metric names.

use crate::error::IoError;
use probe_core::{CycleReport, ReportSink};
use prometheus::{
    Encoder, GaugeVec, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use std::sync::LazyLock;
use std::thread;
use tiny_http::{Header, Response, Server};

/// Global metrics registry
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Loop Metrics
// ============================================================================

/// Total acquisition cycles executed
pub static CYCLES_EXECUTED: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new(
        "probe_cycles_executed_total",
        "Total acquisition cycles executed",
    )
    .unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Cycles whose sampling took longer than the cycle time
pub static CYCLES_OVERRUN: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new(
        "probe_cycles_overrun_total",
        "Acquisition cycles that overran their period",
    )
    .unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

pub static CYCLE_DURATION_US: LazyLock<Histogram> = LazyLock::new(|| {
    let histogram = Histogram::with_opts(
        HistogramOpts::new(
            "probe_cycle_duration_microseconds",
            "Time spent sampling all channels in one cycle",
        )
        .buckets(vec![1.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1000.0, 10_000.0]),
    )
    .unwrap();
    REGISTRY.register(Box::new(histogram.clone())).unwrap();
    histogram
});

// ============================================================================
// Channel Metrics
// ============================================================================

pub static READINGS_MISSING: LazyLock<IntCounterVec> = LazyLock::new(|| {
    let counter = IntCounterVec::new(
        Opts::new("probe_readings_missing_total", "Sampling attempts that yielded no data"),
        &["channel"],
    )
    .unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

pub static READINGS_CONCRETE: LazyLock<IntCounterVec> = LazyLock::new(|| {
    let counter = IntCounterVec::new(
        Opts::new("probe_readings_concrete_total", "Sampling attempts that yielded a value"),
        &["channel"],
    )
    .unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Most recent value per channel (echoed when a reading is missing)
pub static CHANNEL_LAST_VALUE: LazyLock<IntGaugeVec> = LazyLock::new(|| {
    let gauge = IntGaugeVec::new(
        Opts::new("probe_channel_last_value", "Most recent value per channel"),
        &["channel"],
    )
    .unwrap();
    REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

pub static CHANNEL_RUNNING_MEAN: LazyLock<GaugeVec> = LazyLock::new(|| {
    let gauge = GaugeVec::new(
        Opts::new(
            "probe_channel_running_mean",
            "Running mean per channel, rounded to three decimals",
        ),
        &["channel"],
    )
    .unwrap();
    REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

pub static CHANNEL_SAMPLE_COUNT: LazyLock<IntGaugeVec> = LazyLock::new(|| {
    let gauge = IntGaugeVec::new(
        Opts::new(
            "probe_channel_sample_count",
            "Concrete samples folded into the running mean",
        ),
        &["channel"],
    )
    .unwrap();
    REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Mirrors every cycle report into the process-global gauges.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsReporter;

impl ReportSink for MetricsReporter {
    fn publish(&mut self, report: &CycleReport) {
        CYCLES_EXECUTED.inc();
        if report.overrun {
            CYCLES_OVERRUN.inc();
        }
        CYCLE_DURATION_US.observe(report.duration_us as f64);

        for channel in &report.channels {
            let labels = [channel.name.as_str()];
            if channel.missing {
                READINGS_MISSING.with_label_values(&labels).inc();
            } else {
                READINGS_CONCRETE.with_label_values(&labels).inc();
            }
            CHANNEL_LAST_VALUE
                .with_label_values(&labels)
                .set(i64::from(channel.last_value));
            CHANNEL_RUNNING_MEAN
                .with_label_values(&labels)
                .set(channel.running_mean);
            CHANNEL_SAMPLE_COUNT
                .with_label_values(&labels)
                .set(i64::try_from(channel.sample_count).unwrap_or(i64::MAX));
        }
    }
}

/// Encode the registry in the Prometheus text format.
pub fn render_metrics() -> Result<String, IoError> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|_| IoError::NonUtf8)
}

// ============================================================================
// Metrics HTTP Server
// ============================================================================

/// Bind the metrics HTTP server and serve it from a background thread.
pub fn serve_metrics(bind_addr: &str) -> Result<thread::JoinHandle<()>, IoError> {
    let server = Server::http(bind_addr).map_err(|e| IoError::MetricsBind {
        addr: bind_addr.to_string(),
        reason: e.to_string(),
    })?;
    tracing::info!("Metrics server listening on http://{}/metrics", bind_addr);

    Ok(thread::spawn(move || {
        for request in server.incoming_requests() {
            let response = match request.url() {
                "/metrics" => match render_metrics() {
                    Ok(body) => {
                        let mut response = Response::from_string(body);
                        if let Ok(header) = Header::from_bytes(
                            &b"Content-Type"[..],
                            &b"text/plain; version=0.0.4"[..],
                        ) {
                            response = response.with_header(header);
                        }
                        response
                    }
                    Err(e) => {
                        tracing::warn!("Failed to encode metrics: {}", e);
                        Response::from_string("Internal Server Error").with_status_code(500)
                    }
                },
                "/health" => Response::from_string("OK"),
                // Ready once the loop has completed a cycle
                "/ready" if CYCLES_EXECUTED.get() > 0 => Response::from_string("Ready"),
                "/ready" => Response::from_string("Not Ready").with_status_code(503),
                _ => Response::from_string("Not Found").with_status_code(404),
            };
            let _ = request.respond(response);
        }
    }))
}

/// Initialize all metrics (forces lazy initialization)
pub fn init_metrics() {
    let _ = CYCLES_EXECUTED.get();
    let _ = CYCLES_OVERRUN.get();
    let _ = CYCLE_DURATION_US.get_sample_count();
    LazyLock::force(&READINGS_MISSING);
    LazyLock::force(&READINGS_CONCRETE);
    LazyLock::force(&CHANNEL_LAST_VALUE);
    LazyLock::force(&CHANNEL_RUNNING_MEAN);
    LazyLock::force(&CHANNEL_SAMPLE_COUNT);
}
