use serde::Serialize;

/// Per-channel output of one cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelReport {
    pub name: String,
    pub label: String,
    pub last_value: i32,
    pub running_mean: f64,
    pub sample_count: u64,
    pub missing: bool,
}

/// Everything one acquisition cycle produced, in sampling order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub timestamp_us: u64,
    pub duration_us: u64,
    /// Sampling took longer than the configured cycle time.
    pub overrun: bool,
    pub channels: Vec<ChannelReport>,
}

impl CycleReport {
    pub fn channel(&self, name: &str) -> Option<&ChannelReport> {
        self.channels.iter().find(|channel| channel.name == name)
    }

    pub fn missing_count(&self) -> usize {
        self.channels.iter().filter(|channel| channel.missing).count()
    }
}

/// Consumer of cycle reports (console, metrics, tests).
pub trait ReportSink {
    fn publish(&mut self, report: &CycleReport);

    /// The sink can no longer deliver reports and the loop should stop.
    fn is_closed(&self) -> bool {
        false
    }
}

impl ReportSink for Vec<CycleReport> {
    fn publish(&mut self, report: &CycleReport) {
        self.push(report.clone());
    }
}

impl<S: ReportSink + ?Sized> ReportSink for &mut S {
    fn publish(&mut self, report: &CycleReport) {
        (**self).publish(report);
    }
    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

impl<S: ReportSink + ?Sized> ReportSink for Box<S> {
    fn publish(&mut self, report: &CycleReport) {
        (**self).publish(report);
    }
    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

/// Forwards every report to each inner sink, in order.
#[derive(Default)]
pub struct FanOut {
    sinks: Vec<Box<dyn ReportSink + Send>>,
}

impl FanOut {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl ReportSink + Send + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl ReportSink for FanOut {
    fn publish(&mut self, report: &CycleReport) {
        for sink in &mut self.sinks {
            if !sink.is_closed() {
                sink.publish(report);
            }
        }
    }

    /// Closed as soon as any inner sink is.
    fn is_closed(&self) -> bool {
        self.sinks.iter().any(|sink| sink.is_closed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn report(missing: [bool; 2]) -> CycleReport {
        CycleReport {
            cycle: 0,
            timestamp_us: 0,
            duration_us: 0,
            overrun: false,
            channels: ["a", "b"]
                .iter()
                .zip(missing)
                .map(|(name, missing)| ChannelReport {
                    name: name.to_string(),
                    label: name.to_string(),
                    last_value: 1,
                    running_mean: 1.0,
                    sample_count: 1,
                    missing,
                })
                .collect(),
        }
    }

    struct Shared(Arc<Mutex<Vec<u64>>>);

    impl ReportSink for Shared {
        fn publish(&mut self, report: &CycleReport) {
            self.0.lock().unwrap().push(report.cycle);
        }
    }

    #[test]
    fn lookup_and_missing_count() {
        let report = report([true, false]);
        assert_eq!(report.channel("b").map(|c| c.missing), Some(false));
        assert!(report.channel("c").is_none());
        assert_eq!(report.missing_count(), 1);
    }

    #[test]
    fn fan_out_reaches_every_sink() {
        let seen_a = Arc::new(Mutex::new(Vec::new()));
        let seen_b = Arc::new(Mutex::new(Vec::new()));
        let mut fan_out = FanOut::new()
            .with(Shared(Arc::clone(&seen_a)))
            .with(Shared(Arc::clone(&seen_b)));
        assert_eq!(fan_out.len(), 2);

        fan_out.publish(&report([false, false]));

        assert_eq!(*seen_a.lock().unwrap(), vec![0]);
        assert_eq!(*seen_b.lock().unwrap(), vec![0]);
    }

    struct OneShot {
        published: usize,
    }

    impl ReportSink for OneShot {
        fn publish(&mut self, _report: &CycleReport) {
            self.published += 1;
        }

        fn is_closed(&self) -> bool {
            self.published > 0
        }
    }

    #[test]
    fn fan_out_closes_with_any_inner_sink() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut fan_out = FanOut::new()
            .with(OneShot { published: 0 })
            .with(Shared(Arc::clone(&seen)));
        assert!(!fan_out.is_closed());

        fan_out.publish(&report([false, false]));
        assert!(fan_out.is_closed());
        assert_eq!(*seen.lock().unwrap(), vec![0]);
    }

    #[test]
    fn serializes_to_json() {
        let json = serde_json::to_value(report([false, true])).unwrap();
        assert_eq!(json["channels"][1]["missing"], true);
        assert_eq!(json["channels"][0]["running_mean"], 1.0);
    }
}
