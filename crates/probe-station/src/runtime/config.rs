use probe_core::sensor_sim::DEFAULT_ERROR_PERCENT;
use probe_core::AcquisitionConfig;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgError {
    #[error("{flag} requires a value")]
    MissingValue { flag: String },

    #[error("invalid value {value:?} for {flag}")]
    InvalidValue { flag: String, value: String },

    #[error("unknown option {0}")]
    UnknownFlag(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub show_help: bool,
    pub run_seconds: Option<u64>,
    pub cycles: Option<u64>,
    pub cycle_ms: u64,
    pub error_percent: u8,
    pub seed: Option<u64>,
    pub json_logs: bool,
    pub json_report: bool,
    pub clear_screen: bool,
    pub metrics_addr: Option<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            show_help: false,
            run_seconds: None,
            cycles: None,
            cycle_ms: 1000,
            error_percent: DEFAULT_ERROR_PERCENT,
            seed: None,
            json_logs: false,
            json_report: false,
            clear_screen: true,
            metrics_addr: None,
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self, ArgError> {
        let args: Vec<String> = std::env::args().collect();
        Self::from_args(&args)
    }

    pub fn from_args(args: &[String]) -> Result<Self, ArgError> {
        let mut cfg = RuntimeConfig::default();
        let mut i = 1;
        while i < args.len() {
            let flag = args[i].as_str();
            match flag {
                "--run-seconds" => {
                    cfg.run_seconds = Some(parse_value(args, &mut i)?);
                }
                "--cycles" => {
                    cfg.cycles = Some(parse_value(args, &mut i)?);
                }
                "--cycle-ms" => {
                    cfg.cycle_ms = parse_value(args, &mut i)?;
                }
                "--error-percent" => {
                    cfg.error_percent = parse_value(args, &mut i)?;
                }
                "--seed" => {
                    cfg.seed = Some(parse_value(args, &mut i)?);
                }
                "--metrics-addr" => {
                    cfg.metrics_addr = Some(parse_value(args, &mut i)?);
                }
                "--json-logs" => {
                    cfg.json_logs = true;
                }
                "--json-report" => {
                    cfg.json_report = true;
                }
                "--no-clear" => {
                    cfg.clear_screen = false;
                }
                "--help" | "-h" => {
                    cfg.show_help = true;
                    break;
                }
                other => return Err(ArgError::UnknownFlag(other.to_string())),
            }
            i += 1;
        }
        Ok(cfg)
    }

    pub fn acquisition_config(&self) -> AcquisitionConfig {
        AcquisitionConfig {
            cycle_time: Duration::from_millis(self.cycle_ms),
            max_cycles: self.cycles,
        }
    }

    pub fn print_help() {
        println!(
            r#"probe-station - Lunar probe sensor sampling station

USAGE:
    probe-station [OPTIONS]

OPTIONS:
    --cycle-ms <MS>         Delay between sampling cycles in milliseconds [default: 1000]
    --cycles <N>            Stop after N cycles
    --run-seconds <SECS>    Run for a fixed duration then exit
    --error-percent <P>     Probability in percent that a sensor read yields no data [default: 30]
    --seed <N>              Seed the simulated sensors for a reproducible run
    --json-report           Print each cycle as a JSON line instead of the console table
    --no-clear              Do not clear the terminal between cycles
    --json-logs             Output logs in JSON format (for log aggregation)
    --metrics-addr <ADDR>   Enable Prometheus metrics server on address (e.g., 0.0.0.0:9090)
    -h, --help              Print this help message

ENVIRONMENT VARIABLES:
    RUST_LOG                Set log filter (e.g., RUST_LOG=debug,probe_core=trace)

EXAMPLES:
    # Interactive run, one cycle per second
    probe-station

    # Short reproducible run for scripting
    probe-station --cycles 10 --cycle-ms 100 --seed 7 --json-report

    # Long-running with metrics
    probe-station --no-clear --json-logs --metrics-addr 0.0.0.0:9090
"#
        );
    }
}

fn parse_value<T: std::str::FromStr>(args: &[String], i: &mut usize) -> Result<T, ArgError> {
    let flag = &args[*i];
    let value = args.get(*i + 1).ok_or_else(|| ArgError::MissingValue {
        flag: flag.clone(),
    })?;
    *i += 1;
    value.parse().map_err(|_| ArgError::InvalidValue {
        flag: flag.clone(),
        value: value.clone(),
    })
}
