use crate::error::IoError;
use probe_core::{CycleReport, ReportSink};
use std::io::{self, ErrorKind, Write};
use tracing::warn;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleFormat {
    /// `Current <label>: <value>, Mean <label> = <mean>` per channel.
    #[default]
    Table,
    /// One JSON object per cycle.
    JsonLines,
}

/// Writes cycle reports to a terminal or any other writer.
pub struct ConsoleReporter<W: Write> {
    out: W,
    format: ConsoleFormat,
    clear_screen: bool,
    closed: bool,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout(format: ConsoleFormat, clear_screen: bool) -> Self {
        Self::new(io::stdout(), format, clear_screen)
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, format: ConsoleFormat, clear_screen: bool) -> Self {
        Self {
            out,
            format,
            // Clearing would wipe earlier JSON lines
            clear_screen: clear_screen && format == ConsoleFormat::Table,
            closed: false,
        }
    }

    pub fn write_report(&mut self, report: &CycleReport) -> Result<(), IoError> {
        match self.format {
            ConsoleFormat::Table => {
                if self.clear_screen {
                    self.out.write_all(CLEAR_SCREEN.as_bytes())?;
                }
                for channel in &report.channels {
                    writeln!(
                        self.out,
                        "Current {label}: {}, Mean {label} = {}",
                        channel.last_value,
                        channel.running_mean,
                        label = channel.label,
                    )?;
                }
            }
            ConsoleFormat::JsonLines => {
                let mut line = serde_json::to_vec(report)?;
                line.push(b'\n');
                self.out.write_all(&line)?;
            }
        }
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportSink for ConsoleReporter<W> {
    fn publish(&mut self, report: &CycleReport) {
        if self.closed {
            return;
        }
        match self.write_report(report) {
            Ok(()) => {}
            Err(IoError::Console(e)) if e.kind() == ErrorKind::BrokenPipe => {
                warn!(cycle = report.cycle, "Console reader went away, no further reports");
                self.closed = true;
            }
            Err(e) => {
                warn!(error = %e, cycle = report.cycle, "Failed to write cycle report");
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
