//! Suite Output and Reporting
//!
//! Human-readable and JSON rendering of a [`SuiteReport`].

use std::time::Duration;

use crate::checks::Check;
use crate::cli::{OutputFormat, VerbosityLevel};
use crate::suite::{CheckOutcome, CheckStatus, SuiteReport};

/// Output formatter for suite results
pub struct Output {
    format: OutputFormat,
    verbosity: VerbosityLevel,
    show_colors: bool,
}

impl Output {
    pub fn new(format: OutputFormat, verbosity: VerbosityLevel) -> Self {
        Self {
            format,
            verbosity,
            show_colors: atty::is(atty::Stream::Stdout),
        }
    }

    /// Disable ANSI colors regardless of the terminal
    pub fn without_colors(mut self) -> Self {
        self.show_colors = false;
        self
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    pub fn format_report(&self, report: &SuiteReport) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report)
                .unwrap_or_else(|e| json_error(&e)),
            OutputFormat::Human => self.format_human(report),
        }
    }

    fn format_human(&self, report: &SuiteReport) -> String {
        let mut output = String::new();

        for outcome in &report.outcomes {
            let show = match self.verbosity {
                VerbosityLevel::Quiet => !outcome.status.is_passed(),
                VerbosityLevel::Normal | VerbosityLevel::Verbose => true,
            };
            if show {
                output.push_str(&self.format_outcome(outcome));
                output.push('\n');
            }
        }

        if self.verbosity == VerbosityLevel::Quiet {
            if !report.success() {
                output.push_str(&format!(
                    "Failed: {} Errors: {}\n",
                    report.failed(),
                    report.errored()
                ));
            }
            return output;
        }

        output.push('\n');
        output.push_str(&self.format_summary(report));
        output
    }

    pub fn format_outcome(&self, outcome: &CheckOutcome) -> String {
        let duration = format_duration(outcome.duration);

        match &outcome.status {
            CheckStatus::Passed => {
                let mut line = format!("{}  {}", self.colorize("✓ PASS", "32"), outcome.name);
                if self.verbosity >= VerbosityLevel::Verbose {
                    line.push_str(&format!(" ({})", duration));
                }
                line
            }
            CheckStatus::Failed { message } => format!(
                "{}  {} ({})\n    {}",
                self.colorize("✗ FAIL", "31"),
                outcome.name,
                duration,
                message
            ),
            CheckStatus::Errored { message } => format!(
                "{}  {} ({})\n    {}",
                self.colorize("⚠ ERROR", "33"),
                outcome.name,
                duration,
                message
            ),
        }
    }

    fn format_summary(&self, report: &SuiteReport) -> String {
        let mut output = String::new();
        output.push_str("Conformance Summary:\n");
        output.push_str(&format!("  Entrypoint: {}\n", report.entrypoint));
        output.push_str(&format!("  Checks run: {}\n", report.outcomes.len()));
        output.push_str(&format!(
            "  {} {}\n",
            self.colorize("Passed:", "32"),
            report.passed()
        ));
        if report.failed() > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Failed:", "31"),
                report.failed()
            ));
        }
        if report.errored() > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Errors:", "33"),
                report.errored()
            ));
        }
        output.push_str(&format!(
            "  Duration: {}\n",
            format_duration(report.total_duration)
        ));
        output
    }

    /// One line per check for `--list`
    pub fn format_catalogue(&self, checks: &[Check]) -> String {
        let width = checks.iter().map(|c| c.name().len()).max().unwrap_or(0);
        checks
            .iter()
            .map(|c| format!("{:width$}  {}\n", c.name(), c.description(), width = width))
            .collect()
    }
}

fn json_error(error: &dyn std::fmt::Display) -> String {
    serde_json::json!({ "error": error.to_string() }).to_string()
}

fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs_f64();
    if total_secs < 1.0 {
        format!("{:.0}ms", duration.as_millis())
    } else if total_secs < 60.0 {
        format!("{:.2}s", total_secs)
    } else {
        let mins = (total_secs / 60.0) as u64;
        let secs = total_secs % 60.0;
        format!("{}m{:.1}s", mins, secs)
    }
}
