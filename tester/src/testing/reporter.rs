//! Human-readable run output
//!
//! Colored emoji markers on a capable terminal, plain `[PASS]`-style markers
//! everywhere else (pipes, CI logs, `NO_COLOR`, `TERM=dumb`).

use std::io::IsTerminal;

use super::report::{RunReport, Verdict, VerdictKind};

const GREEN: &str = "\x1b[92m";
const RED: &str = "\x1b[91m";
const YELLOW: &str = "\x1b[93m";
const CYAN: &str = "\x1b[96m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

const RULE_WIDTH: usize = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStyle {
    /// ANSI colors and emoji markers
    Rich,
    /// ASCII markers, no escape codes
    Plain,
}

impl OutputStyle {
    /// Pick a style for stdout from the environment
    pub fn detect(force_plain: bool) -> Self {
        let no_color = std::env::var_os("NO_COLOR").is_some();
        let dumb_term = std::env::var("TERM").map(|t| t == "dumb").unwrap_or(false);
        if force_plain || no_color || dumb_term || !std::io::stdout().is_terminal() {
            OutputStyle::Plain
        } else {
            OutputStyle::Rich
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    style: OutputStyle,
}

impl Reporter {
    pub fn new(style: OutputStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> OutputStyle {
        self.style
    }

    pub fn group_header(&self, group: &str) -> String {
        let rule = "─".repeat(RULE_WIDTH);
        match self.style {
            OutputStyle::Rich => format!("\n{BOLD}{CYAN}{rule}{RESET}\n{BOLD}{CYAN}Group: {group}{RESET}\n{BOLD}{CYAN}{rule}{RESET}"),
            OutputStyle::Plain => format!("\n{}\nGroup: {}\n{}", "-".repeat(RULE_WIDTH), group, "-".repeat(RULE_WIDTH)),
        }
    }

    /// One line per finished scenario
    pub fn scenario_line(&self, scenario: &str, verdict: &Verdict) -> String {
        let marker = self.marker(verdict.kind());
        match verdict.reason() {
            None => format!("{} {}", marker, scenario),
            Some(reason) => format!("{} {}: {}", marker, scenario, reason),
        }
    }

    pub fn summary(&self, report: &RunReport) -> String {
        let mut out = String::new();
        let rule = "=".repeat(RULE_WIDTH);
        let (bold, green, red, yellow, reset) = match self.style {
            OutputStyle::Rich => (BOLD, GREEN, RED, YELLOW, RESET),
            OutputStyle::Plain => ("", "", "", "", ""),
        };

        out.push_str(&format!("\n{bold}{rule}{reset}\n"));
        out.push_str(&format!("{bold}Test Summary (run {}){reset}\n", report.run_id.short()));
        out.push_str(&format!("{bold}{rule}{reset}\n"));
        out.push_str(&format!("Total: {} scenarios\n", report.total()));
        out.push_str(&format!("{green}Passed: {}{reset}\n", report.passed));
        out.push_str(&format!("{red}Failed: {}{reset}\n", report.failed));
        out.push_str(&format!("{yellow}Errors: {}{reset}\n", report.errored));

        if !report.failures.is_empty() {
            out.push_str(&format!("\n{red}Failing scenarios:{reset}\n"));
            for failure in &report.failures {
                out.push_str(&format!(
                    "  - [{}] {}/{}: {}\n",
                    failure.kind, failure.group, failure.scenario, failure.reason
                ));
            }
        }

        let verdict_line = if report.all_passed() {
            format!("{green}{} ALL SCENARIOS PASSED{reset}", self.marker(VerdictKind::Pass))
        } else {
            format!("{red}{} SOME SCENARIOS FAILED{reset}", self.marker(VerdictKind::Fail))
        };
        out.push_str(&format!("\n{}\n", verdict_line));
        out
    }

    fn marker(&self, kind: VerdictKind) -> String {
        match (self.style, kind) {
            (OutputStyle::Rich, VerdictKind::Pass) => format!("{GREEN}✅{RESET}"),
            (OutputStyle::Rich, VerdictKind::Fail) => format!("{RED}❌{RESET}"),
            (OutputStyle::Rich, VerdictKind::Error) => format!("{YELLOW}💥{RESET}"),
            (OutputStyle::Plain, kind) => format!("[{}]", kind),
        }
    }
}
