//! Run summaries on stderr, or JSON on stdout.

use crate::acquisition::paginator::PaginationStop;
use crate::pipeline::RunReport;
use std::io::IsTerminal;

/// Colors are on when stderr is a terminal and `NO_COLOR` is unset.
pub fn color_enabled() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    std::io::stderr().is_terminal()
}

/// Whether a live progress bar makes sense.
pub fn progress_enabled(quiet: bool, json: bool) -> bool {
    !quiet && !json && std::io::stderr().is_terminal()
}

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

pub struct Styled {
    use_color: bool,
}

impl Default for Styled {
    fn default() -> Self {
        Self::new()
    }
}

impl Styled {
    pub fn new() -> Self {
        Self {
            use_color: color_enabled(),
        }
    }

    pub fn plain() -> Self {
        Self { use_color: false }
    }

    pub fn ok_sym(&self) -> &'static str {
        if self.use_color {
            "\x1b[32m\u{2713}\x1b[0m"
        } else {
            "OK"
        }
    }

    pub fn fail_sym(&self) -> &'static str {
        if self.use_color {
            "\x1b[31m\u{2717}\x1b[0m"
        } else {
            "!!"
        }
    }

    pub fn warn_sym(&self) -> &'static str {
        if self.use_color {
            "\x1b[33m\u{26a0}\x1b[0m"
        } else {
            "??"
        }
    }

    fn paint(&self, code: &str, s: &str) -> String {
        if self.use_color {
            format!("{code}{s}{RESET}")
        } else {
            s.to_string()
        }
    }

    pub fn green(&self, s: &str) -> String {
        self.paint(GREEN, s)
    }

    pub fn red(&self, s: &str) -> String {
        self.paint(RED, s)
    }

    pub fn yellow(&self, s: &str) -> String {
        self.paint(YELLOW, s)
    }

    pub fn dim(&self, s: &str) -> String {
        self.paint(DIM, s)
    }

    pub fn bold(&self, s: &str) -> String {
        self.paint(BOLD, s)
    }
}

/// Human-readable lines for one run.
pub fn report_lines(s: &Styled, report: &RunReport) -> Vec<String> {
    let mut lines = vec![format!(
        "  {} {}",
        s.bold(&report.scholar_id),
        s.dim(&format!("years {}", report.target_years.join(", ")))
    )];

    let listing_sym = match report.pagination {
        PaginationStop::Exhausted | PaginationStop::ControlMissing => s.ok_sym(),
        PaginationStop::SessionLost { .. } => s.fail_sym(),
        _ => s.warn_sym(),
    };
    lines.push(format!(
        "    {listing_sym} {:<16} {} ({} show-more clicks)",
        "listing",
        describe_stop(&report.pagination),
        report.show_more_clicks
    ));

    lines.push(format!(
        "    {} {:<16} {}",
        s.ok_sym(),
        "articles",
        report.articles_found
    ));

    if report.unavailable_articles > 0 {
        lines.push(format!(
            "    {} {:<16} {}",
            s.warn_sym(),
            "unavailable",
            s.yellow(&report.unavailable_articles.to_string())
        ));
    }

    if let Some(reason) = &report.partial {
        lines.push(format!(
            "    {} {:<16} {}",
            s.fail_sym(),
            "stopped early",
            s.red(reason)
        ));
    }

    match &report.output_path {
        Some(path) => lines.push(format!(
            "    {} {:<16} {} rows -> {}",
            s.ok_sym(),
            "saved",
            report.rows_written,
            s.green(&path.display().to_string())
        )),
        None => lines.push(format!(
            "    {} {:<16} {}",
            s.warn_sym(),
            "saved",
            s.dim("nothing to write")
        )),
    }

    if let Some(path) = &report.listing_snapshot {
        lines.push(format!(
            "    {} {:<16} {}",
            s.ok_sym(),
            "listing html",
            path.display()
        ));
    }

    lines
}

pub fn print_report(s: &Styled, report: &RunReport) {
    for line in report_lines(s, report) {
        eprintln!("{line}");
    }
    eprintln!();
}

pub fn print_failure(s: &Styled, scholar_id: &str, err: &anyhow::Error) {
    eprintln!("  {} {} {err:#}", s.fail_sym(), s.bold(scholar_id));
    eprintln!();
}

/// Print JSON output to stdout.
pub fn print_json(value: &serde_json::Value) {
    if let Ok(s) = serde_json::to_string_pretty(value) {
        println!("{s}");
    }
}

fn describe_stop(stop: &PaginationStop) -> String {
    match stop {
        PaginationStop::ProfileNotReady => "profile did not finish loading".to_string(),
        PaginationStop::Exhausted => "complete".to_string(),
        PaginationStop::ControlMissing => "complete (no show-more control)".to_string(),
        PaginationStop::Interrupted { reason } => format!("interrupted: {reason}"),
        PaginationStop::BudgetSpent => "click budget spent".to_string(),
        PaginationStop::SessionLost { reason } => format!("browser lost: {reason}"),
    }
}
