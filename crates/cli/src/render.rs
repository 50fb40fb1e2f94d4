//! Terminal rendering: output-format detection, source-annotated JSON
//! errors (ariadne) and coloured summary lines.

use std::io::{self, IsTerminal};

use ariadne::{Color, Config, Fmt, Label, Report, ReportKind, Source};

// ── Output format ───────────────────────────────────────────────────────

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Format {
    /// Human-readable, coloured output.
    Pretty,
    /// Machine-readable JSON.
    Json,
}

impl Format {
    /// Use the explicit choice, or detect from whether stdout is a TTY.
    pub(crate) fn resolve_or_detect(explicit: Option<&str>) -> Self {
        match explicit {
            Some("json") => Format::Json,
            Some("pretty") => Format::Pretty,
            // Default: pretty for interactive terminals, JSON for pipes
            _ => {
                if io::stdout().is_terminal() {
                    Format::Pretty
                } else {
                    Format::Json
                }
            }
        }
    }
}

// ── JSON input errors ───────────────────────────────────────────────────

/// Byte offset of a 1-based `(line, column)` position, clamped to `source`.
pub(crate) fn offset_of(source: &str, line: usize, column: usize) -> usize {
    let line_start: usize = source
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(source.len())
}

/// Render a JSON syntax or shape error against its source, to stderr.
pub(crate) fn render_json_error(source: &str, filename: &str, err: &serde_json::Error) {
    if err.line() == 0 {
        eprintln!("error: {filename}: {err}");
        return;
    }
    let start = offset_of(source, err.line(), err.column());
    let end = (start + 1).min(source.len()).max(start);

    let report = Report::build(ReportKind::Error, (filename, start..end))
        .with_message("invalid JSON input")
        .with_config(Config::default().with_compact(false))
        .with_label(
            Label::new((filename, start..end))
                .with_message(err.to_string())
                .with_color(Color::Red),
        )
        .finish();
    report.eprint((filename, Source::from(source))).ok();
}

/// Render any other error as a single line to stderr.
pub(crate) fn render_error(message: &str) {
    eprintln!("{}: {message}", "error".fg(Color::Red));
}

// ── Summary line ────────────────────────────────────────────────────────

/// Print a coloured `N reproduced, M failed` line to stderr.
pub(crate) fn print_summary(reproduced: usize, failed: usize, truncated: usize) {
    let mut parts = vec![format!("{}", format!("{reproduced} reproduced").fg(Color::Green))];
    if failed > 0 {
        parts.push(format!("{}", format!("{failed} failed").fg(Color::Red)));
    }
    if truncated > 0 {
        parts.push(format!("{}", format!("{truncated} truncated").fg(Color::Yellow)));
    }
    eprintln!("{}", parts.join(", "));
}
