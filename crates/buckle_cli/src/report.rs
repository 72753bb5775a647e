//! Terminal output: diagnostics with source locations, errors and values.

use buckle_core::SourceText;
use buckle_diagnostics::{Diagnostic, DiagnosticQueue};
use std::io::{self, IsTerminal};

// ANSI color codes
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const MAGENTA: &str = "\x1b[35m";
const CYAN: &str = "\x1b[36m";
const GRAY: &str = "\x1b[90m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    color: bool,
}

impl Reporter {
    /// Colors only when enabled and stderr is a terminal.
    pub fn new(color: bool) -> Self {
        Self {
            color: color && io::stderr().is_terminal(),
        }
    }

    fn paint(&self, code: &'static str) -> &'static str {
        if self.color {
            code
        } else {
            ""
        }
    }

    /// Print every diagnostic in order. `source` resolves spans to lines;
    /// without it only the character offset is shown.
    pub fn print_diagnostics(&self, diagnostics: &DiagnosticQueue, source: Option<&SourceText>) {
        for diagnostic in diagnostics.iter() {
            self.print_diagnostic(diagnostic, source);
        }
    }

    fn print_diagnostic(&self, diagnostic: &Diagnostic, source: Option<&SourceText>) {
        let color = if diagnostic.is_error() { self.paint(RED) } else { self.paint(YELLOW) };
        let (cyan, bold, reset) = (self.paint(CYAN), self.paint(BOLD), self.paint(RESET));

        let location = match (diagnostic.span, source) {
            (Some(span), Some(source)) => {
                let line_index = source.line_index(span.start);
                let line = source.lines()[line_index];
                let column = span.start - line.start + 1;
                Some((format!("{}({},{}): ", source.file_name(), line_index + 1, column), line_index))
            }
            (Some(span), None) => Some((format!("({}): ", span.start), 0)),
            (None, _) => None,
        };

        eprintln!(
            "{}{}{}{}{} {}{}{}: {}",
            location.as_ref().map(|(text, _)| text.as_str()).unwrap_or(""),
            bold,
            color,
            diagnostic.severity,
            reset,
            cyan,
            diagnostic.code_text(),
            reset,
            diagnostic.message
        );

        if let (Some(span), Some(source), Some((_, line_index))) = (diagnostic.span, source, location) {
            let line = source.lines()[line_index];
            let text = source.slice(line.span());
            let offset = (span.start - line.start) as usize;
            let width = (span.end().min(line.end()).saturating_sub(span.start) as usize).max(1);
            eprintln!("    {}", text);
            eprintln!("    {}{}{}{}", " ".repeat(offset), color, "^".repeat(width), reset);
        }
    }

    pub fn print_error(&self, message: &str) {
        eprintln!(
            "{}{}error{}: {}",
            self.paint(BOLD),
            self.paint(RED),
            self.paint(RESET),
            message
        );
    }

    /// Summary line after a failed run.
    pub fn print_error_count(&self, count: usize) {
        eprintln!(
            "\n{}Found {} error{}.{}",
            self.paint(RED),
            count,
            if count == 1 { "" } else { "s" },
            self.paint(RESET)
        );
    }

    pub fn print_value(&self, value: &impl std::fmt::Display) {
        println!("{}{}{}", self.paint(MAGENTA), value, self.paint(RESET));
    }

    pub fn print_note(&self, message: &str) {
        eprintln!("{}{}{}", self.paint(GRAY), message, self.paint(RESET));
    }
}
