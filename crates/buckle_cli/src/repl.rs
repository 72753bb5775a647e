//! Interactive loop. Each submission is bound as a script chained to the
//! last successful one, and globals persist between submissions.

use crate::report::Reporter;
use buckle_compiler::Compilation;
use buckle_core::SourceText;
use buckle_evaluator::Globals;
use buckle_options::CompilerOptions;
use buckle_parser::SyntaxTree;
use bumpalo::Bump;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::debug;

const PROMPT: &str = "» ";
const CONTINUATION_PROMPT: &str = "· ";

enum Command {
    Continue,
    Exit,
}

pub struct Repl {
    options: CompilerOptions,
    previous: Option<Arc<Compilation>>,
    globals: Globals,
    reporter: Reporter,
}

impl Repl {
    pub fn new(mut options: CompilerOptions) -> Self {
        options.script = true;
        let reporter = Reporter::new(options.color);
        Self {
            options,
            previous: None,
            globals: Globals::new(),
            reporter,
        }
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    /// Read submissions until `#exit` or end of input.
    pub fn run(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut text = String::new();

        loop {
            prompt(if text.is_empty() { PROMPT } else { CONTINUATION_PROMPT })?;
            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                return Ok(());
            }
            let line = line.trim_end_matches(['\r', '\n']);

            if text.is_empty() {
                if line.trim().is_empty() {
                    continue;
                }
                if line.starts_with('#') {
                    match self.meta_command(line.trim()) {
                        Command::Continue => continue,
                        Command::Exit => return Ok(()),
                    }
                }
            }

            // A blank line submits whatever has been typed so far.
            let force = line.trim().is_empty();
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(line);
            if !force && is_incomplete(&text) {
                continue;
            }

            self.submit(&text);
            text.clear();
        }
    }

    fn meta_command(&mut self, line: &str) -> Command {
        match line {
            "#showTree" => {
                self.options.show_tree = !self.options.show_tree;
                self.reporter.print_note(if self.options.show_tree {
                    "Showing bound trees."
                } else {
                    "Not showing bound trees."
                });
            }
            "#showCfg" => {
                self.options.show_cfg = !self.options.show_cfg;
                self.reporter.print_note(&if self.options.show_cfg {
                    format!("Writing control flow graphs to '{}'.", self.options.cfg_path)
                } else {
                    "Not writing control flow graphs.".to_string()
                });
            }
            "#reset" => {
                self.previous = None;
                self.globals.clear();
                self.reporter.print_note("Cleared all previous submissions.");
            }
            "#exit" => return Command::Exit,
            "#help" => {
                self.reporter
                    .print_note("#showTree  #showCfg  #reset  #exit  (blank line submits)");
            }
            _ => self.reporter.print_error(&format!("unknown command '{}'", line)),
        }
        Command::Continue
    }

    fn submit(&mut self, text: &str) {
        let compilation = Compilation::create_script(self.previous.clone(), vec![text.to_string()])
            .with_options(self.options.clone());

        if let Err(message) = crate::emit(&compilation, &self.options) {
            self.reporter.print_error(&message);
        }

        let result = match compilation.evaluate(&mut self.globals) {
            Ok(result) => result,
            Err(error) => {
                self.reporter
                    .print_error(&format!("internal compiler error: {}", error));
                return;
            }
        };

        let source = SourceText::from_text(text);
        self.reporter.print_diagnostics(&result.diagnostics, Some(&source));

        let evaluated = !result.diagnostics.has_errors()
            && !(self.options.warnings_as_errors && !result.diagnostics.is_empty());
        if !evaluated {
            return;
        }
        if let Some(value) = &result.value {
            self.reporter.print_value(value);
        }
        debug!(globals = self.globals.len(), "submission accepted");
        self.previous = Some(Arc::new(compilation));
    }
}

fn prompt(text: &str) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()
}

/// Whether the parser ran out of input before the text was complete.
fn is_incomplete(text: &str) -> bool {
    let arena = Bump::new();
    SyntaxTree::parse(&arena, text).ends_prematurely()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_submissions() {
        assert!(is_incomplete("void F() {"));
        assert!(is_incomplete("int x = (1 + 2"));
        assert!(!is_incomplete("1 + 2;"));
        assert!(!is_incomplete("void F() { PrintLine(1); }"));
    }
}
