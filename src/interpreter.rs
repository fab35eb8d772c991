use crate::environment::{Frame, FunctionTable};
use crate::reader::{self, Reader};
use crate::special_forms::parse_def;
use crate::types::Expression;
use crate::{core, evaluator, lazy, plugins};
use std::fmt;
use std::io::{self, BufRead, Write};

#[derive(Debug)]
pub enum Error {
    Read(reader::Error),
    Eval(evaluator::Error),
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Read(e) => write!(f, "read error: {}", e),
            Error::Eval(e) => write!(f, "{}", e),
            Error::Io(e) => write!(f, "io error: {}", e),
        }
    }
}

impl From<reader::Error> for Error {
    fn from(e: reader::Error) -> Self {
        Error::Read(e)
    }
}

impl From<evaluator::Error> for Error {
    fn from(e: evaluator::Error) -> Self {
        Error::Eval(e)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T = Expression> = std::result::Result<T, Error>;

/// Top-level forms run for their effect only; their results are not echoed.
const STATEMENTS: [&str; 2] = ["set", "print"];

fn is_statement(form: &Expression) -> bool {
    match form.as_list() {
        Ok(list) if !list.quoted && !list.lambda => matches!(
            list.first(),
            Some(Expression::Identifier(head)) if STATEMENTS.contains(&head.as_str())
        ),
        _ => false,
    }
}

/// Owns the function table and the top-level frame, which persists from one
/// top-level form to the next.
pub struct Interpreter {
    functions: FunctionTable,
    frame: Frame,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// The core namespace, then every plugin. A plugin may replace a core
    /// function.
    pub fn new() -> Self {
        let mut functions = FunctionTable::new();
        core::register(&mut functions);
        plugins::register_all(&mut functions);
        log::debug!("{} native functions registered", functions.len());
        Self {
            functions,
            frame: Frame::new(),
        }
    }

    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    /// Runs one top-level form. Definitions extend the function table and
    /// produce no value.
    pub fn eval_form(&mut self, form: &Expression) -> Result<Option<Expression>> {
        if let Some(definition) = parse_def(form) {
            let (name, overload) = definition?;
            log::debug!("define {} {}", name, overload.parameters);
            self.functions.define(name, overload);
            return Ok(None);
        }
        let value = evaluator::evaluate(form, &mut self.frame, &self.functions)?;
        Ok(Some(lazy::realize(&value, &self.functions)?))
    }

    /// Evaluates every form from `reader`, writing each echoed result to `out`
    /// on its own line. Stops at the first error.
    pub fn run<R: BufRead, W: Write>(&mut self, reader: Reader<R>, out: &mut W) -> Result<()> {
        for form in reader {
            let form = form?;
            if let Some(value) = self.eval_form(&form)? {
                if !is_statement(&form) {
                    writeln!(out, "{}", value)?;
                }
            }
        }
        Ok(())
    }

    /// Runs a whole script held in a string and returns the echoed results.
    pub fn run_str(&mut self, source: &str) -> Result<Vec<String>> {
        let mut printed = Vec::new();
        self.run(Reader::new(source.as_bytes()), &mut printed)?;
        Ok(String::from_utf8_lossy(&printed)
            .lines()
            .map(String::from)
            .collect())
    }

    /// Runs one REPL entry. Errors are reported as text and leave the session
    /// usable; forms read before the error keep their effect.
    pub fn rep(&mut self, line: &str) -> String {
        match self.run_str(line) {
            Ok(lines) => lines.join("\n"),
            Err(e) => format!("Error: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definitions_are_not_echoed() {
        let mut interpreter = Interpreter::new();
        let printed = interpreter
            .run_str("(def sq (n) (* n n))\n(sq 4)\n; a comment\n\n(sq 5)")
            .unwrap();
        assert_eq!(printed, vec!["16", "25"]);
    }

    #[test]
    fn top_level_frame_persists() {
        let mut interpreter = Interpreter::new();
        assert_eq!(
            interpreter.run_str("(set x 41)\n(+ x 1)").unwrap(),
            vec!["42"]
        );
        assert_eq!(interpreter.run_str("x").unwrap(), vec!["41"]);
    }

    #[test]
    fn first_error_stops_the_run() {
        let mut interpreter = Interpreter::new();
        let result = interpreter.run_str("(set x 1)\n(head '())\n(set x 2)");
        assert!(matches!(
            result,
            Err(Error::Eval(evaluator::Error::EmptySequence("head")))
        ));
        assert_eq!(interpreter.run_str("x").unwrap(), vec!["1"]);
    }

    #[test]
    fn nested_definitions_are_rejected() {
        let mut interpreter = Interpreter::new();
        assert!(matches!(
            interpreter.run_str("(if 'T (def f (x) x) 0)"),
            Err(Error::Eval(evaluator::Error::Form(_)))
        ));
    }

    #[test]
    fn read_errors_are_reported() {
        let mut interpreter = Interpreter::new();
        assert!(matches!(
            interpreter.run_str("(+ 1 2"),
            Err(Error::Read(_))
        ));
    }

    #[test]
    fn repl_reports_errors_inline() {
        let mut interpreter = Interpreter::new();
        assert_eq!(interpreter.rep("(+ 1 2)"), "3");
        assert!(interpreter.rep("(nope)").starts_with("Error: "));
        assert_eq!(interpreter.rep("(def id (x) x)"), "");
        assert_eq!(interpreter.rep("(id 7)"), "7");
    }

    #[test]
    fn lazy_results_are_materialized() {
        let mut interpreter = Interpreter::new();
        let printed = interpreter
            .run_str(
                "(def counter (n) (if (< n 10) (list (+ n 1)) '()))\n(lazy counter 0)",
            )
            .unwrap();
        assert_eq!(printed, vec!["'(1 2 3 4 5 6 7 8 9 10)"]);
    }
}
