//! Matching call arguments against a parameter specification.
//!
//! A specification is either a single identifier, which captures every
//! argument as one list, or a list of descriptors matched left to right:
//!
//! - `name` binds the argument at that position; repeating a name requires the
//!   arguments at both positions to be equal;
//! - `name:type` additionally requires the argument's type to match;
//! - a literal (integer, string, boolean or empty list) binds nothing but only
//!   matches an equal argument. This is how a function is overloaded on values.
//!   A finished lazy sequence matches the empty list.

use crate::environment::{Frame, FunctionTable};
use crate::evaluator;
use crate::lazy;
use crate::typename::Type;
use crate::types::{classify, Expression, Identifier};
use std::fmt;

pub const ANNOTATION_MARKER: char = ':';

#[derive(Debug)]
pub enum BindError {
    ArityMismatch { expected: usize, got: usize },
    NotAnIdentifier(Expression),
    LiteralMismatch { expected: Expression, found: Expression },
    TypeMismatch { name: Identifier, expected: Type, found: Type },
    RepeatedMismatch { name: Identifier, first: Expression, found: Expression },
    /// Comparing against a lazy argument ran its generator, which failed.
    Forced(Box<evaluator::Error>),
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindError::ArityMismatch { expected, got } => {
                write!(f, "expected {} arguments, but received {}", expected, got)
            }
            BindError::NotAnIdentifier(e) => {
                write!(f, "{} cannot appear in a parameter list", e)
            }
            BindError::LiteralMismatch { expected, found } => {
                write!(f, "literal parameter {} does not match {}", expected, found)
            }
            BindError::TypeMismatch {
                name,
                expected,
                found,
            } => write!(f, "parameter {} expects {}, got {}", name, expected, found),
            BindError::RepeatedMismatch { name, first, found } => write!(
                f,
                "parameter {} is repeated but was given {} and {}",
                name, first, found
            ),
            BindError::Forced(e) => write!(f, "{}", e),
        }
    }
}

impl BindError {
    /// Whether another overload may still be tried. A malformed specification
    /// is a definition error and stops the search.
    pub fn is_no_match(&self) -> bool {
        !matches!(self, BindError::NotAnIdentifier(_) | BindError::Forced(_))
    }
}

/// Splits `name:type` into its parts.
pub fn split_annotation(name: &Identifier) -> (Identifier, Option<Type>) {
    match name.split_once(ANNOTATION_MARKER) {
        Some((bare, annotation)) if !annotation.is_empty() => {
            (Identifier::from(bare), Some(Type::new(annotation)))
        }
        Some((bare, _)) => (Identifier::from(bare), None),
        None => (name.clone(), None),
    }
}

/// Checks the shape of a specification without any arguments, so malformed
/// definitions are reported when they are made.
pub fn validate(parameters: &Expression) -> Result<(), BindError> {
    match parameters {
        Expression::Identifier(_) => Ok(()),
        Expression::List(descriptors) if !descriptors.lambda => descriptors
            .iter()
            .try_for_each(|d| match d {
                Expression::Identifier(_) => Ok(()),
                literal if literal.is_literal() => Ok(()),
                other => Err(BindError::NotAnIdentifier(other.clone())),
            }),
        other => Err(BindError::NotAnIdentifier(other.clone())),
    }
}

fn equal(a: &Expression, b: &Expression, functions: &FunctionTable) -> Result<bool, BindError> {
    lazy::equal(a, b, functions).map_err(|e| BindError::Forced(Box::new(e)))
}

pub fn bind(
    parameters: &Expression,
    arguments: &[Expression],
    functions: &FunctionTable,
) -> Result<Frame, BindError> {
    let mut frame = Frame::new();
    let descriptors = match parameters {
        Expression::Identifier(name) => {
            let (name, _) = split_annotation(name);
            frame.set(name, Expression::wrap_list(arguments.to_vec()));
            return Ok(frame);
        }
        Expression::List(descriptors) if !descriptors.lambda => descriptors,
        other => return Err(BindError::NotAnIdentifier(other.clone())),
    };

    if descriptors.len() != arguments.len() {
        return Err(BindError::ArityMismatch {
            expected: descriptors.len(),
            got: arguments.len(),
        });
    }

    for (descriptor, argument) in descriptors.iter().zip(arguments) {
        match descriptor {
            Expression::Identifier(name) => bind_name(&mut frame, name, argument, functions)?,
            literal if literal.is_literal() => {
                if !equal(literal, argument, functions)? {
                    return Err(BindError::LiteralMismatch {
                        expected: literal.clone(),
                        found: argument.clone(),
                    });
                }
            }
            other => return Err(BindError::NotAnIdentifier(other.clone())),
        }
    }
    log::trace!("bound {} against {} argument(s)", parameters, arguments.len());
    Ok(frame)
}

fn bind_name(
    frame: &mut Frame,
    name: &Identifier,
    argument: &Expression,
    functions: &FunctionTable,
) -> Result<(), BindError> {
    let (name, annotation) = split_annotation(name);
    if let Some(expected) = annotation {
        let found = classify(argument);
        if !expected.accepts(&found) {
            return Err(BindError::TypeMismatch {
                name,
                expected,
                found,
            });
        }
    }
    match frame.get(&name) {
        Some(first) if !equal(first, argument, functions)? => Err(BindError::RepeatedMismatch {
            first: first.clone(),
            found: argument.clone(),
            name,
        }),
        Some(_) => Ok(()),
        None => {
            frame.set(name, argument.clone());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Interpreter;
    use crate::lazy::LazySequence;
    use crate::reader::{read_all, read_str};
    use std::rc::Rc;

    fn args(source: &str) -> Vec<Expression> {
        read_all(source).unwrap()
    }

    fn bind(parameters: &Expression, arguments: &[Expression]) -> Result<Frame, BindError> {
        super::bind(parameters, arguments, &FunctionTable::new())
    }

    fn lookup<'a>(frame: &'a Frame, name: &str) -> Option<&'a Expression> {
        frame.get(&Identifier::from(name))
    }

    #[test]
    fn repeated_names_need_equal_arguments() {
        let params = read_str("(x x)").unwrap();
        let frame = bind(&params, &args("1 1")).unwrap();
        assert_eq!(lookup(&frame, "x"), Some(&Expression::from(1)));
        assert_eq!(frame.len(), 1);
        assert!(matches!(
            bind(&params, &args("1 2")),
            Err(BindError::RepeatedMismatch { .. })
        ));
    }

    #[test]
    fn empty_list_literal() {
        let params = read_str("(x ())").unwrap();
        let frame = bind(&params, &args("1 ()")).unwrap();
        assert_eq!(frame.len(), 1);
        assert_eq!(lookup(&frame, "x"), Some(&Expression::from(1)));
        assert!(bind(&params, &args("1 '()")).is_ok());
        assert!(matches!(
            bind(&params, &args("1 (1)")),
            Err(BindError::LiteralMismatch { .. })
        ));
    }

    #[test]
    fn wildcard_captures_everything() {
        let params = read_str("args").unwrap();
        for source in &["", "1", "1 \"two\" '(3)"] {
            let actual = args(source);
            let frame = bind(&params, &actual).unwrap();
            assert_eq!(lookup(&frame, "args"), Some(&Expression::wrap_list(actual)));
        }
    }

    #[test]
    fn arity_must_match() {
        let params = read_str("(a b)").unwrap();
        assert!(matches!(
            bind(&params, &args("1")),
            Err(BindError::ArityMismatch { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn literal_values() {
        let params = read_str("(0 \"zero\" 'T)").unwrap();
        assert!(bind(&params, &args("0 \"zero\" 'T")).is_ok());
        assert!(bind(&params, &args("0 \"zero\" 'F")).is_err());
        assert!(bind(&params, &args("1 \"zero\" 'T")).is_err());
    }

    #[test]
    fn annotations_check_types() {
        let params = read_str("(n:int s:str)").unwrap();
        let frame = bind(&params, &args("1 \"x\"")).unwrap();
        assert_eq!(lookup(&frame, "n"), Some(&Expression::from(1)));
        assert!(lookup(&frame, "n:int").is_none());
        assert!(matches!(
            bind(&params, &args("\"x\" \"x\"")),
            Err(BindError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn non_identifiers_are_rejected() {
        let params = read_str("(x (y))").unwrap();
        let error = bind(&params, &args("1 2")).unwrap_err();
        assert!(!error.is_no_match());
        assert!(validate(&params).is_err());
        assert!(validate(&read_str("(x 1 ())").unwrap()).is_ok());
        assert!(validate(&read_str("5").unwrap()).is_err());
    }

    #[test]
    fn finished_sequences_match_the_empty_list() {
        let mut interpreter = Interpreter::new();
        interpreter
            .run_str("(def counter (n) (if (< n 2) (list (+ n 1)) '()))")
            .unwrap();
        let functions = interpreter.functions();
        let lazy_at = |n: i64| {
            Expression::Lazy(Rc::new(LazySequence::new(
                Expression::new_identifier("counter"),
                Expression::from(n),
            )))
        };
        let params = read_str("(())").unwrap();
        assert!(super::bind(&params, &[lazy_at(2)], functions).is_ok());
        assert!(matches!(
            super::bind(&params, &[lazy_at(0)], functions),
            Err(BindError::LiteralMismatch { .. })
        ));
    }

    #[test]
    fn failing_generators_stop_the_search() {
        let mut interpreter = Interpreter::new();
        interpreter.run_str("(def bad (n) '(1 2 3))").unwrap();
        let seq = Expression::Lazy(Rc::new(LazySequence::new(
            Expression::new_identifier("bad"),
            Expression::from(0),
        )));
        let error = super::bind(&read_str("(())").unwrap(), &[seq], interpreter.functions())
            .unwrap_err();
        assert!(matches!(error, BindError::Forced(_)));
        assert!(!error.is_no_match());
    }
}
