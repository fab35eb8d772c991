use crate::binding::{self, BindError};
use crate::environment::{Callable, Frame, FunctionTable, UserFunction};
use crate::integer::NumericError;
use crate::special_forms::{self, FormError};
use crate::typename::{self, Type, TypeClash};
use crate::types::{classify, BadArgCount, Expression, Identifier, List, TypeMismatch};
use itertools::Itertools;
use std::fmt;
use std::rc::Rc;

pub type Result<T = Expression> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    UnboundIdentifier(Identifier),
    UnknownFunction(Identifier),
    EmptyCall,
    ListHeadNotCallable(Expression),
    Form(FormError),
    TypeMismatch(TypeMismatch),
    BadArgCount(BadArgCount),
    ArgumentType {
        function: String,
        position: usize,
        clash: TypeClash,
    },
    Numeric(NumericError),
    Bind {
        function: String,
        error: BindError,
    },
    NoMatchingOverload {
        function: String,
        last: Option<BindError>,
    },
    EmptySequence(&'static str),
    MalformedIteratorResult(Expression),
    IOError(std::io::Error),
    Native(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnboundIdentifier(s) => write!(f, "'{}' not found", s),
            Error::UnknownFunction(s) => write!(f, "no function named '{}'", s),
            Error::EmptyCall => write!(f, "cannot evaluate the empty call ()"),
            Error::ListHeadNotCallable(e) => write!(f, "{} cannot be called", e),
            Error::Form(e) => write!(f, "{}", e),
            Error::TypeMismatch(e) => write!(f, "type mismatch: {}", e),
            Error::BadArgCount(e) => write!(f, "{}", e),
            Error::ArgumentType {
                function,
                position,
                clash,
            } => write!(f, "argument {} of {}: {}", position + 1, function, clash),
            Error::Numeric(e) => write!(f, "{}", e),
            Error::Bind { function, error } => write!(f, "calling {}: {}", function, error),
            Error::NoMatchingOverload { function, last } => match last {
                Some(reason) => write!(
                    f,
                    "no definition of {} matches the arguments (last: {})",
                    function, reason
                ),
                None => write!(f, "no definition of {} matches the arguments", function),
            },
            Error::EmptySequence(op) => write!(f, "{} of an empty sequence", op),
            Error::MalformedIteratorResult(e) => write!(
                f,
                "iterator result malformed: generator returned {}",
                e
            ),
            Error::IOError(e) => write!(f, "io error: {}", e),
            Error::Native(message) => write!(f, "{}", message),
        }
    }
}

impl From<TypeMismatch> for Error {
    fn from(t: TypeMismatch) -> Self {
        Self::TypeMismatch(t)
    }
}

impl From<NumericError> for Error {
    fn from(e: NumericError) -> Self {
        Self::Numeric(e)
    }
}

impl From<FormError> for Error {
    fn from(e: FormError) -> Self {
        Self::Form(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::IOError(e)
    }
}

/// What the head of a call resolved to.
enum Callee<'f> {
    Function(&'f Callable),
    Lambda(Rc<List>),
}

/// Evaluates one form. Nested calls recurse on the native stack, so very deep
/// user recursion can exhaust it.
pub fn evaluate(ast: &Expression, frame: &mut Frame, functions: &FunctionTable) -> Result {
    match ast {
        Expression::Identifier(name) => match frame.get(name) {
            Some(value) => Ok(value.clone()),
            None if functions.contains(name) => Ok(ast.clone()),
            None => Err(Error::UnboundIdentifier(name.clone())),
        },
        Expression::List(list) if list.quoted || list.lambda => Ok(ast.clone()),
        Expression::List(list) => match list.split_first() {
            None => Err(Error::EmptyCall),
            Some((head, args)) => {
                log::trace!("apply {}", ast);
                apply_form(head, args, frame, functions)
            }
        },
        Expression::Integer(_)
        | Expression::String(_)
        | Expression::Bool(_)
        | Expression::Lazy(_)
        | Expression::Native(_) => Ok(ast.clone()),
    }
}

fn apply_form(
    head: &Expression,
    args: &[Expression],
    frame: &mut Frame,
    functions: &FunctionTable,
) -> Result {
    if let Expression::Identifier(name) = head {
        match name.as_str() {
            "if" => return special_forms::apply_if(args, frame, functions),
            "set" => return special_forms::apply_set(args, frame, functions),
            "lambda" => return special_forms::apply_lambda(args),
            "def" => return Err(FormError::DefinitionNotAtTopLevel.into()),
            // Anything else is a function call, handled below
            _ => (),
        }
    }

    match resolve_head(head, frame, functions)? {
        Callee::Function(Callable::Native(func)) => {
            let types: Vec<Type> = args
                .iter()
                .map(|arg| static_type(arg, frame, functions))
                .collect();
            func.try_bind_all(&types)?;
            let evaluated = evaluate_sequence_elementwise(args, frame, functions)?;
            func.evaluate(functions, &evaluated)
        }
        Callee::Function(Callable::User(func)) => {
            let evaluated = evaluate_sequence_elementwise(args, frame, functions)?;
            call_user(func, &evaluated, functions)
        }
        Callee::Lambda(lambda) => {
            let evaluated = evaluate_sequence_elementwise(args, frame, functions)?;
            call_lambda(&lambda, &evaluated, functions)
        }
    }
}

fn callee_from_value<'f>(value: &Expression, functions: &'f FunctionTable) -> Result<Callee<'f>> {
    match value {
        Expression::Identifier(name) => functions
            .get(name)
            .map(Callee::Function)
            .ok_or_else(|| Error::UnknownFunction(name.clone())),
        Expression::List(list) if list.lambda => Ok(Callee::Lambda(Rc::clone(list))),
        other => Err(Error::ListHeadNotCallable(other.clone())),
    }
}

/// A variable in head position is followed once: it may hold a function name
/// or a lambda.
fn resolve_head<'f>(
    head: &Expression,
    frame: &mut Frame,
    functions: &'f FunctionTable,
) -> Result<Callee<'f>> {
    match head {
        Expression::Identifier(name) => match frame.get(name) {
            Some(value) => {
                let value = value.clone();
                callee_from_value(&value, functions)
            }
            None => functions
                .get(name)
                .map(Callee::Function)
                .ok_or_else(|| Error::UnknownFunction(name.clone())),
        },
        Expression::List(list) if !list.quoted && !list.lambda => {
            let value = evaluate(head, frame, functions)?;
            callee_from_value(&value, functions)
        }
        other => callee_from_value(other, functions),
    }
}

/// Best-effort type of an argument before it is evaluated. Anything not
/// knowable without running code is `any`.
pub(crate) fn static_type(arg: &Expression, frame: &Frame, functions: &FunctionTable) -> Type {
    let any = || Type::from(typename::ANY);
    match arg {
        Expression::Identifier(name) => match frame.get(name) {
            Some(value) => classify(value),
            None if functions.contains(name) => classify(arg),
            // Evaluation reports it as unbound
            None => any(),
        },
        Expression::List(list) if list.quoted || list.lambda => classify(arg),
        Expression::List(list) => match list.first() {
            Some(Expression::Identifier(name)) if !frame.contains_key(name) => {
                match functions.get(name) {
                    Some(Callable::Native(func)) => {
                        let returns = func.declared_return_type();
                        match returns.has_variables() {
                            false => returns,
                            true => any(),
                        }
                    }
                    _ => any(),
                }
            }
            _ => any(),
        },
        Expression::Integer(_)
        | Expression::String(_)
        | Expression::Bool(_)
        | Expression::Lazy(_)
        | Expression::Native(_) => classify(arg),
    }
}

pub fn evaluate_sequence_elementwise(
    seq: &[Expression],
    frame: &mut Frame,
    functions: &FunctionTable,
) -> Result<Vec<Expression>> {
    seq.iter().map(|obj| evaluate(obj, frame, functions)).collect()
}

pub(crate) fn pretty_print_args(args: &[Expression]) -> String {
    match args.len() {
        0 => "no args".into(),
        1 => args[0].to_string(),
        _ => format!("\n\t{}", args.iter().join("\n\t")),
    }
}

fn run_body(body: &[Expression], mut frame: Frame, functions: &FunctionTable) -> Result {
    let mut result = Expression::new_list();
    for form in body {
        result = evaluate(form, &mut frame, functions)?;
    }
    Ok(result)
}

/// Tries each overload in declaration order and runs the first that matches.
pub fn call_user(func: &UserFunction, args: &[Expression], functions: &FunctionTable) -> Result {
    log::trace!("Call {} with {}", func.name, pretty_print_args(args));
    let mut last = None;
    for overload in &func.overloads {
        match binding::bind(&overload.parameters, args, functions) {
            Ok(frame) => return run_body(&overload.body, frame, functions),
            Err(BindError::Forced(error)) => return Err(*error),
            Err(error) if error.is_no_match() => {
                log::trace!("{} {} does not match: {}", func.name, overload.parameters, error);
                last = Some(error);
            }
            Err(error) => {
                return Err(Error::Bind {
                    function: func.name.to_string(),
                    error,
                })
            }
        }
    }
    Err(Error::NoMatchingOverload {
        function: func.name.to_string(),
        last,
    })
}

pub fn call_lambda(lambda: &List, args: &[Expression], functions: &FunctionTable) -> Result {
    let (parameters, body) = lambda
        .split_first()
        .ok_or(FormError::BadLambda)?;
    let frame = binding::bind(parameters, args, functions).map_err(|error| match error {
        BindError::Forced(error) => *error,
        error => Error::Bind {
            function: "lambda".into(),
            error,
        },
    })?;
    run_body(body, frame, functions)
}

/// Calls a function value (a function name or a lambda) on evaluated
/// arguments. Used by natives that take callbacks, such as lazy sequences.
pub fn apply_value(callee: &Expression, args: Vec<Expression>, functions: &FunctionTable) -> Result {
    match callee_from_value(callee, functions)? {
        Callee::Function(Callable::Native(func)) => {
            let types: Vec<Type> = args.iter().map(classify).collect();
            func.try_bind_all(&types)?;
            func.evaluate(functions, &args)
        }
        Callee::Function(Callable::User(func)) => call_user(func, &args, functions),
        Callee::Lambda(lambda) => call_lambda(&lambda, &args, functions),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Interpreter;
    use crate::reader::read_str;

    fn eval_in(interpreter: &Interpreter, source: &str) -> Result {
        let mut frame = Frame::new();
        evaluate(&read_str(source).unwrap(), &mut frame, interpreter.functions())
    }

    fn eval_str(source: &str) -> Result {
        eval_in(&Interpreter::new(), source)
    }

    #[test]
    fn literals_evaluate_to_themselves() {
        for source in &["42", "-3", "\"text\"", "'T", "'F", "123456789012345678901234567890"] {
            let form = read_str(source).unwrap();
            assert_eq!(eval_str(source).unwrap(), form);
        }
    }

    #[test]
    fn quoted_lists_are_not_traversed() {
        let form = read_str("'((undefined-function 1) x)").unwrap();
        assert_eq!(eval_str("'((undefined-function 1) x)").unwrap(), form);
    }

    #[test]
    fn empty_call_is_an_error() {
        assert!(matches!(eval_str("()"), Err(Error::EmptyCall)));
    }

    #[test]
    fn unbound_identifier() {
        assert!(matches!(eval_str("nope"), Err(Error::UnboundIdentifier(_))));
        assert!(matches!(eval_str("(nope 1)"), Err(Error::UnknownFunction(_))));
    }

    #[test]
    fn unbound_arguments_are_not_type_errors() {
        assert!(matches!(eval_str("(+ nope 1)"), Err(Error::UnboundIdentifier(_))));
    }

    #[test]
    fn function_names_are_values() {
        assert_eq!(eval_str("head").unwrap(), Expression::new_identifier("head"));
    }

    #[test]
    fn arithmetic() {
        assert_eq!(eval_str("(+)").unwrap(), Expression::from(0));
        assert_eq!(eval_str("(- 5)").unwrap(), Expression::from(5));
        assert_eq!(eval_str("(- 5 3)").unwrap(), Expression::from(2));
        assert_eq!(eval_str("(/ -7 2)").unwrap(), Expression::from(-3));
        assert_eq!(eval_str("(* 2 3 4)").unwrap(), Expression::from(24));
    }

    #[test]
    fn if_needs_a_boolean() {
        assert_eq!(eval_str("(if (< 1 2) 1 (nope))").unwrap(), Expression::from(1));
        assert!(matches!(
            eval_str("(if 1 2 3)"),
            Err(Error::TypeMismatch(TypeMismatch::NotABool))
        ));
        assert!(matches!(eval_str("(if 'T 1)"), Err(Error::BadArgCount(_))));
    }

    #[test]
    fn native_arguments_are_checked_before_evaluation() {
        let mut interpreter = Interpreter::new();
        interpreter.run_str("(def boom () (nope))").unwrap();
        // The string is rejected by the signature of + before (boom) runs.
        assert!(matches!(
            eval_in(&interpreter, "(+ \"a\" (boom))"),
            Err(Error::ArgumentType { position: 0, .. })
        ));
    }

    #[test]
    fn overloads_dispatch_on_literals() {
        let mut interpreter = Interpreter::new();
        interpreter
            .run_str("(def size (()) 0)\n(def size (xs) (+ 1 (size (tail xs))))")
            .unwrap();
        assert_eq!(
            eval_in(&interpreter, "(size '(7 8 9))").unwrap(),
            Expression::from(3)
        );
        assert!(matches!(
            eval_in(&interpreter, "(size 1 2)"),
            Err(Error::NoMatchingOverload { .. })
        ));
    }

    #[test]
    fn variables_can_hold_functions() {
        let mut interpreter = Interpreter::new();
        interpreter
            .run_str("(def twice (f x) (f (f x)))\n(def inc (n) (+ n 1))")
            .unwrap();
        assert_eq!(
            eval_in(&interpreter, "(twice inc 5)").unwrap(),
            Expression::from(7)
        );
        assert_eq!(
            eval_in(&interpreter, "(twice (lambda (n) (* n 3)) 2)").unwrap(),
            Expression::from(18)
        );
    }

    #[test]
    fn frames_are_per_call() {
        let mut interpreter = Interpreter::new();
        interpreter
            .run_str("(def inner () y)\n(def outer () (set y 1) (inner))")
            .unwrap();
        assert!(matches!(
            eval_in(&interpreter, "(outer)"),
            Err(Error::UnboundIdentifier(_))
        ));
    }

    #[test]
    fn body_returns_last_form() {
        let mut interpreter = Interpreter::new();
        interpreter
            .run_str("(def f (x) (set y (* x 2)) (set y (+ y 1)) y)")
            .unwrap();
        assert_eq!(eval_in(&interpreter, "(f 4)").unwrap(), Expression::from(9));
    }
}
