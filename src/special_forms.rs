use crate::binding::{self, BindError};
use crate::environment::{Frame, FunctionTable, Overload};
use crate::evaluator::{evaluate, Error, Result};
use crate::types::{Arity, Expression, Identifier};
use std::fmt;

/// Names the evaluator handles itself; none of them can name a function.
pub const RESERVED: [&str; 4] = ["if", "set", "lambda", "def"];

#[derive(Debug)]
pub enum FormError {
    KeyNotAnIdentifier(Expression),
    NameNotAnIdentifier(Expression),
    ReservedName(Identifier),
    BadParameters(BindError),
    BadLambda,
    DefinitionNotAtTopLevel,
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormError::KeyNotAnIdentifier(e) => write!(f, "set: {} is not an identifier", e),
            FormError::NameNotAnIdentifier(e) => {
                write!(f, "def: function name {} is not an identifier", e)
            }
            FormError::ReservedName(name) => write!(f, "def: {} is a reserved name", name),
            FormError::BadParameters(e) => write!(f, "bad parameter list: {}", e),
            FormError::BadLambda => write!(f, "lambda without a parameter list"),
            FormError::DefinitionNotAtTopLevel => {
                write!(f, "def may only appear at the top level")
            }
        }
    }
}

pub fn apply_if(args: &[Expression], frame: &mut Frame, functions: &FunctionTable) -> Result {
    Arity::exactly(3)
        .validate_for(args.len(), "if")
        .map_err(Error::BadArgCount)?;
    let condition = evaluate(&args[0], frame, functions)?;
    match condition.as_bool()? {
        true => evaluate(&args[1], frame, functions),
        false => evaluate(&args[2], frame, functions),
    }
}

/// Rebinds a variable in the current frame only.
pub fn apply_set(args: &[Expression], frame: &mut Frame, functions: &FunctionTable) -> Result {
    Arity::exactly(2)
        .validate_for(args.len(), "set")
        .map_err(Error::BadArgCount)?;
    let key = match &args[0] {
        Expression::Identifier(name) => Ok(name),
        other => Err(FormError::KeyNotAnIdentifier(other.clone())),
    }?;
    let value = evaluate(&args[1], frame, functions)?;
    log::debug!("set {} to {}", key, value);
    frame.set(key.clone(), value);
    Ok(Expression::new_list())
}

pub fn apply_lambda(args: &[Expression]) -> Result {
    Arity::at_least(2)
        .validate_for(args.len(), "lambda")
        .map_err(Error::BadArgCount)?;
    binding::validate(&args[0]).map_err(FormError::BadParameters)?;
    Ok(Expression::wrap_lambda(args.to_vec()))
}

/// Recognises `(def NAME PARAMETERS BODY...)`, returning `None` for any other
/// form.
pub fn parse_def(form: &Expression) -> Option<Result<(Identifier, Overload)>> {
    let list = form.as_list().ok().filter(|list| !list.quoted)?;
    match list.first() {
        Some(Expression::Identifier(head)) if head.as_str() == "def" => Some(build_def(&list[1..])),
        _ => None,
    }
}

fn build_def(args: &[Expression]) -> Result<(Identifier, Overload)> {
    Arity::at_least(3)
        .validate_for(args.len(), "def")
        .map_err(Error::BadArgCount)?;
    let name = match &args[0] {
        Expression::Identifier(name) => Ok(name.clone()),
        other => Err(FormError::NameNotAnIdentifier(other.clone())),
    }?;
    if RESERVED.contains(&name.as_str()) {
        return Err(FormError::ReservedName(name).into());
    }
    binding::validate(&args[1]).map_err(FormError::BadParameters)?;
    let overload = Overload {
        parameters: args[1].clone(),
        body: args[2..].to_vec(),
    };
    Ok((name, overload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::read_str;

    #[test]
    fn set_rebinds_in_the_current_frame() {
        let functions = FunctionTable::new();
        let mut frame = Frame::new();
        let form = read_str("(x 1)").unwrap();
        let args = &form.as_list().unwrap()[..];
        let result = apply_set(args, &mut frame, &functions).unwrap();
        assert!(result.is_empty_list() && result.is_quoted_list());
        let again = read_str("(x \"two\")").unwrap();
        apply_set(&again.as_list().unwrap()[..], &mut frame, &functions).unwrap();
        assert_eq!(frame.get(&Identifier::from("x")), Some(&Expression::from("two")));
    }

    #[test]
    fn set_needs_an_identifier() {
        let functions = FunctionTable::new();
        let mut frame = Frame::new();
        let form = read_str("(1 1)").unwrap();
        assert!(matches!(
            apply_set(&form.as_list().unwrap()[..], &mut frame, &functions),
            Err(Error::Form(FormError::KeyNotAnIdentifier(_)))
        ));
    }

    #[test]
    fn parses_definitions() {
        let form = read_str("(def add (a b) (+ a b))").unwrap();
        let (name, overload) = parse_def(&form).unwrap().unwrap();
        assert_eq!(name, Identifier::from("add"));
        assert_eq!(overload.body.len(), 1);
        assert!(parse_def(&read_str("(add 1 2)").unwrap()).is_none());
        assert!(parse_def(&read_str("'(def x)").unwrap()).is_none());
    }

    #[test]
    fn rejects_bad_definitions() {
        for source in &["(def f (x))", "(def 1 (x) x)", "(def if (x) x)", "(def f ((x)) x)"] {
            let form = read_str(source).unwrap();
            assert!(parse_def(&form).unwrap().is_err(), "{} was accepted", source);
        }
    }

    #[test]
    fn lambda_builds_a_value() {
        let form = read_str("((n) (* n n))").unwrap();
        let lambda = apply_lambda(&form.as_list().unwrap()[..]).unwrap();
        assert!(lambda.is_lambda());
        assert_eq!(lambda.to_string(), "(lambda (n) (* n n))");
    }
}
