//! The contract between the evaluator and functions implemented in Rust, both
//! the core namespace and plugin modules.

use crate::environment::FunctionTable;
use crate::evaluator::{self, Error};
use crate::typename::{Substitution, Type};
use crate::types::{Arity, Expression};
use std::fmt;

pub trait NativeFunction {
    fn name(&self) -> &str;

    /// Runs the function on already-evaluated arguments.
    fn evaluate(&self, functions: &FunctionTable, args: &[Expression]) -> evaluator::Result;

    fn declared_return_type(&self) -> Type;

    /// Checks that arguments of these types could be accepted, without running
    /// anything. Returns the result type with any type variables resolved.
    fn try_bind_all(&self, argument_types: &[Type]) -> evaluator::Result<Type>;
}

/// A native function described by a static signature. The last formal type
/// repeats for variadic functions.
#[derive(Clone)]
pub struct PrimitiveFn {
    pub name: &'static str,
    pub arity: Arity,
    pub parameters: &'static [&'static str],
    pub returns: &'static str,
    pub fn_ptr: fn(&FunctionTable, &[Expression]) -> evaluator::Result,
}

impl fmt::Debug for PrimitiveFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "primitive function #<{}>", self.name)
    }
}

impl PrimitiveFn {
    fn formal(&self, position: usize) -> Option<Type> {
        self.parameters
            .get(position)
            .or_else(|| self.parameters.last())
            .map(|&text| Type::new(text))
    }
}

impl NativeFunction for PrimitiveFn {
    fn name(&self) -> &str {
        self.name
    }

    fn evaluate(&self, functions: &FunctionTable, args: &[Expression]) -> evaluator::Result {
        self.arity
            .validate_for(args.len(), self.name)
            .map_err(Error::BadArgCount)?;
        log::trace!("Call {} with {}", self.name, evaluator::pretty_print_args(args));
        let result = (self.fn_ptr)(functions, args);
        match &result {
            Ok(val) => log::trace!("Call to {} resulted in {}", self.name, val),
            Err(e) => log::trace!("Call to {} failed: {}", self.name, e),
        }
        result
    }

    fn declared_return_type(&self) -> Type {
        Type::new(self.returns)
    }

    fn try_bind_all(&self, argument_types: &[Type]) -> evaluator::Result<Type> {
        self.arity
            .validate_for(argument_types.len(), self.name)
            .map_err(Error::BadArgCount)?;
        let mut substitution = Substitution::new();
        for (position, actual) in argument_types.iter().enumerate() {
            if let Some(formal) = self.formal(position) {
                formal
                    .unify(actual, &mut substitution)
                    .map_err(|clash| Error::ArgumentType {
                        function: self.name.to_string(),
                        position,
                        clash,
                    })?;
            }
        }
        Ok(self.declared_return_type().expand(&substitution))
    }
}
