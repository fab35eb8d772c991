//! Native modules linked into the interpreter. Each exposes a `register`
//! function that adds its primitives to a function table; names share one
//! namespace with the core functions and the last registration wins.

pub mod canvas;
pub mod fileio;

use crate::environment::FunctionTable;
use crate::evaluator::{self, Error};
use crate::types::Expression;

pub fn register_all(table: &mut FunctionTable) {
    fileio::register(table);
    canvas::register(table);
}

/// A fixed-width integer argument, for plugins that index or size things.
fn fixed_arg(args: &[Expression], position: usize, function: &str) -> evaluator::Result<i64> {
    args[position].as_int()?.as_fixed().ok_or_else(|| {
        Error::Native(format!(
            "{}: argument {} is too large",
            function,
            position + 1
        ))
    })
}
