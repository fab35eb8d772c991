pub mod binding;
pub mod cmdline;
pub mod core;
pub mod environment;
pub mod evaluator;
pub mod integer;
pub mod interpreter;
pub mod lazy;
pub mod native;
pub mod plugins;
pub mod printer;
pub mod reader;
pub mod special_forms;
pub mod typename;
pub mod types;

#[macro_use]
extern crate lazy_static;

mod strings;
mod tokens;

pub use environment::{Frame, FunctionTable};
pub use interpreter::Interpreter;
pub use lazy::LazySequence;
pub use native::{NativeFunction, PrimitiveFn};
pub use typename::Type;
pub use types::{Expression, Identifier, NativeObject, NativeValue};
