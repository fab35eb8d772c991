use crate::integer::Integer;
use crate::lazy::LazySequence;
use crate::printer::{self, PrintMode};
use crate::typename::{self, Type};
use derive_more::Deref;
use std::any::Any;
use std::fmt;
use std::fmt::{Formatter, Write};
use std::ops::{Deref, RangeFrom, RangeInclusive};
use std::rc::Rc;

#[derive(Deref, Debug, PartialEq, Eq, Hash, Clone)]
pub struct Identifier(pub String);

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Identifier(name.into())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An ordered sequence of expressions. A `quoted` list is data; an unquoted one
/// is a pending call. A `lambda` list holds `[parameters, body...]` and is never
/// itself treated as a call.
#[derive(Debug)]
pub struct List {
    pub items: Vec<Expression>,
    pub quoted: bool,
    pub lambda: bool,
}

impl Deref for List {
    type Target = [Expression];

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}

/// Behaviour a plugin must provide for the opaque values it hands out.
pub trait NativeObject: fmt::Debug {
    fn type_tag(&self) -> Type;
    fn describe(&self) -> String;
    fn as_any(&self) -> &dyn Any;
}

#[derive(Debug, Clone)]
pub struct NativeValue(pub Rc<dyn NativeObject>);

impl NativeValue {
    pub fn new<T: NativeObject + 'static>(object: T) -> Self {
        Self(Rc::new(object))
    }

    pub fn downcast<T: 'static>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }
}

#[derive(Debug, Clone)]
pub enum Expression {
    Integer(Integer),
    String(String),
    Bool(bool),
    Identifier(Identifier),
    List(Rc<List>),
    Lazy(Rc<LazySequence>),
    Native(NativeValue),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeMismatch {
    NotAnInt,
    NotAString,
    NotABool,
    NotAList,
    NotASequence,
    NotCallable,
    NotA(Type),
}

impl fmt::Display for TypeMismatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TypeMismatch::NotAnInt => write!(f, "expected an integer"),
            TypeMismatch::NotAString => write!(f, "expected a string"),
            TypeMismatch::NotABool => write!(f, "expected a boolean"),
            TypeMismatch::NotAList => write!(f, "expected a list"),
            TypeMismatch::NotASequence => write!(f, "expected a list or lazy sequence"),
            TypeMismatch::NotCallable => write!(f, "expected a function"),
            TypeMismatch::NotA(t) => write!(f, "expected a value of type {}", t),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Arity {
    Between(RangeInclusive<usize>),
    AtLeast(RangeFrom<usize>),
}

#[derive(Debug)]
pub struct BadArgCount {
    name: String,
    expected: Arity,
    got: usize,
}

impl fmt::Display for BadArgCount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "When evaluating {} expected {} arguments, but received {} arguments",
            self.name, self.expected, self.got
        )
    }
}

impl Arity {
    pub const fn exactly(n: usize) -> Self {
        Self::Between(n..=n)
    }

    pub const fn at_least(n: usize) -> Self {
        Self::AtLeast(n..)
    }

    pub fn contains(&self, n: usize) -> bool {
        match self {
            Self::Between(range) => range.contains(&n),
            Self::AtLeast(range) => range.contains(&n),
        }
    }

    pub fn validate_for(&self, n: usize, name: &str) -> Result<(), BadArgCount> {
        match self.contains(n) {
            true => Ok(()),
            false => Err(BadArgCount {
                name: name.to_string(),
                expected: self.clone(),
                got: n,
            }),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Between(r) => {
                if r.start() == r.end() {
                    write!(f, "exactly {}", r.start())
                } else {
                    write!(f, "from {} to {}", r.start(), r.end())
                }
            }
            Arity::AtLeast(r) => write!(f, "At least {}", r.start),
        }
    }
}

/// Maps an expression to its primitive type tag. Identifiers are provisionally
/// function references; nothing checks here that the function exists.
pub fn classify(expr: &Expression) -> Type {
    use Expression::*;
    match expr {
        Integer(_) => Type::from(typename::INT),
        String(_) => Type::from(typename::STR),
        Bool(_) => Type::from(typename::BOOL),
        Identifier(_) => Type::from(typename::FUNC),
        List(list) if list.lambda => Type::from(typename::FUNC),
        List(_) | Lazy(_) => Type::from(typename::LIST),
        Native(value) => value.0.type_tag(),
    }
}

impl Expression {
    pub fn as_int(&self) -> Result<&Integer, TypeMismatch> {
        match self {
            Expression::Integer(x) => Ok(x),
            _ => Err(TypeMismatch::NotAnInt),
        }
    }

    pub fn as_bool(&self) -> Result<bool, TypeMismatch> {
        match self {
            Expression::Bool(b) => Ok(*b),
            _ => Err(TypeMismatch::NotABool),
        }
    }

    pub fn as_string(&self) -> Result<&str, TypeMismatch> {
        match self {
            Expression::String(s) => Ok(s),
            _ => Err(TypeMismatch::NotAString),
        }
    }

    pub fn as_list(&self) -> Result<&List, TypeMismatch> {
        match self {
            Expression::List(list) => Ok(list),
            _ => Err(TypeMismatch::NotAList),
        }
    }

    pub fn as_native<T: 'static>(&self) -> Result<&T, TypeMismatch> {
        match self {
            Expression::Native(value) => value
                .downcast::<T>()
                .ok_or_else(|| TypeMismatch::NotA(value.0.type_tag())),
            _ => Err(TypeMismatch::NotA(classify(self))),
        }
    }

    pub fn is_empty_list(&self) -> bool {
        matches!(self, Expression::List(list) if list.is_empty())
    }

    pub fn is_quoted_list(&self) -> bool {
        matches!(self, Expression::List(list) if list.quoted)
    }

    pub fn is_lambda(&self) -> bool {
        matches!(self, Expression::List(list) if list.lambda)
    }

    /// Self-evaluating atoms that may appear as literal parameters.
    pub fn is_literal(&self) -> bool {
        match self {
            Expression::Integer(_) | Expression::String(_) | Expression::Bool(_) => true,
            Expression::List(_) => self.is_empty_list(),
            Expression::Identifier(_) | Expression::Lazy(_) | Expression::Native(_) => false,
        }
    }

    /// Digest used for structural equality: sub-expressions are visited in order
    /// and every atom is written with a kind prefix and a terminator. A lazy
    /// sequence is written as its generator and state, which never change.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        self.encode_into(&mut out);
        out
    }

    fn encode_into(&self, out: &mut String) {
        use Expression::*;
        // Writing into a String cannot fail.
        let _ = match self {
            Integer(x) => write!(out, "i{};", x),
            String(s) => write!(out, "s{}:{};", s.len(), s),
            Bool(b) => write!(out, "b{};", if *b { 'T' } else { 'F' }),
            Identifier(name) => write!(out, "n{}:{};", name.len(), name),
            List(list) => {
                out.push('(');
                for item in list.iter() {
                    item.encode_into(out);
                }
                out.push(')');
                Ok(())
            }
            Lazy(seq) => {
                out.push_str("z(");
                seq.generator().encode_into(out);
                seq.state().encode_into(out);
                out.push(')');
                Ok(())
            }
            Native(value) => write!(out, "v{:p};", Rc::as_ptr(&value.0) as *const ()),
        };
    }
}

impl Expression {
    pub fn new_list() -> Self {
        Self::wrap_list(Vec::new())
    }

    /// A quoted (data) list.
    pub fn wrap_list(items: Vec<Expression>) -> Self {
        Self::List(Rc::new(List {
            items,
            quoted: true,
            lambda: false,
        }))
    }

    pub fn wrap_call(items: Vec<Expression>) -> Self {
        Self::List(Rc::new(List {
            items,
            quoted: false,
            lambda: false,
        }))
    }

    pub fn wrap_lambda(items: Vec<Expression>) -> Self {
        Self::List(Rc::new(List {
            items,
            quoted: false,
            lambda: true,
        }))
    }

    pub fn new_identifier(name: &str) -> Self {
        Self::Identifier(Identifier(name.into()))
    }
}

impl From<i64> for Expression {
    fn from(x: i64) -> Self {
        Expression::Integer(Integer::Fixed(x))
    }
}

impl From<bool> for Expression {
    fn from(b: bool) -> Self {
        Expression::Bool(b)
    }
}

impl From<&str> for Expression {
    fn from(s: &str) -> Self {
        Expression::String(s.into())
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        if self.is_empty_list() && other.is_empty_list() {
            return true;
        }
        classify(self) == classify(other) && self.encode() == other.encode()
    }
}

impl Eq for Expression {}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", printer::pr_str(self, PrintMode::ReadableRepresentation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_list(xs: &[i64]) -> Expression {
        Expression::wrap_list(xs.iter().map(|&x| Expression::from(x)).collect())
    }

    #[test]
    fn empty_lists_are_always_equal() {
        assert_eq!(Expression::new_list(), Expression::wrap_call(Vec::new()));
        assert_eq!(Expression::new_list(), Expression::wrap_lambda(Vec::new()));
    }

    #[test]
    fn lists_compare_elementwise() {
        assert_eq!(int_list(&[1, 2, 3]), int_list(&[1, 2, 3]));
        assert_ne!(int_list(&[1, 2, 3]), int_list(&[1, 2]));
        assert_ne!(int_list(&[1, 2, 3]), int_list(&[1, 3, 2]));
    }

    #[test]
    fn equality_needs_same_type() {
        assert_ne!(Expression::from(1), Expression::from("1"));
        assert_ne!(Expression::from("f"), Expression::new_identifier("f"));
        assert_eq!(
            Expression::Integer(Integer::Fixed(5)),
            Expression::Integer(Integer::Fixed(5).to_big())
        );
    }

    #[test]
    fn encoding_separates_adjacent_strings() {
        let ab_c = Expression::wrap_list(vec!["ab".into(), "c".into()]);
        let a_bc = Expression::wrap_list(vec!["a".into(), "bc".into()]);
        assert_ne!(ab_c, a_bc);
    }

    #[test]
    fn sequences_compare_by_generator_and_state() {
        let lazy = |state: i64| {
            Expression::Lazy(Rc::new(LazySequence::new(
                Expression::new_identifier("up"),
                Expression::from(state),
            )))
        };
        assert_eq!(lazy(0), lazy(0));
        assert_ne!(lazy(0), lazy(1));
        let call = Expression::wrap_list(vec![Expression::new_identifier("up"), Expression::from(0)]);
        assert_ne!(lazy(0), call);
    }

    #[test]
    fn classify_primitive_kinds() {
        assert_eq!(classify(&Expression::from(1)).to_string(), "int");
        assert_eq!(classify(&Expression::from("x")).to_string(), "str");
        assert_eq!(classify(&Expression::from(true)).to_string(), "bool");
        assert_eq!(classify(&Expression::new_list()).to_string(), "list");
        assert_eq!(classify(&Expression::new_identifier("f")).to_string(), "func");
        assert_eq!(classify(&Expression::wrap_lambda(vec![])).to_string(), "func");
    }
}
