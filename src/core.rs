use crate::environment::FunctionTable;
use crate::evaluator::{self, Error};
use crate::integer::{Integer, NumericError};
use crate::lazy::{self, LazySequence};
use crate::native::PrimitiveFn;
use crate::printer::{self, PrintMode};
use crate::typename;
use crate::types::{classify, Arity, Expression, List, TypeMismatch};
use itertools::Itertools;
use std::collections::HashMap;
use std::rc::Rc;

fn grab_ints(args: &[Expression]) -> evaluator::Result<Vec<&Integer>> {
    let type_check: Result<Vec<_>, _> = args.iter().map(|o| o.as_int()).collect();
    type_check.map_err(evaluator::Error::TypeMismatch)
}

/// Folds from the first argument, or returns `empty` if there are none.
fn fold_ints(
    args: &[Expression],
    empty: Integer,
    op: fn(&Integer, &Integer) -> Result<Integer, NumericError>,
) -> evaluator::Result {
    let ints = grab_ints(args)?;
    let value = match ints.split_first() {
        None => empty,
        Some((first, rest)) => rest
            .iter()
            .try_fold((*first).clone(), |acc, x| op(&acc, x))?,
    };
    Ok(Expression::Integer(value))
}

const SUM: PrimitiveFn = PrimitiveFn {
    name: "+",
    fn_ptr: |_, args| fold_ints(args, Integer::zero(), Integer::add),
    arity: Arity::at_least(0),
    parameters: &["int"],
    returns: "int",
};

const SUB: PrimitiveFn = PrimitiveFn {
    name: "-",
    fn_ptr: |_, args| fold_ints(args, Integer::zero(), Integer::sub),
    arity: Arity::at_least(1),
    parameters: &["int"],
    returns: "int",
};

const MUL: PrimitiveFn = PrimitiveFn {
    name: "*",
    fn_ptr: |_, args| fold_ints(args, Integer::one(), Integer::mul),
    arity: Arity::at_least(0),
    parameters: &["int"],
    returns: "int",
};

const DIV: PrimitiveFn = PrimitiveFn {
    name: "/",
    fn_ptr: |_, args| fold_ints(args, Integer::one(), Integer::div),
    arity: Arity::at_least(1),
    parameters: &["int"],
    returns: "int",
};

fn comparison_(
    args: &[Expression],
    comp: fn(&Integer, &Integer) -> Result<bool, NumericError>,
) -> evaluator::Result {
    match grab_ints(args)?.as_slice() {
        [x, y] => Ok(Expression::Bool(comp(x, y)?)),
        _ => Err(TypeMismatch::NotAnInt.into()),
    }
}

fn compare_lt(x: &Integer, y: &Integer) -> Result<bool, NumericError> {
    x.lt(y)
}

fn compare_gt(x: &Integer, y: &Integer) -> Result<bool, NumericError> {
    y.lt(x)
}

fn compare_le(x: &Integer, y: &Integer) -> Result<bool, NumericError> {
    y.lt(x).map(|gt| !gt)
}

fn compare_ge(x: &Integer, y: &Integer) -> Result<bool, NumericError> {
    x.lt(y).map(|lt| !lt)
}

macro_rules! comparison_primitive {
    ($SYMBOL:tt, $NAME:ident) => {
        paste::item! {
            const $NAME: PrimitiveFn = PrimitiveFn {
                name: stringify!($SYMBOL),
                fn_ptr: |_: &FunctionTable, args: &[Expression]| {
                    comparison_(args, [<compare_ $NAME:lower>])
                },
                arity: Arity::exactly(2),
                parameters: &["int", "int"],
                returns: "bool",
            };
        }
    };
}

comparison_primitive!(<, LT);
comparison_primitive!(<=, LE);
comparison_primitive!(>, GT);
comparison_primitive!(>=, GE);

const EQUAL: PrimitiveFn = PrimitiveFn {
    name: "=",
    fn_ptr: |functions, args| {
        let equal = lazy::equal(&args[0], &args[1], functions)?;
        Ok(Expression::Bool(equal))
    },
    arity: Arity::exactly(2),
    parameters: &["any", "any"],
    returns: "bool",
};

const NOT: PrimitiveFn = PrimitiveFn {
    name: "not",
    fn_ptr: |_, args| Ok(Expression::Bool(!args[0].as_bool()?)),
    arity: Arity::exactly(1),
    parameters: &["bool"],
    returns: "bool",
};

fn print_string_internal(
    functions: &FunctionTable,
    args: &[Expression],
    mode: PrintMode,
    sep: &'static str,
    to_screen: bool,
) -> evaluator::Result {
    let realized: Vec<Expression> = args
        .iter()
        .map(|arg| lazy::realize(arg, functions))
        .collect::<evaluator::Result<_>>()?;
    let text = realized.iter().map(|arg| printer::pr_str(arg, mode)).join(sep);
    if to_screen {
        println!("{}", text);
        Ok(Expression::new_list())
    } else {
        Ok(Expression::String(text))
    }
}

const STR: PrimitiveFn = PrimitiveFn {
    name: "str",
    fn_ptr: |functions, args| print_string_internal(functions, args, PrintMode::Directly, "", false),
    arity: Arity::at_least(0),
    parameters: &["any"],
    returns: "str",
};

const PRINT: PrimitiveFn = PrimitiveFn {
    name: "print",
    fn_ptr: |functions, args| print_string_internal(functions, args, PrintMode::Directly, " ", true),
    arity: Arity::at_least(0),
    parameters: &["any"],
    returns: "list",
};

/// Either kind of value that supports the list operations.
enum Sequence<'a> {
    Items(&'a List),
    Lazy(&'a LazySequence),
}

fn as_sequence(expression: &Expression) -> Result<Sequence<'_>, TypeMismatch> {
    match expression {
        Expression::List(list) if !list.lambda => Ok(Sequence::Items(list)),
        Expression::Lazy(seq) => Ok(Sequence::Lazy(seq)),
        _ => Err(TypeMismatch::NotASequence),
    }
}

fn as_data_list(expression: &Expression) -> Result<&List, TypeMismatch> {
    match expression {
        Expression::List(list) if !list.lambda => Ok(list),
        _ => Err(TypeMismatch::NotAList),
    }
}

const LIST: PrimitiveFn = PrimitiveFn {
    name: "list",
    fn_ptr: |_, args| Ok(Expression::wrap_list(args.to_vec())),
    arity: Arity::at_least(0),
    parameters: &["any"],
    returns: "list",
};

const CONS: PrimitiveFn = PrimitiveFn {
    name: "cons",
    fn_ptr: cons_,
    arity: Arity::exactly(2),
    parameters: &["any", "list"],
    returns: "list",
};

fn cons_(_: &FunctionTable, args: &[Expression]) -> evaluator::Result {
    let tail = as_data_list(&args[1])?;
    let items = std::iter::once(args[0].clone())
        .chain(tail.iter().cloned())
        .collect();
    Ok(Expression::wrap_list(items))
}

const APPEND: PrimitiveFn = PrimitiveFn {
    name: "append",
    fn_ptr: append_,
    arity: Arity::exactly(2),
    parameters: &["list", "any"],
    returns: "list",
};

fn append_(_: &FunctionTable, args: &[Expression]) -> evaluator::Result {
    let mut items = as_data_list(&args[0])?.to_vec();
    items.push(args[1].clone());
    Ok(Expression::wrap_list(items))
}

const LEN: PrimitiveFn = PrimitiveFn {
    name: "len",
    fn_ptr: len_,
    arity: Arity::exactly(1),
    parameters: &["list"],
    returns: "int",
};

fn len_(functions: &FunctionTable, args: &[Expression]) -> evaluator::Result {
    let count = match as_sequence(&args[0])? {
        Sequence::Items(list) => list.len(),
        Sequence::Lazy(seq) => seq.materialize(functions)?.len(),
    };
    Ok(Expression::from(count as i64))
}

const HEAD: PrimitiveFn = PrimitiveFn {
    name: "head",
    fn_ptr: head_,
    arity: Arity::exactly(1),
    parameters: &["list[a]"],
    returns: "a",
};

fn head_(functions: &FunctionTable, args: &[Expression]) -> evaluator::Result {
    match as_sequence(&args[0])? {
        Sequence::Items(list) => list.first().cloned().ok_or(Error::EmptySequence("head")),
        Sequence::Lazy(seq) => seq.head(functions),
    }
}

const TAIL: PrimitiveFn = PrimitiveFn {
    name: "tail",
    fn_ptr: tail_,
    arity: Arity::exactly(1),
    parameters: &["list[a]"],
    returns: "list[a]",
};

fn tail_(functions: &FunctionTable, args: &[Expression]) -> evaluator::Result {
    match as_sequence(&args[0])? {
        Sequence::Items(list) => match list.split_first() {
            Some((_, rest)) => Ok(Expression::wrap_list(rest.to_vec())),
            None => Err(Error::EmptySequence("tail")),
        },
        Sequence::Lazy(seq) => Ok(Expression::Lazy(Rc::new(seq.tail(functions)?))),
    }
}

const EMPTY: PrimitiveFn = PrimitiveFn {
    name: "empty",
    fn_ptr: empty_,
    arity: Arity::exactly(1),
    parameters: &["list"],
    returns: "bool",
};

fn empty_(functions: &FunctionTable, args: &[Expression]) -> evaluator::Result {
    let empty = match as_sequence(&args[0])? {
        Sequence::Items(list) => list.is_empty(),
        Sequence::Lazy(seq) => seq.is_empty(functions)?,
    };
    Ok(Expression::Bool(empty))
}

const LAZY: PrimitiveFn = PrimitiveFn {
    name: "lazy",
    fn_ptr: lazy_,
    arity: Arity::exactly(2),
    parameters: &["func", "any"],
    returns: "list",
};

fn lazy_(_: &FunctionTable, args: &[Expression]) -> evaluator::Result {
    if classify(&args[0]).basic() != typename::FUNC {
        return Err(TypeMismatch::NotCallable.into());
    }
    let seq = LazySequence::new(args[0].clone(), args[1].clone());
    Ok(Expression::Lazy(Rc::new(seq)))
}

const TAKE: PrimitiveFn = PrimitiveFn {
    name: "take",
    fn_ptr: take_,
    arity: Arity::exactly(2),
    parameters: &["int", "list"],
    returns: "list",
};

fn take_(functions: &FunctionTable, args: &[Expression]) -> evaluator::Result {
    let limit = args[0]
        .as_int()?
        .as_fixed()
        .filter(|n| *n >= 0)
        .ok_or_else(|| Error::Native(format!("take: {} is not a valid count", args[0])))?;
    let limit = limit as usize;
    let values = match as_sequence(&args[1])? {
        Sequence::Items(list) => list.iter().take(limit).cloned().collect(),
        Sequence::Lazy(seq) => seq.take(limit, functions)?,
    };
    Ok(Expression::wrap_list(values))
}

const BIG: PrimitiveFn = PrimitiveFn {
    name: "big",
    fn_ptr: |_, args| Ok(Expression::Integer(args[0].as_int()?.to_big())),
    arity: Arity::exactly(1),
    parameters: &["int"],
    returns: "int",
};

type Namespace = HashMap<&'static str, PrimitiveFn>;
lazy_static! {
    pub static ref CORE: Namespace = {
        let mut map = Namespace::new();
        for func in [
            // Arithmetic
            SUM,
            SUB,
            MUL,
            DIV,
            BIG,
            // Comparisons
            LT,
            LE,
            GT,
            GE,
            EQUAL,
            NOT,
            // Working with strings
            STR,
            PRINT,
            // Working with lists
            LIST,
            CONS,
            APPEND,
            LEN,
            HEAD,
            TAIL,
            EMPTY,
            // Lazy sequences
            LAZY,
            TAKE,
        ] {
            map.insert(func.name, func);
        }
        map
    };
}

pub fn register(table: &mut FunctionTable) {
    for func in CORE.values() {
        table.register_native(Box::new(func.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Interpreter;

    fn run(source: &str) -> Vec<String> {
        Interpreter::new().run_str(source).unwrap()
    }

    fn fails(source: &str) -> evaluator::Error {
        match Interpreter::new().run_str(source) {
            Err(crate::interpreter::Error::Eval(e)) => e,
            other => panic!("expected an evaluation error, got {:?}", other),
        }
    }

    #[test]
    fn arithmetic_folds_from_the_first_argument() {
        assert_eq!(run("(+ 1 2 3)\n(*)\n(- 10 1 2)\n(/ 7 2)\n(/ -7 2)"), vec![
            "6", "1", "7", "3", "-3"
        ]);
    }

    #[test]
    fn fixed_width_overflow_is_reported() {
        assert!(matches!(
            fails("(* 9223372036854775807 2)"),
            Error::Numeric(NumericError::Overflow("*"))
        ));
        assert!(matches!(fails("(/ 1 0)"), Error::Numeric(NumericError::DivideByZero)));
    }

    #[test]
    fn big_integers_do_not_mix() {
        assert_eq!(
            run("(* (big 9223372036854775807) (big 2))"),
            vec!["18446744073709551614"]
        );
        assert!(matches!(
            fails("(+ (big 1) 1)"),
            Error::Numeric(NumericError::MixedRepresentations)
        ));
    }

    #[test]
    fn comparisons() {
        assert_eq!(run("(< 1 2)\n(> 1 2)\n(<= 2 2)\n(>= 1 2)"), vec!["'T", "'F", "'T", "'F"]);
        assert_eq!(run("(= '(1 2) (list 1 2))\n(= 1 \"1\")\n(not (= '() (tail '(1))))"), vec![
            "'T", "'F", "'F"
        ]);
    }

    #[test]
    fn list_operations() {
        assert_eq!(
            run("(cons 1 '(2 3))\n(append '(1 2) 3)\n(len '(1 2 3))\n(head '(4 5))\n(tail '(4 5))\n(empty '())"),
            vec!["'(1 2 3)", "'(1 2 3)", "3", "4", "'(5)", "'T"]
        );
    }

    #[test]
    fn head_of_empty_list() {
        assert!(matches!(fails("(head '())"), Error::EmptySequence("head")));
        assert!(matches!(fails("(tail '())"), Error::EmptySequence("tail")));
    }

    #[test]
    fn take_is_safe_on_infinite_sequences() {
        assert_eq!(
            run("(def up (n) (+ n 1))\n(take 3 (lazy up 0))\n(take 5 '(1 2))"),
            vec!["'(1 2 3)", "'(1 2)"]
        );
        assert!(matches!(fails("(take -1 '(1))"), Error::Native(_)));
    }

    #[test]
    fn lazy_sequences_support_list_operations() {
        let source = "(def counter (n) (if (< n 3) (list (+ n 1)) '()))
(set s (lazy counter 0))
(head s)
(head (tail s))
(len s)
(empty (tail (tail (tail s))))";
        assert_eq!(run(source), vec!["1", "2", "3", "'T"]);
    }

    #[test]
    fn lazy_needs_a_function() {
        assert!(matches!(fails("(lazy 1 0)"), Error::ArgumentType { position: 0, .. }));
    }

    #[test]
    fn sequences_compare_structurally() {
        let source = "(def counter (n) (if (< n 3) (list (+ n 1)) '()))
(set s (lazy counter 0))
(= (tail s) (tail s))
(= (lazy counter 0) (lazy counter 0))
(= s (tail s))
(= '() (lazy counter 3))
(= (lazy counter 2) '())";
        assert_eq!(run(source), vec!["'T", "'T", "'F", "'T", "'F"]);
    }

    #[test]
    fn nested_sequences_print_their_values() {
        let source = "(def counter (n) (if (< n 3) (list (+ n 1)) '()))
(list 0 (lazy counter 0))
(str (list (lazy counter 1)))";
        assert_eq!(run(source), vec!["'(0 '(1 2 3))", "\"'(2 3)\""]);
    }

    #[test]
    fn str_joins_directly() {
        assert_eq!(run("(str \"a\" 1 '(2))"), vec!["\"a1'(2)\""]);
    }
}
