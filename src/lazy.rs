//! Lazily produced sequences.
//!
//! A sequence node pairs a generator with a state. Stepping calls the generator
//! on the state and interprets the result:
//!
//! | generator returns | meaning                       |
//! |-------------------|-------------------------------|
//! | `'()`             | the sequence is finished      |
//! | `'(v)`            | value `v`, next state `v`     |
//! | `'(v s)`          | value `v`, next state `s`     |
//! | any other value   | value and next state are both it |
//!
//! A quoted list of any other length is malformed. Nodes never change once
//! built: the step is computed at most once per node and `tail` returns a new
//! node, so any number of readers can walk the same sequence.

use crate::environment::FunctionTable;
use crate::evaluator::{self, Error};
use crate::types::{Expression, List};
use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone)]
enum Step {
    Finished,
    Produced { value: Expression, state: Expression },
}

pub struct LazySequence {
    generator: Rc<Expression>,
    state: Expression,
    memo: OnceCell<Step>,
}

impl fmt::Debug for LazySequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LazySequence{{generator: {}, state: {}, forced: {}}}",
            self.generator,
            self.state,
            self.memo.get().is_some()
        )
    }
}

fn interpret(result: Expression) -> evaluator::Result<Step> {
    if let Expression::List(list) = &result {
        if list.is_empty() {
            return Ok(Step::Finished);
        }
        if list.quoted {
            return match &list[..] {
                [value] => Ok(Step::Produced {
                    value: value.clone(),
                    state: value.clone(),
                }),
                [value, state] => Ok(Step::Produced {
                    value: value.clone(),
                    state: state.clone(),
                }),
                _ => Err(Error::MalformedIteratorResult(result.clone())),
            };
        }
    }
    Ok(Step::Produced {
        value: result.clone(),
        state: result,
    })
}

impl LazySequence {
    pub fn new(generator: Expression, state: Expression) -> Self {
        Self {
            generator: Rc::new(generator),
            state,
            memo: OnceCell::new(),
        }
    }

    pub fn generator(&self) -> &Expression {
        &self.generator
    }

    pub fn state(&self) -> &Expression {
        &self.state
    }

    fn step(&self, functions: &FunctionTable) -> evaluator::Result<&Step> {
        if let Some(step) = self.memo.get() {
            return Ok(step);
        }
        log::trace!("force {} at state {}", self.generator, self.state);
        let result = evaluator::apply_value(&self.generator, vec![self.state.clone()], functions)?;
        let step = interpret(result)?;
        Ok(self.memo.get_or_init(|| step))
    }

    pub fn is_empty(&self, functions: &FunctionTable) -> evaluator::Result<bool> {
        Ok(matches!(self.step(functions)?, Step::Finished))
    }

    pub fn head(&self, functions: &FunctionTable) -> evaluator::Result {
        match self.step(functions)? {
            Step::Finished => Err(Error::EmptySequence("head")),
            Step::Produced { value, .. } => Ok(value.clone()),
        }
    }

    pub fn tail(&self, functions: &FunctionTable) -> evaluator::Result<LazySequence> {
        match self.step(functions)? {
            Step::Finished => Err(Error::EmptySequence("tail")),
            Step::Produced { state, .. } => Ok(LazySequence {
                generator: Rc::clone(&self.generator),
                state: state.clone(),
                memo: OnceCell::new(),
            }),
        }
    }

    /// At most `limit` values from the front of the sequence.
    pub fn take(&self, limit: usize, functions: &FunctionTable) -> evaluator::Result<Vec<Expression>> {
        let mut values = Vec::new();
        let mut next: Option<LazySequence> = None;
        while values.len() < limit {
            let node = next.as_ref().unwrap_or(self);
            if node.is_empty(functions)? {
                break;
            }
            values.push(node.head(functions)?);
            next = Some(node.tail(functions)?);
        }
        Ok(values)
    }

    /// Every value. Does not return for an infinite sequence.
    pub fn materialize(&self, functions: &FunctionTable) -> evaluator::Result<Vec<Expression>> {
        self.take(usize::MAX, functions)
    }
}

/// Replaces every lazy sequence, including those nested inside lists, by the
/// quoted list of all its values, so that it can be printed.
pub fn realize(value: &Expression, functions: &FunctionTable) -> evaluator::Result {
    match value {
        Expression::Lazy(seq) => {
            let values = seq.materialize(functions)?;
            let items = values
                .iter()
                .map(|v| realize(v, functions))
                .collect::<evaluator::Result<_>>()?;
            Ok(Expression::wrap_list(items))
        }
        Expression::List(list) if list.iter().any(holds_sequence) => {
            let items = list
                .iter()
                .map(|item| realize(item, functions))
                .collect::<evaluator::Result<_>>()?;
            Ok(Expression::List(Rc::new(List {
                items,
                quoted: list.quoted,
                lambda: list.lambda,
            })))
        }
        other => Ok(other.clone()),
    }
}

fn holds_sequence(value: &Expression) -> bool {
    match value {
        Expression::Lazy(_) => true,
        Expression::List(list) => list.iter().any(holds_sequence),
        _ => false,
    }
}

/// Structural equality, where a finished sequence also equals the empty list.
pub fn equal(a: &Expression, b: &Expression, functions: &FunctionTable) -> evaluator::Result<bool> {
    match (a, b) {
        (Expression::Lazy(seq), other) | (other, Expression::Lazy(seq)) if other.is_empty_list() => {
            seq.is_empty(functions)
        }
        _ => Ok(a == b),
    }
}
