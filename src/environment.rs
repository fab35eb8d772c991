use crate::native::NativeFunction;
use crate::types::{Expression, Identifier};
use derive_more::{Deref, DerefMut};
use std::collections::HashMap;
use std::fmt;

/// Variables visible to one function call. Each call gets a fresh frame; it is
/// never shared with sibling or nested calls.
#[derive(Deref, DerefMut, Debug, Default, Clone)]
pub struct Frame(HashMap<Identifier, Expression>);

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<T>(&mut self, key: T, value: Expression) -> Option<Expression>
    where
        T: Into<Identifier>,
    {
        self.0.insert(key.into(), value)
    }
}

/// One body of a user-defined function, selected when `parameters` matches the
/// call's arguments.
#[derive(Debug, Clone)]
pub struct Overload {
    pub parameters: Expression,
    pub body: Vec<Expression>,
}

#[derive(Debug)]
pub struct UserFunction {
    pub name: Identifier,
    /// In declaration order; the first match wins.
    pub overloads: Vec<Overload>,
}

pub enum Callable {
    Native(Box<dyn NativeFunction>),
    User(UserFunction),
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Native(func) => write!(f, "native function #<{}>", func.name()),
            Callable::User(func) => write!(
                f,
                "function #<{}> with {} overload(s)",
                func.name,
                func.overloads.len()
            ),
        }
    }
}

/// Every named function in the program. Filled while the program is set up and
/// while top-level definitions are read; evaluation only ever reads it.
#[derive(Debug, Default)]
pub struct FunctionTable {
    functions: HashMap<Identifier, Callable>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later registrations replace earlier ones under the same name.
    pub fn register_native(&mut self, func: Box<dyn NativeFunction>) {
        let name = Identifier::from(func.name());
        if let Some(previous) = self.functions.insert(name.clone(), Callable::Native(func)) {
            log::debug!("{} replaced {:?}", name, previous);
        }
    }

    /// Adds an overload to a user function, creating it (and displacing any
    /// native of the same name) if needed.
    pub fn define(&mut self, name: Identifier, overload: Overload) {
        if let Some(Callable::User(func)) = self.functions.get_mut(&name) {
            log::debug!("add overload #{} to {}", func.overloads.len() + 1, name);
            func.overloads.push(overload);
            return;
        }
        if let Some(Callable::Native(_)) = self.functions.get(&name) {
            log::debug!("user definition of {} replaces a native function", name);
        }
        let func = UserFunction {
            name: name.clone(),
            overloads: vec![overload],
        };
        self.functions.insert(name, Callable::User(func));
    }

    pub fn get(&self, name: &Identifier) -> Option<&Callable> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &Identifier) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
