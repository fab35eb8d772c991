//! Nominal types with optional generic parameters, written `base[p1,p2,...]`.
//!
//! Types are kept in their textual form. Parameters are recovered on demand by
//! splitting at top-level commas, so arbitrarily nested generics such as
//! `list[a,some[b,c]]` are handled without a separate tree representation.
//! Single lowercase letters are type variables.

use derive_more::Deref;
use itertools::Itertools;
use std::collections::HashMap;
use std::fmt;

pub const INT: &str = "int";
pub const STR: &str = "str";
pub const BOOL: &str = "bool";
pub const LIST: &str = "list";
pub const FUNC: &str = "func";
pub const ANY: &str = "any";

pub type Substitution = HashMap<String, Type>;

#[derive(Deref, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Type(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeClash {
    pub expected: Type,
    pub found: Type,
}

impl fmt::Display for TypeClash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected {}, found {}", self.expected, self.found)
    }
}

impl Type {
    pub fn new(text: &str) -> Self {
        Self(text.chars().filter(|c| !c.is_whitespace()).collect())
    }

    pub fn generic(basic: &str, arguments: &[Type]) -> Self {
        match arguments.len() {
            0 => Self::new(basic),
            _ => Self(format!("{}[{}]", basic, arguments.iter().join(","))),
        }
    }

    pub fn basic(&self) -> &str {
        match self.0.find('[') {
            Some(open) => &self.0[..open],
            None => &self.0,
        }
    }

    /// Splits the parameter list at commas that are not nested inside another
    /// bracket pair.
    pub fn arguments(&self) -> Vec<Type> {
        let open = match self.0.find('[') {
            Some(open) => open,
            None => return Vec::new(),
        };
        let inner = self.0[open + 1..].strip_suffix(']').unwrap_or(&self.0[open + 1..]);
        let mut arguments = Vec::new();
        let mut depth = 0usize;
        let mut start = 0;
        for (i, c) in inner.char_indices() {
            match c {
                '[' => depth += 1,
                ']' => depth = depth.saturating_sub(1),
                ',' if depth == 0 => {
                    arguments.push(Type::new(&inner[start..i]));
                    start = i + 1;
                }
                _ => (),
            }
        }
        if start < inner.len() {
            arguments.push(Type::new(&inner[start..]));
        }
        arguments
    }

    pub fn is_variable(&self) -> bool {
        let mut chars = self.0.chars();
        matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_lowercase())
    }

    pub fn is_any(&self) -> bool {
        self.0 == ANY
    }

    fn collect_variables(&self, seen: &mut Vec<String>) {
        if self.is_variable() {
            if !seen.contains(&self.0) {
                seen.push(self.0.clone());
            }
            return;
        }
        for argument in self.arguments() {
            argument.collect_variables(seen);
        }
    }

    pub fn has_variables(&self) -> bool {
        let mut seen = Vec::new();
        self.collect_variables(&mut seen);
        !seen.is_empty()
    }

    /// Renames type variables positionally (a, b, c, ...) in order of first
    /// appearance.
    pub fn canonical(&self) -> Type {
        let mut seen = Vec::new();
        self.collect_variables(&mut seen);
        let renaming: Substitution = seen
            .into_iter()
            .zip(b'a'..=b'z')
            .map(|(name, letter)| (name, Type((letter as char).to_string())))
            .collect();
        self.expand(&renaming)
    }

    /// Replaces bound variables, leaving unbound ones in place.
    pub fn expand(&self, substitution: &Substitution) -> Type {
        if self.is_variable() {
            return substitution.get(&self.0).cloned().unwrap_or_else(|| self.clone());
        }
        let arguments = self.arguments();
        if arguments.is_empty() {
            return self.clone();
        }
        let expanded: Vec<_> = arguments.iter().map(|a| a.expand(substitution)).collect();
        Type::generic(self.basic(), &expanded)
    }

    /// Whether a value of type `actual` satisfies this annotation. Unparameterised
    /// actual types are compared by base name only.
    pub fn accepts(&self, actual: &Type) -> bool {
        if self.is_any() {
            return true;
        }
        match actual.arguments().is_empty() {
            true => self.basic() == actual.basic(),
            false => self.canonical() == actual.canonical(),
        }
    }

    /// Matches this (formal) type against an actual type, extending the
    /// substitution with any variables it binds.
    pub fn unify(&self, actual: &Type, substitution: &mut Substitution) -> Result<(), TypeClash> {
        let clash_of = |s: &Substitution| TypeClash {
            expected: self.expand(s),
            found: actual.clone(),
        };
        if self.is_any() || actual.is_any() {
            return Ok(());
        }
        if self.is_variable() {
            return match substitution.get(&self.0).cloned() {
                Some(bound) => match bound.unify(actual, substitution) {
                    Ok(()) => Ok(()),
                    Err(_) => Err(clash_of(substitution)),
                },
                None => {
                    substitution.insert(self.0.clone(), actual.clone());
                    Ok(())
                }
            };
        }
        if self.basic() != actual.basic() {
            return Err(clash_of(substitution));
        }
        let (formal, given) = (self.arguments(), actual.arguments());
        if formal.is_empty() || given.is_empty() {
            return Ok(());
        }
        if formal.len() != given.len() {
            return Err(clash_of(substitution));
        }
        for (f, g) in formal.iter().zip(&given) {
            if f.unify(g, substitution).is_err() {
                return Err(clash_of(substitution));
            }
        }
        Ok(())
    }
}

impl From<&str> for Type {
    fn from(text: &str) -> Self {
        Type::new(text)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(types: Vec<Type>) -> Vec<String> {
        types.into_iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn arguments_respect_nesting() {
        assert_eq!(
            names(Type::new("list[a,some[b,c]]").arguments()),
            vec!["a", "some[b,c]"]
        );
        assert_eq!(names(Type::new("list[a,b,c]").arguments()), vec!["a", "b", "c"]);
        assert!(Type::new("int").arguments().is_empty());
        assert_eq!(
            names(Type::new("f[g[h[a,b]],c]").arguments()),
            vec!["g[h[a,b]]", "c"]
        );
    }

    #[test]
    fn basic_strips_parameters() {
        assert_eq!(Type::new("list[a,b]").basic(), "list");
        assert_eq!(Type::new("int").basic(), "int");
    }

    #[test]
    fn canonical_ignores_variable_spelling() {
        let first = Type::new("pair[x,list[y]]");
        let second = Type::new("pair[p,list[q]]");
        assert_eq!(first.canonical(), second.canonical());
        assert_eq!(first.canonical().to_string(), "pair[a,list[b]]");
        assert_eq!(Type::new("map[int,z]").canonical().to_string(), "map[int,a]");
    }

    #[test]
    fn expand_leaves_unbound_variables() {
        let mut substitution = Substitution::new();
        substitution.insert("a".into(), Type::new("list[int]"));
        let expanded = Type::new("pair[a,b]").expand(&substitution);
        assert_eq!(expanded.to_string(), "pair[list[int],b]");
    }

    #[test]
    fn unify_binds_variables_consistently() {
        let mut substitution = Substitution::new();
        let formal = Type::new("pair[a,a]");
        assert!(formal
            .unify(&Type::new("pair[int,int]"), &mut substitution)
            .is_ok());
        assert_eq!(substitution["a"], Type::new("int"));

        let mut substitution = Substitution::new();
        assert!(formal
            .unify(&Type::new("pair[int,str]"), &mut substitution)
            .is_err());
    }

    #[test]
    fn clash_reports_the_bound_formal() {
        let mut substitution = Substitution::new();
        let clash = Type::new("pair[a,list[a]]")
            .unify(&Type::new("pair[int,list[str]]"), &mut substitution)
            .unwrap_err();
        assert_eq!(clash.expected.to_string(), "pair[int,list[int]]");
        assert_eq!(clash.found.to_string(), "pair[int,list[str]]");
    }

    #[test]
    fn annotation_accepts_by_base_name() {
        assert!(Type::new("list").accepts(&Type::new("list")));
        assert!(Type::new("list[int]").accepts(&Type::new("list")));
        assert!(!Type::new("int").accepts(&Type::new("str")));
        assert!(Type::new("any").accepts(&Type::new("str")));
    }
}
