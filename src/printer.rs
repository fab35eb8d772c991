use crate::strings::string_repr;
use crate::types::{Expression, List};
use itertools::Itertools;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintMode {
    /// Text that reads back as the same expression: strings are quoted and
    /// escaped.
    ReadableRepresentation,
    /// Strings are written as their contents.
    Directly,
}

fn pr_list(list: &List, mode: PrintMode) -> String {
    let inner = list.iter().map(|e| pr_str(e, mode)).join(" ");
    match (list.quoted, list.lambda) {
        (_, true) => format!("(lambda {})", inner),
        (true, false) => format!("'({})", inner),
        (false, false) => format!("({})", inner),
    }
}

/// Lazy sequences print as a placeholder; the run loop materializes finite
/// ones before printing them.
pub fn pr_str(expression: &Expression, mode: PrintMode) -> String {
    match expression {
        Expression::Integer(value) => value.to_string(),
        Expression::String(s) => match mode {
            PrintMode::ReadableRepresentation => string_repr(s),
            PrintMode::Directly => s.clone(),
        },
        Expression::Bool(true) => String::from("'T"),
        Expression::Bool(false) => String::from("'F"),
        Expression::Identifier(name) => name.to_string(),
        Expression::List(list) => pr_list(list, mode),
        Expression::Lazy(_) => String::from("<lazy sequence>"),
        Expression::Native(value) => value.0.describe(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::read_str;

    fn round_trip(source: &str) -> String {
        pr_str(&read_str(source).unwrap(), PrintMode::ReadableRepresentation)
    }

    #[test]
    fn atoms() {
        assert_eq!(round_trip("12"), "12");
        assert_eq!(round_trip("-12"), "-12");
        assert_eq!(round_trip("'T"), "'T");
        assert_eq!(round_trip("'F"), "'F");
        assert_eq!(round_trip("abc"), "abc");
        assert_eq!(round_trip("99999999999999999999999"), "99999999999999999999999");
    }

    #[test]
    fn lists_keep_their_quote() {
        assert_eq!(round_trip("'(1 (2 3) '(4))"), "'(1 (2 3) '(4))");
        assert_eq!(round_trip("(+ 1 2)"), "(+ 1 2)");
        assert_eq!(round_trip("'()"), "'()");
    }

    #[test]
    fn strings_depend_on_mode() {
        let text = Expression::from("say \"hi\"\n");
        assert_eq!(
            pr_str(&text, PrintMode::ReadableRepresentation),
            r#""say \"hi\"\n""#
        );
        assert_eq!(pr_str(&text, PrintMode::Directly), "say \"hi\"\n");
    }
}
