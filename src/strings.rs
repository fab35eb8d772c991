// Only three escapes exist in a string literal: \n, \" and \\. Anything else
// after a backslash is rejected rather than passed through.

use bimap::BiMap;
use std::fmt;
use std::str::Chars;

lazy_static! {
    static ref ESCAPES: BiMap<char, char> = {
        let mut m = BiMap::new();
        m.insert('\\', '\\');
        m.insert('"', '"');
        m.insert('n', '\n');
        m
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscapeError {
    UnknownEscape(char),
    TrailingBackslash,
}

impl fmt::Display for EscapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EscapeError::UnknownEscape(c) => write!(f, "unknown escape sequence \\{}", c),
            EscapeError::TrailingBackslash => write!(f, "string literal ends with a backslash"),
        }
    }
}

struct Unescaper<'a> {
    chars: Chars<'a>,
}

impl Iterator for Unescaper<'_> {
    type Item = Result<char, EscapeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = match self.chars.next()? {
            '\\' => match self.chars.next() {
                None => Err(EscapeError::TrailingBackslash),
                Some(c) => ESCAPES
                    .get_by_left(&c)
                    .copied()
                    .ok_or(EscapeError::UnknownEscape(c)),
            },
            c => Ok(c),
        };
        Some(result)
    }
}

/// Turns the body of a string literal (without its quotes) into its value.
pub(crate) fn unescape(src: &str) -> Result<String, EscapeError> {
    Unescaper { chars: src.chars() }.collect()
}

/// The inverse of `unescape`, with surrounding quotes.
pub(crate) fn string_repr(src: &str) -> String {
    let mut output = String::with_capacity(src.len() + 2);
    output.push('"');
    for c in src.chars() {
        match ESCAPES.get_by_right(&c) {
            Some(&escape) => {
                output.push('\\');
                output.push(escape);
            }
            None => output.push(c),
        }
    }
    output.push('"');
    output
}
