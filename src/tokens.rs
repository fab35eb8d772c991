use regex::Regex;
use std::fmt;

#[derive(Debug, Eq, PartialEq)]
pub enum Token<'a> {
    OpenList,
    OpenQuotedList,
    CloseList,
    Boolean(bool),
    StringLiteral(&'a str),
    Comment(&'a str),
    PlainChars(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenizerError {
    NoFirstCharacter,
    BadQuote(String),
    UnbalancedString,
    NoCapture(String),
}

impl fmt::Display for TokenizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenizerError::NoFirstCharacter => write!(f, "no characters to parse token from"),
            TokenizerError::BadQuote(s) => {
                write!(f, "a quote must begin a list or 'T/'F, not {}", s)
            }
            TokenizerError::UnbalancedString => write!(f, "unbalanced string literal"),
            TokenizerError::NoCapture(s) => write!(f, "no token found in {:?}", s),
        }
    }
}

fn create_token(captured: &str) -> Result<Token<'_>, TokenizerError> {
    let bytes = captured.as_bytes();
    let first_char = bytes.first().ok_or(TokenizerError::NoFirstCharacter)?;
    match first_char {
        b'(' => Ok(Token::OpenList),
        b')' => Ok(Token::CloseList),
        b'\'' => match captured {
            "'(" => Ok(Token::OpenQuotedList),
            "'T" => Ok(Token::Boolean(true)),
            "'F" => Ok(Token::Boolean(false)),
            _ => Err(TokenizerError::BadQuote(captured.to_string())),
        },
        b'"' => tokenize_string_literal(captured),
        // ; is ASCII so slicing past it is safe.
        b';' => Ok(Token::Comment(&captured[1..])),
        _ => Ok(Token::PlainChars(captured)),
    }
}

fn tokenize_string_literal(captured: &str) -> Result<Token<'_>, TokenizerError> {
    let bytes = captured.as_bytes();
    if bytes.len() == 1 || bytes[bytes.len() - 1] != b'"' {
        return Err(TokenizerError::UnbalancedString);
    }

    let trailing_backslashes = bytes
        .iter()
        .rev()
        .skip(1)
        .take_while(|&&byte| byte == b'\\')
        .count();
    if trailing_backslashes % 2 == 1 {
        return Err(TokenizerError::UnbalancedString);
    }

    Ok(Token::StringLiteral(&captured[1..captured.len() - 1]))
}

/// Splits one line of source into tokens. Quotes protect whitespace, so a
/// string literal with internal spaces is a single token.
pub fn tokenize(input: &str) -> Result<Vec<Token<'_>>, TokenizerError> {
    lazy_static! {
        static ref TOKEN_RE: Regex = Regex::new(
            r#"(?x)                          # ignore whitespace in this pattern & allow comments
                ^\s*
                (                            # token capture group
                    '\(                      # start of a quoted list
                    |[()]                    # plain list delimiters
                    |"(?:                    # string literal. its contents, not captured, include:
                        \\.                  #    escapes
                        |[^\\"]              #    anything which isn't a backslash or a quote
                      )*
                      "?                     #    possibly missing a closing quote
                    |;.*                     # comments
                    |'[^\s()";]*             # quoted atom: only 'T and 'F are valid
                    |[^\s()'";]+             # one or more plain characters
                )
                \s*
            "#
        )
        .unwrap();
    }
    let mut input = input.trim_start();
    let mut tokens = Vec::new();
    while !input.is_empty() {
        let caps = TOKEN_RE
            .captures(input)
            .ok_or_else(|| TokenizerError::NoCapture(String::from(input)))?;
        let (token, whole) = match (caps.get(1), caps.get(0)) {
            (Some(token), Some(whole)) => (token, whole),
            _ => return Err(TokenizerError::NoCapture(String::from(input))),
        };
        tokens.push(create_token(token.as_str())?);
        input = &input[whole.end()..];
    }
    log::trace!("tokenized {} tokens", tokens.len());
    Ok(tokens)
}
