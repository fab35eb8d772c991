use crate::integer::Integer;
use crate::strings::{self, EscapeError};
use crate::tokens::{tokenize, Token, TokenizerError};
use crate::types::{Expression, List};
use std::collections::VecDeque;
use std::fmt;
use std::io::{self, BufRead};
use std::rc::Rc;

const COMMENT_MARKER: char = ';';

#[derive(Debug)]
pub enum Error {
    Tokenizer(TokenizerError),
    BadString(EscapeError),
    MalformedLiteral(String),
    UnclosedList,
    UnexpectedClose,
    TrailingContent,
    NoForm,
    Io(io::Error),
    OnLine(usize, Box<Error>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Tokenizer(e) => write!(f, "tokenizer failed: {}", e),
            Error::BadString(e) => write!(f, "bad string literal: {}", e),
            Error::MalformedLiteral(s) => write!(f, "malformed literal {}", s),
            Error::UnclosedList => write!(f, "input ended inside an unterminated list"),
            Error::UnexpectedClose => write!(f, "unexpected ) with no list open"),
            Error::TrailingContent => write!(f, "unexpected input after a complete form"),
            Error::NoForm => write!(f, "no form to read"),
            Error::Io(e) => write!(f, "{}", e),
            Error::OnLine(line, e) => write!(f, "line {}: {}", line, e),
        }
    }
}

impl From<TokenizerError> for Error {
    fn from(e: TokenizerError) -> Self {
        Error::Tokenizer(e)
    }
}

impl From<EscapeError> for Error {
    fn from(e: EscapeError) -> Self {
        Error::BadString(e)
    }
}

pub type Result<T = Expression> = std::result::Result<T, Error>;

/// Tokens with their atoms already decoded, so they outlive the line they came
/// from.
#[derive(Debug)]
enum Lexeme {
    Open { quoted: bool },
    Close,
    Atom(Expression),
}

fn lex_line(line: &str, out: &mut VecDeque<Lexeme>) -> Result<()> {
    for token in tokenize(line)? {
        let lexeme = match token {
            Token::OpenList => Lexeme::Open { quoted: false },
            Token::OpenQuotedList => Lexeme::Open { quoted: true },
            Token::CloseList => Lexeme::Close,
            Token::Boolean(b) => Lexeme::Atom(Expression::Bool(b)),
            Token::StringLiteral(body) => Lexeme::Atom(Expression::String(strings::unescape(body)?)),
            Token::Comment(_) => continue,
            Token::PlainChars(chars) => Lexeme::Atom(read_atom(chars)?),
        };
        out.push_back(lexeme);
    }
    Ok(())
}

fn looks_numeric(chars: &str) -> bool {
    let digits = chars.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(chars);
    digits.starts_with(|c: char| c.is_ascii_digit())
}

fn read_atom(chars: &str) -> Result {
    if looks_numeric(chars) {
        return Integer::parse(chars)
            .map(Expression::Integer)
            .ok_or_else(|| Error::MalformedLiteral(chars.to_string()));
    }
    Ok(Expression::new_identifier(chars))
}

/// Reads forms one at a time from a line-oriented source. Lines are only pulled
/// from the source when the current form needs more tokens.
pub struct Reader<R> {
    lines: io::Lines<R>,
    pending: VecDeque<Lexeme>,
    line_number: usize,
}

impl<R: BufRead> Reader<R> {
    pub fn new(input: R) -> Self {
        Self {
            lines: input.lines(),
            pending: VecDeque::new(),
            line_number: 0,
        }
    }

    fn next_lexeme(&mut self) -> Result<Option<Lexeme>> {
        while self.pending.is_empty() {
            let line = match self.lines.next() {
                None => return Ok(None),
                Some(line) => line.map_err(Error::Io)?,
            };
            self.line_number += 1;
            let trimmed = line.trim_start();
            if trimmed.is_empty() || trimmed.starts_with(COMMENT_MARKER) {
                continue;
            }
            lex_line(&line, &mut self.pending)
                .map_err(|e| Error::OnLine(self.line_number, Box::new(e)))?;
        }
        Ok(self.pending.pop_front())
    }

    /// The next complete form, or `None` once the input is exhausted.
    pub fn read_form(&mut self) -> Result<Option<Expression>> {
        let quoted = match self.next_lexeme()? {
            None => return Ok(None),
            Some(Lexeme::Atom(atom)) => return Ok(Some(atom)),
            Some(Lexeme::Close) => {
                return Err(Error::OnLine(self.line_number, Box::new(Error::UnexpectedClose)))
            }
            Some(Lexeme::Open { quoted }) => quoted,
        };

        let mut stack: Vec<(Vec<Expression>, bool)> = vec![(Vec::new(), quoted)];
        loop {
            match self.next_lexeme()? {
                None => return Err(Error::OnLine(self.line_number, Box::new(Error::UnclosedList))),
                Some(Lexeme::Open { quoted }) => stack.push((Vec::new(), quoted)),
                Some(Lexeme::Atom(atom)) => {
                    if let Some((items, _)) = stack.last_mut() {
                        items.push(atom);
                    }
                }
                Some(Lexeme::Close) => {
                    let (items, quoted) = match stack.pop() {
                        Some(top) => top,
                        None => return Err(Error::UnexpectedClose),
                    };
                    let list = Expression::List(Rc::new(List {
                        items,
                        quoted,
                        lambda: false,
                    }));
                    match stack.last_mut() {
                        Some((parent, _)) => parent.push(list),
                        None => {
                            log::trace!("read form {}", list);
                            return Ok(Some(list));
                        }
                    }
                }
            }
        }
    }
}

impl<R: BufRead> Iterator for Reader<R> {
    type Item = Result;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_form().transpose()
    }
}

/// Reads exactly one form from a string.
pub fn read_str(input: &str) -> Result {
    let mut reader = Reader::new(input.as_bytes());
    let form = reader.read_form()?.ok_or(Error::NoForm)?;
    match reader.read_form()? {
        None => Ok(form),
        Some(_) => Err(Error::TrailingContent),
    }
}

/// Reads every form in a string.
pub fn read_all(input: &str) -> Result<Vec<Expression>> {
    Reader::new(input.as_bytes()).collect()
}
