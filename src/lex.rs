use std::{fmt::Display, str::FromStr, sync::LazyLock};

use miette::{Diagnostic, NamedSource, SourceSpan};
use regex::Regex;
use thiserror::Error;

use crate::read::Reader;

static HEX: LazyLock<Regex> = LazyLock::new(|| pattern(r"^0x[0-9A-Fa-f]+"));
static OCTAL: LazyLock<Regex> = LazyLock::new(|| pattern(r"^0o[0-7]+"));
static BINARY: LazyLock<Regex> = LazyLock::new(|| pattern(r"^0b[01]+"));
static FLOAT: LazyLock<Regex> = LazyLock::new(|| pattern(r"^[0-9]+\.[0-9]*"));
static DECIMAL: LazyLock<Regex> = LazyLock::new(|| pattern(r"^[0-9]+"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| pattern(r"^\s+"));
static OPERATOR: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"^(<-|\+|-|\*|/|\^|and|or|not|xor|log|ln|sqrt|sin|cos|tan|ctg|factorial)")
});
static IDENT: LazyLock<Regex> = LazyLock::new(|| pattern(r"^[A-Za-z][A-Za-z0-9]*"));

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("lexer patterns are valid regular expressions")
}

#[derive(Error, Debug, Diagnostic)]
#[error("invalid input at {position}")]
#[diagnostic(help("numbers must fit in 32 bits; names start with a letter"))]
pub struct LexError {
    #[source_code]
    src: NamedSource<String>,

    #[label("this input")]
    bad_bit: SourceSpan,

    pub position: usize,
}

impl LexError {
    fn at(reader: &Reader<'_>, len: usize) -> Self {
        let position = reader.position();
        LexError {
            src: NamedSource::new("<input>", reader.line().to_string()),
            bad_bit: SourceSpan::from(position..position + len),
            position,
        }
    }
}

/// Base an integer literal was written in. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Radix {
    Binary,
    Octal,
    Decimal,
    Hexadecimal,
}

impl Radix {
    pub fn base(self) -> u32 {
        match self {
            Radix::Binary => 2,
            Radix::Octal => 8,
            Radix::Decimal => 10,
            Radix::Hexadecimal => 16,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Radix::Binary => "BINARY",
            Radix::Octal => "OCTAL",
            Radix::Decimal => "DECIMAL",
            Radix::Hexadecimal => "HEX",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    And,
    Or,
    Not,
    Xor,
    Log,
    Ln,
    Sqrt,
    Sin,
    Cos,
    Tan,
    Ctg,
    Factorial,
    Assign,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Star => "*",
            Operator::Slash => "/",
            Operator::Caret => "^",
            Operator::And => "and",
            Operator::Or => "or",
            Operator::Not => "not",
            Operator::Xor => "xor",
            Operator::Log => "log",
            Operator::Ln => "ln",
            Operator::Sqrt => "sqrt",
            Operator::Sin => "sin",
            Operator::Cos => "cos",
            Operator::Tan => "tan",
            Operator::Ctg => "ctg",
            Operator::Factorial => "factorial",
            Operator::Assign => "<-",
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct UnknownOperator;

impl FromStr for Operator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "+" => Operator::Plus,
            "-" => Operator::Minus,
            "*" => Operator::Star,
            "/" => Operator::Slash,
            "^" => Operator::Caret,
            "and" => Operator::And,
            "or" => Operator::Or,
            "not" => Operator::Not,
            "xor" => Operator::Xor,
            "log" => Operator::Log,
            "ln" => Operator::Ln,
            "sqrt" => Operator::Sqrt,
            "sin" => Operator::Sin,
            "cos" => Operator::Cos,
            "tan" => Operator::Tan,
            "ctg" => Operator::Ctg,
            "factorial" => Operator::Factorial,
            "<-" => Operator::Assign,
            _ => return Err(UnknownOperator),
        })
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'de> {
    pub kind: TokenKind,
    pub literal: &'de str,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    EndOfInput,
    OpenParen,
    CloseParen,
    Whitespace,
    Operator(Operator),
    Ident,
    Integer { value: i32, radix: Radix },
    Float(f64),
}

impl Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lit = self.literal;
        match self.kind {
            TokenKind::EndOfInput => write!(f, "EOF  null"),
            TokenKind::OpenParen => write!(f, "LEFT_PAREN {lit} null"),
            TokenKind::CloseParen => write!(f, "RIGHT_PAREN {lit} null"),
            TokenKind::Whitespace => write!(f, "WHITESPACE {lit:?} null"),
            TokenKind::Operator(_) => write!(f, "OPERATOR {lit} null"),
            TokenKind::Ident => write!(f, "IDENTIFIER {lit} null"),
            TokenKind::Integer { value, radix } => {
                write!(f, "{}_INTEGER {lit} {value}", radix.label())
            }
            TokenKind::Float(n) => {
                if n == n.trunc() {
                    write!(f, "FLOAT {lit} {n}.0")
                } else {
                    write!(f, "FLOAT {lit} {n}")
                }
            }
        }
    }
}

pub struct Lexer<'de> {
    reader: Reader<'de>,
    failed: bool,
}

impl<'de> Lexer<'de> {
    pub fn new(input: &'de str) -> Self {
        Lexer {
            reader: Reader::new(input),
            failed: false,
        }
    }

    pub fn whole(&self) -> &'de str {
        self.reader.line()
    }

    /// Produces the next token.
    ///
    /// Once the line is exhausted every further call yields
    /// [`TokenKind::EndOfInput`].
    pub fn next_token(&mut self) -> Result<Token<'de>, LexError> {
        let token = self.scan()?;
        tracing::trace!(kind = ?token.kind, offset = token.offset, "lexed token");
        Ok(token)
    }

    fn scan(&mut self) -> Result<Token<'de>, LexError> {
        let offset = self.reader.position();
        let Some(c) = self.reader.peek() else {
            return Ok(Token {
                kind: TokenKind::EndOfInput,
                literal: "",
                offset,
            });
        };

        match c {
            '(' => return Ok(self.take(TokenKind::OpenParen, c.len_utf8())),
            ')' => return Ok(self.take(TokenKind::CloseParen, c.len_utf8())),
            '0'..='9' => {
                // prefixed forms first, or `0x1F` would lex as `0` then `x1F`
                let radixes = [
                    (&*HEX, Radix::Hexadecimal),
                    (&*OCTAL, Radix::Octal),
                    (&*BINARY, Radix::Binary),
                ];
                for (pattern, radix) in radixes {
                    if let Some(literal) = self.reader.match_at(pattern) {
                        return self.integer(&literal[2..], literal.len(), radix);
                    }
                }
                if let Some(literal) = self.reader.match_at(&FLOAT) {
                    let Ok(n) = literal.parse::<f64>() else {
                        return Err(LexError::at(&self.reader, literal.len()));
                    };
                    return Ok(self.take(TokenKind::Float(n), literal.len()));
                }
                if let Some(literal) = self.reader.match_at(&DECIMAL) {
                    return self.integer(literal, literal.len(), Radix::Decimal);
                }
            }
            _ => {}
        }

        if let Some(literal) = self.reader.match_at(&WHITESPACE) {
            return Ok(self.take(TokenKind::Whitespace, literal.len()));
        }
        if let Some(literal) = self.reader.match_at(&OPERATOR) {
            let Ok(op) = literal.parse() else {
                return Err(LexError::at(&self.reader, literal.len()));
            };
            return Ok(self.take(TokenKind::Operator(op), literal.len()));
        }
        if let Some(literal) = self.reader.match_at(&IDENT) {
            return Ok(self.take(TokenKind::Ident, literal.len()));
        }

        Err(LexError::at(&self.reader, c.len_utf8()))
    }

    fn integer(
        &mut self,
        digits: &str,
        len: usize,
        radix: Radix,
    ) -> Result<Token<'de>, LexError> {
        // prefixed literals fill all 32 bits, so `0xFFFFFFFF` is -1
        let value = match radix {
            Radix::Decimal => digits.parse::<i32>().ok(),
            _ => u32::from_str_radix(digits, radix.base())
                .ok()
                .map(|n| n as i32),
        };
        match value {
            Some(value) => Ok(self.take(TokenKind::Integer { value, radix }, len)),
            None => Err(LexError::at(&self.reader, len)),
        }
    }

    fn take(&mut self, kind: TokenKind, len: usize) -> Token<'de> {
        let offset = self.reader.position();
        let literal = &self.reader.rest()[..len];
        self.reader.advance(len);
        Token {
            kind,
            literal,
            offset,
        }
    }
}

impl<'de> Iterator for Lexer<'de> {
    type Item = Result<Token<'de>, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_token() {
            Ok(Token {
                kind: TokenKind::EndOfInput,
                ..
            }) => None,
            Ok(token) => Some(Ok(token)),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .map(|token| token.map(|token| token.kind))
            .collect::<Result<_, _>>()
            .unwrap()
    }

    fn int(value: i32, radix: Radix) -> TokenKind {
        TokenKind::Integer { value, radix }
    }

    #[test]
    fn literals_in_every_radix() {
        assert_eq!(
            kinds("(23 + 0xF0 + 0o10 + 0b1101)"),
            vec![
                TokenKind::OpenParen,
                int(23, Radix::Decimal),
                TokenKind::Whitespace,
                TokenKind::Operator(Operator::Plus),
                TokenKind::Whitespace,
                int(240, Radix::Hexadecimal),
                TokenKind::Whitespace,
                TokenKind::Operator(Operator::Plus),
                TokenKind::Whitespace,
                int(8, Radix::Octal),
                TokenKind::Whitespace,
                TokenKind::Operator(Operator::Plus),
                TokenKind::Whitespace,
                int(13, Radix::Binary),
                TokenKind::CloseParen,
            ]
        );
    }

    #[test]
    fn float_wins_over_decimal() {
        assert_eq!(kinds("0.25"), vec![TokenKind::Float(0.25)]);
        assert_eq!(kinds("7."), vec![TokenKind::Float(7.0)]);
    }

    #[test]
    fn hex_fills_all_bits() {
        assert_eq!(kinds("0xFFFFFFFF"), vec![int(-1, Radix::Hexadecimal)]);
    }

    #[test]
    fn oversized_literals_fail_at_their_start() {
        let mut lexer = Lexer::new("1 + 0x100000000");
        for _ in 0..4 {
            lexer.next_token().unwrap();
        }
        assert_eq!(lexer.next_token().unwrap_err().position, 4);

        let err = Lexer::new("2147483648").next_token().unwrap_err();
        assert_eq!(err.position, 0);
    }

    #[test]
    fn keywords_before_identifiers() {
        assert_eq!(
            kinds("x <- factorial y1"),
            vec![
                TokenKind::Ident,
                TokenKind::Whitespace,
                TokenKind::Operator(Operator::Assign),
                TokenKind::Whitespace,
                TokenKind::Operator(Operator::Factorial),
                TokenKind::Whitespace,
                TokenKind::Ident,
            ]
        );
        assert_eq!(
            kinds("sqrt ln log"),
            vec![
                TokenKind::Operator(Operator::Sqrt),
                TokenKind::Whitespace,
                TokenKind::Operator(Operator::Ln),
                TokenKind::Whitespace,
                TokenKind::Operator(Operator::Log),
            ]
        );
    }

    #[test]
    fn whitespace_run_is_one_token() {
        let mut lexer = Lexer::new("1 \t  2");
        lexer.next_token().unwrap();
        let ws = lexer.next_token().unwrap();
        assert_eq!(ws.kind, TokenKind::Whitespace);
        assert_eq!(ws.literal, " \t  ");
    }

    #[test]
    fn end_of_input_repeats() {
        let mut lexer = Lexer::new("1");
        lexer.next_token().unwrap();
        for _ in 0..3 {
            assert_eq!(lexer.next_token().unwrap().kind, TokenKind::EndOfInput);
        }
    }

    #[test]
    fn unknown_character_is_an_error() {
        let mut lexer = Lexer::new("2 $ 3");
        lexer.next_token().unwrap();
        lexer.next_token().unwrap();
        let err = lexer.next_token().unwrap_err();
        assert_eq!(err.position, 2);
        assert_eq!(err.to_string(), "invalid input at 2");
    }

    #[test]
    fn iterator_stops_after_error() {
        let results: Vec<_> = Lexer::new("1 # 2").collect();
        assert_eq!(results.len(), 3);
        assert!(results[2].is_err());
    }

    #[test]
    fn tokens_display_like_a_listing() {
        let listing: Vec<String> = Lexer::new("0x10 2.5 x")
            .map(|token| token.unwrap().to_string())
            .collect();
        assert_eq!(
            listing,
            vec![
                "HEX_INTEGER 0x10 16",
                "WHITESPACE \" \" null",
                "FLOAT 2.5 2.5",
                "WHITESPACE \" \" null",
                "IDENTIFIER x null",
            ]
        );
    }
}
