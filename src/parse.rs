use std::fmt::Display;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::{
    Lexer,
    eval::Value,
    lex::{LexError, Operator, Token, TokenKind},
    ops::{BinaryOp, UnaryOp},
};

#[derive(Error, Debug, Diagnostic)]
#[error("{reason}")]
pub struct ParseError {
    pub reason: String,

    #[source]
    pub lex: Option<LexError>,

    #[source_code]
    src: NamedSource<String>,

    #[label("here")]
    span: Option<SourceSpan>,
}

impl ParseError {
    fn at(whole: &str, token: &Token<'_>, reason: impl Into<String>) -> Self {
        ParseError {
            reason: reason.into(),
            lex: None,
            src: NamedSource::new("<input>", whole.to_string()),
            span: Some(SourceSpan::from(
                token.offset..token.offset + token.literal.len(),
            )),
        }
    }

    fn lexing(whole: &str, error: LexError) -> Self {
        ParseError {
            reason: format!("invalid input at {}", error.position),
            src: NamedSource::new("<input>", whole.to_string()),
            span: Some(SourceSpan::from(error.position..error.position)),
            lex: Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Variable(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Assign {
        name: String,
        value: Box<Expr>,
    },
}

impl Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Literal(value) => write!(f, "{value}"),
            Expr::Variable(name) => write!(f, "{name}"),
            Expr::Unary { op, operand } => write!(f, "({op} {operand})"),
            Expr::Binary { op, left, right } => write!(f, "({op} {left} {right})"),
            Expr::Assign { name, value } => write!(f, "(<- {name} {value})"),
        }
    }
}

/// A parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    root: Expr,
}

impl Expression {
    pub fn new(root: Expr) -> Self {
        Expression { root }
    }

    pub fn root(&self) -> &Expr {
        &self.root
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.root.fmt(f)
    }
}

/// Recursive-descent parser over the fully lexed line.
///
/// ```text
/// expression     := assignment
/// assignment     := ident "<-" additive | additive
/// additive       := multiplicative (("+" | "-" | "and" | "xor") additive)?
/// multiplicative := power (("*" | "/" | "or") multiplicative)?
/// power          := unary ("^" power)?
/// unary          := unary_op? primary
/// primary        := "(" expression ")" | ident | integer | float
/// ```
///
/// Every binary level recurses on its right-hand side, so `3 + 2 - 1` groups
/// as `3 + (2 - 1)`. Whitespace tokens are skipped wherever they appear.
pub struct Parser<'de> {
    lexer: Lexer<'de>,
    tokens: Vec<Token<'de>>,
    pos: usize,
}

impl<'de> Parser<'de> {
    pub fn new(whole: &'de str) -> Self {
        Self::from_lexer(Lexer::new(whole))
    }

    pub fn from_lexer(lexer: Lexer<'de>) -> Self {
        Parser {
            lexer,
            tokens: Vec::new(),
            pos: 0,
        }
    }

    pub fn parse(mut self) -> Result<Expression, ParseError> {
        self.drain()?;

        let root = self.expression()?;
        self.skip_whitespace();
        let rest = self.peek();
        if rest.kind != TokenKind::EndOfInput {
            return Err(self.error(&rest, "input left"));
        }

        tracing::debug!(tree = %root, "parsed");
        Ok(Expression::new(root))
    }

    fn drain(&mut self) -> Result<(), ParseError> {
        let whole = self.lexer.whole();
        loop {
            let token = self
                .lexer
                .next_token()
                .map_err(|e| ParseError::lexing(whole, e))?;
            self.tokens.push(token);
            if token.kind == TokenKind::EndOfInput {
                return Ok(());
            }
        }
    }

    fn peek(&self) -> Token<'de> {
        self.tokens.get(self.pos).copied().unwrap_or(Token {
            kind: TokenKind::EndOfInput,
            literal: "",
            offset: self.lexer.whole().len(),
        })
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn skip_whitespace(&mut self) {
        while self.peek().kind == TokenKind::Whitespace {
            self.bump();
        }
    }

    fn error(&self, token: &Token<'_>, reason: impl Into<String>) -> ParseError {
        ParseError::at(self.lexer.whole(), token, reason)
    }

    fn expression(&mut self) -> Result<Expr, ParseError> {
        self.skip_whitespace();
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr, ParseError> {
        let start = self.pos;
        let target = self.peek();
        if target.kind == TokenKind::Ident {
            self.bump();
            self.skip_whitespace();
            if self.peek().kind == TokenKind::Operator(Operator::Assign) {
                self.bump();
                self.skip_whitespace();
                let value = self.additive()?;
                return Ok(Expr::Assign {
                    name: target.literal.to_string(),
                    value: Box::new(value),
                });
            }
            self.pos = start;
        }
        self.additive()
    }

    fn additive(&mut self) -> Result<Expr, ParseError> {
        let left = self.multiplicative()?;
        self.skip_whitespace();
        let op = match self.peek().kind {
            TokenKind::Operator(Operator::Plus) => BinaryOp::Add,
            TokenKind::Operator(Operator::Minus) => BinaryOp::Subtract,
            TokenKind::Operator(Operator::And) => BinaryOp::And,
            TokenKind::Operator(Operator::Xor) => BinaryOp::Xor,
            _ => return Ok(left),
        };
        self.bump();
        self.skip_whitespace();
        let right = self.additive()?;
        Ok(Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn multiplicative(&mut self) -> Result<Expr, ParseError> {
        let left = self.power()?;
        self.skip_whitespace();
        let op = match self.peek().kind {
            TokenKind::Operator(Operator::Star) => BinaryOp::Multiply,
            TokenKind::Operator(Operator::Slash) => BinaryOp::Divide,
            TokenKind::Operator(Operator::Or) => BinaryOp::Or,
            _ => return Ok(left),
        };
        self.bump();
        self.skip_whitespace();
        let right = self.multiplicative()?;
        Ok(Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn power(&mut self) -> Result<Expr, ParseError> {
        let base = self.unary()?;
        self.skip_whitespace();
        if self.peek().kind != TokenKind::Operator(Operator::Caret) {
            return Ok(base);
        }
        self.bump();
        self.skip_whitespace();
        let exponent = self.power()?;
        Ok(Expr::Binary {
            op: BinaryOp::Power,
            left: Box::new(base),
            right: Box::new(exponent),
        })
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        self.skip_whitespace();
        let token = self.peek();
        let TokenKind::Operator(operator) = token.kind else {
            return self.primary();
        };
        let op = match operator {
            Operator::Minus => UnaryOp::Negate,
            Operator::Not => UnaryOp::Not,
            Operator::Factorial => UnaryOp::Factorial,
            Operator::Log => UnaryOp::Log,
            Operator::Ln => UnaryOp::Ln,
            Operator::Sqrt => UnaryOp::Sqrt,
            Operator::Sin => UnaryOp::Sin,
            Operator::Cos => UnaryOp::Cos,
            Operator::Tan => UnaryOp::Tan,
            Operator::Ctg => UnaryOp::Ctg,
            _ => return Err(self.error(&token, format!("unexpected operator '{operator}'"))),
        };
        self.bump();
        self.skip_whitespace();
        let operand = self.primary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        self.skip_whitespace();
        let token = self.peek();
        let expr = match token.kind {
            TokenKind::OpenParen => {
                self.bump();
                let inner = self.expression()?;
                self.skip_whitespace();
                let close = self.peek();
                if close.kind != TokenKind::CloseParen {
                    return Err(self.error(&close, "expected ')'"));
                }
                inner
            }
            TokenKind::Ident => Expr::Variable(token.literal.to_string()),
            TokenKind::Integer { value, .. } => Expr::Literal(Value::Integer(value)),
            TokenKind::Float(n) => Expr::Literal(Value::Float(n)),
            TokenKind::EndOfInput => {
                return Err(self.error(&token, "unexpected end of input"));
            }
            TokenKind::CloseParen | TokenKind::Whitespace | TokenKind::Operator(_) => {
                return Err(self.error(&token, "not a literal expression"));
            }
        };
        self.bump();
        Ok(expr)
    }
}

pub fn parse(line: &str) -> Result<Expression, ParseError> {
    Parser::new(line).parse()
}
