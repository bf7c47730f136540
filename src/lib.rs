//! Line calculator: integer and float arithmetic, bitwise operators, unary
//! functions and session variables.
//!
//! ```
//! use calculator::{Environment, evaluate, parse};
//!
//! let mut env = Environment::new();
//! evaluate(&parse("x <- 42").unwrap(), &mut env).unwrap();
//! let half = evaluate(&parse("x / 2").unwrap(), &mut env).unwrap();
//! assert_eq!(half.to_string(), "21");
//! ```

use std::sync::Once;

pub mod eval;
pub mod lex;
pub mod ops;
pub mod parse;
pub mod read;

pub use eval::{Environment, EvalFailure, Value, ValueKind, evaluate};
pub use lex::{LexError, Lexer, Token, TokenKind};
pub use parse::{Expr, Expression, ParseError, Parser, parse};

static TRACING_INIT: Once = Once::new();

/// Installs a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Does nothing when `RUST_LOG` is unset. Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}
