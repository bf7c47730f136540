use std::{collections::HashMap, fmt::Display};

use miette::Diagnostic;
use thiserror::Error;

use crate::parse::{Expr, Expression};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Integer(i32),
    Float(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Integer,
    Float,
}

impl Value {
    pub fn kind(self) -> ValueKind {
        match self {
            Value::Integer(_) => ValueKind::Integer,
            Value::Float(_) => ValueKind::Float,
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Value::Integer(n) => f64::from(n),
            Value::Float(n) => n,
        }
    }

    /// Integer `0`, or a float equal to `0.0` (either sign).
    pub fn is_zero(self) -> bool {
        match self {
            Value::Integer(n) => n == 0,
            Value::Float(n) => n == 0.0,
        }
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
        }
    }
}

impl Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueKind::Integer => f.write_str("integer"),
            ValueKind::Float => f.write_str("float"),
        }
    }
}

/// Why evaluating an expression failed, optionally with the failure that led to it.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
#[error("{reason}")]
pub struct EvalFailure {
    pub reason: String,

    #[source]
    pub cause: Option<Box<EvalFailure>>,
}

impl EvalFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        EvalFailure {
            reason: reason.into(),
            cause: None,
        }
    }

    pub fn caused_by(reason: impl Into<String>, cause: EvalFailure) -> Self {
        EvalFailure {
            reason: reason.into(),
            cause: Some(Box::new(cause)),
        }
    }

    /// This failure followed by each nested cause.
    pub fn chain(&self) -> impl Iterator<Item = &EvalFailure> {
        std::iter::successors(Some(self), |failure| failure.cause.as_deref())
    }

    pub fn root_cause(&self) -> &EvalFailure {
        self.chain().last().unwrap_or(self)
    }
}

/// Conversion out of a stored [`Value`] for typed variable access.
pub trait FromValue: Sized {
    const EXPECTED: &'static str;

    fn from_value(value: Value) -> Option<Self>;
}

impl FromValue for Value {
    const EXPECTED: &'static str = "number";

    fn from_value(value: Value) -> Option<Self> {
        Some(value)
    }
}

impl FromValue for i32 {
    const EXPECTED: &'static str = "integer";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Integer(n) => Some(n),
            Value::Float(_) => None,
        }
    }
}

impl FromValue for f64 {
    const EXPECTED: &'static str = "float";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Float(n) => Some(n),
            Value::Integer(_) => None,
        }
    }
}

/// Variables of one session.
#[derive(Debug, Default, Clone)]
pub struct Environment {
    variables: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.variables.get(name).copied()
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn fetch<T: FromValue>(&self, name: &str) -> Result<T, EvalFailure> {
        let Some(value) = self.get(name) else {
            return Err(EvalFailure::new("variable does not exist"));
        };
        T::from_value(value).ok_or_else(|| {
            EvalFailure::caused_by(
                "variable is not of expected type",
                EvalFailure::new(format!(
                    "`{name}` holds a {}, expected {}",
                    value.kind(),
                    T::EXPECTED
                )),
            )
        })
    }
}

impl Expr {
    /// Evaluates children left to right and stops at the first failure.
    pub fn evaluate(&self, env: &mut Environment) -> Result<Value, EvalFailure> {
        match self {
            Expr::Literal(value) => Ok(*value),
            Expr::Variable(name) => env.fetch::<Value>(name),
            Expr::Unary { op, operand } => {
                let operand = operand.evaluate(env)?;
                op.apply(operand)
            }
            Expr::Binary { op, left, right } => {
                let left = left.evaluate(env)?;
                let right = right.evaluate(env)?;
                op.apply(left, right)
            }
            Expr::Assign { name, value } => {
                let value = value.evaluate(env)?;
                env.set(name.as_str(), value);
                Ok(value)
            }
        }
    }
}

impl Expression {
    pub fn evaluate(&self, env: &mut Environment) -> Result<Value, EvalFailure> {
        self.root().evaluate(env)
    }

    /// Evaluates and renders the result the way the calculator prints it.
    pub fn render(&self, env: &mut Environment) -> Result<String, EvalFailure> {
        self.evaluate(env).map(|value| value.to_string())
    }
}

#[tracing::instrument(level = "debug", skip_all, fields(expression = %expression))]
pub fn evaluate(expression: &Expression, env: &mut Environment) -> Result<Value, EvalFailure> {
    let result = expression.evaluate(env);
    match &result {
        Ok(value) => tracing::debug!(%value, "evaluated"),
        Err(failure) => tracing::debug!(reason = %failure.reason, "evaluation failed"),
    }
    result
}
