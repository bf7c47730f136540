//! Operators and functions of the calculator.
//!
//! Integer operands stay integers and are checked for overflow. As soon as a
//! float is involved the result is a float, computed with plain IEEE
//! arithmetic.

use std::fmt::Display;

use crate::eval::{EvalFailure, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    And,
    Or,
    Xor,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Power => "^",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Xor => "xor",
        }
    }

    pub fn apply(self, left: Value, right: Value) -> Result<Value, EvalFailure> {
        match self {
            BinaryOp::Add => add(left, right),
            BinaryOp::Subtract => subtract(left, right),
            BinaryOp::Multiply => multiply(left, right),
            BinaryOp::Divide => divide(left, right),
            BinaryOp::Power => power(left, right),
            BinaryOp::And => and(left, right),
            BinaryOp::Or => or(left, right),
            BinaryOp::Xor => xor(left, right),
        }
    }
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
    Factorial,
    Log,
    Ln,
    Sqrt,
    Sin,
    Cos,
    Tan,
    Ctg,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Negate => "-",
            UnaryOp::Not => "not",
            UnaryOp::Factorial => "factorial",
            UnaryOp::Log => "log",
            UnaryOp::Ln => "ln",
            UnaryOp::Sqrt => "sqrt",
            UnaryOp::Sin => "sin",
            UnaryOp::Cos => "cos",
            UnaryOp::Tan => "tan",
            UnaryOp::Ctg => "ctg",
        }
    }

    pub fn apply(self, operand: Value) -> Result<Value, EvalFailure> {
        match self {
            UnaryOp::Negate => negate(operand),
            UnaryOp::Not => not(operand),
            UnaryOp::Factorial => factorial(operand),
            UnaryOp::Log => log(operand),
            UnaryOp::Ln => ln(operand),
            UnaryOp::Sqrt => sqrt(operand),
            UnaryOp::Sin => sin(operand),
            UnaryOp::Cos => cos(operand),
            UnaryOp::Tan => tan(operand),
            UnaryOp::Ctg => ctg(operand),
        }
    }
}

impl Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

fn checked(result: Option<i32>) -> Result<Value, EvalFailure> {
    result
        .map(Value::Integer)
        .ok_or_else(|| EvalFailure::new("overflow"))
}

pub fn add(left: Value, right: Value) -> Result<Value, EvalFailure> {
    match (left, right) {
        (Value::Integer(l), Value::Integer(r)) => checked(l.checked_add(r)),
        (l, r) => Ok(Value::Float(l.as_f64() + r.as_f64())),
    }
}

pub fn subtract(left: Value, right: Value) -> Result<Value, EvalFailure> {
    match (left, right) {
        (Value::Integer(l), Value::Integer(r)) => checked(l.checked_sub(r)),
        (l, r) => Ok(Value::Float(l.as_f64() - r.as_f64())),
    }
}

pub fn multiply(left: Value, right: Value) -> Result<Value, EvalFailure> {
    match (left, right) {
        (Value::Integer(l), Value::Integer(r)) => checked(l.checked_mul(r)),
        (l, r) => Ok(Value::Float(l.as_f64() * r.as_f64())),
    }
}

pub fn divide(left: Value, right: Value) -> Result<Value, EvalFailure> {
    if right.is_zero() {
        return Err(EvalFailure::new("cannot divide by 0"));
    }
    match (left, right) {
        // i32::MIN / -1 is the only overflowing case
        (Value::Integer(l), Value::Integer(r)) => checked(l.checked_div(r)),
        (l, r) => Ok(Value::Float(l.as_f64() / r.as_f64())),
    }
}

/// Integer powers go through `f64::powf` and are truncated back to `i32`.
/// Results outside the `i32` range saturate instead of reporting overflow.
pub fn power(base: Value, exponent: Value) -> Result<Value, EvalFailure> {
    match (base, exponent) {
        (Value::Integer(b), Value::Integer(e)) => {
            Ok(Value::Integer(f64::from(b).powf(f64::from(e)) as i32))
        }
        (b, e) => Ok(Value::Float(b.as_f64().powf(e.as_f64()))),
    }
}

fn bitwise(
    symbol: &str,
    left: Value,
    right: Value,
    op: impl FnOnce(i32, i32) -> i32,
) -> Result<Value, EvalFailure> {
    match (left, right) {
        (Value::Integer(l), Value::Integer(r)) => Ok(Value::Integer(op(l, r))),
        _ => Err(EvalFailure::new(format!(
            "one of the inputs to the operator '{symbol}' is not an integer"
        ))),
    }
}

pub fn and(left: Value, right: Value) -> Result<Value, EvalFailure> {
    bitwise("and", left, right, |l, r| l & r)
}

pub fn or(left: Value, right: Value) -> Result<Value, EvalFailure> {
    bitwise("or", left, right, |l, r| l | r)
}

pub fn xor(left: Value, right: Value) -> Result<Value, EvalFailure> {
    bitwise("xor", left, right, |l, r| l ^ r)
}

pub fn negate(operand: Value) -> Result<Value, EvalFailure> {
    match operand {
        Value::Integer(x) => checked(x.checked_neg()),
        Value::Float(x) => Ok(Value::Float(-x)),
    }
}

pub fn not(operand: Value) -> Result<Value, EvalFailure> {
    match operand {
        Value::Integer(x) => Ok(Value::Integer(!x)),
        Value::Float(_) => Err(EvalFailure::new(
            "the input to the operator 'not' is not an integer",
        )),
    }
}

pub fn factorial(operand: Value) -> Result<Value, EvalFailure> {
    match operand {
        Value::Integer(n) if n < 0 => Err(EvalFailure::new("the input to factorial is negative")),
        Value::Integer(n) => (1..=n)
            .try_fold(1i32, |acc, i| acc.checked_mul(i))
            .map(Value::Integer)
            .ok_or_else(|| EvalFailure::new("factorial overflowed")),
        Value::Float(_) => Err(EvalFailure::new("the input to factorial is not an integer")),
    }
}

/// Functions defined only for non-negative input.
fn non_negative(name: &str, operand: Value, f: fn(f64) -> f64) -> Result<Value, EvalFailure> {
    let x = operand.as_f64();
    if x < 0.0 {
        return Err(EvalFailure::new(format!("the input to {name} is negative")));
    }
    Ok(Value::Float(f(x)))
}

pub fn log(operand: Value) -> Result<Value, EvalFailure> {
    non_negative("log", operand, f64::log10)
}

pub fn ln(operand: Value) -> Result<Value, EvalFailure> {
    non_negative("ln", operand, f64::ln)
}

pub fn sqrt(operand: Value) -> Result<Value, EvalFailure> {
    non_negative("sqrt", operand, f64::sqrt)
}

pub fn sin(operand: Value) -> Result<Value, EvalFailure> {
    Ok(Value::Float(operand.as_f64().sin()))
}

pub fn cos(operand: Value) -> Result<Value, EvalFailure> {
    Ok(Value::Float(operand.as_f64().cos()))
}

pub fn tan(operand: Value) -> Result<Value, EvalFailure> {
    Ok(Value::Float(operand.as_f64().tan()))
}

pub fn ctg(operand: Value) -> Result<Value, EvalFailure> {
    let tan = operand.as_f64().tan();
    if tan == 0.0 {
        return Err(EvalFailure::new("not defined"));
    }
    Ok(Value::Float(1.0 / tan))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const MAX: Value = Value::Integer(i32::MAX);
    const MIN: Value = Value::Integer(i32::MIN);

    fn int(x: i32) -> Value {
        Value::Integer(x)
    }

    fn float(x: f64) -> Value {
        Value::Float(x)
    }

    fn reason(result: Result<Value, EvalFailure>) -> String {
        result.unwrap_err().reason
    }

    #[test]
    fn integers_stay_integers() {
        assert_eq!(add(int(2), int(3)), Ok(int(5)));
        assert_eq!(subtract(int(2), int(3)), Ok(int(-1)));
        assert_eq!(multiply(int(-4), int(3)), Ok(int(-12)));
        assert_eq!(divide(int(7), int(2)), Ok(int(3)));
        assert_eq!(divide(int(-7), int(2)), Ok(int(-3)));
    }

    #[test]
    fn floats_promote() {
        assert_eq!(add(int(1), float(0.5)), Ok(float(1.5)));
        assert_eq!(multiply(float(0.5), int(4)), Ok(float(2.0)));
        assert_eq!(divide(int(1), float(4.0)), Ok(float(0.25)));
        assert_eq!(subtract(float(0.5), float(0.25)), Ok(float(0.25)));
    }

    #[test]
    fn integer_overflow_is_reported() {
        assert_eq!(reason(add(MAX, int(1))), "overflow");
        assert_eq!(reason(subtract(MIN, int(1))), "overflow");
        assert_eq!(reason(multiply(MAX, int(2))), "overflow");
        assert_eq!(reason(divide(MIN, int(-1))), "overflow");
        assert_eq!(reason(negate(MIN)), "overflow");
    }

    #[test]
    fn float_overflow_saturates() {
        assert_eq!(multiply(float(f64::MAX), int(2)), Ok(float(f64::INFINITY)));
    }

    #[test]
    fn division_by_any_zero() {
        assert_eq!(reason(divide(int(2), int(0))), "cannot divide by 0");
        assert_eq!(reason(divide(float(2.0), float(0.0))), "cannot divide by 0");
        assert_eq!(reason(divide(float(2.0), float(-0.0))), "cannot divide by 0");
        assert_eq!(reason(divide(int(2), float(0.0))), "cannot divide by 0");
    }

    #[test]
    fn power_truncates_integer_results() {
        assert_eq!(power(int(10), int(4)), Ok(int(10000)));
        assert_eq!(power(int(2), int(-1)), Ok(int(0)));
        assert_eq!(power(int(2), int(40)), Ok(int(i32::MAX)));
        assert_eq!(power(float(4.0), float(0.5)), Ok(float(2.0)));
        assert_eq!(power(int(2), float(3.0)), Ok(float(8.0)));
    }

    #[test]
    fn bitwise_needs_integers() {
        assert_eq!(and(int(0b1100), int(0b1010)), Ok(int(0b1000)));
        assert_eq!(or(int(0b00010), int(0b11011)), Ok(int(27)));
        assert_eq!(xor(int(0b1100), int(0b1010)), Ok(int(0b0110)));
        assert_eq!(not(int(0)), Ok(int(-1)));
        assert_eq!(
            reason(and(int(1), float(1.0))),
            "one of the inputs to the operator 'and' is not an integer"
        );
        assert_eq!(
            reason(xor(float(1.0), int(1))),
            "one of the inputs to the operator 'xor' is not an integer"
        );
        assert_eq!(
            reason(not(float(1.0))),
            "the input to the operator 'not' is not an integer"
        );
    }

    #[test]
    fn factorial_rules() {
        assert_eq!(factorial(int(0)), Ok(int(1)));
        assert_eq!(factorial(int(5)), Ok(int(120)));
        assert_eq!(factorial(int(12)), Ok(int(479001600)));
        assert_eq!(reason(factorial(int(13))), "factorial overflowed");
        assert_eq!(reason(factorial(int(-1))), "the input to factorial is negative");
        assert_eq!(
            reason(factorial(float(3.0))),
            "the input to factorial is not an integer"
        );
    }

    #[test]
    fn logarithms_and_roots() {
        assert_eq!(log(int(1000)), Ok(float(3.0)));
        assert_eq!(ln(int(1000)), Ok(float(6.907755278982137)));
        assert_eq!(sqrt(int(4)), Ok(float(2.0)));
        assert_eq!(sqrt(float(2.25)), Ok(float(1.5)));
        assert_eq!(reason(log(int(-1))), "the input to log is negative");
        assert_eq!(reason(ln(float(-0.5))), "the input to ln is negative");
        assert_eq!(reason(sqrt(int(-4))), "the input to sqrt is negative");
    }

    #[test]
    fn trigonometry() {
        assert_eq!(sin(int(0)), Ok(float(0.0)));
        assert_eq!(cos(int(0)), Ok(float(1.0)));
        assert_eq!(tan(int(0)), Ok(float(0.0)));
        assert_eq!(reason(ctg(int(0))), "not defined");
        assert_eq!(ctg(float(1.0)), Ok(float(1.0 / 1f64.tan())));
    }

    #[test]
    fn dispatch_by_operator() {
        assert_eq!(BinaryOp::Xor.apply(int(6), int(3)), Ok(int(5)));
        assert_eq!(UnaryOp::Negate.apply(float(1.5)), Ok(float(-1.5)));
        assert_eq!(BinaryOp::Power.to_string(), "^");
        assert_eq!(UnaryOp::Factorial.to_string(), "factorial");
    }
}
