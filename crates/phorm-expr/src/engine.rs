//! Tree-walking evaluation over bound form documents.

use std::collections::HashMap;

use phorm_core::document::FormDocument;
use phorm_core::value::FieldValue;

use crate::parser::parse;
use crate::types::{BinaryOp, Expr, ExprError, UnaryOp};

/// Evaluates expressions against a named set of bindings.
///
/// Bindings come in two shapes: whole documents (exposed by form id for
/// member access, `formA.qty`) and scalars (exposed by name, like the
/// `value` variable in visibility conditions). Nothing outside these
/// bindings is reachable from an expression.
#[derive(Debug, Default)]
pub struct Evaluator {
    documents: HashMap<String, FormDocument>,
    scalars: HashMap<String, FieldValue>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a form document under a name.
    pub fn bind_document(&mut self, name: impl Into<String>, document: FormDocument) -> &mut Self {
        self.documents.insert(name.into(), document);
        self
    }

    /// Binds a scalar variable under a name.
    pub fn bind_value(&mut self, name: impl Into<String>, value: FieldValue) -> &mut Self {
        self.scalars.insert(name.into(), value);
        self
    }

    /// Parses and evaluates `expression`, returning the typed result.
    pub fn evaluate(&self, expression: &str) -> Result<FieldValue, ExprError> {
        let expr = parse(expression)?;
        self.eval(&expr)
    }

    /// Evaluates `expression` and coerces the result to a boolean using
    /// truthiness (null/false/0/empty string are false).
    pub fn evaluate_bool(&self, expression: &str) -> Result<bool, ExprError> {
        Ok(self.evaluate(expression)?.is_truthy())
    }

    fn eval(&self, expr: &Expr) -> Result<FieldValue, ExprError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Var(name) => self
                .scalars
                .get(name)
                .cloned()
                .ok_or_else(|| ExprError::UnknownVariable(name.clone())),
            Expr::Member { object, field } => {
                let doc = self
                    .documents
                    .get(object)
                    .ok_or_else(|| ExprError::UnknownBinding(object.clone()))?;
                // A missing field evaluates to null; comparisons against
                // null are fine, arithmetic on it is a type error.
                Ok(doc.get(field).cloned().unwrap_or(FieldValue::Null))
            }
            Expr::Unary { op, operand } => {
                let value = self.eval(operand)?;
                match op {
                    UnaryOp::Not => Ok(FieldValue::Bool(!value.is_truthy())),
                    UnaryOp::Neg => match value {
                        FieldValue::Int(i) => {
                            i.checked_neg().map(FieldValue::Int).ok_or(ExprError::Overflow)
                        }
                        FieldValue::Float(f) => Ok(FieldValue::Float(-f)),
                        other => Err(ExprError::Type(format!("cannot negate {other:?}"))),
                    },
                }
            }
            Expr::Binary { op, lhs, rhs } => self.eval_binary(*op, lhs, rhs),
        }
    }

    fn eval_binary(&self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Result<FieldValue, ExprError> {
        // Short-circuiting logic first.
        match op {
            BinaryOp::And => {
                if !self.eval(lhs)?.is_truthy() {
                    return Ok(FieldValue::Bool(false));
                }
                return Ok(FieldValue::Bool(self.eval(rhs)?.is_truthy()));
            }
            BinaryOp::Or => {
                if self.eval(lhs)?.is_truthy() {
                    return Ok(FieldValue::Bool(true));
                }
                return Ok(FieldValue::Bool(self.eval(rhs)?.is_truthy()));
            }
            _ => {}
        }

        let left = self.eval(lhs)?;
        let right = self.eval(rhs)?;

        match op {
            BinaryOp::Add => add(&left, &right),
            BinaryOp::Sub => arith(&left, &right, "-", |a, b| a.checked_sub(b), |a, b| a - b),
            BinaryOp::Mul => arith(&left, &right, "*", |a, b| a.checked_mul(b), |a, b| a * b),
            BinaryOp::Rem => rem(&left, &right),
            BinaryOp::Div => div(&left, &right),
            BinaryOp::Eq => Ok(FieldValue::Bool(loose_eq(&left, &right))),
            BinaryOp::Ne => Ok(FieldValue::Bool(!loose_eq(&left, &right))),
            BinaryOp::Lt => compare(&left, &right, |o| o == std::cmp::Ordering::Less),
            BinaryOp::Le => compare(&left, &right, |o| o != std::cmp::Ordering::Greater),
            BinaryOp::Gt => compare(&left, &right, |o| o == std::cmp::Ordering::Greater),
            BinaryOp::Ge => compare(&left, &right, |o| o != std::cmp::Ordering::Less),
            BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
        }
    }
}

/// `+` concatenates when either side is text, otherwise adds numerically.
fn add(left: &FieldValue, right: &FieldValue) -> Result<FieldValue, ExprError> {
    if matches!(left, FieldValue::Text(_)) || matches!(right, FieldValue::Text(_)) {
        return Ok(FieldValue::Text(format!("{left}{right}")));
    }
    arith(left, right, "+", |a, b| a.checked_add(b), |a, b| a + b)
}

/// Integer arithmetic stays integer (checked); anything involving a float
/// goes through f64 and is re-normalized.
fn arith(
    left: &FieldValue,
    right: &FieldValue,
    symbol: &str,
    int_op: impl Fn(i64, i64) -> Option<i64>,
    float_op: impl Fn(f64, f64) -> f64,
) -> Result<FieldValue, ExprError> {
    match (left, right) {
        (FieldValue::Int(a), FieldValue::Int(b)) => {
            int_op(*a, *b).map(FieldValue::Int).ok_or(ExprError::Overflow)
        }
        _ => {
            let (a, b) = numeric_pair(left, right, symbol)?;
            Ok(FieldValue::from_f64(float_op(a, b)))
        }
    }
}

fn div(left: &FieldValue, right: &FieldValue) -> Result<FieldValue, ExprError> {
    let (a, b) = numeric_pair(left, right, "/")?;
    if b == 0.0 {
        return Err(ExprError::DivisionByZero);
    }
    Ok(FieldValue::from_f64(a / b))
}

fn rem(left: &FieldValue, right: &FieldValue) -> Result<FieldValue, ExprError> {
    match (left, right) {
        (FieldValue::Int(_), FieldValue::Int(0)) => Err(ExprError::DivisionByZero),
        (FieldValue::Int(a), FieldValue::Int(b)) => {
            a.checked_rem(*b).map(FieldValue::Int).ok_or(ExprError::Overflow)
        }
        _ => {
            let (a, b) = numeric_pair(left, right, "%")?;
            if b == 0.0 {
                return Err(ExprError::DivisionByZero);
            }
            Ok(FieldValue::from_f64(a % b))
        }
    }
}

fn numeric_pair(
    left: &FieldValue,
    right: &FieldValue,
    symbol: &str,
) -> Result<(f64, f64), ExprError> {
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(ExprError::Type(format!(
            "cannot apply '{symbol}' to {left:?} and {right:?}"
        ))),
    }
}

/// Equality: numeric values compare across Int/Float; otherwise values of
/// different types are unequal. Null equals only null.
fn loose_eq(left: &FieldValue, right: &FieldValue) -> bool {
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => left == right,
    }
}

fn compare(
    left: &FieldValue,
    right: &FieldValue,
    accept: impl Fn(std::cmp::Ordering) -> bool,
) -> Result<FieldValue, ExprError> {
    let ordering = match (left, right) {
        (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
        _ => {
            let (a, b) = numeric_pair(left, right, "<")?;
            a.partial_cmp(&b)
                .ok_or_else(|| ExprError::Type("cannot order NaN".into()))?
        }
    };
    Ok(FieldValue::Bool(accept(ordering)))
}
