use crate::ast::{Assignment, BinaryOp, Expr, ExprKind, Item, Program};
use crate::environment::Environment;
use crate::error::{CfglError, EvalError};
use crate::value::{Mapping, Value};
use miette::NamedSource;
use std::sync::Arc;

/// Reduces a parsed [`Program`] to a [`Value`].
///
/// Constants are bound into [`Evaluator::environment`] as their declarations
/// are reached, so a name can only refer to something declared above it.
pub struct Evaluator {
    source: Arc<NamedSource<String>>,
    pub environment: Environment,
}

impl Evaluator {
    pub fn new(source_text: &str) -> Self {
        Self::new_with_name(source_text, "source.cfgl".to_string())
    }

    pub fn new_with_name(source_text: &str, name: String) -> Self {
        Evaluator {
            source: Arc::new(NamedSource::new(name, source_text.to_string())),
            environment: Environment::new(),
        }
    }

    /// Evaluates every item in order. One top-level value is returned as is,
    /// several are collected into a list, and none yields an empty mapping.
    ///
    /// # Errors
    /// Returns a `CfglError::Eval` for the first item that fails; nothing is
    /// returned for the items before it.
    pub fn evaluate(&mut self, program: &Program) -> Result<Value, CfglError> {
        let mut emitted = Vec::new();
        for item in &program.items {
            match item {
                Item::Constant(decl) => {
                    let value = self.eval_expr(&decl.value)?;
                    log::trace!("constant {} <- {}", decl.name, value);
                    if self.environment.bind(decl.name.clone(), value).is_some() {
                        log::debug!("constant '{}' redeclared", decl.name);
                    }
                }
                Item::Value(expr) => {
                    let value = self.eval_expr(expr)?;
                    log::trace!("top-level value #{}: {}", emitted.len(), value);
                    emitted.push(value);
                }
            }
        }

        let result = match emitted.len() {
            0 => Value::Mapping(Mapping::new()),
            1 => emitted.remove(0),
            _ => Value::List(emitted),
        };
        log::debug!(
            "evaluated {} items into {}",
            program.items.len(),
            result.kind_name()
        );
        Ok(result)
    }

    fn eval_expr(&self, expr: &Expr) -> Result<Value, EvalError> {
        match &expr.kind {
            ExprKind::Number(n) => Ok(Value::Integer(*n)),
            ExprKind::String(raw) => Ok(Value::Text(strip_string_delimiters(raw).to_string())),
            ExprKind::Name(name) => self
                .environment
                .lookup(name)
                .cloned()
                .ok_or_else(|| EvalError::UndefinedConstant {
                    src: (*self.source).clone(),
                    span: expr.span().into(),
                    name: name.clone(),
                }),
            ExprKind::Array(elements) => elements
                .iter()
                .map(|element| self.eval_expr(element))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            ExprKind::Dict(entries) => self.eval_dict(entries),
            ExprKind::Binary { op, left, right } => self.eval_binary(*op, expr, left, right),
            ExprKind::Len(operand) => self.eval_len(operand),
        }
    }

    fn eval_dict(&self, entries: &[Assignment]) -> Result<Value, EvalError> {
        let mut map = Mapping::new();
        for entry in entries {
            let value = self.eval_expr(&entry.value)?;
            if map.insert(entry.key.clone(), value).is_some() {
                log::debug!("key '{}' assigned twice, keeping the later value", entry.key);
            }
        }
        Ok(Value::Mapping(map))
    }

    fn eval_binary(
        &self,
        op: BinaryOp,
        whole: &Expr,
        left: &Expr,
        right: &Expr,
    ) -> Result<Value, EvalError> {
        let lhs = self.eval_integer_operand(op, left)?;
        let rhs = self.eval_integer_operand(op, right)?;

        let result = match op {
            BinaryOp::Add => lhs.checked_add(rhs),
            BinaryOp::Sub => lhs.checked_sub(rhs),
            BinaryOp::Mul => lhs.checked_mul(rhs),
            BinaryOp::Div => {
                if rhs == 0 {
                    return Err(EvalError::DivisionByZero {
                        src: (*self.source).clone(),
                        span: right.span().into(),
                    });
                }
                lhs.checked_div(rhs)
            }
        };

        result
            .map(Value::Integer)
            .ok_or_else(|| EvalError::Overflow {
                src: (*self.source).clone(),
                span: whole.span().into(),
                operation: format!("'{}'", op.symbol()),
            })
    }

    fn eval_integer_operand(&self, op: BinaryOp, operand: &Expr) -> Result<i64, EvalError> {
        match self.eval_expr(operand)? {
            Value::Integer(n) => Ok(n),
            other => Err(self.type_mismatch(
                format!("'{}'", op.symbol()),
                "an integer",
                &other,
                operand,
            )),
        }
    }

    fn eval_len(&self, operand: &Expr) -> Result<Value, EvalError> {
        let count = match self.eval_expr(operand)? {
            Value::Text(s) => s.chars().count(),
            Value::List(items) => items.len(),
            Value::Mapping(map) => map.len(),
            other @ Value::Integer(_) => {
                return Err(self.type_mismatch(
                    "'len'".to_string(),
                    "a string, array or dict",
                    &other,
                    operand,
                ))
            }
        };
        i64::try_from(count)
            .map(Value::Integer)
            .map_err(|_| EvalError::Overflow {
                src: (*self.source).clone(),
                span: operand.span().into(),
                operation: "'len'".to_string(),
            })
    }

    fn type_mismatch(
        &self,
        operation: String,
        expected: &str,
        found: &Value,
        at: &Expr,
    ) -> EvalError {
        EvalError::TypeMismatch {
            src: (*self.source).clone(),
            span: at.span().into(),
            operation,
            expected: expected.to_string(),
            found: found.kind_name().to_string(),
        }
    }
}

/// `@"text"` -> `text`
fn strip_string_delimiters(raw: &str) -> &str {
    raw.strip_prefix("@\"")
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(raw)
}
