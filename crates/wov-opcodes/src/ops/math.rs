//! `+`, `-`, `*`, `/`, `%`, `^`, `random`.

use async_trait::async_trait;
use rand::Rng;
use wov_core::ast::Ast;
use wov_core::context::Context;
use wov_core::error::{Result, WovError};
use wov_core::value::{Number, Value};

use crate::meta::{Category, Evaluation, OpcodeMeta};
use crate::opcode::{eval_all, Evaluator, Opcode};

fn as_number(v: &Value, op: &'static str) -> Result<f64> {
    v.as_f64().ok_or_else(|| WovError::InvalidRequest(format!("{op} requires numeric arguments")))
}

fn meta(name: &'static str, description: &'static str) -> OpcodeMeta {
    OpcodeMeta { name, category: Category::Math, evaluation: Evaluation::Eager, description }
}

/// `+(a, b, ...)` — variadic sum.
pub struct Add;

#[async_trait]
impl Opcode for Add {
    fn name(&self) -> &'static str {
        "+"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("+", "Sum of all arguments.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let mut total = 0.0;
        for v in &values {
            total += as_number(v, "+")?;
        }
        Ok(Value::Number(Number::from_f64(total)))
    }
}

/// `-(a)` / `-(a, b, ...)` — negation or left-to-right subtraction.
pub struct Sub;

#[async_trait]
impl Opcode for Sub {
    fn name(&self) -> &'static str {
        "-"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("-", "Negation of one argument, or left-to-right subtraction of several.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let mut iter = values.iter();
        let first = as_number(iter.next().ok_or_else(|| WovError::InvalidRequest("- requires at least one argument".into()))?, "-")?;
        let rest: Vec<f64> = iter.map(|v| as_number(v, "-")).collect::<Result<_>>()?;
        let result = if rest.is_empty() { -first } else { rest.iter().fold(first, |acc, x| acc - x) };
        Ok(Value::Number(Number::from_f64(result)))
    }
}

/// `*(a, b, ...)` — variadic product.
pub struct Mul;

#[async_trait]
impl Opcode for Mul {
    fn name(&self) -> &'static str {
        "*"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("*", "Product of all arguments.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let mut total = 1.0;
        for v in &values {
            total *= as_number(v, "*")?;
        }
        Ok(Value::Number(Number::from_f64(total)))
    }
}

/// `/(a, b)` — division. Errors on division by zero rather than producing
/// `inf`/`NaN`.
pub struct Div;

#[async_trait]
impl Opcode for Div {
    fn name(&self) -> &'static str {
        "/"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("/", "Division; errors on division by zero.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let [a, b] = values.as_slice() else {
            return Err(WovError::InvalidRequest("/ requires exactly two arguments".into()));
        };
        let (a, b) = (as_number(a, "/")?, as_number(b, "/")?);
        if b == 0.0 {
            return Err(WovError::InvalidRequest("division by zero".into()));
        }
        Ok(Value::Number(Number::from_f64(a / b)))
    }
}

/// `%(a, b)` — remainder.
pub struct Mod;

#[async_trait]
impl Opcode for Mod {
    fn name(&self) -> &'static str {
        "%"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("%", "Remainder; errors on division by zero.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let [a, b] = values.as_slice() else {
            return Err(WovError::InvalidRequest("% requires exactly two arguments".into()));
        };
        let (a, b) = (as_number(a, "%")?, as_number(b, "%")?);
        if b == 0.0 {
            return Err(WovError::InvalidRequest("division by zero".into()));
        }
        Ok(Value::Number(Number::from_f64(a % b)))
    }
}

/// `^(base, exponent)`.
pub struct Pow;

#[async_trait]
impl Opcode for Pow {
    fn name(&self) -> &'static str {
        "^"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("^", "Exponentiation.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let [base, exponent] = values.as_slice() else {
            return Err(WovError::InvalidRequest("^ requires exactly two arguments".into()));
        };
        Ok(Value::Number(Number::from_f64(as_number(base, "^")?.powf(as_number(exponent, "^")?))))
    }
}

/// `random()` — uniform float in `[0, 1)`. `random(min, max)` — uniform
/// integer in `[min, max)`.
pub struct Random;

#[async_trait]
impl Opcode for Random {
    fn name(&self) -> &'static str {
        "random"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("random", "Uniform float in [0, 1), or integer in [min, max) when given two arguments.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let mut rng = rand::thread_rng();
        match values.as_slice() {
            [] => Ok(Value::Number(Number::Float(rng.gen_range(0.0..1.0)))),
            [min, max] => {
                let (min, max) = (as_number(min, "random")? as i64, as_number(max, "random")? as i64);
                if min >= max {
                    return Err(WovError::InvalidRequest("random(min, max) requires min < max".into()));
                }
                Ok(Value::int(rng.gen_range(min..max)))
            },
            _ => Err(WovError::InvalidRequest("random takes zero or two arguments".into())),
        }
    }
}
