//! Arithmetic methods. Integer operands produce integer results where the
//! operation stays in the integers (so `add(10, 5)` answers `15`, not
//! `15.0`); division is always carried out in floating point.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Number, Value, json};
use uuid::Uuid;

use callwire_json_rpc::{MethodError, RequestParams, RpcMethod, decode_params};

#[derive(Debug, Deserialize)]
struct BinaryParams {
    a: Number,
    b: Number,
}

#[derive(Debug, Deserialize)]
struct PowerParams {
    base: Number,
    exponent: Number,
}

#[derive(Debug, Deserialize)]
struct BatchParams {
    operations: Vec<Value>,
}

pub struct CalculationService;

impl CalculationService {
    fn binary(
        &self,
        operation: &str,
        a: &Number,
        b: &Number,
    ) -> Result<Value, MethodError> {
        let result = match operation {
            "addition" => int_or_float(a, b, i64::checked_add, |x, y| x + y)?,
            "subtraction" => int_or_float(a, b, i64::checked_sub, |x, y| x - y)?,
            "multiplication" => int_or_float(a, b, i64::checked_mul, |x, y| x * y)?,
            "division" => {
                let divisor = as_f64(b)?;
                if divisor == 0.0 {
                    return Err(MethodError::failed("Division by zero is not allowed"));
                }
                Number::from_f64(as_f64(a)? / divisor)
                    .ok_or_else(|| MethodError::failed("Division produced a non-finite result"))?
            }
            "power" => power(a, b)?,
            other => {
                return Err(MethodError::failed(format!("Unknown operation: {other}")));
            }
        };

        Ok(json!({
            "operation": operation,
            "operands": [a, b],
            "result": result,
            "calculation_id": Uuid::new_v4().to_string(),
            "calculated_at": Utc::now().to_rfc3339(),
        }))
    }

    /// Run a list of {operation, a, b} entries, reporting per-entry failures
    /// inline instead of failing the whole call.
    fn batch_calculate(&self, operations: Vec<Value>) -> Value {
        let results: Vec<Value> = operations
            .into_iter()
            .map(|op| {
                let operation = op.get("operation").and_then(Value::as_str);
                let a = op.get("a").cloned().unwrap_or(Value::Null);
                let b = op.get("b").cloned().unwrap_or(Value::Null);

                if a.is_null() || b.is_null() {
                    return json!({
                        "error": "Missing operands 'a' or 'b'",
                        "operation": operation,
                        "operands": [a, b],
                    });
                }

                let (Value::Number(a), Value::Number(b)) = (a.clone(), b.clone()) else {
                    return json!({
                        "error": "Operands must be numbers",
                        "operation": operation,
                        "operands": [a, b],
                    });
                };

                let canonical = match operation {
                    Some("add") => "addition",
                    Some("subtract") => "subtraction",
                    Some("multiply") => "multiplication",
                    Some("divide") => "division",
                    Some("power") => "power",
                    other => {
                        return json!({
                            "error": format!("Unknown operation: {}", other.unwrap_or("null")),
                            "operation": operation,
                            "operands": [a, b],
                        });
                    }
                };

                match self.binary(canonical, &a, &b) {
                    Ok(result) => result,
                    Err(err) => json!({
                        "error": err.to_string(),
                        "operation": operation,
                        "operands": [a, b],
                    }),
                }
            })
            .collect();

        Value::Array(results)
    }
}

fn as_f64(n: &Number) -> Result<f64, MethodError> {
    n.as_f64()
        .ok_or_else(|| MethodError::invalid_params("operand out of range"))
}

/// Integer arithmetic when both operands are integers and the operation does
/// not overflow; floating point otherwise. A non-finite float result is an
/// error, never a value.
fn int_or_float(
    a: &Number,
    b: &Number,
    int_op: impl Fn(i64, i64) -> Option<i64>,
    float_op: impl Fn(f64, f64) -> f64,
) -> Result<Number, MethodError> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64())
        && let Some(result) = int_op(x, y)
    {
        return Ok(Number::from(result));
    }

    Number::from_f64(float_op(as_f64(a)?, as_f64(b)?))
        .ok_or_else(|| MethodError::failed("Operation produced a non-finite result"))
}

fn power(base: &Number, exponent: &Number) -> Result<Number, MethodError> {
    if let (Some(b), Some(e)) = (base.as_i64(), exponent.as_i64())
        && (0..=u32::MAX as i64).contains(&e)
        && let Some(result) = b.checked_pow(e as u32)
    {
        return Ok(Number::from(result));
    }

    let result = as_f64(base)?.powf(as_f64(exponent)?);
    Number::from_f64(result)
        .ok_or_else(|| MethodError::failed("Power produced a non-finite result"))
}

#[async_trait]
impl RpcMethod for CalculationService {
    async fn call(
        &self,
        method: &str,
        params: Option<RequestParams>,
    ) -> Result<Value, MethodError> {
        match method {
            "add" | "subtract" | "multiply" | "divide" => {
                let operation = match method {
                    "add" => "addition",
                    "subtract" => "subtraction",
                    "multiply" => "multiplication",
                    _ => "division",
                };
                let p: BinaryParams = decode_params(params, &["a", "b"])?;
                self.binary(operation, &p.a, &p.b)
            }
            "power" => {
                let p: PowerParams = decode_params(params, &["base", "exponent"])?;
                self.binary("power", &p.base, &p.exponent)
            }
            "batch_calculate" => {
                let p: BatchParams = decode_params(params, &["operations"])?;
                Ok(self.batch_calculate(p.operations))
            }
            other => Err(MethodError::failed(format!(
                "CalculationService does not handle '{other}'"
            ))),
        }
    }

    fn method_names(&self) -> Vec<String> {
        ["add", "subtract", "multiply", "divide", "power", "batch_calculate"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}
