//! Tax calculation methods: flat-rate and progressive-bracket.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use callwire_json_rpc::{MethodError, RequestParams, RpcMethod, decode_params};

/// Progressive brackets: upper bound and rate, last bracket unbounded.
const BRACKETS: &[(f64, f64)] = &[
    (10_000.0, 0.10),
    (40_000.0, 0.12),
    (85_000.0, 0.22),
    (f64::INFINITY, 0.24),
];

#[derive(Debug, Deserialize)]
struct TaxParams {
    income: f64,
    #[serde(default)]
    deductions: f64,
    #[serde(default = "default_tax_rate")]
    tax_rate: f64,
}

fn default_tax_rate() -> f64 {
    0.20
}

#[derive(Debug, Deserialize)]
struct ProgressiveTaxParams {
    income: f64,
}

pub struct TaxService;

impl TaxService {
    fn calculate_tax(&self, params: TaxParams) -> Result<Value, MethodError> {
        if params.income < 0.0 || params.deductions < 0.0 {
            return Err(MethodError::failed(
                "Income and deductions must be non-negative",
            ));
        }

        let taxable_income = (params.income - params.deductions).max(0.0);
        let tax_amount = taxable_income * params.tax_rate;

        Ok(json!({
            "income": params.income,
            "deductions": params.deductions,
            "taxable_income": taxable_income,
            "tax_rate": params.tax_rate,
            "tax_amount": tax_amount,
            "net_income": params.income - tax_amount,
            "calculation_id": Uuid::new_v4().to_string(),
            "calculated_at": Utc::now().to_rfc3339(),
        }))
    }

    fn calculate_progressive_tax(&self, params: ProgressiveTaxParams) -> Result<Value, MethodError> {
        let income = params.income;
        if income < 0.0 {
            return Err(MethodError::failed("Income must be non-negative"));
        }

        let mut total_tax = 0.0;
        let mut previous_limit = 0.0;
        let mut breakdown = Vec::new();

        for &(limit, rate) in BRACKETS {
            if income <= previous_limit {
                break;
            }

            let upper = income.min(limit);
            let taxable_in_bracket = upper - previous_limit;
            let tax_in_bracket = taxable_in_bracket * rate;
            total_tax += tax_in_bracket;

            breakdown.push(json!({
                "bracket": format!("${:.0} - ${:.0}", previous_limit, upper),
                "rate": format!("{:.0}%", rate * 100.0),
                "taxable_income": taxable_in_bracket,
                "tax": tax_in_bracket,
            }));

            previous_limit = limit;
            if income <= limit {
                break;
            }
        }

        let effective_rate = if income > 0.0 { total_tax / income } else { 0.0 };

        Ok(json!({
            "income": income,
            "total_tax": total_tax,
            "effective_rate": effective_rate,
            "net_income": income - total_tax,
            "tax_breakdown": breakdown,
            "calculation_id": Uuid::new_v4().to_string(),
            "calculated_at": Utc::now().to_rfc3339(),
        }))
    }
}

#[async_trait]
impl RpcMethod for TaxService {
    async fn call(
        &self,
        method: &str,
        params: Option<RequestParams>,
    ) -> Result<Value, MethodError> {
        match method {
            "calculate_tax" => {
                self.calculate_tax(decode_params(params, &["income", "deductions", "tax_rate"])?)
            }
            "calculate_progressive_tax" => {
                self.calculate_progressive_tax(decode_params(params, &["income"])?)
            }
            other => Err(MethodError::failed(format!(
                "TaxService does not handle '{other}'"
            ))),
        }
    }

    fn method_names(&self) -> Vec<String> {
        vec![
            "calculate_tax".to_string(),
            "calculate_progressive_tax".to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn call(method: &str, params: Value) -> Result<Value, MethodError> {
        let params = callwire_json_rpc::RequestParams::from_value(params).unwrap();
        TaxService.call(method, params).await
    }

    #[tokio::test]
    async fn test_flat_tax_with_defaults() {
        let result = call("calculate_tax", json!({"income": 50000.0}))
            .await
            .unwrap();

        assert_eq!(result["taxable_income"], json!(50000.0));
        assert_eq!(result["tax_amount"], json!(10000.0));
        assert_eq!(result["net_income"], json!(40000.0));
        assert!(result["calculation_id"].is_string());
    }

    #[tokio::test]
    async fn test_deductions_floor_at_zero() {
        let result = call(
            "calculate_tax",
            json!({"income": 1000.0, "deductions": 5000.0}),
        )
        .await
        .unwrap();

        assert_eq!(result["taxable_income"], json!(0.0));
        assert_eq!(result["tax_amount"], json!(0.0));
    }

    #[tokio::test]
    async fn test_negative_income_rejected() {
        let err = call("calculate_tax", json!({"income": -1.0})).await.unwrap_err();
        assert!(matches!(err, MethodError::Failed(_)));
    }

    #[tokio::test]
    async fn test_progressive_brackets() {
        // 50_000: 10k @ 10% + 30k @ 12% + 10k @ 22% = 1000 + 3600 + 2200
        let result = call("calculate_progressive_tax", json!({"income": 50000.0}))
            .await
            .unwrap();

        assert_eq!(result["total_tax"], json!(6800.0));
        assert_eq!(result["net_income"], json!(43200.0));
        assert_eq!(result["tax_breakdown"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_progressive_zero_income() {
        let result = call("calculate_progressive_tax", json!({"income": 0.0}))
            .await
            .unwrap();

        assert_eq!(result["total_tax"], json!(0.0));
        assert_eq!(result["effective_rate"], json!(0.0));
        assert!(result["tax_breakdown"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_top_bracket_is_unbounded() {
        let result = call("calculate_progressive_tax", json!({"income": 200000.0}))
            .await
            .unwrap();

        assert_eq!(result["tax_breakdown"].as_array().unwrap().len(), 4);
        // 1000 + 3600 + 9900 + 115_000 * 0.24
        assert_eq!(result["total_tax"], json!(42100.0));
    }

    #[tokio::test]
    async fn test_positional_params() {
        let result = call("calculate_tax", json!([40000.0, 10000.0, 0.25]))
            .await
            .unwrap();

        assert_eq!(result["taxable_income"], json!(30000.0));
        assert_eq!(result["tax_amount"], json!(7500.0));
    }
}
