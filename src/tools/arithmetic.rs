//! 算术 Action：sum_values / multiplication_float / division_float（无状态）

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::tools::registry::unexpected;
use crate::tools::{ActionHandler, ActionKind, ActionRequest};

/// JSON 无法表示 NaN / 无穷大
fn finite(kind: ActionKind, value: f64) -> Result<f64, String> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("{kind} produced a non-finite result"))
    }
}

pub struct SumValuesHandler;

#[async_trait]
impl ActionHandler for SumValuesHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::SumValues
    }

    async fn execute(&self, request: &ActionRequest) -> Result<Value, String> {
        let ActionRequest::SumValues { values } = request else {
            return Err(unexpected(self.kind(), request));
        };
        let sum = finite(self.kind(), values.iter().sum())?;
        Ok(json!({ "sum": sum }))
    }
}

pub struct MultiplicationHandler;

#[async_trait]
impl ActionHandler for MultiplicationHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::MultiplicationFloat
    }

    async fn execute(&self, request: &ActionRequest) -> Result<Value, String> {
        let ActionRequest::MultiplicationFloat { a, b } = request else {
            return Err(unexpected(self.kind(), request));
        };
        let product = finite(self.kind(), a * b)?;
        Ok(json!({ "product": product }))
    }
}

pub struct DivisionHandler;

#[async_trait]
impl ActionHandler for DivisionHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::DivisionFloat
    }

    async fn execute(&self, request: &ActionRequest) -> Result<Value, String> {
        let ActionRequest::DivisionFloat {
            numerator,
            denominator,
        } = request
        else {
            return Err(unexpected(self.kind(), request));
        };
        // 校验阶段已拒绝 0，这里只防止手工构造的请求
        if *denominator == 0.0 {
            return Err("denominator must not be zero".to_string());
        }
        let quotient = finite(self.kind(), numerator / denominator)?;
        Ok(json!({ "quotient": quotient }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sum() {
        let out = SumValuesHandler
            .execute(&ActionRequest::SumValues {
                values: vec![1.5, 2.5, 6.0],
            })
            .await
            .unwrap();
        assert_eq!(out["sum"], 10.0);

        let empty = SumValuesHandler
            .execute(&ActionRequest::SumValues { values: vec![] })
            .await
            .unwrap();
        assert_eq!(empty["sum"], 0.0);
    }

    #[tokio::test]
    async fn test_multiplication() {
        let out = MultiplicationHandler
            .execute(&ActionRequest::MultiplicationFloat { a: 2.0, b: 3.5 })
            .await
            .unwrap();
        assert_eq!(out["product"], 7.0);
    }

    #[tokio::test]
    async fn test_overflow_is_error() {
        let err = MultiplicationHandler
            .execute(&ActionRequest::MultiplicationFloat {
                a: f64::MAX,
                b: 10.0,
            })
            .await
            .unwrap_err();
        assert!(err.contains("non-finite"));
    }

    #[tokio::test]
    async fn test_division() {
        let out = DivisionHandler
            .execute(&ActionRequest::DivisionFloat {
                numerator: 150.0,
                denominator: 600.0,
            })
            .await
            .unwrap();
        assert_eq!(out["quotient"], 0.25);

        assert!(DivisionHandler
            .execute(&ActionRequest::DivisionFloat {
                numerator: 1.0,
                denominator: 0.0,
            })
            .await
            .is_err());
    }
}
