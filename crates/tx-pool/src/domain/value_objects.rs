//! Result types returned across the pool boundary.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::errors::PoolErrorType;

/// Errors keyed by transaction id (hex).
pub type ErrorMap = BTreeMap<String, Vec<TransactionErrorResponse>>;

/// One structured rejection reason.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionErrorResponse {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
}

impl TransactionErrorResponse {
    pub fn new(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_type: error_type.into(),
            message: message.into(),
        }
    }

    pub fn from_code(code: PoolErrorType, message: impl Into<String>) -> Self {
        Self::new(code.code(), message)
    }
}

/// Classification of one validated batch.
///
/// `accept`, `invalid` and `excess` partition the distinct transactions of
/// the batch; a repeated copy is counted once. `broadcast` lists
/// the accepted ids that should be relayed to peers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorResult {
    pub accept: Vec<String>,
    pub broadcast: Vec<String>,
    pub invalid: Vec<String>,
    pub excess: Vec<String>,
    /// `None` when no transaction in the batch was rejected.
    pub errors: Option<ErrorMap>,
}

impl ProcessorResult {
    /// Number of transactions classified.
    pub fn total(&self) -> usize {
        self.accept.len() + self.invalid.len() + self.excess.len()
    }

    pub fn is_accepted(&self, id: &str) -> bool {
        self.accept.iter().any(|a| a == id)
    }

    /// Error codes recorded for `id`.
    pub fn error_types(&self, id: &str) -> Vec<&str> {
        self.errors
            .as_ref()
            .and_then(|errors| errors.get(id))
            .map(|list| list.iter().map(|e| e.error_type.as_str()).collect())
            .unwrap_or_default()
    }

    /// JSON wire form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_serializes_type_field() {
        let response = TransactionErrorResponse::from_code(PoolErrorType::Nonce, "expected 1, got 3");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["type"], "ERR_NONCE");
        assert_eq!(json["message"], "expected 1, got 3");
    }

    #[test]
    fn test_result_wire_form() {
        let mut errors = ErrorMap::new();
        errors
            .entry("ab".to_string())
            .or_default()
            .push(TransactionErrorResponse::from_code(PoolErrorType::Duplicate, "duplicate"));
        let result = ProcessorResult {
            accept: vec!["cd".into()],
            broadcast: vec!["cd".into()],
            invalid: vec![],
            excess: vec!["ab".into()],
            errors: Some(errors),
        };

        let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        assert_eq!(json["excess"][0], "ab");
        assert_eq!(json["errors"]["ab"][0]["type"], "ERR_DUPLICATE");
        assert_eq!(result.total(), 2);
        assert_eq!(result.error_types("ab"), vec!["ERR_DUPLICATE"]);
        assert!(result.is_accepted("cd"));
    }
}
