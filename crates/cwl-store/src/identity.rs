use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const RESERVED_KEYS: &[&str] = &["code", "market_name"];

/// One entry of the candidate list.
///
/// Only `code` and `market_name` are interpreted by the store; they form the
/// identity key. Every other field the caller (or a hand-edited file) supplies
/// lands in `extra` and is written back verbatim, in its original order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockIdentity {
    pub code: String,
    pub market_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StockIdentity {
    pub fn new(code: impl Into<String>, market_name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            market_name: market_name.into(),
            extra: Map::new(),
        }
    }

    /// Builder-style helper for attaching opaque metadata (display name, sector, ...).
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Exact, case-sensitive key match.
    pub fn matches(&self, code: &str, market_name: &str) -> bool {
        self.code == code && self.market_name == market_name
    }

    /// Reason this identity cannot be stored, if any.
    pub fn validate(&self) -> Option<String> {
        if self.code.trim().is_empty() {
            return Some("code must not be empty".to_string());
        }
        if self.market_name.trim().is_empty() {
            return Some(format!("market_name must not be empty (code={})", self.code));
        }
        if let Some(key) = RESERVED_KEYS.iter().find(|k| self.extra.contains_key(**k)) {
            return Some(format!("extra field '{key}' shadows a key field"));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extra_fields_survive_serde_in_order() {
        let raw = r#"{"code":"600519","market_name":"SH","name":"贵州茅台","sector":"白酒","lot":100}"#;
        let id: StockIdentity = serde_json::from_str(raw).unwrap();

        assert_eq!(id.code, "600519");
        assert_eq!(id.market_name, "SH");
        let keys: Vec<&str> = id.extra.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["name", "sector", "lot"]);

        let back = serde_json::to_string(&id).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn missing_key_field_is_a_parse_error() {
        let err = serde_json::from_value::<StockIdentity>(json!({"code": "AAPL"}));
        assert!(err.is_err(), "market_name is required");
    }

    #[test]
    fn matches_is_exact() {
        let id = StockIdentity::new("AAPL", "US");
        assert!(id.matches("AAPL", "US"));
        assert!(!id.matches("aapl", "US"));
        assert!(!id.matches("AAPL", "HK"));
    }

    #[test]
    fn validate_rejects_blank_keys() {
        assert!(StockIdentity::new("AAPL", "US").validate().is_none());
        assert!(StockIdentity::new("  ", "US").validate().is_some());
        let reason = StockIdentity::new("AAPL", "").validate().unwrap();
        assert!(reason.contains("market_name"), "got: {reason}");

        let shadowed = StockIdentity::new("AAPL", "US").with_field("code", "MSFT");
        assert!(shadowed.validate().is_some());
    }
}
