use crate::api::{match_count, GrammarChecker};
use crate::config::ErrorMode;
use crate::error::RelayError;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// The text carried by a check request.
///
/// The body is read as loose JSON so a missing or non-string `text` can be
/// told apart from a body that is not JSON at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRequest {
    pub text: Option<String>,
}

impl CheckRequest {
    pub fn from_json(body: &Value) -> Self {
        Self {
            text: body.get("text").and_then(Value::as_str).map(str::to_string),
        }
    }
}

/// Service responsible for relaying one check to the grammar checker
/// and shaping the result for the caller
#[derive(Clone)]
pub struct RelayService {
    checker: Arc<dyn GrammarChecker>,
    error_mode: ErrorMode,
}

impl RelayService {
    pub fn new(checker: Arc<dyn GrammarChecker>, error_mode: ErrorMode) -> Self {
        Self {
            checker,
            error_mode,
        }
    }

    /// Run a single check. The checker is called at most once and its
    /// result is returned untouched.
    pub async fn relay(&self, request: CheckRequest) -> Result<Value, RelayError> {
        if request.text.is_none() && self.error_mode == ErrorMode::Explicit {
            warn!(target: "relay", "rejecting check request without text");
            return Err(RelayError::MissingText);
        }

        let text_len = request.text.as_deref().map(str::len);
        let start = Instant::now();
        let result = self.checker.check(request.text.as_deref()).await;
        let elapsed = start.elapsed();

        match result {
            Ok(value) => {
                info!(
                    target: "relay",
                    "check ok: text_len={:?} matches={:?} elapsed={:?}",
                    text_len,
                    match_count(&value),
                    elapsed
                );
                Ok(value)
            }
            Err(e) => {
                warn!(
                    target: "relay",
                    "check failed: text_len={:?} elapsed={:?} mode={}: {}",
                    text_len,
                    elapsed,
                    self.error_mode,
                    e
                );
                match self.error_mode {
                    ErrorMode::Explicit => Err(RelayError::Check(e)),
                    ErrorMode::Passthrough => Ok(Value::Null),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CheckError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct FixedChecker {
        calls: Mutex<Vec<Option<String>>>,
        fail: bool,
    }

    impl FixedChecker {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                fail,
            })
        }
    }

    #[async_trait]
    impl GrammarChecker for FixedChecker {
        async fn check(&self, text: Option<&str>) -> Result<Value, CheckError> {
            self.calls.lock().unwrap().push(text.map(str::to_string));
            if self.fail {
                Err(CheckError::UpstreamStatus {
                    status: 403,
                    body: "invalid api key".into(),
                })
            } else {
                Ok(json!({"matches": []}))
            }
        }
    }

    fn request(text: Option<&str>) -> CheckRequest {
        CheckRequest {
            text: text.map(str::to_string),
        }
    }

    #[test]
    fn test_check_request_from_json() {
        assert_eq!(
            CheckRequest::from_json(&json!({"text": "hi", "extra": 1})).text,
            Some("hi".to_string())
        );
        assert_eq!(CheckRequest::from_json(&json!({})).text, None);
        assert_eq!(CheckRequest::from_json(&json!({"text": 42})).text, None);
        assert_eq!(CheckRequest::from_json(&json!(["text"])).text, None);
    }

    #[tokio::test]
    async fn test_explicit_mode_rejects_missing_text_without_calling() {
        let checker = FixedChecker::new(false);
        let service = RelayService::new(checker.clone(), ErrorMode::Explicit);

        let result = service.relay(request(None)).await;
        assert!(matches!(result, Err(RelayError::MissingText)));
        assert!(checker.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_passthrough_mode_forwards_missing_text() {
        let checker = FixedChecker::new(false);
        let service = RelayService::new(checker.clone(), ErrorMode::Passthrough);

        let result = service.relay(request(None)).await.unwrap();
        assert_eq!(result, json!({"matches": []}));
        assert_eq!(*checker.calls.lock().unwrap(), vec![None]);
    }

    #[tokio::test]
    async fn test_failure_shape_depends_on_mode() {
        let explicit = RelayService::new(FixedChecker::new(true), ErrorMode::Explicit);
        let err = explicit.relay(request(Some("text"))).await.unwrap_err();
        assert_eq!(err.code(), "upstream_status");

        let passthrough = RelayService::new(FixedChecker::new(true), ErrorMode::Passthrough);
        let value = passthrough.relay(request(Some("text"))).await.unwrap();
        assert_eq!(value, Value::Null);
    }
}
