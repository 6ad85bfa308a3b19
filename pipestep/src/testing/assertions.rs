//! Test assertions for step results.

use crate::core::StepResult;

/// Asserts that the result indicates success.
pub fn assert_result_succeeded(result: &StepResult) {
    assert!(
        result.is_success(),
        "Expected success, got error: {:?}",
        result.error
    );
}

/// Asserts that the result indicates failure.
pub fn assert_result_failed(result: &StepResult) {
    assert!(
        result.is_failure(),
        "Expected failure, got data: {:?}",
        result.data
    );
}

/// Asserts that the result failed with a message containing `fragment`.
pub fn assert_result_error_contains(result: &StepResult, fragment: &str) {
    let message = result.error.as_ref().map(|e| e.message().to_string());
    assert!(
        message.as_deref().is_some_and(|m| m.contains(fragment)),
        "Expected error containing '{fragment}', got {message:?}"
    );
}

/// Asserts that the result carries a specific key/value pair.
pub fn assert_result_value(result: &StepResult, key: &str, expected: &serde_json::Value) {
    let actual = result.get(key);
    assert_eq!(
        actual,
        Some(expected),
        "Expected value {expected:?} for key '{key}', got {actual:?}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assert_result_succeeded() {
        assert_result_succeeded(&StepResult::ok(1));
    }

    #[test]
    #[should_panic(expected = "Expected success")]
    fn test_assert_result_succeeded_fails() {
        assert_result_succeeded(&StepResult::failed("error"));
    }

    #[test]
    fn test_assert_result_failed() {
        assert_result_failed(&StepResult::failed("error"));
    }

    #[test]
    fn test_assert_result_error_contains() {
        assert_result_error_contains(
            &StepResult::failed("connection reset by peer"),
            "reset",
        );
    }

    #[test]
    #[should_panic(expected = "Expected error containing")]
    fn test_assert_result_error_contains_on_success() {
        assert_result_error_contains(&StepResult::empty(), "anything");
    }

    #[test]
    fn test_assert_result_value() {
        let result = StepResult::empty().with_key_val("count", 42);
        assert_result_value(&result, "count", &serde_json::json!(42));
    }
}
