//! Conditional filtering of objects and array items

use crate::rule::{Condition, ValuePolicy};
use serde_json::Value;
use std::panic::{self, AssertUnwindSafe};

/// Evaluate an optional condition on the raw input of a node
///
/// A missing condition always passes. A predicate that returns an error or
/// panics is logged and counts as `false`.
pub fn passes(condition: Option<&Condition>, raw: &Value) -> bool {
    let Some(condition) = condition else {
        return true;
    };
    match panic::catch_unwind(AssertUnwindSafe(|| condition.evaluate(raw))) {
        Ok(Ok(passed)) => passed,
        Ok(Err(err)) => {
            tracing::trace!(error = %err, "condition failed, excluding value");
            false
        }
        Err(_) => {
            tracing::trace!("condition panicked, excluding value");
            false
        }
    }
}

/// Whether a present value satisfies the `expected` constraint of a primitive
pub fn matches_expected(policy: &ValuePolicy, value: &Value) -> bool {
    match policy {
        ValuePolicy::Expected(expected) => expected == value,
        ValuePolicy::Free | ValuePolicy::Default(_) => true,
    }
}
