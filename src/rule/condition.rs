use serde_json::Value;
use std::fmt;
use std::sync::Arc;

type Predicate = dyn Fn(&Value) -> anyhow::Result<bool> + Send + Sync;

/// Predicate over the raw input of an object rule or of an array item
///
/// Conditions are advisory filters: a predicate that returns an error or
/// panics is treated the same as one that returns `false`.
#[derive(Clone)]
pub struct Condition(Arc<Predicate>);

impl Condition {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Condition(Arc::new(move |value| Ok(predicate(value))))
    }

    pub fn try_new<F>(predicate: F) -> Self
    where
        F: Fn(&Value) -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        Condition(Arc::new(predicate))
    }

    pub fn evaluate(&self, value: &Value) -> anyhow::Result<bool> {
        (self.0)(value)
    }
}

impl PartialEq for Condition {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Condition(..)")
    }
}
