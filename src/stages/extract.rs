//! Core extraction: match a value against a rule
//!
//! Object rules are applied in two passes. The first pass resolves every
//! declared property, including alias copies, and records either a value or
//! the error that would be raised if the property turns out to be needed.
//! The second pass applies the required/default policy once per alias group
//! and assembles the output in declaration order.
//!
//! Output keys are the keys the values were found under; renaming through
//! the keymap is left to the remap stage.

use super::condition::{matches_expected, passes};
use crate::error::{subrule_location, CoreParserError, Result, ARRAY_SUBRULE_LOCATION};
use crate::jsonpath;
use crate::rule::{ArrayRule, ItemRule, ObjectRule, PropertyKind, PropertyRule, Rule, ValueKind};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Result of resolving one property in the first pass
enum Outcome {
    Found(Value),
    Missing(CoreParserError),
    /// A present value differed from the property's `expected` value
    Excluded,
}

/// Apply `rule` to `value`
pub fn apply_rule(value: &Value, rule: &Rule) -> Result<Value> {
    match rule {
        Rule::Object(object) => apply_object(value, object).map(Value::Object),
        Rule::Array(array) => apply_array(value, array).map(Value::Array),
    }
}

fn missing_property(key: &str) -> CoreParserError {
    CoreParserError::mismatch(format!("missing required property \"{key}\""))
}

fn resolve_property(key: &str, property: &PropertyRule, raw: Option<&Value>) -> Outcome {
    let Some(raw) = raw else {
        return Outcome::Missing(missing_property(key));
    };

    match &property.kind {
        PropertyKind::Primitive(primitive) => {
            if !primitive.ty.matches(raw) {
                return Outcome::Missing(CoreParserError::mismatch(format!(
                    "expected {} at property \"{key}\", found {}",
                    primitive.ty,
                    ValueKind::of(raw)
                )));
            }
            if !matches_expected(&primitive.policy, raw) {
                return Outcome::Excluded;
            }
            Outcome::Found(raw.clone())
        }
        PropertyKind::Nested(rule) => match apply_rule(raw, rule) {
            Ok(Value::Array(items)) if items.is_empty() => Outcome::Missing(CoreParserError::mismatch(
                format!("no items left at property \"{key}\""),
            )),
            Ok(parsed) => Outcome::Found(parsed),
            Err(err) => Outcome::Missing(err.with_location(subrule_location(key))),
        },
    }
}

/// Apply an object rule, returning the extracted properties
pub fn apply_object(value: &Value, rule: &ObjectRule) -> Result<Map<String, Value>> {
    let Value::Object(_) = value else {
        return Err(CoreParserError::mismatch(format!(
            "expected object, found {}",
            ValueKind::of(value)
        )));
    };

    if !passes(rule.condition.as_ref(), value) {
        tracing::trace!("object condition rejected value");
        return Ok(Map::new());
    }

    let mut outcomes = Vec::with_capacity(rule.properties.len());
    for (key, property) in &rule.properties {
        let outcome = resolve_property(key, property, jsonpath::resolve(key, value));
        if let Outcome::Excluded = outcome {
            tracing::trace!(property = %key, "expected value mismatch, excluding object");
            return Ok(Map::new());
        }
        outcomes.push(outcome);
    }

    let satisfied: HashSet<&str> = rule
        .properties
        .keys()
        .zip(&outcomes)
        .filter(|(_, outcome)| matches!(outcome, Outcome::Found(_)))
        .map(|(key, _)| rule.canonical_name(key))
        .collect();

    let strict = rule.is_strict();
    let mut output = Map::new();
    for ((key, property), outcome) in rule.properties.iter().zip(outcomes) {
        let err = match outcome {
            Outcome::Found(found) => {
                output.insert(key.clone(), found);
                continue;
            }
            Outcome::Missing(err) => err,
            Outcome::Excluded => continue,
        };

        // Alias copies defer to their canonical property
        if property.alias_of.is_some() || satisfied.contains(key.as_str()) {
            continue;
        }

        if property.is_strictly_required(strict) {
            return Err(err);
        }
        match property.fallback() {
            Some(fallback) => {
                output.insert(key.clone(), fallback.clone());
            }
            None => tracing::debug!(property = %key, error = %err, "omitting property"),
        }
    }

    Ok(output)
}

/// Apply an array rule, returning the surviving items
pub fn apply_array(value: &Value, rule: &ArrayRule) -> Result<Vec<Value>> {
    let Value::Array(items) = value else {
        return Err(CoreParserError::mismatch(format!(
            "expected array, found {}",
            ValueKind::of(value)
        )));
    };

    let considered = if rule.limit == 0 {
        items.len()
    } else {
        rule.limit.min(items.len())
    };

    let mut output = Vec::with_capacity(considered);
    for (index, item) in items.iter().take(considered).enumerate() {
        if !rule.items.accepts_kind(item) {
            if rule.is_strict() {
                return Err(CoreParserError::mismatch(format!(
                    "expected {} at index {index}, found {}",
                    rule.items.kind_name(),
                    ValueKind::of(item)
                )));
            }
            tracing::trace!(index, "skipping non-conforming item");
            continue;
        }

        if !passes(rule.condition.as_ref(), item) {
            tracing::trace!(index, "item condition rejected value");
            continue;
        }

        let parsed = match rule.items.as_ref() {
            ItemRule::Primitive(_) => item.clone(),
            ItemRule::Nested(items_rule) => apply_rule(item, items_rule)
                .map_err(|err| err.with_location(ARRAY_SUBRULE_LOCATION))?,
        };

        if is_empty_container(&parsed) {
            continue;
        }
        output.push(parsed);
    }

    Ok(output)
}

fn is_empty_container(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
