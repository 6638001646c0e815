//! Flatten nested objects into their parent
//!
//! Children are flattened before their parent, so with `flatten_all` a
//! three-level object collapses into `a-b-c` keys in one pass.

use crate::rule::{ObjectRule, PropertyRule, Rule};
use serde_json::{Map, Value};

/// How joined keys are produced
#[derive(Debug, Clone, Copy)]
pub struct FlattenOptions<'a> {
    pub separator: &'a str,
    /// Output keys already went through the keymap; joined keys get one more
    /// keymap lookup and child rules are found through the reverse keymap
    pub keys_remapped: bool,
}

impl<'a> FlattenOptions<'a> {
    pub fn new(separator: &'a str) -> Self {
        FlattenOptions {
            separator,
            keys_remapped: false,
        }
    }

    pub fn keys_remapped(mut self, keys_remapped: bool) -> Self {
        self.keys_remapped = keys_remapped;
        self
    }
}

/// Property rule producing output key `key`
///
/// A declared property that the keymap leaves alone keeps its own key, even
/// when another property is renamed onto it.
fn property_for<'r>(rule: &'r ObjectRule, key: &str, options: &FlattenOptions<'_>) -> Option<&'r PropertyRule> {
    let renamed_away = options.keys_remapped && rule.keymap.contains_key(key);
    if let Some(property) = rule.properties.get(key).filter(|_| !renamed_away) {
        return Some(property);
    }
    if options.keys_remapped {
        if let Some((source, _)) = rule.keymap.iter().find(|(_, target)| target.as_str() == key) {
            return rule.properties.get(source);
        }
    }
    None
}

fn join(parent: &str, child: &str, separator: &str) -> String {
    let mut joined = String::with_capacity(parent.len() + separator.len() + child.len());
    joined.push_str(parent);
    joined.push_str(separator);
    joined.push_str(child);
    joined
}

/// Flatten `value` according to `rule`
///
/// `force` flattens every object regardless of its rule; it is set for the
/// descendants of a `flatten_all` rule.
pub fn flatten_value(value: Value, rule: Option<&Rule>, options: &FlattenOptions<'_>, force: bool) -> Value {
    match value {
        Value::Object(map) => {
            let object = rule.and_then(Rule::as_object);
            Value::Object(flatten_object(map, object, options, force))
        }
        Value::Array(items) => {
            let items_rule = rule.and_then(Rule::as_array).and_then(|array| array.items.as_rule());
            Value::Array(
                items
                    .into_iter()
                    .map(|item| flatten_value(item, items_rule, options, force))
                    .collect(),
            )
        }
        other => other,
    }
}

fn flatten_object(
    map: Map<String, Value>,
    rule: Option<&ObjectRule>,
    options: &FlattenOptions<'_>,
    force: bool,
) -> Map<String, Value> {
    let flatten_here = force || rule.is_some_and(|rule| rule.flatten || rule.flatten_all);
    let force_children = force || rule.is_some_and(|rule| rule.flatten_all);

    // Nothing below an unruled, unforced object can request flattening
    if rule.is_none() && !force {
        return map;
    }

    let mut output = Map::with_capacity(map.len());
    for (key, child) in map {
        let child_rule = rule
            .and_then(|rule| property_for(rule, &key, options))
            .and_then(PropertyRule::as_rule);
        let child = flatten_value(child, child_rule, options, force_children);

        match child {
            Value::Object(grandchildren) if flatten_here => {
                for (child_key, grandchild) in grandchildren {
                    let joined = join(&key, &child_key, options.separator);
                    let joined = match rule {
                        Some(rule) if options.keys_remapped => rule.follow_keymap(&joined).to_string(),
                        _ => joined,
                    };
                    output.insert(joined, grandchild);
                }
            }
            child => {
                output.insert(key, child);
            }
        }
    }
    output
}

/// Flatten every nested object of `value`, without a rule
pub fn flatten_all(value: Value, separator: &str) -> Value {
    flatten_value(value, None, &FlattenOptions::new(separator), true)
}
