//! Key remap
//!
//! Each object rule renames the keys of its own output through its keymap,
//! exactly one substitution per key. Nested rules apply their own keymaps.

use crate::rule::Rule;
use serde_json::{Map, Value};

/// Rename output keys of `value` according to `rule` and its nested rules
pub fn remap_value(value: Value, rule: Option<&Rule>) -> Value {
    match (value, rule) {
        (Value::Object(map), Some(Rule::Object(object))) => {
            let mut output = Map::with_capacity(map.len());
            for (key, child) in map {
                let child_rule = object.properties.get(&key).and_then(|property| property.as_rule());
                let child = remap_value(child, child_rule);
                output.insert(object.follow_keymap(&key).to_string(), child);
            }
            Value::Object(output)
        }
        (Value::Array(items), Some(Rule::Array(array))) => {
            let items_rule = array.items.as_rule();
            Value::Array(
                items
                    .into_iter()
                    .map(|item| remap_value(item, items_rule))
                    .collect(),
            )
        }
        (value, _) => value,
    }
}
