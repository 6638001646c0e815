//! Rule data model
//!
//! A [`Rule`] is a closed tree: object rules own ordered property rules,
//! array rules own a single item rule, and primitive constraints only appear
//! as leaves. Every stage pattern-matches on these enums, so adding a variant
//! is a compile error everywhere it is not handled.

pub mod condition;
mod repr;

pub use condition::Condition;

use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;

/// Objects reject missing required properties unless told otherwise
pub const OBJECT_STRICT_DEFAULT: bool = true;
/// Arrays skip non-conforming items unless told otherwise
pub const ARRAY_STRICT_DEFAULT: bool = false;
/// Properties are required unless told otherwise
pub const REQUIRED_DEFAULT: bool = true;

/// Runtime kind of a JSON value, used for type checks and messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Boolean,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Boolean => "boolean",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Leaf types a property or array item can be constrained to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    String,
    Number,
    Boolean,
    Any,
}

impl PrimitiveType {
    /// `Any` accepts every value, including `null`
    pub fn matches(self, value: &Value) -> bool {
        match self {
            PrimitiveType::String => value.is_string(),
            PrimitiveType::Number => value.is_number(),
            PrimitiveType::Boolean => value.is_boolean(),
            PrimitiveType::Any => true,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveType::String => "string",
            PrimitiveType::Number => "number",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Any => "any",
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happens around a primitive value besides the type check
///
/// `Default` and `Expected` are mutually exclusive by construction.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ValuePolicy {
    #[default]
    Free,
    /// Used when the value is missing or has the wrong type
    Default(Value),
    /// The owning object is excluded when a present value differs
    Expected(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveRule {
    pub ty: PrimitiveType,
    pub policy: ValuePolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKind {
    Primitive(PrimitiveRule),
    Nested(Rule),
}

/// A named entry of an object rule
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyRule {
    pub required: Option<bool>,
    /// Extra source keys accepted in place of the property's own key
    pub aliases: Vec<String>,
    /// Canonical key this entry was copied from by alias expansion
    pub alias_of: Option<String>,
    pub kind: PropertyKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemRule {
    Primitive(PrimitiveType),
    Nested(Rule),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectRule {
    pub strict: Option<bool>,
    pub flatten: bool,
    pub flatten_all: bool,
    pub properties: IndexMap<String, PropertyRule>,
    pub keymap: IndexMap<String, String>,
    pub condition: Option<Condition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayRule {
    /// Maximum number of source items considered, 0 for no limit
    pub limit: usize,
    pub strict: Option<bool>,
    pub items: Box<ItemRule>,
    pub condition: Option<Condition>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Object(ObjectRule),
    Array(ArrayRule),
}

impl Rule {
    pub fn as_object(&self) -> Option<&ObjectRule> {
        match self {
            Rule::Object(rule) => Some(rule),
            Rule::Array(_) => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayRule> {
        match self {
            Rule::Array(rule) => Some(rule),
            Rule::Object(_) => None,
        }
    }

    /// Whether `value` has the container kind this rule applies to
    pub fn accepts_kind(&self, value: &Value) -> bool {
        match self {
            Rule::Object(_) => value.is_object(),
            Rule::Array(_) => value.is_array(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Rule::Object(_) => "object",
            Rule::Array(_) => "array",
        }
    }
}

impl From<ObjectRule> for Rule {
    fn from(rule: ObjectRule) -> Self {
        Rule::Object(rule)
    }
}

impl From<ArrayRule> for Rule {
    fn from(rule: ArrayRule) -> Self {
        Rule::Array(rule)
    }
}

impl ObjectRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_strict(&self) -> bool {
        self.strict.unwrap_or(OBJECT_STRICT_DEFAULT)
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }

    pub fn flatten(mut self, flatten: bool) -> Self {
        self.flatten = flatten;
        self
    }

    pub fn flatten_all(mut self, flatten_all: bool) -> Self {
        self.flatten_all = flatten_all;
        self
    }

    /// Add a property; a later property with the same name replaces the earlier one
    pub fn property(mut self, name: impl Into<String>, property: impl Into<PropertyRule>) -> Self {
        self.properties.insert(name.into(), property.into());
        self
    }

    pub fn remap(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.keymap.insert(source.into(), target.into());
        self
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Output key for `key` after one keymap substitution
    pub fn follow_keymap<'a>(&'a self, key: &'a str) -> &'a str {
        self.keymap.get(key).map(String::as_str).unwrap_or(key)
    }

    /// Name of the alias group `key` belongs to
    pub fn canonical_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.properties
            .get(key)
            .and_then(|property| property.alias_of.as_deref())
            .unwrap_or(key)
    }
}

impl ArrayRule {
    pub fn new(items: impl Into<ItemRule>) -> Self {
        ArrayRule {
            limit: 0,
            strict: None,
            items: Box::new(items.into()),
            condition: None,
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strict.unwrap_or(ARRAY_STRICT_DEFAULT)
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }
}

impl ItemRule {
    pub fn accepts_kind(&self, value: &Value) -> bool {
        match self {
            ItemRule::Primitive(ty) => ty.matches(value),
            ItemRule::Nested(rule) => rule.accepts_kind(value),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ItemRule::Primitive(ty) => ty.as_str(),
            ItemRule::Nested(rule) => rule.kind_name(),
        }
    }

    pub fn as_rule(&self) -> Option<&Rule> {
        match self {
            ItemRule::Nested(rule) => Some(rule),
            ItemRule::Primitive(_) => None,
        }
    }
}

impl From<PrimitiveType> for ItemRule {
    fn from(ty: PrimitiveType) -> Self {
        ItemRule::Primitive(ty)
    }
}

impl From<Rule> for ItemRule {
    fn from(rule: Rule) -> Self {
        ItemRule::Nested(rule)
    }
}

impl From<ObjectRule> for ItemRule {
    fn from(rule: ObjectRule) -> Self {
        ItemRule::Nested(Rule::Object(rule))
    }
}

impl From<ArrayRule> for ItemRule {
    fn from(rule: ArrayRule) -> Self {
        ItemRule::Nested(Rule::Array(rule))
    }
}

impl PropertyRule {
    pub fn primitive(ty: PrimitiveType) -> Self {
        PropertyRule {
            required: None,
            aliases: Vec::new(),
            alias_of: None,
            kind: PropertyKind::Primitive(PrimitiveRule {
                ty,
                policy: ValuePolicy::Free,
            }),
        }
    }

    pub fn string() -> Self {
        Self::primitive(PrimitiveType::String)
    }

    pub fn number() -> Self {
        Self::primitive(PrimitiveType::Number)
    }

    pub fn boolean() -> Self {
        Self::primitive(PrimitiveType::Boolean)
    }

    pub fn any() -> Self {
        Self::primitive(PrimitiveType::Any)
    }

    pub fn nested(rule: impl Into<Rule>) -> Self {
        PropertyRule {
            required: None,
            aliases: Vec::new(),
            alias_of: None,
            kind: PropertyKind::Nested(rule.into()),
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Set the fallback value; replaces any `expected` value.
    /// Has no effect on nested rules.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        if let PropertyKind::Primitive(primitive) = &mut self.kind {
            primitive.policy = ValuePolicy::Default(value.into());
        }
        self
    }

    /// Set the expected value; replaces any `default` value.
    /// Has no effect on nested rules.
    pub fn expected(mut self, value: impl Into<Value>) -> Self {
        if let PropertyKind::Primitive(primitive) = &mut self.kind {
            primitive.policy = ValuePolicy::Expected(value.into());
        }
        self
    }

    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(REQUIRED_DEFAULT)
    }

    pub fn fallback(&self) -> Option<&Value> {
        match &self.kind {
            PropertyKind::Primitive(PrimitiveRule {
                policy: ValuePolicy::Default(value),
                ..
            }) => Some(value),
            _ => None,
        }
    }

    /// Required, inside a strict object, and without a fallback
    pub fn is_strictly_required(&self, owner_strict: bool) -> bool {
        self.is_required() && owner_strict && self.fallback().is_none()
    }

    pub fn as_rule(&self) -> Option<&Rule> {
        match &self.kind {
            PropertyKind::Nested(rule) => Some(rule),
            PropertyKind::Primitive(_) => None,
        }
    }
}

impl From<PrimitiveType> for PropertyRule {
    fn from(ty: PrimitiveType) -> Self {
        PropertyRule::primitive(ty)
    }
}

impl From<Rule> for PropertyRule {
    fn from(rule: Rule) -> Self {
        PropertyRule::nested(rule)
    }
}

impl From<ObjectRule> for PropertyRule {
    fn from(rule: ObjectRule) -> Self {
        PropertyRule::nested(rule)
    }
}

impl From<ArrayRule> for PropertyRule {
    fn from(rule: ArrayRule) -> Self {
        PropertyRule::nested(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_primitive_matching() {
        assert!(PrimitiveType::String.matches(&json!("x")));
        assert!(!PrimitiveType::String.matches(&json!(1)));
        assert!(PrimitiveType::Number.matches(&json!(1.5)));
        assert!(!PrimitiveType::Boolean.matches(&json!(null)));
        assert!(PrimitiveType::Any.matches(&json!(null)));
        assert!(PrimitiveType::Any.matches(&json!([1, 2])));
    }

    #[test]
    fn test_strictly_required() {
        let plain = PropertyRule::number();
        assert!(plain.is_strictly_required(true));
        assert!(!plain.is_strictly_required(false));

        let optional = PropertyRule::number().required(false);
        assert!(!optional.is_strictly_required(true));

        let defaulted = PropertyRule::number().default_value(7);
        assert!(!defaulted.is_strictly_required(true));
        assert_eq!(defaulted.fallback(), Some(&json!(7)));
    }

    #[test]
    fn test_default_and_expected_replace_each_other() {
        let property = PropertyRule::string().default_value("a").expected("b");
        let PropertyKind::Primitive(primitive) = &property.kind else {
            panic!("expected primitive property");
        };
        assert_eq!(primitive.policy, ValuePolicy::Expected(json!("b")));
        assert!(property.fallback().is_none());
    }

    #[test]
    fn test_follow_keymap_is_one_hop() {
        let rule = ObjectRule::new().remap("a", "b").remap("b", "c");
        assert_eq!(rule.follow_keymap("a"), "b");
        assert_eq!(rule.follow_keymap("b"), "c");
        assert_eq!(rule.follow_keymap("z"), "z");
    }

    #[test]
    fn test_item_rule_kind() {
        let items = ItemRule::from(ObjectRule::new());
        assert!(items.accepts_kind(&json!({})));
        assert!(!items.accepts_kind(&json!([])));
        assert_eq!(items.kind_name(), "object");
        assert_eq!(ItemRule::from(PrimitiveType::Number).kind_name(), "number");
    }
}
