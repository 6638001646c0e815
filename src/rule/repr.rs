//! Document form of rules
//!
//! Rules are read from and written to JSON documents through a flat
//! representation that mirrors the document keys. Conversion into the typed
//! model is where malformed documents are rejected: missing `properties` or
//! `items`, primitive type tags at the top level, and primitives that set
//! both `default` and `expected`.

use super::{
    ArrayRule, ItemRule, ObjectRule, PrimitiveRule, PrimitiveType, PropertyKind, PropertyRule,
    Rule, ValuePolicy,
};
use crate::error::{subrule_location, CoreParserError, ARRAY_SUBRULE_LOCATION};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TypeTag {
    String,
    Number,
    Boolean,
    Any,
    Object,
    Array,
}

impl TypeTag {
    fn primitive(self) -> Option<PrimitiveType> {
        match self {
            TypeTag::String => Some(PrimitiveType::String),
            TypeTag::Number => Some(PrimitiveType::Number),
            TypeTag::Boolean => Some(PrimitiveType::Boolean),
            TypeTag::Any => Some(PrimitiveType::Any),
            TypeTag::Object | TypeTag::Array => None,
        }
    }
}

impl From<PrimitiveType> for TypeTag {
    fn from(ty: PrimitiveType) -> Self {
        match ty {
            PrimitiveType::String => TypeTag::String,
            PrimitiveType::Number => TypeTag::Number,
            PrimitiveType::Boolean => TypeTag::Boolean,
            PrimitiveType::Any => TypeTag::Any,
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &usize) -> bool {
    *value == 0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRule {
    #[serde(rename = "type")]
    ty: TypeTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    required: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    alias_of: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    strict: Option<bool>,
    #[serde(default, skip_serializing_if = "is_false")]
    flatten: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    flatten_all: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    properties: Option<IndexMap<String, RawProperty>>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    keymap: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    limit: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    items: Option<Box<RawProperty>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expected: Option<Value>,
}

/// A property or item is either a bare type name or a full rule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawProperty {
    Shorthand(TypeTag),
    Full(RawRule),
}

impl RawRule {
    fn bare(ty: TypeTag) -> Self {
        RawRule {
            ty,
            required: None,
            aliases: Vec::new(),
            alias_of: None,
            strict: None,
            flatten: false,
            flatten_all: false,
            properties: None,
            keymap: IndexMap::new(),
            limit: 0,
            items: None,
            default: None,
            expected: None,
        }
    }

    fn into_rule(self) -> Result<Rule, CoreParserError> {
        match self.ty {
            TypeTag::Object => self.into_object().map(Rule::Object),
            TypeTag::Array => self.into_array().map(Rule::Array),
            primitive => Err(CoreParserError::schema(format!(
                "expected an object or array rule, found primitive type \"{}\"",
                primitive.primitive().map(PrimitiveType::as_str).unwrap_or("?")
            ))),
        }
    }

    fn into_object(self) -> Result<ObjectRule, CoreParserError> {
        let Some(raw_properties) = self.properties else {
            return Err(CoreParserError::schema("object rule is missing \"properties\""));
        };

        let mut properties = IndexMap::with_capacity(raw_properties.len());
        for (key, raw) in raw_properties {
            let property = raw
                .into_property()
                .map_err(|err| err.with_location(subrule_location(&key)))?;
            properties.insert(key, property);
        }

        Ok(ObjectRule {
            strict: self.strict,
            flatten: self.flatten,
            flatten_all: self.flatten_all,
            properties,
            keymap: self.keymap,
            condition: None,
        })
    }

    fn into_array(self) -> Result<ArrayRule, CoreParserError> {
        let Some(raw_items) = self.items else {
            return Err(CoreParserError::schema("array rule is missing \"items\""));
        };
        let items = raw_items
            .into_item()
            .map_err(|err| err.with_location(ARRAY_SUBRULE_LOCATION))?;

        Ok(ArrayRule {
            limit: self.limit,
            strict: self.strict,
            items: Box::new(items),
            condition: None,
        })
    }
}

impl RawProperty {
    fn into_full(self) -> RawRule {
        match self {
            RawProperty::Shorthand(ty) => RawRule::bare(ty),
            RawProperty::Full(raw) => raw,
        }
    }

    fn into_property(self) -> Result<PropertyRule, CoreParserError> {
        let mut raw = self.into_full();
        let required = raw.required;
        let aliases = std::mem::take(&mut raw.aliases);
        let alias_of = raw.alias_of.take();

        let kind = match raw.ty.primitive() {
            Some(ty) => {
                let policy = match (raw.default, raw.expected) {
                    (Some(_), Some(_)) => {
                        return Err(CoreParserError::schema(
                            "a primitive property cannot define both \"default\" and \"expected\"",
                        ))
                    }
                    (Some(value), None) => ValuePolicy::Default(value),
                    (None, Some(value)) => ValuePolicy::Expected(value),
                    (None, None) => ValuePolicy::Free,
                };
                PropertyKind::Primitive(PrimitiveRule { ty, policy })
            }
            None => PropertyKind::Nested(raw.into_rule()?),
        };

        Ok(PropertyRule {
            required,
            aliases,
            alias_of,
            kind,
        })
    }

    fn into_item(self) -> Result<ItemRule, CoreParserError> {
        let raw = self.into_full();
        match raw.ty.primitive() {
            Some(ty) => Ok(ItemRule::Primitive(ty)),
            None => raw.into_rule().map(ItemRule::Nested),
        }
    }
}

impl From<&ObjectRule> for RawRule {
    fn from(rule: &ObjectRule) -> Self {
        let properties = rule
            .properties
            .iter()
            .map(|(key, property)| (key.clone(), RawProperty::Full(RawRule::from(property))))
            .collect();

        RawRule {
            strict: rule.strict,
            flatten: rule.flatten,
            flatten_all: rule.flatten_all,
            properties: Some(properties),
            keymap: rule.keymap.clone(),
            ..RawRule::bare(TypeTag::Object)
        }
    }
}

impl From<&ArrayRule> for RawRule {
    fn from(rule: &ArrayRule) -> Self {
        let items = match rule.items.as_ref() {
            ItemRule::Primitive(ty) => RawProperty::Shorthand((*ty).into()),
            ItemRule::Nested(nested) => RawProperty::Full(RawRule::from(nested)),
        };

        RawRule {
            strict: rule.strict,
            limit: rule.limit,
            items: Some(Box::new(items)),
            ..RawRule::bare(TypeTag::Array)
        }
    }
}

impl From<&Rule> for RawRule {
    fn from(rule: &Rule) -> Self {
        match rule {
            Rule::Object(object) => object.into(),
            Rule::Array(array) => array.into(),
        }
    }
}

impl From<&PropertyRule> for RawRule {
    fn from(property: &PropertyRule) -> Self {
        let mut raw = match &property.kind {
            PropertyKind::Nested(rule) => RawRule::from(rule),
            PropertyKind::Primitive(primitive) => {
                let mut raw = RawRule::bare(primitive.ty.into());
                match &primitive.policy {
                    ValuePolicy::Free => {}
                    ValuePolicy::Default(value) => raw.default = Some(value.clone()),
                    ValuePolicy::Expected(value) => raw.expected = Some(value.clone()),
                }
                raw
            }
        };
        raw.required = property.required;
        raw.aliases = property.aliases.clone();
        raw.alias_of = property.alias_of.clone();
        raw
    }
}

impl Serialize for Rule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RawRule::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Rule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawRule::deserialize(deserializer)?
            .into_rule()
            .map_err(serde::de::Error::custom)
    }
}

impl Rule {
    /// Read a rule document, reporting the JSON path of structural errors
    pub fn from_json_str(source: &str) -> Result<Self, CoreParserError> {
        let de = &mut serde_json::Deserializer::from_str(source);
        let raw: RawRule = serde_path_to_error::deserialize(de).map_err(document_error)?;
        raw.into_rule()
    }

    pub fn from_value(value: Value) -> Result<Self, CoreParserError> {
        let raw: RawRule = serde_path_to_error::deserialize(value).map_err(document_error)?;
        raw.into_rule()
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(RawRule::from(self))
    }
}

fn document_error<E: std::fmt::Display>(err: serde_path_to_error::Error<E>) -> CoreParserError {
    let path = err.path().to_string();
    CoreParserError::schema(format!("invalid rule document: {}", err.into_inner()))
        .with_location(format!("JSON path {path}"))
}
