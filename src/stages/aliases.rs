//! Alias expansion
//!
//! Every alias of a property becomes a sibling copy of that property, so the
//! extraction stage can look the value up under any of the names. Copies are
//! marked with the canonical name they came from, which keeps the group
//! together when the required policy is applied.

use crate::error::{CoreParserError, Result};
use crate::rule::{ArrayRule, ObjectRule, PropertyKind, Rule};
use crate::traverse::{self, RuleVisitor, TraverseOptions, VisitorContext};

/// Rewrites object rules in place, recursing through the context
#[derive(Debug, Default)]
pub struct AliasExpander {
    inserted: usize,
}

impl AliasExpander {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of alias copies inserted so far
    pub fn inserted(&self) -> usize {
        self.inserted
    }
}

impl RuleVisitor for AliasExpander {
    fn visit_object_rule(&mut self, ctx: &mut VisitorContext, rule: &mut ObjectRule) -> anyhow::Result<()> {
        // Children are handled here so a property is expanded after its subtree
        ctx.skip();

        let declared: Vec<String> = rule.properties.keys().cloned().collect();
        for key in declared {
            let Some(property) = rule.properties.get_mut(&key) else {
                continue;
            };
            if let PropertyKind::Nested(nested) = &mut property.kind {
                ctx.traverse(nested, self, TraverseOptions::property(&key))?;
            }

            if property.aliases.is_empty() {
                continue;
            }
            let aliases = std::mem::take(&mut property.aliases);
            let mut copy = property.clone();
            copy.alias_of = Some(key.clone());

            for alias in &aliases {
                if rule.properties.contains_key(alias) {
                    return Err(CoreParserError::schema(format!(
                        "alias collision: \"{alias}\" of property \"{key}\" is already a property"
                    ))
                    .into());
                }
                rule.properties.insert(alias.clone(), copy.clone());
                self.inserted += 1;
            }
        }
        Ok(())
    }

    fn visit_array_rule(&mut self, _ctx: &mut VisitorContext, _rule: &mut ArrayRule) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Expand the aliases of `rule` and every nested rule
pub fn expand(mut rule: Rule) -> Result<Rule> {
    let mut expander = AliasExpander::new();
    traverse::traverse(&mut rule, &mut expander)?;
    tracing::trace!(inserted = expander.inserted(), "expanded aliases");
    Ok(rule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::rule::{PrimitiveType, PropertyRule};

    #[test]
    fn test_aliases_become_sibling_copies() {
        let rule: Rule = ObjectRule::new()
            .property("a", PropertyRule::number().alias("b").alias("c"))
            .property("d", PropertyRule::string())
            .into();

        let expanded = expand(rule).unwrap();
        let object = expanded.as_object().unwrap();

        let keys: Vec<&str> = object.properties.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "d", "b", "c"]);

        let b = &object.properties["b"];
        assert_eq!(b.alias_of.as_deref(), Some("a"));
        assert!(b.aliases.is_empty());
        assert_eq!(b.kind, object.properties["a"].kind);
        assert!(object.properties["a"].aliases.is_empty());
        assert_eq!(object.canonical_name("c"), "a");
        assert_eq!(object.canonical_name("d"), "d");
    }

    #[test]
    fn test_nested_aliases_are_expanded() {
        let rule: Rule = ObjectRule::new()
            .property(
                "outer",
                PropertyRule::nested(ObjectRule::new().property("x", PropertyRule::number().alias("y")))
                    .alias("outerAlias"),
            )
            .into();

        let expanded = expand(rule).unwrap();
        let object = expanded.as_object().unwrap();
        for key in ["outer", "outerAlias"] {
            let nested = object.properties[key].as_rule().unwrap().as_object().unwrap();
            assert!(nested.properties.contains_key("y"), "{key} should carry the inner alias");
        }
    }

    #[test]
    fn test_aliases_inside_array_items() {
        let rule: Rule = ArrayRule::new(ObjectRule::new().property("id", PropertyRule::string().alias("videoId")))
            .into();

        let expanded = expand(rule).unwrap();
        let items = expanded.as_array().unwrap().items.as_rule().unwrap().as_object().unwrap();
        assert!(items.properties.contains_key("videoId"));
    }

    #[test]
    fn test_collision_with_sibling_fails() {
        let rule: Rule = ObjectRule::new()
            .property("a", PropertyRule::number().alias("existing"))
            .property("existing", PrimitiveType::String)
            .into();

        let err = expand(rule).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert!(err.message().starts_with("alias collision"));
    }

    #[test]
    fn test_collision_reports_trace() {
        let rule: Rule = ObjectRule::new()
            .property(
                "outer",
                ObjectRule::new()
                    .property("a", PropertyRule::number().alias("b"))
                    .property("c", PropertyRule::number().alias("b")),
            )
            .into();

        let err = expand(rule).unwrap_err();
        assert!(err.message().contains("\"b\""));
        assert_eq!(err.locations(), &["subrule at property \"outer\""]);
    }

    #[test]
    fn test_expansion_is_idempotent() {
        let rule: Rule = ObjectRule::new()
            .property("a", PropertyRule::number().alias("b"))
            .into();
        let once = expand(rule).unwrap();
        let twice = expand(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_input_rule_is_not_touched() {
        let rule: Rule = ObjectRule::new()
            .property("a", PropertyRule::number().alias("b"))
            .into();
        let before = rule.clone();
        let _ = expand(rule.clone()).unwrap();
        assert_eq!(rule, before);
    }
}
