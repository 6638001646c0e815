//! Rule sanity check run before extraction
//!
//! Hard errors are reserved for rules that can never behave as written: a
//! `default` or `expected` value that the declared primitive type would
//! reject. Suspicious but workable rules only produce diagnostics.

use crate::error::{CoreParserError, Result};
use crate::rule::{ArrayRule, ObjectRule, PrimitiveRule, PropertyKind, Rule, ValuePolicy, ValueKind};
use crate::traverse::{self, Diagnostic, RuleVisitor, VisitorContext};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct RuleChecker;

impl RuleChecker {
    fn check_policy(key: &str, primitive: &PrimitiveRule) -> anyhow::Result<()> {
        let (label, value) = match &primitive.policy {
            ValuePolicy::Free => return Ok(()),
            ValuePolicy::Default(value) => ("default", value),
            ValuePolicy::Expected(value) => ("expected", value),
        };
        if !primitive.ty.matches(value) {
            return Err(CoreParserError::schema(format!(
                "{label} value of property \"{key}\" is {}, declared type is {}",
                ValueKind::of(value),
                primitive.ty
            ))
            .into());
        }
        Ok(())
    }
}

impl RuleVisitor for RuleChecker {
    fn visit_object_rule(&mut self, ctx: &mut VisitorContext, rule: &mut ObjectRule) -> anyhow::Result<()> {
        for (key, property) in &rule.properties {
            if let PropertyKind::Primitive(primitive) = &property.kind {
                Self::check_policy(key, primitive)?;
            }
        }

        let mut targets: HashMap<&str, &str> = HashMap::new();
        for (source, target) in &rule.keymap {
            if let Some(previous) = targets.insert(target.as_str(), source.as_str()) {
                ctx.error(format!(
                    "keymap sends both \"{previous}\" and \"{source}\" to \"{target}\""
                ));
            }
        }

        if rule.properties.is_empty() {
            ctx.error("object rule has no properties");
        }
        Ok(())
    }

    fn visit_array_rule(&mut self, _ctx: &mut VisitorContext, _rule: &mut ArrayRule) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Validate `rule`, logging and returning the diagnostics it produced
pub fn check(rule: &mut Rule) -> Result<Vec<Diagnostic>> {
    let diagnostics = traverse::traverse(rule, &mut RuleChecker)?;
    for diagnostic in &diagnostics {
        tracing::warn!(%diagnostic, "suspicious rule");
    }
    Ok(diagnostics)
}
