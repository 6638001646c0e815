//! Generic depth-first walk over a rule tree
//!
//! The engine visits object and array rules in pre-order and hands each
//! node to a [`RuleVisitor`] together with a fresh [`VisitorContext`].
//! Primitive properties and items are leaves and are never visited.
//! Nested property rules push their name onto the path and a
//! `subrule at property "<key>"` location onto the trace; array items only
//! push `array subrule`, since the item rule describes every index at once.
//!
//! Errors returned by a callback are converted into [`CoreParserError`] and
//! get the trace of the failing node appended, innermost location first.

pub mod context;

pub use context::{Diagnostic, TraverseOptions, VisitorContext};

use crate::error::{subrule_location, CoreParserError, ARRAY_SUBRULE_LOCATION};
use crate::rule::{ArrayRule, ItemRule, ObjectRule, PropertyKind, Rule};

/// Callbacks invoked by the engine for every rule node
pub trait RuleVisitor {
    fn visit_object_rule(
        &mut self,
        ctx: &mut VisitorContext,
        rule: &mut ObjectRule,
    ) -> anyhow::Result<()>;

    fn visit_array_rule(
        &mut self,
        ctx: &mut VisitorContext,
        rule: &mut ArrayRule,
    ) -> anyhow::Result<()>;
}

/// State of one traversal run
#[derive(Debug, Default)]
pub struct RuleIterator {
    path: Vec<String>,
    trace: Vec<String>,
    broken: bool,
    diagnostics: Vec<Diagnostic>,
}

impl RuleIterator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing position, e.g. when re-entering from a visitor
    pub fn with_origin(path: Vec<String>, trace: Vec<String>) -> Self {
        RuleIterator {
            path,
            trace,
            broken: false,
            diagnostics: Vec::new(),
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn traverse_rule<V>(&mut self, rule: &mut Rule, visitor: &mut V) -> Result<(), CoreParserError>
    where
        V: RuleVisitor + ?Sized,
    {
        match rule {
            Rule::Object(object) => self.visit_object(object, visitor),
            Rule::Array(array) => self.visit_array(array, visitor),
        }
    }

    fn push_subrule(&mut self, key: Option<&str>) {
        match key {
            Some(key) => {
                self.trace.push(subrule_location(key));
                self.path.push(key.to_string());
            }
            None => self.trace.push(ARRAY_SUBRULE_LOCATION.to_string()),
        }
    }

    fn pop_subrule(&mut self, had_key: bool) {
        self.trace.pop();
        if had_key {
            self.path.pop();
        }
    }

    /// Wrap a callback failure with the current trace, innermost first
    fn wrap(&self, error: anyhow::Error) -> CoreParserError {
        CoreParserError::from_anyhow(error).with_locations(self.trace.iter().rev().cloned())
    }

    /// Read the context flags back; returns whether children should be visited
    fn settle(&mut self, ctx: VisitorContext) -> bool {
        let descend = !ctx.is_skipped() && !ctx.is_broken();
        if ctx.is_broken() {
            self.broken = true;
        }
        self.diagnostics.extend(ctx.into_diagnostics());
        descend
    }

    fn visit_nested<V>(&mut self, key: Option<&str>, rule: &mut Rule, visitor: &mut V) -> Result<(), CoreParserError>
    where
        V: RuleVisitor + ?Sized,
    {
        self.push_subrule(key);
        let result = self.traverse_rule(rule, visitor);
        self.pop_subrule(key.is_some());
        result
    }

    fn visit_object<V>(&mut self, rule: &mut ObjectRule, visitor: &mut V) -> Result<(), CoreParserError>
    where
        V: RuleVisitor + ?Sized,
    {
        let mut ctx = VisitorContext::new(self.path.clone());
        visitor
            .visit_object_rule(&mut ctx, rule)
            .map_err(|err| self.wrap(err))?;

        if !self.settle(ctx) {
            return Ok(());
        }

        for (key, property) in rule.properties.iter_mut() {
            if self.broken {
                break;
            }
            if let PropertyKind::Nested(nested) = &mut property.kind {
                self.visit_nested(Some(key.as_str()), nested, visitor)?;
            }
        }
        Ok(())
    }

    fn visit_array<V>(&mut self, rule: &mut ArrayRule, visitor: &mut V) -> Result<(), CoreParserError>
    where
        V: RuleVisitor + ?Sized,
    {
        let mut ctx = VisitorContext::new(self.path.clone());
        visitor
            .visit_array_rule(&mut ctx, rule)
            .map_err(|err| self.wrap(err))?;

        if !self.settle(ctx) {
            return Ok(());
        }

        if let ItemRule::Nested(items) = rule.items.as_mut() {
            self.visit_nested(None, items, visitor)?;
        }
        Ok(())
    }
}

/// Walk `rule` with `visitor` from the root, returning collected diagnostics
pub fn traverse<V>(rule: &mut Rule, visitor: &mut V) -> Result<Vec<Diagnostic>, CoreParserError>
where
    V: RuleVisitor + ?Sized,
{
    let mut iterator = RuleIterator::new();
    iterator.traverse_rule(rule, visitor)?;
    Ok(iterator.into_diagnostics())
}
