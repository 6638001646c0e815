use super::{RuleIterator, RuleVisitor};
use crate::error::{subrule_location, CoreParserError, ARRAY_SUBRULE_LOCATION};
use crate::rule::Rule;
use std::fmt;

/// A non-fatal finding recorded by a visitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Property names from the root rule to the node that reported it
    pub path: Vec<String>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "<root>: {}", self.message)
        } else {
            write!(f, "{}: {}", self.path.join("."), self.message)
        }
    }
}

/// How a manual re-entry into the engine is positioned
#[derive(Debug, Clone, Default)]
pub struct TraverseOptions {
    /// Path segment appended to the current path for the nested run
    pub segment: Option<String>,
    /// Trace locations the nested run starts with, outermost first
    pub locations: Vec<String>,
}

impl TraverseOptions {
    /// Position a nested run at property `key` of the current object rule
    pub fn property(key: &str) -> Self {
        TraverseOptions {
            segment: Some(key.to_string()),
            locations: vec![subrule_location(key)],
        }
    }

    /// Position a nested run at the item rule of the current array rule
    pub fn array_items() -> Self {
        TraverseOptions {
            segment: None,
            locations: vec![ARRAY_SUBRULE_LOCATION.to_string()],
        }
    }

    /// Replace the starting trace locations
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.locations = vec![location.into()];
        self
    }
}

/// Per-node handle given to visitor callbacks
///
/// A fresh context is created for every visited node and dropped once the
/// callback returns and the engine has read its flags.
#[derive(Debug)]
pub struct VisitorContext {
    path: Vec<String>,
    skipped: bool,
    broken: bool,
    diagnostics: Vec<Diagnostic>,
}

impl VisitorContext {
    pub(crate) fn new(path: Vec<String>) -> Self {
        VisitorContext {
            path,
            skipped: false,
            broken: false,
            diagnostics: Vec::new(),
        }
    }

    /// Property names from the root rule to this node
    pub fn full_path(&self) -> &[String] {
        &self.path
    }

    /// Do not descend into this node's children
    pub fn skip(&mut self) {
        self.skipped = true;
    }

    /// Stop the whole traversal, siblings and ancestors' siblings included
    pub fn break_traversal(&mut self) {
        self.broken = true;
    }

    /// Record a diagnostic for this node and skip its children
    pub fn error(&mut self, message: impl Into<String>) {
        self.skipped = true;
        self.diagnostics.push(Diagnostic {
            path: self.path.clone(),
            message: message.into(),
        });
    }

    pub fn is_skipped(&self) -> bool {
        self.skipped
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Re-enter the engine for `rule` with its own iterator
    ///
    /// The nested run's path extends this node's path; its trace starts from
    /// `options.locations` and is completed by the enclosing run if the
    /// error propagates out of the current callback. Diagnostics of the
    /// nested run are attached to this context.
    pub fn traverse<V>(
        &mut self,
        rule: &mut Rule,
        visitor: &mut V,
        options: TraverseOptions,
    ) -> Result<(), CoreParserError>
    where
        V: RuleVisitor + ?Sized,
    {
        let mut path = self.path.clone();
        path.extend(options.segment);

        let mut iterator = RuleIterator::with_origin(path, options.locations);
        let result = iterator.traverse_rule(rule, visitor);
        self.diagnostics.extend(iterator.into_diagnostics());
        result
    }

    pub(crate) fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
