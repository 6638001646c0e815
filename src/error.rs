//! Error model shared by every pipeline stage
//!
//! A [`CoreParserError`] carries a base message plus an ordered list of
//! locations. Each enclosing rule application appends its own location while
//! the error unwinds, so `locations()[0]` is always the innermost subrule and
//! the last entry is the one closest to the root rule.

use std::fmt::Write as _;

use thiserror::Error;

const STACK_SEPARATOR: &str = "\n  at ";

/// Location pushed when an error crosses an object property boundary
pub fn subrule_location(key: &str) -> String {
    format!("subrule at property \"{key}\"")
}

/// Location pushed when an error crosses an array item boundary
pub const ARRAY_SUBRULE_LOCATION: &str = "array subrule";

/// Broad classification of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The rule itself is malformed (bad document, alias collision, ...)
    Schema,
    /// The input value disagrees with a strictly required part of the rule
    Mismatch,
    /// The extracted output could not be decoded into the requested type
    Decode,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Schema => "schema error",
            ErrorKind::Mismatch => "value mismatch",
            ErrorKind::Decode => "decode error",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}{}", .message, render_locations(.locations))]
pub struct CoreParserError {
    kind: ErrorKind,
    message: String,
    locations: Vec<String>,
}

impl CoreParserError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        CoreParserError {
            kind,
            message: message.into(),
            locations: Vec::new(),
        }
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Schema, message)
    }

    pub fn mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Mismatch, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Decode, message)
    }

    /// Convert an arbitrary callback error, keeping an existing
    /// `CoreParserError` (and its trace) intact.
    pub fn from_anyhow(error: anyhow::Error) -> Self {
        match error.downcast::<CoreParserError>() {
            Ok(inner) => inner,
            Err(other) => Self::schema(format!("{other:#}")),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Base message without the location trace
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Locations ordered from the innermost subrule outwards
    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    /// Append the location of an enclosing frame
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.locations.push(location.into());
        self
    }

    pub fn with_locations<I>(mut self, locations: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.locations.extend(locations.into_iter().map(Into::into));
        self
    }
}

fn render_locations(locations: &[String]) -> String {
    let mut out = String::new();
    for location in locations {
        let _ = write!(out, "{STACK_SEPARATOR}{location}");
    }
    out
}

pub type Result<T, E = CoreParserError> = std::result::Result<T, E>;
