//! # jsonmold - declarative JSON extraction
//!
//! Applies a *rule* describing the expected shape of a JSON value to an
//! untyped, arbitrarily nested `serde_json::Value` and produces a validated,
//! normalized output. Missing or malformed optional data is tolerated;
//! strictly required data is reported with a trace of the enclosing rules.
//!
//! ## Modules
//!
//! - **rule**: the rule tree, its builders and its document form
//! - **jsonpath**: dotted/bracketed key resolution used for property lookup
//! - **traverse**: generic visitor-based walk over rule trees
//! - **stages**: alias expansion, extraction, remap and flatten
//! - **pipeline**: the [`Parser`] running the stages in order
//!
//! ## Quick Start
//!
//! ```rust
//! use jsonmold::{ObjectRule, PrimitiveType, PropertyRule, Rule};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), jsonmold::CoreParserError> {
//! let rule: Rule = ObjectRule::new()
//!     .property("videoId", PropertyRule::string().alias("id"))
//!     .property("views", PropertyRule::number().default_value(0))
//!     .property("author", ObjectRule::new().property("name", PrimitiveType::String))
//!     .flatten(true)
//!     .into();
//!
//! let data = json!({"id": "abc", "author": {"name": "Alice"}, "junk": true});
//! let output = jsonmold::parse_to_any(&data, &rule)?;
//!
//! assert_eq!(output, json!({"id": "abc", "views": 0, "author-name": "Alice"}));
//! # Ok(())
//! # }
//! ```
//!
//! ### Rule documents
//!
//! ```rust
//! use jsonmold::Rule;
//! use serde_json::json;
//!
//! let rule = Rule::from_json_str(r#"{
//!     "type": "array",
//!     "limit": 2,
//!     "items": {"type": "object", "strict": false, "properties": {"n": "number"}}
//! }"#).unwrap();
//!
//! let output = jsonmold::parse_to_any(&json!([{"n": 1}, {"n": "x"}, {"n": 3}]), &rule).unwrap();
//! assert_eq!(output, json!([{"n": 1}]));
//! ```

pub mod error;
pub mod jsonpath;
pub mod pipeline;
pub mod rule;
pub mod stages;
pub mod traverse;
pub mod types;

use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde_json::Value;

// Re-export commonly used types for convenience
pub use error::{CoreParserError, ErrorKind};
pub use pipeline::{Parser, PipelineContext};
pub use rule::{
    ArrayRule, Condition, ItemRule, ObjectRule, PrimitiveRule, PrimitiveType, PropertyKind,
    PropertyRule, Rule, ValuePolicy,
};
pub use stages::Stage;
pub use traverse::{traverse, Diagnostic, RuleIterator, RuleVisitor, TraverseOptions, VisitorContext};
pub use types::{ParserConfig, PipelineItem, StageOrder};

static DEFAULT_PARSER: Lazy<Parser> = Lazy::new(Parser::default);

/// Apply `rule` to `value` with the default configuration
pub fn parse_to_any(value: &Value, rule: &Rule) -> error::Result<Value> {
    DEFAULT_PARSER.parse_to_any(value, rule)
}

/// Apply `rule` to `value` with the default configuration and decode the
/// output into `T`
pub fn parse<T: DeserializeOwned>(value: &Value, rule: &Rule) -> error::Result<T> {
    DEFAULT_PARSER.parse(value, rule)
}
