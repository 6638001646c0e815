//! Pipeline orchestrator
//!
//! A [`Parser`] clones the caller's value and rule once, then moves the pair
//! through the stages in the configured order.

use crate::error::{CoreParserError, Result};
use crate::rule::Rule;
use crate::stages::Stage;
use crate::types::{ParserConfig, PipelineItem};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Per-call state shared with the stages
#[derive(Debug)]
pub struct PipelineContext<'a> {
    config: &'a ParserConfig,
    completed: Vec<Stage>,
}

impl<'a> PipelineContext<'a> {
    pub fn new(config: &'a ParserConfig) -> Self {
        PipelineContext {
            config,
            completed: Vec::with_capacity(4),
        }
    }

    pub fn config(&self) -> &ParserConfig {
        self.config
    }

    pub fn has_completed(&self, stage: Stage) -> bool {
        self.completed.contains(&stage)
    }

    pub fn completed(&self) -> &[Stage] {
        &self.completed
    }

    fn mark_completed(&mut self, stage: Stage) {
        self.completed.push(stage);
    }
}

/// Applies rules to values
#[derive(Debug, Clone, Default)]
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    pub fn new(config: ParserConfig) -> Self {
        Parser { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Run every stage and return the untyped output
    pub fn parse_to_any(&self, value: &Value, rule: &Rule) -> Result<Value> {
        let mut ctx = PipelineContext::new(&self.config);
        let mut item = PipelineItem::new(value.clone(), rule.clone());

        for stage in self.config.stage_order.stages() {
            tracing::trace!(%stage, "running stage");
            item = stage.apply(&ctx, item).map_err(|err| {
                tracing::debug!(%stage, error = %err, "stage failed");
                err
            })?;
            ctx.mark_completed(stage);
        }

        Ok(item.value)
    }

    /// Run every stage and decode the output into `T`
    pub fn parse<T: DeserializeOwned>(&self, value: &Value, rule: &Rule) -> Result<T> {
        let output = self.parse_to_any(value, rule)?;
        serde_path_to_error::deserialize(output).map_err(|err| {
            let path = err.path().to_string();
            CoreParserError::decode(err.into_inner().to_string()).with_location(format!("output path {path}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::rule::{ObjectRule, PrimitiveType, PropertyRule};
    use crate::types::StageOrder;
    use serde::Deserialize;
    use serde_json::json;

    fn flatten_rule() -> Rule {
        ObjectRule::new()
            .flatten(true)
            .property("test", ObjectRule::new().property("test", PrimitiveType::String))
            .remap("test-test", "t2")
            .into()
    }

    #[test]
    fn test_both_stage_orders_apply_flattened_keymap() {
        let value = json!({"test": {"test": "v"}});
        for stage_order in [StageOrder::RemapThenFlatten, StageOrder::FlattenThenRemap] {
            let parser = Parser::new(ParserConfig {
                stage_order,
                ..ParserConfig::default()
            });
            assert_eq!(
                parser.parse_to_any(&value, &flatten_rule()).unwrap(),
                json!({"t2": "v"}),
                "{stage_order:?}"
            );
        }
    }

    #[test]
    fn test_context_tracks_completed_stages() {
        let config = ParserConfig::default();
        let mut ctx = PipelineContext::new(&config);
        assert!(!ctx.has_completed(Stage::Remap));
        ctx.mark_completed(Stage::Aliases);
        ctx.mark_completed(Stage::Remap);
        assert!(ctx.has_completed(Stage::Remap));
        assert_eq!(ctx.completed(), &[Stage::Aliases, Stage::Remap]);
    }

    #[test]
    fn test_custom_separator() {
        let parser = Parser::new(ParserConfig {
            separator: "_".into(),
            ..ParserConfig::default()
        });
        let rule: Rule = ObjectRule::new()
            .flatten(true)
            .property("a", ObjectRule::new().property("b", PrimitiveType::Number))
            .into();
        assert_eq!(parser.parse_to_any(&json!({"a": {"b": 1}}), &rule).unwrap(), json!({"a_b": 1}));
    }

    #[test]
    fn test_rule_check_can_be_disabled() {
        let rule: Rule = ObjectRule::new()
            .property("n", PropertyRule::number().default_value("seven"))
            .into();

        let err = Parser::default().parse_to_any(&json!({}), &rule).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);

        let lenient = Parser::new(ParserConfig {
            validate_rules: false,
            ..ParserConfig::default()
        });
        assert_eq!(lenient.parse_to_any(&json!({}), &rule).unwrap(), json!({"n": "seven"}));
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Video {
        id: String,
        views: u64,
    }

    #[test]
    fn test_typed_parse() {
        let rule: Rule = ObjectRule::new()
            .property("id", PrimitiveType::String)
            .property("views", PrimitiveType::Number)
            .into();
        let video: Video = Parser::default()
            .parse(&json!({"id": "abc", "views": 12, "extra": 1}), &rule)
            .unwrap();
        assert_eq!(video, Video { id: "abc".into(), views: 12 });
    }

    #[test]
    fn test_typed_parse_reports_decode_path() {
        let rule: Rule = ObjectRule::new()
            .property("id", PrimitiveType::String)
            .property("views", PrimitiveType::Number)
            .into();
        let err = Parser::default()
            .parse::<Video>(&json!({"id": "abc", "views": -3}), &rule)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(err.locations(), &["output path views"]);
        assert!(err.to_string().ends_with("\n  at output path views"));
    }
}
