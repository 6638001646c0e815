use crate::rule::Rule;
use crate::stages::Stage;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The unit threaded through the pipeline: a value and the rule governing it
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineItem {
    pub value: Value,
    pub rule: Rule,
}

impl PipelineItem {
    pub fn new(value: Value, rule: Rule) -> Self {
        PipelineItem { value, rule }
    }
}

/// Order of the two reshaping stages that follow extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StageOrder {
    #[default]
    RemapThenFlatten,
    FlattenThenRemap,
}

impl StageOrder {
    pub fn stages(self) -> [Stage; 4] {
        match self {
            StageOrder::RemapThenFlatten => [Stage::Aliases, Stage::Extract, Stage::Remap, Stage::Flatten],
            StageOrder::FlattenThenRemap => [Stage::Aliases, Stage::Extract, Stage::Flatten, Stage::Remap],
        }
    }
}

/// Configuration for a [`Parser`](crate::Parser)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParserConfig {
    /// Separator used to join parent and child keys when flattening
    pub separator: String,

    pub stage_order: StageOrder,

    /// Run the rule check before extraction
    pub validate_rules: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            separator: String::from("-"),
            stage_order: StageOrder::default(),
            validate_rules: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config() {
        let config = ParserConfig::default();
        assert_eq!(config.separator, "-");
        assert_eq!(config.stage_order, StageOrder::RemapThenFlatten);
        assert!(config.validate_rules);
    }

    #[test]
    fn test_partial_config_document() {
        let config: ParserConfig =
            serde_json::from_value(json!({"stageOrder": "flattenThenRemap"})).unwrap();
        assert_eq!(config.stage_order, StageOrder::FlattenThenRemap);
        assert_eq!(config.separator, "-");
        assert!(config.validate_rules);
    }

    #[test]
    fn test_stage_orders() {
        assert_eq!(StageOrder::RemapThenFlatten.stages()[2], Stage::Remap);
        assert_eq!(StageOrder::FlattenThenRemap.stages()[2], Stage::Flatten);
    }
}
