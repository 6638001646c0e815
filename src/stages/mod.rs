//! Pipeline stages
//!
//! Every stage consumes a [`PipelineItem`] and produces the next one. The
//! value and rule are moved through the chain, never shared, so no stage can
//! observe another stage's intermediate state except through its output.

pub mod aliases;
pub mod check;
pub mod condition;
pub mod extract;
pub mod flatten;
pub mod remap;

use crate::error::Result;
use crate::pipeline::PipelineContext;
use crate::types::PipelineItem;
use flatten::FlattenOptions;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Expand aliases into sibling property copies
    Aliases,
    /// Check the rule (when enabled) and extract the value
    Extract,
    /// Rename output keys through keymaps
    Remap,
    /// Merge nested objects into their parents
    Flatten,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Aliases => "aliases",
            Stage::Extract => "extract",
            Stage::Remap => "remap",
            Stage::Flatten => "flatten",
        }
    }

    pub fn apply(self, ctx: &PipelineContext<'_>, item: PipelineItem) -> Result<PipelineItem> {
        let PipelineItem { value, mut rule } = item;
        match self {
            Stage::Aliases => {
                let rule = aliases::expand(rule)?;
                Ok(PipelineItem { value, rule })
            }
            Stage::Extract => {
                if ctx.config().validate_rules {
                    check::check(&mut rule)?;
                }
                let value = extract::apply_rule(&value, &rule)?;
                Ok(PipelineItem { value, rule })
            }
            Stage::Remap => {
                let value = remap::remap_value(value, Some(&rule));
                Ok(PipelineItem { value, rule })
            }
            Stage::Flatten => {
                let options = FlattenOptions::new(&ctx.config().separator)
                    .keys_remapped(ctx.has_completed(Stage::Remap));
                let value = flatten::flatten_value(value, Some(&rule), &options, false);
                Ok(PipelineItem { value, rule })
            }
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
