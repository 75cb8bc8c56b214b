//! Per-type block behavior
//!
//! A block type maps to how it turns back into template source. Types with
//! no entry get the generic behavior: keep the markers, restore templates
//! inside.

use super::block::{Block, BlockKind, ParseDepth, parse};
use crate::error::Result;
use std::collections::HashMap;

/// Turns one block into template source
pub type ToTemplate = fn(&Block, &BlockRegistry) -> Result<String>;

/// Behavior record for one block type
#[derive(Debug, Clone, Copy)]
pub struct BlockBehavior {
    /// Block to template source
    pub to_template: ToTemplate,
}

/// Type used for helper output blocks
pub const HELPER: &str = "helper";
/// Type used for partial output blocks
pub const PARTIAL: &str = "partial";

const GENERIC: BlockBehavior = BlockBehavior {
    to_template: generic_to_template,
};

/// Mapping from block type name to behavior
#[derive(Debug, Clone, Default)]
pub struct BlockRegistry {
    behaviors: HashMap<String, BlockBehavior>,
}

impl BlockRegistry {
    /// Registry without any types; every block is generic
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the `helper` and `partial` types
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(
            HELPER,
            BlockBehavior {
                to_template: helper_to_template,
            },
        );
        registry.register(
            PARTIAL,
            BlockBehavior {
                to_template: partial_to_template,
            },
        );
        registry
    }

    /// Add or replace the behavior for `type_name`
    pub fn register(&mut self, type_name: &str, behavior: BlockBehavior) {
        self.behaviors.insert(type_name.to_string(), behavior);
    }

    /// Behavior for `type_name`, the generic one if unregistered
    pub fn behavior(&self, type_name: &str) -> BlockBehavior {
        self.behaviors.get(type_name).copied().unwrap_or(GENERIC)
    }

    /// Template source for one block
    pub fn to_template(&self, block: &Block) -> Result<String> {
        match (block.kind, block.type_name.as_deref()) {
            (BlockKind::Typed, Some(type_name)) => (self.behavior(type_name).to_template)(block, self),
            _ => Ok(block.content.clone()),
        }
    }

    /// Template source for a whole document
    pub fn template_str(&self, markdown: &str) -> Result<String> {
        parse(markdown, ParseDepth::None)?.map_join(|block| self.to_template(block))
    }
}

fn generic_to_template(block: &Block, registry: &BlockRegistry) -> Result<String> {
    Ok(format!(
        "{}{}{}",
        block.open_marker(),
        registry.template_str(&block.content)?,
        block.close_marker()
    ))
}

fn helper_to_template(block: &Block, _registry: &BlockRegistry) -> Result<String> {
    let name = block.name.as_deref().unwrap_or_default();
    let params: String = block
        .params
        .iter()
        .map(|p| format!(" \"{}\"", p.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect();
    Ok(format!("{{{{{{{name}{params}}}}}}}"))
}

fn partial_to_template(block: &Block, _registry: &BlockRegistry) -> Result<String> {
    Ok(format!("{{{{>{}}}}}", block.name.as_deref().unwrap_or_default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helper_block_becomes_triple_stash() {
        let registry = BlockRegistry::with_builtins();
        let block = Block::typed(HELPER, "diffStep", &["1.1"], "\n```diff\n```\n");
        assert_eq!(registry.to_template(&block).unwrap(), "{{{diffStep \"1.1\"}}}");
    }

    #[test]
    fn test_helper_without_params() {
        let registry = BlockRegistry::with_builtins();
        let block = Block::typed(HELPER, "toc", &[], "x");
        assert_eq!(registry.to_template(&block).unwrap(), "{{{toc}}}");
    }

    #[test]
    fn test_partial_block_becomes_include() {
        let registry = BlockRegistry::with_builtins();
        let block = Block::typed(PARTIAL, "intro", &[], "Welcome!");
        assert_eq!(registry.to_template(&block).unwrap(), "{{>intro}}");
    }

    #[test]
    fn test_unregistered_type_keeps_markers_and_restores_inside() {
        let registry = BlockRegistry::with_builtins();
        let input = "[{]: <note> (tip)\nsee [{]: <helper> (diffStep 2)\nd\n[}]: #\n[}]: #";
        let out = registry.template_str(input).unwrap();
        assert_eq!(out, "[{]: <note> (tip)\nsee {{{diffStep \"2\"}}}\n[}]: #");
    }

    #[test]
    fn test_empty_registry_is_generic() {
        let registry = BlockRegistry::new();
        let input = "a [{]: <helper> (x)y[}]: # b";
        assert_eq!(registry.template_str(input).unwrap(), input);
    }

    #[test]
    fn test_register_overrides() {
        fn shout(block: &Block, _: &BlockRegistry) -> Result<String> {
            Ok(block.content.to_uppercase())
        }
        let mut registry = BlockRegistry::with_builtins();
        registry.register(HELPER, BlockBehavior { to_template: shout });
        let block = Block::typed(HELPER, "x", &[], "abc");
        assert_eq!(registry.to_template(&block).unwrap(), "ABC");
    }
}
