use loomql_core::Result;
use serde_json::Value;

use super::{Capability, PluginContext, PluginTarget, SchemaPlugin, target_field};
use crate::resolver::ResolverRef;

/// Reduces a list result to its first item.
pub struct FirstResultPlugin;

impl SchemaPlugin for FirstResultPlugin {
    fn identifier(&self) -> &str {
        "firstResult"
    }

    fn capabilities(&self) -> &[Capability] {
        &[Capability::ModelQuery, Capability::Query]
    }

    fn apply(&self, target: &mut PluginTarget<'_>, _context: &mut PluginContext, _config: &Value) -> Result<()> {
        let field = target_field(target, self.identifier())?;
        field.add_afterware(ResolverRef::new("FirstResult", "first"));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Field;
    use serde_json::json;

    #[test]
    fn test_adds_afterware_once() {
        let mut field = Field::with_type("readOneArticle", "Article").unwrap();
        let mut context = PluginContext::default();
        for _ in 0..2 {
            FirstResultPlugin
                .apply(&mut PluginTarget::Query(&mut field), &mut context, &json!({}))
                .unwrap();
        }
        assert_eq!(field.afterware().len(), 1);
        assert_eq!(field.afterware()[0].to_string(), "FirstResult::first");
    }
}
