//! Process-wide registry of callable tools. Loaded at startup, read-only
//! afterwards; shared across runs behind an `Arc`.

use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

use crate::domain::types::ToolDefinition;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("tool '{0}' is already registered")]
    DuplicateToolName(String),
}

#[derive(Debug, Default)]
pub struct ToolCatalog {
    tools: Vec<ToolDefinition>,
    index: HashMap<String, usize>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: ToolDefinition) -> Result<(), CatalogError> {
        if self.index.contains_key(&tool.name) {
            return Err(CatalogError::DuplicateToolName(tool.name));
        }
        debug!(tool = tool.name.as_str(), "Registered tool");
        self.index.insert(tool.name.clone(), self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Tools in registration order.
    pub fn list_all(&self) -> &[ToolDefinition] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
