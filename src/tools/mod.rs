//! Tool interface exposed to the model, plus the registry of built-in tools.
//!
//! A tool is a pure function from JSON arguments to a [`ToolOutput`]. Tools
//! never talk to the UI directly: anything that has to be shown is returned
//! as a [`UiEffect`] and performed by the turn handler.

pub mod builtin;

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use serde_json::Value;

use crate::config::AssetConfig;
use crate::message::OutgoingMessage;
use crate::openai::function_tool;

pub use self::builtin::{
    CodingTool, CreatorTool, DeveloperTool, MotivationTool, SindhiTool, TranslateTool,
};

/// A callable the model may invoke.
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    /// Natural-language description the model reads to decide on invocation.
    fn description(&self) -> &'static str;
    /// JSON schema of the arguments object.
    fn parameters(&self) -> Value;
    fn invoke(&self, args: &Value) -> Result<ToolOutput>;
}

/// Result of a tool invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolOutput {
    /// Text handed back to the model.
    pub text: String,
    pub effect: Option<UiEffect>,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            effect: None,
        }
    }

    pub fn with_effect(mut self, effect: UiEffect) -> Self {
        self.effect = Some(effect);
        self
    }
}

/// A UI side effect requested by a tool.
#[derive(Clone, Debug, PartialEq)]
pub enum UiEffect {
    SendMessage(OutgoingMessage),
}

/// Name-indexed set of tools shared by every agent.
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: BTreeMap<&'static str, Arc<dyn Tool>>,
}

impl ToolSet {
    /// The six tools ASA-Mind ships with.
    pub fn builtin(assets: &AssetConfig) -> Self {
        let mut set = ToolSet::default();
        set.insert(Arc::new(DeveloperTool));
        set.insert(Arc::new(CodingTool));
        set.insert(Arc::new(TranslateTool));
        set.insert(Arc::new(SindhiTool));
        set.insert(Arc::new(CreatorTool::new(assets.creator_image.clone())));
        set.insert(Arc::new(MotivationTool));
        set
    }

    pub fn insert(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.values()
    }

    /// Chat-completions definitions for the named tools, in the given order.
    pub fn definitions(&self, names: &[String]) -> Result<Vec<Value>> {
        names
            .iter()
            .map(|name| {
                let tool = self
                    .tools
                    .get(name.as_str())
                    .ok_or_else(|| anyhow!("unknown tool: {name}"))?;
                Ok(function_tool(tool.name(), tool.description(), tool.parameters()))
            })
            .collect()
    }
}

/// Read an optional string argument, falling back to `default`.
pub(crate) fn string_arg(args: &Value, key: &str, default: &str) -> String {
    args.get(key)
        .and_then(|v| v.as_str())
        .unwrap_or(default)
        .to_string()
}

/// Read a required string argument.
pub(crate) fn required_string_arg(args: &Value, key: &str) -> Result<String> {
    args.get(key)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("missing required argument '{key}'"))
}
