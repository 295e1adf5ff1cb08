//! Agent definitions — personas, sampling settings, tools, and handoffs.
//!
//! The registry is pure data: which specialist handles a message is decided
//! by the model reading the main agent's instructions, not by code here.
//! Each handoff target is offered to the model as a `transfer_to_<agent>`
//! function by the runner.

mod prompts;

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use serde::Serialize;
use serde_json::{Value, json};

use crate::openai::function_tool;
use crate::tools::ToolSet;

use self::prompts::{
    CODER_INSTRUCTIONS, DEVELOPER_INSTRUCTIONS, MAIN_INSTRUCTIONS, QUOTES_INSTRUCTIONS,
    SHIA_INSTRUCTIONS, SINDHI_INSTRUCTIONS, TRANSLATE_INSTRUCTIONS,
};

/// Name of the entry-point agent.
pub const MAIN_AGENT: &str = "ASA-Mind";

/// Sampling parameters sent with every completion of an agent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ModelSettings {
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
}

impl ModelSettings {
    pub const fn new(temperature: f64, top_p: f64, max_tokens: u32) -> Self {
        Self {
            temperature,
            top_p,
            max_tokens,
        }
    }
}

/// An immutable agent configuration.
#[derive(Clone, Debug, Serialize)]
pub struct AgentDescriptor {
    /// Unique name (e.g. "ASA-Mind", "CodingFixer").
    pub name: String,
    /// One-liner shown to other agents when they may hand off to this one.
    pub handoff_description: String,
    /// Persona and policy text used as the system prompt.
    pub instructions: String,
    pub settings: ModelSettings,
    /// Names of tools from the shared [`ToolSet`].
    pub tools: Vec<String>,
    /// Names of agents this one may hand off to.
    pub handoffs: Vec<String>,
}

impl AgentDescriptor {
    pub fn new(name: &str, handoff_description: &str, instructions: &str, settings: ModelSettings) -> Self {
        Self {
            name: name.to_string(),
            handoff_description: handoff_description.to_string(),
            instructions: instructions.trim().to_string(),
            settings,
            tools: Vec::new(),
            handoffs: Vec::new(),
        }
    }

    pub fn with_tools(mut self, tools: &[&str]) -> Self {
        self.tools = tools.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_handoffs(mut self, handoffs: &[&str]) -> Self {
        self.handoffs = handoffs.iter().map(|h| h.to_string()).collect();
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.handoffs.is_empty()
    }
}

/// Validated, name-indexed set of agents.
#[derive(Clone, Debug)]
pub struct AgentRegistry {
    agents: BTreeMap<String, Arc<AgentDescriptor>>,
    main: Arc<AgentDescriptor>,
}

impl AgentRegistry {
    /// The ASA-Mind agent graph: one router and six specialist leaves.
    pub fn asa_mind(tools: &ToolSet) -> Result<Self> {
        let shia = AgentDescriptor::new(
            "ShiaAgent",
            "Answers Islamic and Shia questions with book references.",
            SHIA_INSTRUCTIONS,
            ModelSettings::new(0.9, 0.5, 2048),
        );
        let coder = AgentDescriptor::new(
            "CodingFixer",
            "Fixes, explains, and writes code.",
            CODER_INSTRUCTIONS,
            ModelSettings::new(0.3, 0.7, 2048),
        )
        .with_tools(&["coding_tool"]);
        let developer = AgentDescriptor::new(
            "Developer",
            "Plans and builds websites, frontends, and layouts.",
            DEVELOPER_INSTRUCTIONS,
            ModelSettings::new(0.2, 0.7, 2048),
        )
        .with_tools(&["coding_tool", "developer_tool"]);
        let sindhi = AgentDescriptor::new(
            "SindhiAgent",
            "Chats in Sindhi with Sindhi speakers.",
            SINDHI_INSTRUCTIONS,
            ModelSettings::new(0.7, 0.5, 1048),
        )
        .with_tools(&["sindhi_tool"]);
        let quotes = AgentDescriptor::new(
            "QuotesAgent",
            "Shares motivational quotes and uplifting thoughts.",
            QUOTES_INSTRUCTIONS,
            ModelSettings::new(0.7, 0.5, 1048),
        )
        .with_tools(&["motivation_tool"]);
        let translate = AgentDescriptor::new(
            "TranslaterAgent",
            "Translates between Sindhi, Urdu, English, and more.",
            TRANSLATE_INSTRUCTIONS,
            ModelSettings::new(0.7, 0.7, 1048),
        )
        .with_tools(&["translate_tool"]);

        let main = AgentDescriptor::new(
            MAIN_AGENT,
            "The main ASA-Mind assistant.",
            MAIN_INSTRUCTIONS,
            ModelSettings::new(0.7, 0.9, 2048),
        )
        .with_tools(&["creator_tool"])
        .with_handoffs(&[
            shia.name.as_str(),
            coder.name.as_str(),
            quotes.name.as_str(),
            sindhi.name.as_str(),
            developer.name.as_str(),
            translate.name.as_str(),
        ]);

        Self::new(
            MAIN_AGENT,
            vec![main, shia, coder, quotes, sindhi, developer, translate],
            tools,
        )
    }

    /// Build a registry, checking every tool and handoff reference.
    pub fn new(main: &str, agents: Vec<AgentDescriptor>, tools: &ToolSet) -> Result<Self> {
        let mut by_name = BTreeMap::new();
        for agent in agents {
            let name = agent.name.clone();
            if by_name.insert(name.clone(), Arc::new(agent)).is_some() {
                return Err(anyhow!("duplicate agent name: {name}"));
            }
        }

        for agent in by_name.values() {
            for tool in &agent.tools {
                if !tools.contains(tool) {
                    return Err(anyhow!("agent {} references unknown tool {tool}", agent.name));
                }
            }
            for target in &agent.handoffs {
                if target == &agent.name {
                    return Err(anyhow!("agent {} hands off to itself", agent.name));
                }
                if !by_name.contains_key(target) {
                    return Err(anyhow!(
                        "agent {} hands off to unknown agent {target}",
                        agent.name
                    ));
                }
            }
        }

        let main = by_name
            .get(main)
            .cloned()
            .ok_or_else(|| anyhow!("main agent {main} is not registered"))?;

        Ok(Self {
            agents: by_name,
            main,
        })
    }

    pub fn main(&self) -> Arc<AgentDescriptor> {
        self.main.clone()
    }

    pub fn get(&self, name: &str) -> Option<Arc<AgentDescriptor>> {
        self.agents.get(name).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<AgentDescriptor>> {
        self.agents.values()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Handoff function definitions offered to the model while `agent` runs.
    pub fn handoff_definitions(&self, agent: &AgentDescriptor) -> Vec<Value> {
        agent
            .handoffs
            .iter()
            .filter_map(|name| self.agents.get(name))
            .map(|target| {
                function_tool(
                    &handoff_tool_name(&target.name),
                    &format!(
                        "Handoff to the {} agent to handle the request. {}",
                        target.name, target.handoff_description
                    ),
                    json!({"type": "object", "properties": {}, "additionalProperties": false}),
                )
            })
            .collect()
    }

    /// Resolve a `transfer_to_*` call made by `agent` to its target.
    pub fn resolve_handoff(
        &self,
        agent: &AgentDescriptor,
        tool_name: &str,
    ) -> Option<Arc<AgentDescriptor>> {
        agent
            .handoffs
            .iter()
            .find(|name| handoff_tool_name(name) == tool_name)
            .and_then(|name| self.agents.get(name))
            .cloned()
    }
}

/// Function name under which a handoff to `agent_name` is exposed.
pub fn handoff_tool_name(agent_name: &str) -> String {
    let mut snake = String::new();
    let mut prev_lower = false;
    for ch in agent_name.chars() {
        if ch.is_ascii_alphanumeric() {
            if ch.is_ascii_uppercase() && prev_lower && !snake.ends_with('_') {
                snake.push('_');
            }
            prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
            snake.push(ch.to_ascii_lowercase());
        } else {
            if !snake.is_empty() && !snake.ends_with('_') {
                snake.push('_');
            }
            prev_lower = false;
        }
    }
    format!("transfer_to_{}", snake.trim_end_matches('_'))
}
