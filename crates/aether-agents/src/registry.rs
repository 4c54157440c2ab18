use aether_core::model::{AgentRole, Message};

use crate::reasoner;
use crate::topics::{self, Topic};

pub const GENERAL_TASK: &str = "Perform general analysis and propose steps.";
pub const DESIGNER_LOGO: &str = "Will craft vector logo with geometric primitives and typography grid.";
pub const DESIGNER_DEFAULT: &str = "Ready for visual ideation and layout options.";
pub const VERIFIER_SUMMARY: &str = "Checkpoints: goals defined, tools mapped, result verifiable. Risks: ambiguity, missing constraints.";

/// How an agent turns a prompt into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentKind {
    /// Lists a task for every recognized topic.
    Planner,
    /// Defers to the fallback reasoner.
    Analyst,
    /// Picks logo or generic layout guidance.
    Designer,
    /// Fixed checkpoint and risk summary.
    Verifier,
}

/// A named heuristic agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentDescriptor {
    pub role: AgentRole,
    pub kind: AgentKind,
}

impl AgentDescriptor {
    pub const fn new(role: AgentRole, kind: AgentKind) -> Self {
        Self { role, kind }
    }

    pub fn name(&self) -> &'static str {
        self.role.as_str()
    }

    pub fn respond(&self, prompt: &str) -> String {
        match self.kind {
            AgentKind::Planner => plan(prompt),
            AgentKind::Analyst => reasoner::respond(prompt),
            AgentKind::Designer => {
                if topics::mentions_logo_or_brand(prompt) {
                    DESIGNER_LOGO.to_string()
                } else {
                    DESIGNER_DEFAULT.to_string()
                }
            }
            AgentKind::Verifier => VERIFIER_SUMMARY.to_string(),
        }
    }

    pub fn run(&self, prompt: &str) -> Message {
        Message::new(self.role, self.respond(prompt))
    }
}

fn plan(prompt: &str) -> String {
    let tasks: Vec<&str> = Topic::ALL
        .iter()
        .filter(|t| t.matches(prompt))
        .map(Topic::task)
        .collect();
    if tasks.is_empty() {
        format!("Tasks: {GENERAL_TASK}")
    } else {
        format!("Tasks: {}", tasks.join(" "))
    }
}

/// The agents run for every request, in this order.
pub const DEFAULT_AGENTS: [AgentDescriptor; 4] = [
    AgentDescriptor::new(AgentRole::Planner, AgentKind::Planner),
    AgentDescriptor::new(AgentRole::Analyst, AgentKind::Analyst),
    AgentDescriptor::new(AgentRole::Designer, AgentKind::Designer),
    AgentDescriptor::new(AgentRole::Verifier, AgentKind::Verifier),
];

/// Ordered set of agents. Iteration order is declaration order.
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    agents: Vec<AgentDescriptor>,
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self {
            agents: DEFAULT_AGENTS.to_vec(),
        }
    }
}

impl AgentRegistry {
    pub fn new(agents: Vec<AgentDescriptor>) -> Self {
        Self { agents }
    }

    pub fn agents(&self) -> &[AgentDescriptor] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Run every agent against `prompt`, one message each.
    pub fn run_all(&self, prompt: &str) -> Vec<Message> {
        self.agents.iter().map(|a| a.run(prompt)).collect()
    }
}
