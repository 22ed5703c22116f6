//! Browser-automation agent abstraction.
//!
//! The [`AutomationAgent`] trait decouples job dispatch from the service
//! that actually drives a browser. Everything that happens inside a run
//! (navigation, clicking, retries on dynamic pages) belongs to the agent;
//! this crate only hands over a task and reads back free text.

pub mod cloud;
pub mod prompt;
pub mod result;

use std::future::Future;
use std::pin::Pin;

use crate::Result;

/// One unit of work handed to the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentTask {
    /// Natural-language instructions, including the grocery list.
    pub prompt: String,
    /// Step budget for the run.
    pub max_steps: u32,
}

/// Outcome of a completed agent run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentRun {
    /// Identifier assigned by the automation service.
    pub task_id: String,
    /// The agent's final free-text answer.
    pub output: String,
    /// Live browser view, when the service exposes one.
    pub live_url: Option<String>,
}

/// Interface to an external browser-automation agent.
pub trait AutomationAgent: Send + Sync {
    /// Execute a task to completion and return the agent's final answer.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Agent`](crate::AppError::Agent) if the run cannot
    /// be started, fails, is stopped, or finishes without output.
    fn run(&self, task: AgentTask) -> Pin<Box<dyn Future<Output = Result<AgentRun>> + Send + '_>>;
}
