//! Agent abstraction module
//!
//! Defines the capability traits every task agent composes from:
//! - TaskAgent: manifest plus single-shot execution of a start command
//! - ResumableAgent: adds resume handling for orchestrators that fan work
//!   out and are re-invoked by the broker when a subtask group completes

mod task;

use async_trait::async_trait;
use ensemble_api::{AgentManifest, ResumeInput, TaskOutcome};
use serde_json::Value;
use thiserror::Error;

pub use task::{ResumeTask, StartTask};

/// Failure raised inside agent logic.
///
/// Caught at the execution wrapper boundary and converted into a `failed`
/// outcome; the variants classify the fault for logging.
#[derive(Debug, Error)]
pub enum AgentError {
    /// A required upstream call failed or returned an unusable result.
    #[error("upstream call failed: {0}")]
    Upstream(String),
    /// The agent's own computation failed.
    #[error("execution failed: {0}")]
    Execution(String),
    /// The agent was invoked in a way its definition does not support.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// A task agent: one task type, invoked by the broker over HTTP.
///
/// Agents are black boxes to the execution wrapper. They may call out to
/// other services while computing a result, but hold no state between
/// invocations; whatever a workflow needs later must travel in the outcome.
#[async_trait]
pub trait TaskAgent: Send + Sync {
    /// Static self-description: identity and schemas.
    fn manifest(&self) -> AgentManifest;

    /// Execute a validated start command.
    async fn execute(&self, task: StartTask) -> Result<TaskOutcome, AgentError>;
}

/// Capability extension for orchestrator agents.
///
/// An orchestrator owns the total ordering of its workflow's phases: on each
/// resume it maps the completed group id to the next fan-out, using only the
/// original input and the children's outputs carried in the call.
#[async_trait]
pub trait ResumableAgent: TaskAgent {
    /// Schema for resume payloads (`{originalInput, childrenOutputs}`).
    ///
    /// The default wraps the agent's input schema in the standard resume
    /// envelope; override it only for orchestrators with a bespoke resume
    /// payload.
    fn resume_input_schema(&self) -> Value {
        ResumeInput::schema_for(&self.manifest().input_schema)
    }

    /// Continue the workflow after the given group completed.
    async fn resume(&self, task: ResumeTask) -> Result<TaskOutcome, AgentError>;
}
