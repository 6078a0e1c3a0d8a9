//! Typed task views handed to agent implementations.
//!
//! Built by the execution wrapper after the validation gate, so agent code
//! never sees a raw or unvalidated payload.

use ensemble_api::GroupId;
use serde_json::Value;

/// A validated start invocation.
#[derive(Debug, Clone)]
pub struct StartTask {
    /// Correlation id for logging; already defaulted, never empty.
    pub correlation_id: String,
    /// Broker-side execution instance, when the broker exposes one.
    pub task_instance_id: Option<String>,
    /// Start payload, validated against the agent's input schema.
    pub input: Value,
}

impl StartTask {
    pub fn new(correlation_id: impl Into<String>, input: Value) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            task_instance_id: None,
            input,
        }
    }

    pub fn with_task_instance_id(mut self, task_instance_id: impl Into<String>) -> Self {
        self.task_instance_id = Some(task_instance_id.into());
        self
    }
}

/// A validated resume invocation.
#[derive(Debug, Clone)]
pub struct ResumeTask {
    pub correlation_id: String,
    pub task_instance_id: Option<String>,
    /// Group whose completion triggered this call.
    pub completed_group_id: GroupId,
    /// The workflow's initial input, passed back verbatim by the broker.
    pub original_input: Value,
    /// Final outputs of every subtask in the completed group.
    pub children_outputs: Vec<Value>,
}

impl ResumeTask {
    pub fn new(
        correlation_id: impl Into<String>,
        completed_group_id: impl Into<GroupId>,
        original_input: Value,
        children_outputs: Vec<Value>,
    ) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            task_instance_id: None,
            completed_group_id: completed_group_id.into(),
            original_input,
            children_outputs,
        }
    }

    pub fn with_task_instance_id(mut self, task_instance_id: impl Into<String>) -> Self {
        self.task_instance_id = Some(task_instance_id.into());
        self
    }
}
