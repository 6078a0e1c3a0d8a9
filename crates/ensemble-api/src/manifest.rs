//! Agent manifest definitions
//!
//! The static self-description every agent exposes: identity plus the
//! schemas its payloads follow. Renderable as portable JSON documents
//! without executing a task.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::envelope::TaskId;
use crate::naming::agent_path;

/// Agent self-description: identity and payload schemas.
///
/// A present `resume_input_schema` marks a resumable (orchestrator) agent;
/// its absence marks a single-shot agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentManifest {
    /// Display name; the HTTP path segment derives from it.
    pub agent_name: String,
    /// Task type identifier the broker dispatches on.
    pub task_id: TaskId,
    pub description: String,
    /// JSON schema for start payloads.
    pub input_schema: Value,
    /// JSON schema for terminal outputs; introspection only, never enforced.
    pub output_schema: Value,
    /// JSON schema for resume payloads; present only for orchestrators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_input_schema: Option<Value>,
}

impl AgentManifest {
    /// Create a manifest with empty schemas.
    pub fn new(
        agent_name: impl Into<String>,
        task_id: impl Into<TaskId>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            task_id: task_id.into(),
            description: description.into(),
            input_schema: Value::Null,
            output_schema: Value::Null,
            resume_input_schema: None,
        }
    }

    /// Set the start payload schema.
    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }

    /// Set the output schema.
    pub fn with_output_schema(mut self, schema: Value) -> Self {
        self.output_schema = schema;
        self
    }

    /// Set the resume payload schema, marking the agent resumable.
    pub fn with_resume_input_schema(mut self, schema: Value) -> Self {
        self.resume_input_schema = Some(schema);
        self
    }

    /// HTTP path segment for this agent.
    pub fn path(&self) -> String {
        agent_path(&self.agent_name)
    }

    /// Whether this manifest describes a resumable orchestrator.
    pub fn is_resumable(&self) -> bool {
        self.resume_input_schema.is_some()
    }

    /// The public `/info` descriptor. Excludes the resume schema, which is
    /// part of the broker contract rather than the discovery surface.
    pub fn info(&self) -> Value {
        json!({
            "agentName": self.agent_name,
            "description": self.description,
            "taskId": self.task_id,
            "inputSchema": self.input_schema,
            "outputSchema": self.output_schema,
        })
    }
}
