//! Task envelope definitions
//!
//! The request/response vocabulary exchanged between the broker and an agent.
//! Every value here lives for exactly one HTTP round trip; workflow state is
//! reconstructed on each call from the payload itself (continuation passing),
//! never held by the agent between calls.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// Sentinel correlation id used when the broker supplied none.
pub const NO_CID: &str = "no-cid";

/// Strongly-typed task type identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<&TaskId> for TaskId {
    fn from(value: &TaskId) -> Self {
        value.clone()
    }
}

impl From<TaskId> for String {
    fn from(value: TaskId) -> Self {
        value.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<&str> for TaskId {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// Strongly-typed subtask group identifier.
///
/// Every subtask of one fan-out shares one group id; the broker uses it both
/// to detect "all members done" and to tell the orchestrator which resume
/// branch applies, so ids must not be reused across sequential phases.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct GroupId(pub String);

impl GroupId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for GroupId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for GroupId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<&GroupId> for GroupId {
    fn from(value: &GroupId) -> Self {
        value.clone()
    }
}

impl From<GroupId> for String {
    fn from(value: GroupId) -> Self {
        value.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for GroupId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<&str> for GroupId {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// Command carried by a task request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum TaskCommand {
    /// First invocation of a workflow or of a single-shot task.
    Start,
    /// Re-invocation after every subtask of one group has completed.
    #[serde(rename_all = "camelCase")]
    Resume {
        /// The group whose completion triggered this call.
        completed_group_id: GroupId,
    },
}

impl TaskCommand {
    pub fn resume(completed_group_id: impl Into<GroupId>) -> Self {
        Self::Resume {
            completed_group_id: completed_group_id.into(),
        }
    }

    pub fn is_start(&self) -> bool {
        matches!(self, TaskCommand::Start)
    }

    pub fn is_resume(&self) -> bool {
        matches!(self, TaskCommand::Resume { .. })
    }

    /// Completed group id when this is a resume command.
    pub fn completed_group_id(&self) -> Option<&GroupId> {
        match self {
            TaskCommand::Start => None,
            TaskCommand::Resume { completed_group_id } => Some(completed_group_id),
        }
    }
}

/// One task invocation as received from the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentTaskRequest {
    /// Task type this request targets.
    pub task_id: TaskId,
    /// Broker-side execution instance, when the broker exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_instance_id: Option<String>,
    /// Opaque trace id; echoed on every response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    pub command: TaskCommand,
    /// Payload validated against the schema the command selects.
    #[serde(default)]
    pub task_input_data: Value,
}

impl AgentTaskRequest {
    /// Build a start request for a task type.
    pub fn start(task_id: impl Into<TaskId>, input: Value) -> Self {
        Self {
            task_id: task_id.into(),
            task_instance_id: None,
            correlation_id: None,
            command: TaskCommand::Start,
            task_input_data: input,
        }
    }

    /// Build a resume request; the resume payload rides in `task_input_data`.
    pub fn resume(
        task_id: impl Into<TaskId>,
        completed_group_id: impl Into<GroupId>,
        original_input: Value,
        children_outputs: Vec<Value>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            task_instance_id: None,
            correlation_id: None,
            command: TaskCommand::resume(completed_group_id),
            task_input_data: ResumeInput::new(original_input, children_outputs).into_value(),
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    pub fn with_task_instance_id(mut self, task_instance_id: impl Into<String>) -> Self {
        self.task_instance_id = Some(task_instance_id.into());
        self
    }

    /// Correlation id for echo and logging; `"no-cid"` when absent, never null.
    pub fn cid(&self) -> &str {
        self.correlation_id.as_deref().unwrap_or(NO_CID)
    }
}

/// Typed view of `task_input_data` on a resume call.
///
/// `resume_input_schema` validates exactly this shape; agents decode it after
/// the validation gate instead of picking fields out of raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeInput {
    /// The workflow's initial input, passed back verbatim by the broker.
    pub original_input: Value,
    /// Final outputs of every subtask in the completed group.
    #[serde(default)]
    pub children_outputs: Vec<Value>,
}

impl ResumeInput {
    pub fn new(original_input: Value, children_outputs: Vec<Value>) -> Self {
        Self {
            original_input,
            children_outputs,
        }
    }

    /// Wire form of the resume payload.
    pub fn into_value(self) -> Value {
        json!({
            "originalInput": self.original_input,
            "childrenOutputs": self.children_outputs,
        })
    }

    /// Standard resume schema wrapping an agent's input schema.
    pub fn schema_for(input_schema: &Value) -> Value {
        json!({
            "type": "object",
            "properties": {
                "originalInput": input_schema,
                "childrenOutputs": { "type": "array" },
            },
            "required": ["originalInput"],
        })
    }
}

/// Subtask emitted by an orchestrator fan-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubTaskInfo {
    /// Task type the broker should dispatch this subtask to.
    pub task_id: TaskId,
    /// Shared by every subtask of the fan-out this entry belongs to.
    pub subtasks_group_id: GroupId,
    pub task_input_data: Value,
}

impl SubTaskInfo {
    pub fn new(
        task_id: impl Into<TaskId>,
        subtasks_group_id: impl Into<GroupId>,
        task_input_data: Value,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            subtasks_group_id: subtasks_group_id.into(),
            task_input_data,
        }
    }
}

/// Named subtask group the broker resumes independently of sibling branches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchInfo {
    pub branch_name: String,
    pub subtasks: Vec<SubTaskInfo>,
}

impl BranchInfo {
    pub fn new(branch_name: impl Into<String>, subtasks: Vec<SubTaskInfo>) -> Self {
        Self {
            branch_name: branch_name.into(),
            subtasks,
        }
    }
}

/// Outcome of one invocation, tagged by `stopReason`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stopReason", rename_all = "camelCase")]
pub enum TaskOutcome {
    /// Terminal success; `task_output` follows the agent's output schema.
    #[serde(rename_all = "camelCase")]
    Completed { task_output: Value },
    /// Terminal failure for this invocation.
    Failed { error: String },
    /// Fan-out: the broker executes every subtask, then resumes the agent
    /// once the whole group is done.
    Subtasks { subtasks: Vec<SubTaskInfo> },
    /// Concurrent named sub-flows, each resumed independently.
    Branch { branches: Vec<BranchInfo> },
}

impl TaskOutcome {
    pub fn completed(task_output: Value) -> Self {
        Self::Completed { task_output }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed {
            error: error.into(),
        }
    }

    pub fn subtasks(subtasks: Vec<SubTaskInfo>) -> Self {
        Self::Subtasks { subtasks }
    }

    pub fn branch(branches: Vec<BranchInfo>) -> Self {
        Self::Branch { branches }
    }

    /// Whether this outcome ends the workflow for this invocation chain.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskOutcome::Completed { .. } | TaskOutcome::Failed { .. })
    }

    /// The wire tag of this outcome, as logged and serialized.
    pub fn stop_reason(&self) -> &'static str {
        match self {
            TaskOutcome::Completed { .. } => "completed",
            TaskOutcome::Failed { .. } => "failed",
            TaskOutcome::Subtasks { .. } => "subtasks",
            TaskOutcome::Branch { .. } => "branch",
        }
    }
}

/// Full response envelope: the outcome plus the echoed correlation id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentTaskResponse {
    pub correlation_id: String,
    #[serde(flatten)]
    pub outcome: TaskOutcome,
}

impl AgentTaskResponse {
    pub fn new(correlation_id: impl Into<String>, outcome: TaskOutcome) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            outcome,
        }
    }

    pub fn completed(correlation_id: impl Into<String>, task_output: Value) -> Self {
        Self::new(correlation_id, TaskOutcome::completed(task_output))
    }

    pub fn failed(correlation_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self::new(correlation_id, TaskOutcome::failed(error))
    }

    pub fn subtasks(correlation_id: impl Into<String>, subtasks: Vec<SubTaskInfo>) -> Self {
        Self::new(correlation_id, TaskOutcome::subtasks(subtasks))
    }

    pub fn branch(correlation_id: impl Into<String>, branches: Vec<BranchInfo>) -> Self {
        Self::new(correlation_id, TaskOutcome::branch(branches))
    }
}
