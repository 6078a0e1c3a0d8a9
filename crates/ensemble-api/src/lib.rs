//! # Ensemble API
//!
//! Wire vocabulary shared between task agents and the broker: the task
//! envelope (requests, commands, outcomes), the agent manifest, and the
//! display-name to path resolver. Carries no transport code, so both sides
//! of the protocol can depend on it.

mod envelope;
mod manifest;
mod naming;

pub use envelope::{
    AgentTaskRequest, AgentTaskResponse, BranchInfo, GroupId, ResumeInput, SubTaskInfo,
    TaskCommand, TaskId, TaskOutcome, NO_CID,
};
pub use manifest::AgentManifest;
pub use naming::agent_path;
