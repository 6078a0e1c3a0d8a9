//! Task execution wrapper
//!
//! `run` is the single entry point the transport layer invokes: it selects
//! the schema the command demands, validates the payload, invokes the agent
//! and maps any fault into a `failed` response. No invalid payload reaches
//! agent logic, and no error escapes to the transport layer.

use ensemble_api::{AgentTaskRequest, AgentTaskResponse, ResumeInput, TaskCommand, NO_CID};

use crate::agent::{ResumeTask, StartTask};
use crate::registry::RegisteredAgent;
use crate::schema;

const MAX_LOG_TEXT_CHARS: usize = 2_000;

// Client-visible messages for wrapper-generated failures. The underlying
// detail is logged with the correlation id, never returned to the broker.
const VALIDATION_FAILED_MSG: &str = "task input validation failed";
const EXECUTION_FAILED_MSG: &str = "task execution failed";

fn truncate_for_log(input: &str, max_chars: usize) -> String {
    let char_count = input.chars().count();
    if char_count <= max_chars {
        return input.to_string();
    }
    let mut preview: String = input.chars().take(max_chars).collect();
    preview.push_str(&format!("... [truncated, total_chars={}]", char_count));
    preview
}

/// Execute one task request against a registered agent.
pub async fn run(agent: &RegisteredAgent, request: AgentTaskRequest) -> AgentTaskResponse {
    let AgentTaskRequest {
        task_id,
        task_instance_id,
        correlation_id,
        command,
        task_input_data,
    } = request;
    let cid = correlation_id.unwrap_or_else(|| NO_CID.to_string());
    let manifest = agent.manifest();

    let result = match (command, agent) {
        (TaskCommand::Start, _) => {
            if let Err(failure) = schema::validate(&manifest.input_schema, &task_input_data) {
                tracing::warn!(
                    task_id = %task_id,
                    correlation_id = %cid,
                    violations = %truncate_for_log(&failure.to_string(), MAX_LOG_TEXT_CHARS),
                    "start input rejected by schema"
                );
                return AgentTaskResponse::failed(cid, VALIDATION_FAILED_MSG);
            }

            let task = StartTask {
                correlation_id: cid.clone(),
                task_instance_id,
                input: task_input_data,
            };
            match agent {
                RegisteredAgent::Single(a) => a.execute(task).await,
                RegisteredAgent::Orchestrator(a) => a.execute(task).await,
            }
        }
        (TaskCommand::Resume { .. }, RegisteredAgent::Single(_)) => {
            tracing::warn!(
                task_id = %task_id,
                correlation_id = %cid,
                "resume sent to a single-shot agent"
            );
            return AgentTaskResponse::failed(
                cid,
                format!("task '{}' does not support resume", task_id),
            );
        }
        (
            TaskCommand::Resume { completed_group_id },
            RegisteredAgent::Orchestrator(orchestrator),
        ) => {
            // The registry injects the resume schema into orchestrator
            // manifests; fall back to the trait for a bare entry.
            let resume_schema = manifest
                .resume_input_schema
                .clone()
                .unwrap_or_else(|| orchestrator.resume_input_schema());

            if let Err(failure) = schema::validate(&resume_schema, &task_input_data) {
                tracing::warn!(
                    task_id = %task_id,
                    correlation_id = %cid,
                    completed_group_id = %completed_group_id,
                    violations = %truncate_for_log(&failure.to_string(), MAX_LOG_TEXT_CHARS),
                    "resume input rejected by schema"
                );
                return AgentTaskResponse::failed(cid, VALIDATION_FAILED_MSG);
            }

            let resume_input: ResumeInput = match serde_json::from_value(task_input_data) {
                Ok(input) => input,
                Err(err) => {
                    tracing::warn!(
                        task_id = %task_id,
                        correlation_id = %cid,
                        error = %err,
                        "resume input does not decode"
                    );
                    return AgentTaskResponse::failed(cid, VALIDATION_FAILED_MSG);
                }
            };

            let task = ResumeTask {
                correlation_id: cid.clone(),
                task_instance_id,
                completed_group_id,
                original_input: resume_input.original_input,
                children_outputs: resume_input.children_outputs,
            };
            tracing::debug!(
                task_id = %task_id,
                correlation_id = %cid,
                completed_group_id = %task.completed_group_id,
                children = task.children_outputs.len(),
                "resume input validated"
            );
            orchestrator.resume(task).await
        }
    };

    match result {
        Ok(outcome) => {
            tracing::info!(
                task_id = %task_id,
                correlation_id = %cid,
                stop_reason = %outcome.stop_reason(),
                "task finished"
            );
            AgentTaskResponse::new(cid, outcome)
        }
        Err(err) => {
            tracing::error!(
                task_id = %task_id,
                correlation_id = %cid,
                error = %truncate_for_log(&err.to_string(), MAX_LOG_TEXT_CHARS),
                "task execution failed"
            );
            AgentTaskResponse::failed(cid, EXECUTION_FAILED_MSG)
        }
    }
}
