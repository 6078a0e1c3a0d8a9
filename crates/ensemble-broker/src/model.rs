//! Wire shapes for the broker's catalog and task-submission surface.

use ensemble_api::{AgentManifest, TaskId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry in the broker's agent catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDefinition {
    pub name: String,
    pub description: String,
    /// Task type the broker dispatches to this agent.
    pub task_id: TaskId,
    pub input_schema: Value,
    pub output_schema: Value,
    /// Whether the agent accepts resume calls.
    pub orchestrator: bool,
    pub endpoint: TaskEndpoint,
}

impl AgentDefinition {
    /// Catalog entry for a manifest served under the given public base URL.
    pub fn from_manifest(manifest: &AgentManifest, base_url: &str) -> Self {
        Self {
            name: manifest.agent_name.clone(),
            description: manifest.description.clone(),
            task_id: manifest.task_id.clone(),
            input_schema: manifest.input_schema.clone(),
            output_schema: manifest.output_schema.clone(),
            orchestrator: manifest.is_resumable(),
            endpoint: TaskEndpoint::for_agent(base_url, &manifest.path()),
        }
    }
}

/// Where the broker reaches one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskEndpoint {
    pub task_url: String,
    pub info_url: String,
}

impl TaskEndpoint {
    pub fn for_agent(base_url: &str, agent_path: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            task_url: format!("{}/agents/{}/tasks", base, agent_path),
            info_url: format!("{}/agents/{}/info", base, agent_path),
        }
    }
}

/// Broker acknowledgement for a submitted top-level task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSubmitAck {
    pub task_id: String,
    pub agent_name: String,
    pub task_execution_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_manifest() -> AgentManifest {
        AgentManifest::new("Topic Planner", "topic.plan", "Plans the sections of a topic")
            .with_input_schema(json!({
                "type": "object",
                "properties": { "topicId": { "type": "string" } },
                "required": ["topicId"]
            }))
            .with_output_schema(json!({ "type": "object" }))
    }

    #[test]
    fn test_definition_carries_orchestrator_flag_from_manifest() {
        let single = AgentDefinition::from_manifest(&sample_manifest(), "https://agents.example");
        assert!(!single.orchestrator);

        let manifest = sample_manifest().with_resume_input_schema(json!({ "type": "object" }));
        let orchestrator = AgentDefinition::from_manifest(&manifest, "https://agents.example");
        assert!(orchestrator.orchestrator);
    }

    #[test]
    fn test_endpoint_urls_derive_from_resolved_path() {
        let definition =
            AgentDefinition::from_manifest(&sample_manifest(), "https://agents.example/");
        assert_eq!(
            definition.endpoint.task_url,
            "https://agents.example/agents/topicplanner/tasks"
        );
        assert_eq!(
            definition.endpoint.info_url,
            "https://agents.example/agents/topicplanner/info"
        );
    }

    #[test]
    fn test_definition_wire_shape_is_camel_case() {
        let definition = AgentDefinition::from_manifest(&sample_manifest(), "https://agents.example");
        let value = serde_json::to_value(&definition).unwrap();
        assert_eq!(value["taskId"], "topic.plan");
        assert!(value.get("inputSchema").is_some());
        assert!(value.get("outputSchema").is_some());
        assert_eq!(value["orchestrator"], false);
        assert!(value["endpoint"].get("taskUrl").is_some());
        assert!(value["endpoint"].get("infoUrl").is_some());
    }

    #[test]
    fn test_submit_ack_decodes_from_broker_json() {
        let ack: TaskSubmitAck = serde_json::from_value(json!({
            "taskId": "topic.plan",
            "agentName": "Topic Planner",
            "taskExecutionId": "exec-123"
        }))
        .unwrap();
        assert_eq!(ack.task_id, "topic.plan");
        assert_eq!(ack.agent_name, "Topic Planner");
        assert_eq!(ack.task_execution_id, "exec-123");
    }
}
