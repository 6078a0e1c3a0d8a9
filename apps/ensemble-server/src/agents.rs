//! Demonstration agents bundled with the host.
//!
//! Three orchestration styles, exercising every response variant end to end:
//! a single-shot echo, a hand-written fan-out orchestrator with its child
//! agent, and a declarative-flow orchestrator with branching sub-flows.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use ensemble_api::{AgentManifest, SubTaskInfo, TaskOutcome};
use ensemble_core::flow::{AgentBinding, FlowError};
use ensemble_core::{
    AgentError, AgentRegistry, FlowNode, FlowOrchestrator, FlowSpec, MapperRegistry,
    ResumableAgent, ResumeTask, StartTask, TaskAgent,
};

/// Group id for the topic writer's section fan-out.
const SECTIONS_GROUP: &str = "write-sections";

/// Build the registry of bundled agents.
pub fn build_registry() -> anyhow::Result<AgentRegistry> {
    let mut registry = AgentRegistry::new();
    registry.register(Arc::new(EchoAgent))?;
    registry.register(Arc::new(SectionWriter))?;
    registry.register_orchestrator(Arc::new(TopicWriter))?;
    registry.register_orchestrator(Arc::new(doc_publisher()?))?;
    Ok(registry)
}

/// Single-shot agent returning its input unchanged.
pub struct EchoAgent;

#[async_trait]
impl TaskAgent for EchoAgent {
    fn manifest(&self) -> AgentManifest {
        AgentManifest::new("Echo", "util.echo", "Returns the task input unchanged")
            .with_input_schema(json!({ "type": "object" }))
            .with_output_schema(json!({
                "type": "object",
                "properties": { "echo": { "type": "object" } }
            }))
    }

    async fn execute(&self, task: StartTask) -> Result<TaskOutcome, AgentError> {
        Ok(TaskOutcome::completed(json!({ "echo": task.input })))
    }
}

/// Single-shot agent writing one section of a topic article.
pub struct SectionWriter;

#[async_trait]
impl TaskAgent for SectionWriter {
    fn manifest(&self) -> AgentManifest {
        AgentManifest::new(
            "Section Writer",
            "topic.write.section",
            "Writes one section of a topic article",
        )
        .with_input_schema(json!({
            "type": "object",
            "properties": {
                "topicId": { "type": "string" },
                "section": { "type": "string" },
                "index": { "type": "integer" }
            },
            "required": ["topicId", "section", "index"]
        }))
        .with_output_schema(json!({
            "type": "object",
            "properties": {
                "section": { "type": "string" },
                "index": { "type": "integer" },
                "text": { "type": "string" }
            }
        }))
    }

    async fn execute(&self, task: StartTask) -> Result<TaskOutcome, AgentError> {
        let section = task.input["section"].as_str().unwrap_or_default();
        Ok(TaskOutcome::completed(json!({
            "section": section,
            "index": task.input["index"],
            "text": format!("A few paragraphs about {}.", section),
        })))
    }
}

/// Hand-written orchestrator: fans out one `topic.write.section` subtask per
/// catalog section, then assembles the children's outputs into an article on
/// resume.
pub struct TopicWriter;

/// Section catalog by topic code. Stands in for the upstream lookup a real
/// deployment would make here.
fn sections_for(topic_code: &str) -> Vec<&'static str> {
    match topic_code {
        "music.baroque" => vec!["history", "form", "composers"],
        "music.jazz" => vec!["origins", "improvisation"],
        _ => Vec::new(),
    }
}

#[async_trait]
impl TaskAgent for TopicWriter {
    fn manifest(&self) -> AgentManifest {
        AgentManifest::new(
            "Topic Writer",
            "topic.write",
            "Writes a topic article section by section",
        )
        .with_input_schema(json!({
            "type": "object",
            "properties": {
                "topicId": { "type": "string" },
                "topicCode": { "type": "string" }
            },
            "required": ["topicId", "topicCode"]
        }))
        .with_output_schema(json!({
            "type": "object",
            "properties": {
                "topicId": { "type": "string" },
                "sectionCount": { "type": "integer" },
                "article": { "type": "array" }
            }
        }))
    }

    async fn execute(&self, task: StartTask) -> Result<TaskOutcome, AgentError> {
        let topic_code = task.input["topicCode"].as_str().unwrap_or_default();
        let sections = sections_for(topic_code);
        if sections.is_empty() {
            return Ok(TaskOutcome::failed(format!(
                "no sections found for topic code '{}'",
                topic_code
            )));
        }

        let subtasks = sections
            .iter()
            .enumerate()
            .map(|(index, section)| {
                SubTaskInfo::new(
                    "topic.write.section",
                    SECTIONS_GROUP,
                    json!({
                        "topicId": task.input["topicId"],
                        "section": section,
                        "index": index,
                    }),
                )
            })
            .collect();
        Ok(TaskOutcome::subtasks(subtasks))
    }
}

#[async_trait]
impl ResumableAgent for TopicWriter {
    async fn resume(&self, task: ResumeTask) -> Result<TaskOutcome, AgentError> {
        if task.completed_group_id != SECTIONS_GROUP {
            return Err(AgentError::Configuration(format!(
                "unknown completed group '{}'",
                task.completed_group_id
            )));
        }

        Ok(TaskOutcome::completed(json!({
            "topicId": task.original_input["topicId"],
            "sectionCount": task.children_outputs.len(),
            "article": task.children_outputs,
        })))
    }
}

/// Declarative-flow orchestrator publishing a document: a render-then-verify
/// chain and a parallel announcement fan-out run as independent branches.
pub fn doc_publisher() -> Result<FlowOrchestrator, FlowError> {
    let manifest = AgentManifest::new(
        "Doc Publisher",
        "doc.publish",
        "Renders, verifies, and announces a document",
    )
    .with_input_schema(json!({
        "type": "object",
        "properties": { "docId": { "type": "string" } },
        "required": ["docId"]
    }))
    .with_output_schema(json!({
        "type": "object",
        "properties": { "published": { "type": "boolean" } }
    }));

    let flow = FlowSpec::new(
        "publish-pipeline",
        FlowNode::branch(
            "publish",
            vec![
                FlowNode::agent("render", "doc.render").then(FlowNode::agent("verify", "doc.verify")),
                FlowNode::parallel(
                    "announce",
                    vec![
                        AgentBinding::new("announce-mail", "notify.mail"),
                        AgentBinding::new("announce-chat", "notify.chat"),
                    ],
                ),
            ],
        ),
    );

    let mut mappers = MapperRegistry::new();
    mappers.register_fn("verify", |input| {
        json!({ "docId": input["docId"], "strict": true })
    });

    Ok(FlowOrchestrator::new(manifest, flow, mappers)?
        .with_completion_output(json!({ "published": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ensemble_api::AgentTaskRequest;
    use ensemble_core::registry::RegisteredAgent;
    use ensemble_core::run;

    #[test]
    fn test_bundled_registry_builds() {
        let registry = build_registry().unwrap();
        assert_eq!(registry.len(), 4);
        assert!(registry.by_path("echo").is_some());
        assert!(registry.by_path("docpublisher").is_some());
    }

    #[tokio::test]
    async fn test_echo_agent_returns_its_input() {
        let agent = RegisteredAgent::Single(Arc::new(EchoAgent));
        let response = run(
            &agent,
            AgentTaskRequest::start("util.echo", json!({ "hello": "world" })),
        )
        .await;
        assert_eq!(
            response.outcome,
            TaskOutcome::completed(json!({ "echo": { "hello": "world" } }))
        );
    }

    #[tokio::test]
    async fn test_topic_writer_fans_out_one_subtask_per_section() {
        let agent = RegisteredAgent::Orchestrator(Arc::new(TopicWriter));
        let response = run(
            &agent,
            AgentTaskRequest::start(
                "topic.write",
                json!({ "topicId": "t1", "topicCode": "music.baroque" }),
            ),
        )
        .await;

        match response.outcome {
            TaskOutcome::Subtasks { subtasks } => {
                assert_eq!(subtasks.len(), 3);
                assert!(subtasks.iter().all(|s| s.subtasks_group_id == SECTIONS_GROUP));
                let indexes: Vec<i64> = subtasks
                    .iter()
                    .map(|s| s.task_input_data["index"].as_i64().unwrap())
                    .collect();
                assert_eq!(indexes, vec![0, 1, 2]);
            }
            other => panic!("expected subtasks, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_topic_writer_fails_on_unknown_topic_code() {
        let agent = RegisteredAgent::Orchestrator(Arc::new(TopicWriter));
        let response = run(
            &agent,
            AgentTaskRequest::start(
                "topic.write",
                json!({ "topicId": "t1", "topicCode": "music.unknown" }),
            ),
        )
        .await;

        match response.outcome {
            TaskOutcome::Failed { error } => {
                assert!(error.contains("no sections found"));
            }
            other => panic!("expected failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_topic_writer_resume_assembles_the_article() {
        let agent = RegisteredAgent::Orchestrator(Arc::new(TopicWriter));
        let response = run(
            &agent,
            AgentTaskRequest::resume(
                "topic.write",
                SECTIONS_GROUP,
                json!({ "topicId": "t1", "topicCode": "music.baroque" }),
                vec![
                    json!({ "index": 0, "text": "..." }),
                    json!({ "index": 1, "text": "..." }),
                    json!({ "index": 2, "text": "..." }),
                ],
            ),
        )
        .await;

        match response.outcome {
            TaskOutcome::Completed { task_output } => {
                assert_eq!(task_output["sectionCount"], 3);
                assert_eq!(task_output["topicId"], "t1");
            }
            other => panic!("expected completed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_doc_publisher_starts_with_two_branches() {
        let agent = RegisteredAgent::Orchestrator(Arc::new(doc_publisher().unwrap()));
        let response = run(
            &agent,
            AgentTaskRequest::start("doc.publish", json!({ "docId": "d1" })),
        )
        .await;

        match response.outcome {
            TaskOutcome::Branch { branches } => {
                assert_eq!(branches.len(), 2);
                assert_eq!(branches[0].branch_name, "render");
                assert_eq!(branches[1].branch_name, "announce");
            }
            other => panic!("expected branch, got {:?}", other),
        }
    }
}
