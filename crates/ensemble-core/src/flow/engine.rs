//! Flow evaluation
//!
//! Stateless interpreter for a validated `FlowSpec`: every call derives its
//! position in the flow from the command alone, so identical calls always
//! produce identical outcomes no matter how often the broker retries them.

use async_trait::async_trait;
use ensemble_api::{AgentManifest, BranchInfo, GroupId, SubTaskInfo, TaskOutcome};
use serde_json::{json, Value};

use super::{FlowError, FlowNode, FlowNodeKind, FlowSpec, MapperRegistry};
use crate::agent::{AgentError, ResumableAgent, ResumeTask, StartTask, TaskAgent};

enum Phase<'a> {
    Start {
        input: &'a Value,
    },
    Resume {
        original_input: &'a Value,
        children_outputs: &'a [Value],
    },
}

/// Stateless evaluator for one flow.
pub struct FlowEngine {
    flow: FlowSpec,
    mappers: MapperRegistry,
    completion_output: Value,
}

impl FlowEngine {
    /// Validate the flow and build an engine for it.
    pub fn new(flow: FlowSpec, mappers: MapperRegistry) -> Result<Self, FlowError> {
        flow.validate()?;
        Ok(Self {
            flow,
            mappers,
            completion_output: json!({ "done": true }),
        })
    }

    /// Output returned when the final node of a chain completes.
    pub fn with_completion_output(mut self, output: Value) -> Self {
        self.completion_output = output;
        self
    }

    pub fn flow(&self) -> &FlowSpec {
        &self.flow
    }

    /// Outcome of a start call.
    pub fn start(&self, input: &Value) -> TaskOutcome {
        tracing::info!(flow = %self.flow.name, node = %self.flow.start.name, "starting flow");
        self.emit(&self.flow.start, &Phase::Start { input })
    }

    /// Outcome of a resume call for the given completed group.
    pub fn resume(
        &self,
        completed_group_id: &GroupId,
        original_input: &Value,
        children_outputs: &[Value],
    ) -> Result<TaskOutcome, FlowError> {
        let node = self
            .flow
            .find(completed_group_id.as_str())
            .ok_or_else(|| FlowError::UnknownGroup(completed_group_id.to_string()))?;

        match node.next.as_deref() {
            None => {
                tracing::info!(
                    flow = %self.flow.name,
                    node = %node.name,
                    "flow chain completed"
                );
                Ok(TaskOutcome::completed(self.completion_output.clone()))
            }
            Some(next) => {
                tracing::info!(
                    flow = %self.flow.name,
                    completed = %node.name,
                    node = %next.name,
                    "advancing flow"
                );
                Ok(self.emit(
                    next,
                    &Phase::Resume {
                        original_input,
                        children_outputs,
                    },
                ))
            }
        }
    }

    fn emit(&self, node: &FlowNode, phase: &Phase<'_>) -> TaskOutcome {
        match &node.kind {
            FlowNodeKind::Branch { children } => {
                tracing::info!(
                    flow = %self.flow.name,
                    node = %node.name,
                    branches = children.len(),
                    "flow branch fan-out"
                );
                TaskOutcome::branch(
                    children
                        .iter()
                        .map(|child| {
                            BranchInfo::new(child.name.clone(), self.fan_out(child, phase))
                        })
                        .collect(),
                )
            }
            _ => {
                let subtasks = self.fan_out(node, phase);
                tracing::info!(
                    flow = %self.flow.name,
                    node = %node.name,
                    count = subtasks.len(),
                    "flow fan-out"
                );
                TaskOutcome::subtasks(subtasks)
            }
        }
    }

    fn fan_out(&self, node: &FlowNode, phase: &Phase<'_>) -> Vec<SubTaskInfo> {
        match &node.kind {
            FlowNodeKind::Agent { task_id } => vec![SubTaskInfo::new(
                task_id.clone(),
                node.name.as_str(),
                self.mapped(&node.name, phase),
            )],
            FlowNodeKind::Parallel { tasks } => tasks
                .iter()
                .map(|binding| {
                    SubTaskInfo::new(
                        binding.task_id.clone(),
                        node.name.as_str(),
                        self.mapped(&binding.name, phase),
                    )
                })
                .collect(),
            // Unreachable in a validated flow; kept total instead of panicking.
            FlowNodeKind::Branch { .. } => Vec::new(),
        }
    }

    fn mapped(&self, name: &str, phase: &Phase<'_>) -> Value {
        match phase {
            Phase::Start { input } => self.mappers.start_input(name, input),
            Phase::Resume {
                original_input,
                children_outputs,
            } => self.mappers.resume_input(name, original_input, children_outputs),
        }
    }
}

/// Exposes a flow as a resumable orchestrator agent.
pub struct FlowOrchestrator {
    manifest: AgentManifest,
    engine: FlowEngine,
}

impl FlowOrchestrator {
    /// Validate the flow and wrap it behind an agent manifest.
    pub fn new(
        manifest: AgentManifest,
        flow: FlowSpec,
        mappers: MapperRegistry,
    ) -> Result<Self, FlowError> {
        Ok(Self {
            manifest,
            engine: FlowEngine::new(flow, mappers)?,
        })
    }

    /// Output returned when the flow's final node completes.
    pub fn with_completion_output(mut self, output: Value) -> Self {
        self.engine = self.engine.with_completion_output(output);
        self
    }
}

#[async_trait]
impl TaskAgent for FlowOrchestrator {
    fn manifest(&self) -> AgentManifest {
        self.manifest.clone()
    }

    async fn execute(&self, task: StartTask) -> Result<TaskOutcome, AgentError> {
        Ok(self.engine.start(&task.input))
    }
}

#[async_trait]
impl ResumableAgent for FlowOrchestrator {
    async fn resume(&self, task: ResumeTask) -> Result<TaskOutcome, AgentError> {
        self.engine
            .resume(
                &task.completed_group_id,
                &task.original_input,
                &task.children_outputs,
            )
            .map_err(|err| AgentError::Configuration(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::run;
    use crate::flow::{AgentBinding, InputMapper};
    use crate::registry::RegisteredAgent;
    use ensemble_api::AgentTaskRequest;
    use std::sync::Arc;
    use tokio_test::block_on;

    struct MergeOutputs;

    impl InputMapper for MergeOutputs {
        fn on_resume(&self, original_input: &Value, children_outputs: &[Value]) -> Value {
            json!({
                "topicId": original_input["topicId"],
                "classifications": children_outputs,
            })
        }
    }

    fn pipeline_mappers() -> MapperRegistry {
        let mut mappers = MapperRegistry::new();
        mappers.register_fn("classify-history", |input| {
            json!({ "topicId": input["topicId"], "angle": "history" })
        });
        mappers.register_fn("classify-form", |input| {
            json!({ "topicId": input["topicId"], "angle": "form" })
        });
        mappers.register("extend", Arc::new(MergeOutputs));
        mappers
    }

    fn pipeline() -> FlowEngine {
        let flow = FlowSpec::new(
            "section-pipeline",
            FlowNode::parallel(
                "classify",
                vec![
                    AgentBinding::new("classify-history", "section.history"),
                    AgentBinding::new("classify-form", "section.form"),
                ],
            )
            .then(FlowNode::agent("extend", "section.extend")),
        );
        FlowEngine::new(flow, pipeline_mappers())
            .unwrap()
            .with_completion_output(json!({ "done": true, "flow": "section-pipeline" }))
    }

    fn split() -> FlowEngine {
        let flow = FlowSpec::new(
            "split-flow",
            FlowNode::branch(
                "split",
                vec![
                    FlowNode::agent("collect", "doc.collect")
                        .then(FlowNode::agent("merge", "doc.merge")),
                    FlowNode::parallel(
                        "audit",
                        vec![
                            AgentBinding::new("audit-style", "doc.style"),
                            AgentBinding::new("audit-facts", "doc.facts"),
                        ],
                    ),
                ],
            ),
        );
        FlowEngine::new(flow, MapperRegistry::new()).unwrap()
    }

    #[test]
    fn test_invalid_flow_rejected_at_construction() {
        let flow = FlowSpec::new(
            "bad",
            FlowNode::branch(
                "outer",
                vec![
                    FlowNode::agent("a", "t.a"),
                    FlowNode::branch(
                        "inner",
                        vec![FlowNode::agent("x", "t.x"), FlowNode::agent("y", "t.y")],
                    ),
                ],
            ),
        );
        assert_eq!(
            FlowEngine::new(flow, MapperRegistry::new()).err(),
            Some(FlowError::BranchUnderBranch("inner".to_string()))
        );
    }

    #[test]
    fn test_start_fans_out_one_group_with_mapped_inputs() {
        let engine = pipeline();
        let outcome = engine.start(&json!({ "topicId": "t1" }));

        match outcome {
            TaskOutcome::Subtasks { subtasks } => {
                assert_eq!(subtasks.len(), 2);
                assert!(subtasks.iter().all(|s| s.subtasks_group_id == "classify"));
                assert_eq!(subtasks[0].task_id, "section.history");
                assert_eq!(subtasks[0].task_input_data["angle"], "history");
                assert_eq!(subtasks[1].task_input_data["angle"], "form");
            }
            other => panic!("expected subtasks, got {:?}", other),
        }
    }

    #[test]
    fn test_resume_advances_with_children_visible_to_the_mapper() {
        let engine = pipeline();
        let outcome = engine
            .resume(
                &GroupId::from("classify"),
                &json!({ "topicId": "t1" }),
                &[json!({ "label": "baroque" }), json!({ "label": "fugue" })],
            )
            .unwrap();

        match outcome {
            TaskOutcome::Subtasks { subtasks } => {
                assert_eq!(subtasks.len(), 1);
                assert_eq!(subtasks[0].subtasks_group_id, "extend");
                assert_eq!(
                    subtasks[0].task_input_data["classifications"],
                    json!([{ "label": "baroque" }, { "label": "fugue" }])
                );
            }
            other => panic!("expected subtasks, got {:?}", other),
        }
    }

    #[test]
    fn test_final_group_completes_with_configured_output() {
        let engine = pipeline();
        let outcome = engine
            .resume(&GroupId::from("extend"), &json!({ "topicId": "t1" }), &[])
            .unwrap();
        assert_eq!(
            outcome,
            TaskOutcome::completed(json!({ "done": true, "flow": "section-pipeline" }))
        );
    }

    #[test]
    fn test_unknown_group_is_an_error() {
        let engine = pipeline();
        let err = engine
            .resume(&GroupId::from("nowhere"), &json!({}), &[])
            .unwrap_err();
        assert_eq!(err, FlowError::UnknownGroup("nowhere".to_string()));
    }

    #[test]
    fn test_branch_start_emits_independent_named_groups() {
        let engine = split();
        let outcome = engine.start(&json!({ "docId": "d1" }));

        match outcome {
            TaskOutcome::Branch { branches } => {
                assert_eq!(branches.len(), 2);
                assert_eq!(branches[0].branch_name, "collect");
                assert_eq!(branches[0].subtasks.len(), 1);
                assert!(branches[0].subtasks.iter().all(|s| s.subtasks_group_id == "collect"));
                assert_eq!(branches[1].branch_name, "audit");
                assert_eq!(branches[1].subtasks.len(), 2);
                assert!(branches[1].subtasks.iter().all(|s| s.subtasks_group_id == "audit"));
            }
            other => panic!("expected branch, got {:?}", other),
        }
    }

    #[test]
    fn test_branch_sub_flows_resume_independently() {
        let engine = split();

        // The collect branch has a follow-up node.
        let after_collect = engine
            .resume(&GroupId::from("collect"), &json!({ "docId": "d1" }), &[json!({})])
            .unwrap();
        match after_collect {
            TaskOutcome::Subtasks { subtasks } => {
                assert_eq!(subtasks[0].subtasks_group_id, "merge");
            }
            other => panic!("expected subtasks, got {:?}", other),
        }

        // The audit branch ends after its only node.
        let after_audit = engine
            .resume(&GroupId::from("audit"), &json!({ "docId": "d1" }), &[])
            .unwrap();
        assert!(after_audit.is_terminal());
    }

    #[test]
    fn test_identical_calls_produce_identical_outcomes() {
        let engine = pipeline();
        let input = json!({ "topicId": "t1" });
        let children = [json!({ "label": "a" })];

        let first = serde_json::to_string(
            &engine
                .resume(&GroupId::from("classify"), &input, &children)
                .unwrap(),
        )
        .unwrap();
        let second = serde_json::to_string(
            &engine
                .resume(&GroupId::from("classify"), &input, &children)
                .unwrap(),
        )
        .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_flow_orchestrator_round_trip_through_the_wrapper() {
        block_on(async {
            let manifest = AgentManifest::new(
                "Section Pipeline",
                "topic.pipeline",
                "Classifies then extends the sections of a topic",
            )
            .with_input_schema(json!({
                "type": "object",
                "properties": { "topicId": { "type": "string" } },
                "required": ["topicId"]
            }));
            let flow = FlowSpec::new(
                "section-pipeline",
                FlowNode::parallel(
                    "classify",
                    vec![
                        AgentBinding::new("classify-history", "section.history"),
                        AgentBinding::new("classify-form", "section.form"),
                    ],
                )
                .then(FlowNode::agent("extend", "section.extend")),
            );
            let orchestrator =
                FlowOrchestrator::new(manifest, flow, pipeline_mappers()).unwrap();
            let agent = RegisteredAgent::Orchestrator(Arc::new(orchestrator));

            let started = run(
                &agent,
                AgentTaskRequest::start("topic.pipeline", json!({ "topicId": "t1" }))
                    .with_correlation_id("corr-42"),
            )
            .await;
            assert_eq!(started.correlation_id, "corr-42");
            assert!(matches!(started.outcome, TaskOutcome::Subtasks { .. }));

            let resumed = run(
                &agent,
                AgentTaskRequest::resume(
                    "topic.pipeline",
                    "extend",
                    json!({ "topicId": "t1" }),
                    vec![json!({ "merged": true })],
                )
                .with_correlation_id("corr-42"),
            )
            .await;
            assert_eq!(
                resumed.outcome,
                TaskOutcome::completed(json!({ "done": true }))
            );
        });
    }
}
