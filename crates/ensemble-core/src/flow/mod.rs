//! Declarative workflow descriptions
//!
//! A `FlowSpec` is a data-only graph of named nodes: a single agent call, a
//! parallel fan-out sharing one group id, or a branch splitting into
//! independent sub-flows. Node names double as subtask group ids, so they
//! must be unique across the whole flow. Input mapping lives in a separate
//! registry keyed by node name, keeping specs serializable and testable on
//! their own.

mod engine;
mod mapper;

pub use engine::{FlowEngine, FlowOrchestrator};
pub use mapper::{FnMapper, InputMapper, MapperRegistry};

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use ensemble_api::TaskId;

/// Flow definition or evaluation mistakes.
///
/// Everything except `UnknownGroup` is detected statically by
/// [`FlowSpec::validate`] before any execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("duplicate node name '{0}' in flow")]
    DuplicateName(String),
    #[error("branch node '{0}' nests a branch directly inside a branch")]
    BranchUnderBranch(String),
    #[error("branch node '{0}' needs at least two children")]
    BranchTooNarrow(String),
    #[error("parallel node '{0}' has no tasks")]
    EmptyParallel(String),
    #[error("no node in the flow matches completed group '{0}'")]
    UnknownGroup(String),
}

/// A declarative, serializable workflow description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowSpec {
    /// Flow name, for logs and diagnostics.
    pub name: String,
    /// First node evaluated on start.
    pub start: FlowNode,
}

impl FlowSpec {
    pub fn new(name: impl Into<String>, start: FlowNode) -> Self {
        Self {
            name: name.into(),
            start,
        }
    }

    /// Check definition-time invariants: globally unique names, no branch
    /// directly under a branch, no empty or degenerate fan-out nodes.
    pub fn validate(&self) -> Result<(), FlowError> {
        let mut seen = HashSet::new();
        check_node(&self.start, false, &mut seen)
    }

    /// Find a node by name anywhere in the flow.
    pub fn find(&self, name: &str) -> Option<&FlowNode> {
        find_in(&self.start, name)
    }
}

/// One named node in a flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
    /// Doubles as the subtask group id for this node's fan-out and keys the
    /// input mapper registry.
    pub name: String,
    #[serde(flatten)]
    pub kind: FlowNodeKind,
    /// Node evaluated once this node's group completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Box<FlowNode>>,
}

impl FlowNode {
    /// A single agent invocation.
    pub fn agent(name: impl Into<String>, task_id: impl Into<TaskId>) -> Self {
        Self {
            name: name.into(),
            kind: FlowNodeKind::Agent {
                task_id: task_id.into(),
            },
            next: None,
        }
    }

    /// A parallel fan-out; every entry shares this node's name as group id.
    pub fn parallel(name: impl Into<String>, tasks: Vec<AgentBinding>) -> Self {
        Self {
            name: name.into(),
            kind: FlowNodeKind::Parallel { tasks },
            next: None,
        }
    }

    /// A split into independent named sub-flows.
    pub fn branch(name: impl Into<String>, children: Vec<FlowNode>) -> Self {
        Self {
            name: name.into(),
            kind: FlowNodeKind::Branch { children },
            next: None,
        }
    }

    /// Append a node at the end of this node's `next` chain.
    pub fn then(mut self, next: FlowNode) -> Self {
        self.next = Some(Box::new(match self.next.take() {
            Some(existing) => (*existing).then(next),
            None => next,
        }));
        self
    }
}

/// Node payload, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlowNodeKind {
    /// One subtask dispatched to a single agent.
    Agent { task_id: TaskId },
    /// Several subtasks dispatched together as one group.
    Parallel { tasks: Vec<AgentBinding> },
    /// Independent sub-flows, resumed separately by the broker.
    Branch { children: Vec<FlowNode> },
}

/// One agent dispatch inside a parallel node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentBinding {
    /// Keys the input mapper registry; unique across the flow.
    pub name: String,
    pub task_id: TaskId,
}

impl AgentBinding {
    pub fn new(name: impl Into<String>, task_id: impl Into<TaskId>) -> Self {
        Self {
            name: name.into(),
            task_id: task_id.into(),
        }
    }
}

fn check_node(
    node: &FlowNode,
    inside_branch: bool,
    seen: &mut HashSet<String>,
) -> Result<(), FlowError> {
    if !seen.insert(node.name.clone()) {
        return Err(FlowError::DuplicateName(node.name.clone()));
    }

    match &node.kind {
        FlowNodeKind::Agent { .. } => {}
        FlowNodeKind::Parallel { tasks } => {
            if tasks.is_empty() {
                return Err(FlowError::EmptyParallel(node.name.clone()));
            }
            for binding in tasks {
                if !seen.insert(binding.name.clone()) {
                    return Err(FlowError::DuplicateName(binding.name.clone()));
                }
            }
        }
        FlowNodeKind::Branch { children } => {
            if inside_branch {
                return Err(FlowError::BranchUnderBranch(node.name.clone()));
            }
            if children.len() < 2 {
                return Err(FlowError::BranchTooNarrow(node.name.clone()));
            }
            for child in children {
                check_node(child, true, seen)?;
            }
        }
    }

    if let Some(next) = &node.next {
        // A next node follows a completed group, so a branch here is not a
        // direct branch-under-branch nesting.
        check_node(next, false, seen)?;
    }
    Ok(())
}

fn find_in<'a>(node: &'a FlowNode, name: &str) -> Option<&'a FlowNode> {
    if node.name == name {
        return Some(node);
    }
    if let FlowNodeKind::Branch { children } = &node.kind {
        for child in children {
            if let Some(found) = find_in(child, name) {
                return Some(found);
            }
        }
    }
    node.next.as_deref().and_then(|next| find_in(next, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn classify_then_extend() -> FlowSpec {
        FlowSpec::new(
            "section-pipeline",
            FlowNode::parallel(
                "classify",
                vec![
                    AgentBinding::new("classify-history", "section.history"),
                    AgentBinding::new("classify-form", "section.form"),
                ],
            )
            .then(FlowNode::agent("extend", "section.extend")),
        )
    }

    #[test]
    fn test_valid_flow_passes_validation() {
        assert!(classify_then_extend().validate().is_ok());
    }

    #[test]
    fn test_duplicate_node_names_rejected() {
        let flow = FlowSpec::new(
            "dup",
            FlowNode::agent("phase", "a.one").then(FlowNode::agent("phase", "a.two")),
        );
        assert_eq!(
            flow.validate(),
            Err(FlowError::DuplicateName("phase".to_string()))
        );
    }

    #[test]
    fn test_binding_names_share_the_namespace() {
        let flow = FlowSpec::new(
            "dup-binding",
            FlowNode::parallel(
                "fan",
                vec![
                    AgentBinding::new("same", "a.one"),
                    AgentBinding::new("same", "a.two"),
                ],
            ),
        );
        assert_eq!(
            flow.validate(),
            Err(FlowError::DuplicateName("same".to_string()))
        );
    }

    #[test]
    fn test_branch_directly_under_branch_rejected() {
        let flow = FlowSpec::new(
            "nested",
            FlowNode::branch(
                "outer",
                vec![
                    FlowNode::agent("left", "a.left"),
                    FlowNode::branch(
                        "inner",
                        vec![
                            FlowNode::agent("x", "a.x"),
                            FlowNode::agent("y", "a.y"),
                        ],
                    ),
                ],
            ),
        );
        assert_eq!(
            flow.validate(),
            Err(FlowError::BranchUnderBranch("inner".to_string()))
        );
    }

    #[test]
    fn test_branch_after_an_intervening_node_is_allowed() {
        let flow = FlowSpec::new(
            "staged",
            FlowNode::branch(
                "split",
                vec![
                    FlowNode::agent("left", "a.left").then(FlowNode::branch(
                        "left-split",
                        vec![
                            FlowNode::agent("deep-a", "a.deep"),
                            FlowNode::agent("deep-b", "b.deep"),
                        ],
                    )),
                    FlowNode::agent("right", "a.right"),
                ],
            ),
        );
        assert!(flow.validate().is_ok());
    }

    #[test]
    fn test_single_child_branch_rejected() {
        let flow = FlowSpec::new(
            "narrow",
            FlowNode::branch("only", vec![FlowNode::agent("lone", "a.one")]),
        );
        assert_eq!(
            flow.validate(),
            Err(FlowError::BranchTooNarrow("only".to_string()))
        );
    }

    #[test]
    fn test_empty_parallel_rejected() {
        let flow = FlowSpec::new("empty", FlowNode::parallel("fan", Vec::new()));
        assert_eq!(
            flow.validate(),
            Err(FlowError::EmptyParallel("fan".to_string()))
        );
    }

    #[test]
    fn test_then_appends_at_the_tail() {
        let node = FlowNode::agent("a", "t.a")
            .then(FlowNode::agent("b", "t.b"))
            .then(FlowNode::agent("c", "t.c"));
        let b = node.next.as_deref().unwrap();
        assert_eq!(b.name, "b");
        assert_eq!(b.next.as_deref().unwrap().name, "c");
    }

    #[test]
    fn test_find_reaches_branch_children_and_chains() {
        let flow = FlowSpec::new(
            "lookup",
            FlowNode::branch(
                "split",
                vec![
                    FlowNode::agent("left", "a.left").then(FlowNode::agent("after", "a.after")),
                    FlowNode::agent("right", "a.right"),
                ],
            ),
        );
        assert!(flow.find("split").is_some());
        assert!(flow.find("after").is_some());
        assert!(flow.find("right").is_some());
        assert!(flow.find("missing").is_none());
    }

    #[test]
    fn test_spec_is_plain_data() {
        let flow = classify_then_extend();
        let value = serde_json::to_value(&flow).unwrap();
        assert_eq!(value["start"]["kind"], "parallel");
        assert_eq!(value["start"]["tasks"][0]["name"], "classify-history");
        assert_eq!(value["start"]["next"]["kind"], "agent");

        let parsed: FlowSpec = serde_json::from_value(json!({
            "name": "from-wire",
            "start": {
                "name": "solo",
                "kind": "agent",
                "task_id": "a.solo"
            }
        }))
        .unwrap();
        assert!(parsed.validate().is_ok());
        assert_eq!(parsed.start.name, "solo");
    }
}
