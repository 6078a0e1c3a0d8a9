//! Agent registry
//!
//! Maps task type ids to registered agents, with a second index by resolved
//! HTTP path for the transport layer. Built once at startup and read-only
//! afterwards, so it is safe to share across concurrent invocations.

use std::collections::HashMap;
use std::sync::Arc;

use ensemble_api::{AgentManifest, TaskId};
use thiserror::Error;

use crate::agent::{ResumableAgent, TaskAgent};

/// Registration mistakes detected before the host starts serving.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("task id '{0}' is already registered")]
    DuplicateTaskId(TaskId),
    #[error("path '{path}' already serves task '{existing}'; task '{candidate}' resolves to the same path")]
    DuplicatePath {
        path: String,
        existing: TaskId,
        candidate: TaskId,
    },
    #[error("agent name '{0}' resolves to an empty path")]
    EmptyPath(String),
}

/// A registered agent, tagged by capability.
#[derive(Clone)]
pub enum RegisteredAgent {
    /// Accepts only start commands.
    Single(Arc<dyn TaskAgent>),
    /// Accepts start and resume commands.
    Orchestrator(Arc<dyn ResumableAgent>),
}

impl RegisteredAgent {
    pub fn is_orchestrator(&self) -> bool {
        matches!(self, RegisteredAgent::Orchestrator(_))
    }

    /// Effective manifest for this registration.
    ///
    /// Orchestrators registered without an explicit resume schema get the
    /// trait-provided one injected, so a manifest's `resume_input_schema`
    /// presence always reflects the registered capability.
    pub fn manifest(&self) -> AgentManifest {
        match self {
            RegisteredAgent::Single(agent) => agent.manifest(),
            RegisteredAgent::Orchestrator(agent) => {
                let manifest = agent.manifest();
                if manifest.resume_input_schema.is_none() {
                    manifest.with_resume_input_schema(agent.resume_input_schema())
                } else {
                    manifest
                }
            }
        }
    }

    /// Resolved HTTP path segment for this registration.
    pub fn path(&self) -> String {
        self.manifest().path()
    }
}

/// Registry of every agent a host serves.
pub struct AgentRegistry {
    agents: HashMap<TaskId, RegisteredAgent>,
    paths: HashMap<String, TaskId>,
}

impl AgentRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            agents: HashMap::new(),
            paths: HashMap::new(),
        }
    }

    /// Register a single-shot agent.
    pub fn register(&mut self, agent: Arc<dyn TaskAgent>) -> Result<(), RegistryError> {
        self.insert(RegisteredAgent::Single(agent))
    }

    /// Register a resumable orchestrator agent.
    pub fn register_orchestrator(
        &mut self,
        agent: Arc<dyn ResumableAgent>,
    ) -> Result<(), RegistryError> {
        self.insert(RegisteredAgent::Orchestrator(agent))
    }

    fn insert(&mut self, entry: RegisteredAgent) -> Result<(), RegistryError> {
        let manifest = entry.manifest();
        let path = manifest.path();
        if path.is_empty() {
            return Err(RegistryError::EmptyPath(manifest.agent_name));
        }
        if self.agents.contains_key(&manifest.task_id) {
            return Err(RegistryError::DuplicateTaskId(manifest.task_id));
        }
        if let Some(existing) = self.paths.get(&path) {
            return Err(RegistryError::DuplicatePath {
                path,
                existing: existing.clone(),
                candidate: manifest.task_id,
            });
        }

        tracing::info!(
            task_id = %manifest.task_id,
            path = %path,
            orchestrator = entry.is_orchestrator(),
            "registered agent"
        );
        self.paths.insert(path, manifest.task_id.clone());
        self.agents.insert(manifest.task_id, entry);
        Ok(())
    }

    /// Get an agent by task type id.
    pub fn get(&self, task_id: &TaskId) -> Option<RegisteredAgent> {
        self.agents.get(task_id).cloned()
    }

    /// Get an agent by resolved HTTP path segment.
    pub fn by_path(&self, path: &str) -> Option<RegisteredAgent> {
        self.paths.get(path).and_then(|task_id| self.get(task_id))
    }

    /// Effective manifests of every registered agent, ordered by task id.
    pub fn manifests(&self) -> Vec<AgentManifest> {
        let mut manifests: Vec<AgentManifest> =
            self.agents.values().map(RegisteredAgent::manifest).collect();
        manifests.sort_by(|a, b| a.task_id.as_str().cmp(b.task_id.as_str()));
        manifests
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
