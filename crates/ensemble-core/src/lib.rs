//! # Ensemble Core
//!
//! Agent abstractions and deterministic execution logic for the Ensemble
//! runtime.
//!
//! This crate contains:
//! - The `TaskAgent` / `ResumableAgent` capability traits
//! - The execution wrapper that validates, dispatches, and maps faults
//! - The agent registry keyed by task id and URL path
//! - Declarative flow definitions and their stateless evaluator
//!
//! This crate does NOT care about:
//! - How requests arrive (HTTP framing lives in the server)
//! - How agents are announced to the broker
//! - Where configuration comes from

pub mod agent;
pub mod executor;
pub mod flow;
pub mod registry;
pub mod schema;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::agent::{AgentError, ResumableAgent, ResumeTask, StartTask, TaskAgent};
    pub use crate::executor::run;
    pub use crate::flow::{
        AgentBinding, FlowEngine, FlowError, FlowNode, FlowNodeKind, FlowOrchestrator, FlowSpec,
        FnMapper, InputMapper, MapperRegistry,
    };
    pub use crate::registry::{AgentRegistry, RegisteredAgent, RegistryError};
    pub use crate::schema::{decode, validate, FieldViolation, ValidationFailure};
}

// Re-export key types at crate root
pub use agent::{AgentError, ResumableAgent, ResumeTask, StartTask, TaskAgent};
pub use executor::run;
pub use flow::{FlowEngine, FlowNode, FlowOrchestrator, FlowSpec, MapperRegistry};
pub use registry::{AgentRegistry, RegisteredAgent, RegistryError};
pub use schema::{validate, ValidationFailure};
