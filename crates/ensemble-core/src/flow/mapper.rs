//! Input mappers for flow nodes
//!
//! Flow specs are plain data; per-node input shaping lives here, in a
//! registry keyed by node (or binding) name. A node without a registered
//! mapper passes the workflow input through unchanged.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

/// Derives a subtask's input payload from workflow data.
///
/// Both methods default to passing the original input through, so an
/// implementation only overrides the phase it cares about.
pub trait InputMapper: Send + Sync {
    /// Input for a subtask scheduled while starting the workflow.
    fn on_start(&self, input: &Value) -> Value {
        input.clone()
    }

    /// Input for a subtask scheduled after a group completed.
    fn on_resume(&self, original_input: &Value, _children_outputs: &[Value]) -> Value {
        original_input.clone()
    }
}

/// Adapter applying one closure to both phases' base input.
pub struct FnMapper<F>(pub F)
where
    F: Fn(&Value) -> Value + Send + Sync;

impl<F> InputMapper for FnMapper<F>
where
    F: Fn(&Value) -> Value + Send + Sync,
{
    fn on_start(&self, input: &Value) -> Value {
        (self.0)(input)
    }

    fn on_resume(&self, original_input: &Value, _children_outputs: &[Value]) -> Value {
        (self.0)(original_input)
    }
}

/// Registry of input mappers, keyed by node name.
#[derive(Default)]
pub struct MapperRegistry {
    mappers: HashMap<String, Arc<dyn InputMapper>>,
}

impl MapperRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            mappers: HashMap::new(),
        }
    }

    /// Register a mapper for a node name.
    pub fn register(&mut self, node_name: impl Into<String>, mapper: Arc<dyn InputMapper>) {
        self.mappers.insert(node_name.into(), mapper);
    }

    /// Register a closure as the mapper for a node name.
    pub fn register_fn<F>(&mut self, node_name: impl Into<String>, f: F)
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.register(node_name, Arc::new(FnMapper(f)));
    }

    /// Get the mapper registered for a node name.
    pub fn get(&self, node_name: &str) -> Option<Arc<dyn InputMapper>> {
        self.mappers.get(node_name).cloned()
    }

    /// Start-phase input for a node: registered mapper or identity.
    pub fn start_input(&self, node_name: &str, input: &Value) -> Value {
        match self.get(node_name) {
            Some(mapper) => mapper.on_start(input),
            None => input.clone(),
        }
    }

    /// Resume-phase input for a node: registered mapper or identity.
    pub fn resume_input(
        &self,
        node_name: &str,
        original_input: &Value,
        children_outputs: &[Value],
    ) -> Value {
        match self.get(node_name) {
            Some(mapper) => mapper.on_resume(original_input, children_outputs),
            None => original_input.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct MergeChildren;

    impl InputMapper for MergeChildren {
        fn on_resume(&self, original_input: &Value, children_outputs: &[Value]) -> Value {
            json!({
                "original": original_input,
                "collected": children_outputs,
            })
        }
    }

    #[test]
    fn test_unregistered_name_falls_back_to_identity() {
        let registry = MapperRegistry::new();
        let input = json!({ "topicId": "t1" });
        assert_eq!(registry.start_input("anything", &input), input);
        assert_eq!(
            registry.resume_input("anything", &input, &[json!(1)]),
            input
        );
    }

    #[test]
    fn test_fn_mapper_shapes_start_input() {
        let mut registry = MapperRegistry::new();
        registry.register_fn("classify", |input| json!({ "topic": input["topicId"] }));

        let shaped = registry.start_input("classify", &json!({ "topicId": "t1" }));
        assert_eq!(shaped, json!({ "topic": "t1" }));
    }

    #[test]
    fn test_custom_mapper_sees_children_on_resume() {
        let mut registry = MapperRegistry::new();
        registry.register("merge", Arc::new(MergeChildren));

        let shaped = registry.resume_input(
            "merge",
            &json!({ "topicId": "t1" }),
            &[json!({ "label": "a" })],
        );
        assert_eq!(shaped["original"]["topicId"], "t1");
        assert_eq!(shaped["collected"][0]["label"], "a");
    }
}
