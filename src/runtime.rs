use crate::component::{connect, Node};
use crate::config::RuntimeConfig;
use anyhow::{anyhow, Result};
use std::collections::HashMap;

type NodeFactory = Box<dyn Fn() -> Node + Send>;

/// Registry and orchestrator of a dataflow network.
///
/// Owns the `component id -> factory` and `instance name -> node` maps.
/// Graph construction and teardown happen on the orchestrator's thread;
/// the running network only ever touches the queues wired between nodes,
/// so no part of the registry is shared with component contexts.
pub struct Runtime {
    config: RuntimeConfig,
    factories: HashMap<String, NodeFactory>,
    nodes: HashMap<String, Node>,
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            config,
            factories: HashMap::new(),
            nodes: HashMap::new(),
        }
    }

    /// Record a factory under a textual component id. Re-registration
    /// replaces the previous factory.
    pub fn register_component(
        &mut self,
        component_id: impl Into<String>,
        factory: impl Fn() -> Node + Send + 'static,
    ) {
        self.factories.insert(component_id.into(), Box::new(factory));
    }

    /// Instantiate a registered component under a unique instance name.
    pub fn add_node(&mut self, component_id: &str, name: &str) -> Result<()> {
        let factory = self
            .factories
            .get(component_id)
            .ok_or_else(|| anyhow!("unknown component id: {component_id}"))?;
        if self.nodes.contains_key(name) {
            return Err(anyhow!("node name already in use: {name}"));
        }

        let mut node = factory();
        node.set_name(name);
        node.apply_config(&self.config);
        self.nodes.insert(name.to_string(), node);

        tracing::debug!("[Runtime] added node {} ({})", name, component_id);
        Ok(())
    }

    /// Drop the named instance. Stops its execution context, joins it, and
    /// closes its input queues, which unblocks anyone still wired to it.
    pub fn remove_node(&mut self, name: &str) {
        if self.nodes.remove(name).is_none() {
            tracing::warn!("[Runtime] remove_node: unknown node {}", name);
        }
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    /// Wire an output port to an input port by instance names. Unknown
    /// names are a logged no-op; callers wanting validation should check
    /// the graph before starting it.
    pub fn add_edge(&mut self, source: &str, output_index: u32, target: &str, input_index: u32) {
        match (self.nodes.get(source), self.nodes.get(target)) {
            (Some(source_node), Some(target_node)) => {
                connect(source_node, output_index, target_node, input_index);
            }
            _ => tracing::warn!(
                "[Runtime] add_edge: unknown node in {} -> {}, edge ignored",
                source,
                target
            ),
        }
    }

    /// Inject an initial message into the named instance's input port,
    /// typically configuration consumed by the component's `initialize`.
    /// Unknown names and rejected messages are logged no-ops.
    pub fn add_initial<T: Send + 'static>(&self, name: &str, input_index: u32, value: T) {
        match self.nodes.get(name) {
            Some(node) => {
                if let Err(e) = node.inject(input_index, value) {
                    tracing::warn!(
                        "[Runtime] add_initial: {} on {}:{}, message dropped",
                        e,
                        name,
                        input_index
                    );
                }
            }
            None => tracing::warn!(
                "[Runtime] add_initial: unknown node {}, message dropped",
                name
            ),
        }
    }

    /// Start every node. No ordering guarantee: components started ahead
    /// of their upstreams simply block on their first receive.
    pub fn start_network(&mut self) {
        tracing::info!("[Runtime] starting network ({} nodes)", self.nodes.len());
        for node in self.nodes.values_mut() {
            node.start_process();
        }
    }

    /// Signal every node to stop. Does not join; nodes are joined when
    /// removed or when the runtime is dropped.
    pub fn stop_network(&mut self) {
        tracing::info!("[Runtime] stopping network");
        for node in self.nodes.values() {
            node.stop_process();
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
