use crate::config::{RuntimeConfig, DEFAULT_PUSH_ATTEMPT_TIMEOUT_MS};
use crate::error::{RecvError, SendError};
use crate::port::{self, InputPort, OutputPort};
use crate::signal::{WakeHandle, WakeSignal, MESSAGE_ARRIVAL, PROCESS_SHUTDOWN, PROCESS_START};
use crate::utils::RunFlag;
use std::any::TypeId;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use uuid::Uuid;

/// Behavior of a flow-based programming component.
///
/// `initialize` runs exactly once, after the component's execution context
/// is released and before the first `process` call; it may block on
/// receives to pick up initial configuration messages. `process` is then
/// invoked in a loop until the component is stopped. Both read inputs and
/// write outputs through the [`NodeIo`] facade; on a `Terminated` status
/// they must return so the loop can observe the stop request.
pub trait Component: Send + 'static {
    fn initialize(&mut self, io: &mut NodeIo);
    fn process(&mut self, io: &mut NodeIo);
}

/// Port arrays and lifecycle flags, shared between the orchestrator-facing
/// [`Node`] and the execution context running the behavior. Immutable after
/// construction apart from the flags and the output ports' queue slots.
struct NodeState {
    id: Uuid,
    inputs: BTreeMap<u32, InputPort>,
    outputs: BTreeMap<u32, OutputPort>,
    should_run: RunFlag,
    is_running: RunFlag,
}

impl NodeState {
    fn input(&self, index: u32) -> &InputPort {
        self.inputs
            .get(&index)
            .unwrap_or_else(|| panic!("unknown input port index {index}"))
    }

    fn output(&self, index: u32) -> &OutputPort {
        self.outputs
            .get(&index)
            .unwrap_or_else(|| panic!("unknown output port index {index}"))
    }
}

/// Declares a component's ports and assembles a [`Node`] around a behavior.
///
/// Port declaration is construction-time only: once the node is built the
/// arrays never change, and once the process is started nothing may be
/// rewired.
pub struct NodeBuilder {
    id: Uuid,
    signal: WakeSignal,
    inputs: BTreeMap<u32, InputPort>,
    outputs: BTreeMap<u32, OutputPort>,
}

impl NodeBuilder {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            signal: WakeSignal::new(),
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }

    /// Declare an input port carrying `T` with a bounded queue of
    /// `capacity` messages.
    pub fn input<T: Send + 'static>(mut self, index: u32, capacity: usize) -> Self {
        let port = InputPort::new::<T>(self.id, capacity, self.signal.handle());
        let replaced = self.inputs.insert(index, port);
        assert!(replaced.is_none(), "duplicate input port index {index}");
        self
    }

    /// Declare an output port carrying `T`. Outputs start unconnected.
    pub fn output<T: Send + 'static>(mut self, index: u32) -> Self {
        let port = OutputPort::new::<T>(self.id);
        let replaced = self.outputs.insert(index, port);
        assert!(replaced.is_none(), "duplicate output port index {index}");
        self
    }

    pub fn build(self, behavior: impl Component) -> Node {
        let handle = self.signal.handle();
        Node {
            name: String::from("component"),
            state: Arc::new(NodeState {
                id: self.id,
                inputs: self.inputs,
                outputs: self.outputs,
                should_run: RunFlag::new(false),
                is_running: RunFlag::new(false),
            }),
            signal_handle: handle,
            signal: Some(self.signal),
            behavior: Some(Box::new(behavior)),
            push_timeout: Duration::from_millis(DEFAULT_PUSH_ATTEMPT_TIMEOUT_MS),
            stack_size: None,
            join: None,
        }
    }
}

impl Default for NodeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A component instance: ports, lifecycle flags and, once started, the
/// execution context running the behavior. Dropping a node stops it and
/// joins its thread, so contexts never outlive their owner.
pub struct Node {
    name: String,
    state: Arc<NodeState>,
    signal_handle: WakeHandle,
    signal: Option<WakeSignal>,
    behavior: Option<Box<dyn Component>>,
    push_timeout: Duration,
    stack_size: Option<usize>,
    join: Option<thread::JoinHandle<()>>,
}

impl Node {
    pub fn builder() -> NodeBuilder {
        NodeBuilder::new()
    }

    pub fn id(&self) -> Uuid {
        self.state.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub(crate) fn apply_config(&mut self, config: &RuntimeConfig) {
        if let Some(ms) = config.push_attempt_timeout_ms {
            self.push_timeout = Duration::from_millis(ms);
        }
        if let Some(bytes) = config.thread_stack_size {
            self.stack_size = Some(bytes);
        }
    }

    pub fn input(&self, index: u32) -> Option<&InputPort> {
        self.state.inputs.get(&index)
    }

    pub fn output(&self, index: u32) -> Option<&OutputPort> {
        self.state.outputs.get(&index)
    }

    /// Deliver an initial message to the given input port from outside the
    /// network, using this node's configured push attempt timeout. See
    /// [`InputPort::inject`].
    pub fn inject<T: Send + 'static>(&self, index: u32, value: T) -> Result<(), SendError<T>> {
        self.state.input(index).inject(value, self.push_timeout)
    }

    pub fn should_run(&self) -> bool {
        self.state.should_run.get()
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running.get()
    }

    /// Spawn the component's execution context and release it for
    /// execution. A node can be started once; later calls are no-ops.
    pub fn start_process(&mut self) {
        let (Some(signal), Some(behavior)) = (self.signal.take(), self.behavior.take()) else {
            tracing::warn!("[{}] already started, ignoring", self.name);
            return;
        };

        self.state.should_run.set(true);

        let name = self.name.clone();
        let state = self.state.clone();
        let push_timeout = self.push_timeout;

        let mut builder = thread::Builder::new().name(self.name.clone());
        if let Some(bytes) = self.stack_size {
            builder = builder.stack_size(bytes);
        }

        match builder.spawn(move || run_process(name, state, signal, behavior, push_timeout)) {
            Ok(handle) => {
                self.join = Some(handle);
                self.signal_handle.notify(PROCESS_START);
            }
            Err(e) => {
                tracing::error!("[{}] failed to spawn execution context: {}", self.name, e);
                self.state.should_run.set(false);
            }
        }
    }

    /// Ask the component to stop. Cooperative: blocked receives and sends
    /// observe the request on their next wake or retry and return
    /// `Terminated`.
    pub fn stop_process(&self) {
        self.state.should_run.set(false);
        self.signal_handle.notify(PROCESS_SHUTDOWN);
    }

    /// Wait for the execution context to exit. Call after `stop_process`;
    /// joining a running component blocks until it is stopped elsewhere.
    pub fn join(&mut self) {
        if let Some(handle) = self.join.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        self.stop_process();
        if let Some(handle) = self.join.take() {
            let _ = handle.join();
        }
    }
}

/// The behavior's window onto its own ports, bound to the component's
/// execution context. Receives block on the context's wake signal, sends
/// cooperate with the stop flag.
pub struct NodeIo {
    name: String,
    state: Arc<NodeState>,
    signal: WakeSignal,
    push_timeout: Duration,
}

impl NodeIo {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_message(&self, index: u32) -> bool {
        self.state.input(index).has_message()
    }

    pub fn message_count(&self, index: u32) -> usize {
        self.state.input(index).message_count()
    }

    /// Receive the next message from input `index`, blocking until one
    /// arrives or the component is stopped.
    pub fn recv<T: Send + 'static>(&mut self, index: u32) -> Result<T, RecvError> {
        let port = self.state.input(index);
        if TypeId::of::<T>() != port.element_type() {
            return Err(RecvError::TypeMismatch);
        }

        loop {
            if !self.state.should_run.get() {
                return Err(RecvError::Terminated);
            }
            if port.has_message() {
                if let Some(value) = port.pop::<T>() {
                    return Ok(value);
                }
                continue;
            }
            self.signal.wait(MESSAGE_ARRIVAL | PROCESS_SHUTDOWN);
        }
    }

    /// Send a message on output `index`, blocking while the downstream
    /// queue is full. See [`OutputPort`] for the unconnected-output
    /// discard policy.
    pub fn send<T: Send + 'static>(&mut self, index: u32, value: T) -> Result<(), SendError<T>> {
        self.state
            .output(index)
            .send(value, &self.state.should_run, self.push_timeout)
    }

    /// Block until one of the given input ports has a message, returning
    /// its index. When several are ready the first ready index in
    /// `indices` wins, so the argument order is the priority order.
    pub fn await_any(&mut self, indices: &[u32]) -> Result<u32, RecvError> {
        loop {
            if !self.state.should_run.get() {
                return Err(RecvError::Terminated);
            }
            for &index in indices {
                if self.state.input(index).has_message() {
                    return Ok(index);
                }
            }
            self.signal.wait(MESSAGE_ARRIVAL | PROCESS_SHUTDOWN);
        }
    }
}

fn run_process(
    name: String,
    state: Arc<NodeState>,
    signal: WakeSignal,
    mut behavior: Box<dyn Component>,
    push_timeout: Duration,
) {
    signal.wait(PROCESS_START);

    state.is_running.set(true);
    tracing::info!("[{}] component initializing", name);

    let mut io = NodeIo {
        name,
        state: state.clone(),
        signal,
        push_timeout,
    };

    behavior.initialize(&mut io);
    tracing::info!("[{}] component running", io.name);

    while state.should_run.get() {
        behavior.process(&mut io);
    }

    state.is_running.set(false);
    tracing::info!("[{}] component shutting down", io.name);
}

/// Connect an output port of one component to an input port of another.
/// Unknown indices and rejected pairings (type mismatch, self-loop) leave
/// the output unconnected; see [`port::connect`].
pub fn connect(source: &Node, source_index: u32, target: &Node, target_index: u32) {
    let (Some(output), Some(input)) = (source.output(source_index), target.input(target_index))
    else {
        tracing::warn!(
            "connect: no such port pair {}:{} -> {}:{}, connection ignored",
            source.name,
            source_index,
            target.name,
            target_index
        );
        return;
    };
    port::connect(output, input);
}
