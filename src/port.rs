use crate::error::{PushFailReason, SendError};
use crate::queue::MessageQueue;
use crate::signal::WakeHandle;
use crate::utils::RunFlag;
use arc_swap::ArcSwapOption;
use std::any::TypeId;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Receiving endpoint of a connection. Creates and owns its message queue;
/// closing happens automatically when the port is dropped, which lets
/// producers observe the reader's departure.
pub struct InputPort {
    parent: Uuid,
    element_type: TypeId,
    queue: Arc<MessageQueue>,
}

impl InputPort {
    pub(crate) fn new<T: Send + 'static>(
        parent: Uuid,
        capacity: usize,
        reader: WakeHandle,
    ) -> Self {
        Self {
            parent,
            element_type: TypeId::of::<T>(),
            queue: Arc::new(MessageQueue::new::<T>(capacity, reader)),
        }
    }

    pub fn element_type(&self) -> TypeId {
        self.element_type
    }

    pub fn has_message(&self) -> bool {
        self.queue.has_message()
    }

    pub fn message_count(&self) -> usize {
        self.queue.message_count()
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }

    pub fn close(&self) {
        self.queue.close();
    }

    pub(crate) fn parent(&self) -> Uuid {
        self.parent
    }

    pub(crate) fn queue(&self) -> &Arc<MessageQueue> {
        &self.queue
    }

    pub(crate) fn pop<T: Send + 'static>(&self) -> Option<T> {
        self.queue.pop()
    }

    /// Deliver a message from outside the network, bypassing any sender
    /// lifecycle. Used for initial configuration messages; retries one
    /// `timeout`-bounded push at a time until the message is accepted or
    /// the receiving queue closes. Must not be called from component
    /// code: it ignores the caller's own shutdown.
    pub fn inject<T: Send + 'static>(
        &self,
        value: T,
        timeout: Duration,
    ) -> Result<(), SendError<T>> {
        if TypeId::of::<T>() != self.element_type {
            return Err(SendError::type_mismatch(value));
        }

        let mut value = value;

        loop {
            if self.queue.is_closed() {
                return Err(SendError::terminated(value));
            }
            match self.queue.push(value, timeout) {
                Ok(()) => return Ok(()),
                Err(e) => match e.reason {
                    PushFailReason::Full => value = e.value,
                    PushFailReason::Closed => return Err(SendError::terminated(e.value)),
                    PushFailReason::Type => return Err(SendError::type_mismatch(e.value)),
                },
            }
        }
    }
}

impl Drop for InputPort {
    fn drop(&mut self) {
        self.queue.close();
    }
}

/// Sending endpoint of a connection. Starts unconnected; [`connect`] binds
/// it to an input port's queue. The slot is read on every send and written
/// at most during wiring, hence the lock-free swap cell.
pub struct OutputPort {
    parent: Uuid,
    element_type: TypeId,
    slot: ArcSwapOption<MessageQueue>,
}

impl OutputPort {
    pub(crate) fn new<T: Send + 'static>(parent: Uuid) -> Self {
        Self {
            parent,
            element_type: TypeId::of::<T>(),
            slot: ArcSwapOption::empty(),
        }
    }

    pub fn element_type(&self) -> TypeId {
        self.element_type
    }

    pub fn is_connected(&self) -> bool {
        self.slot.load().is_some()
    }

    pub fn has_message(&self) -> bool {
        match &*self.slot.load() {
            Some(queue) => queue.has_message(),
            None => false,
        }
    }

    pub fn message_count(&self) -> usize {
        match &*self.slot.load() {
            Some(queue) => queue.message_count(),
            None => 0,
        }
    }

    pub fn capacity(&self) -> usize {
        match &*self.slot.load() {
            Some(queue) => queue.capacity(),
            None => 0,
        }
    }

    /// An unconnected output reads as closed.
    pub fn is_closed(&self) -> bool {
        match &*self.slot.load() {
            Some(queue) => queue.is_closed(),
            None => true,
        }
    }

    /// Close the attached queue; no-op while unconnected.
    pub fn close(&self) {
        if let Some(queue) = &*self.slot.load() {
            queue.close();
        }
    }

    pub(crate) fn parent(&self) -> Uuid {
        self.parent
    }

    pub(crate) fn attach(&self, queue: Arc<MessageQueue>) {
        self.slot.store(Some(queue));
    }

    /// Deliver a message downstream, cooperating with the sender's
    /// lifecycle. An unconnected output, and one whose consumer has gone
    /// away, both discard the message and report success: components are
    /// written to always send, and a missing downstream is not a failure.
    /// A full queue throttles the sender one bounded attempt at a time so
    /// a stop request is observed within `timeout`.
    pub(crate) fn send<T: Send + 'static>(
        &self,
        value: T,
        should_run: &RunFlag,
        timeout: Duration,
    ) -> Result<(), SendError<T>> {
        if TypeId::of::<T>() != self.element_type {
            return Err(SendError::type_mismatch(value));
        }

        let mut value = value;

        loop {
            if !should_run.get() {
                return Err(SendError::terminated(value));
            }
            let Some(queue) = self.slot.load_full() else {
                return Ok(());
            };
            match queue.push(value, timeout) {
                Ok(()) => return Ok(()),
                Err(e) => match e.reason {
                    PushFailReason::Full => value = e.value,
                    PushFailReason::Closed => return Ok(()),
                    PushFailReason::Type => return Err(SendError::type_mismatch(e.value)),
                },
            }
        }
    }
}

/// Bind an output port to an input port's queue.
///
/// Refused (as a logged no-op) when the element types differ or when both
/// ports belong to the same component; a component feeding itself through
/// a bounded queue deadlocks trivially.
pub fn connect(source: &OutputPort, target: &InputPort) {
    if source.parent() == target.parent() {
        tracing::warn!("connect: both ports belong to one component, connection ignored");
        return;
    }
    if source.element_type() != target.element_type() {
        tracing::warn!("connect: port element types differ, connection ignored");
        return;
    }
    source.attach(target.queue().clone());
}
