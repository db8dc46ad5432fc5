use crate::error::{PushError, PushFailReason};
use crate::signal::{WakeHandle, MESSAGE_ARRIVAL};
use crossbeam::queue::ArrayQueue;
use crossbeam::utils::Backoff;
use std::any::{Any, TypeId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Type-erased view of the backing storage. The concrete element type is
/// recovered through `as_any`; observational queries need no type.
trait Slots: Send + Sync {
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool;
    fn as_any(&self) -> &dyn Any;
}

impl<T: Send + 'static> Slots for ArrayQueue<T> {
    fn len(&self) -> usize {
        ArrayQueue::len(self)
    }

    fn is_empty(&self) -> bool {
        ArrayQueue::is_empty(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Bounded FIFO carrying messages of one fixed element type.
///
/// Created by an input port and shared with every output port connected to
/// it. Storage is an [`ArrayQueue`] behind a type witness: every typed
/// access re-checks the element type, so a mistyped push or pop fails
/// instead of reinterpreting another type's payload. The queue knows its
/// reader's wake handle and signals `MESSAGE_ARRIVAL` after each delivery.
pub struct MessageQueue {
    slots: Box<dyn Slots>,
    element_type: TypeId,
    capacity: usize,
    closed: AtomicBool,
    reader: WakeHandle,
}

impl MessageQueue {
    pub fn new<T: Send + 'static>(capacity: usize, reader: WakeHandle) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Box::new(ArrayQueue::<T>::new(capacity)),
            element_type: TypeId::of::<T>(),
            capacity,
            closed: AtomicBool::new(false),
            reader,
        }
    }

    fn cell<T: Send + 'static>(&self) -> Option<&ArrayQueue<T>> {
        self.slots.as_any().downcast_ref()
    }

    pub fn element_type(&self) -> TypeId {
        self.element_type
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn message_count(&self) -> usize {
        self.slots.len()
    }

    pub fn has_message(&self) -> bool {
        !self.slots.is_empty()
    }

    /// Set by the reader on teardown; irreversible and idempotent. Pending
    /// messages stay readable, new pushes are rejected.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Append a message, blocking up to `timeout` for a free slot. On
    /// success the reader context is notified of the arrival. A closed
    /// queue rejects the push without waiting.
    pub fn push<T: Send + 'static>(
        &self,
        value: T,
        timeout: Duration,
    ) -> Result<(), PushError<T>> {
        let Some(cell) = self.cell::<T>() else {
            return Err(PushError::new(value, PushFailReason::Type));
        };

        let start = Instant::now();
        let backoff = Backoff::new();
        let mut spins: u32 = 0;
        let mut value = value;

        loop {
            if self.is_closed() {
                return Err(PushError::new(value, PushFailReason::Closed));
            }

            match cell.push(value) {
                Ok(()) => {
                    self.reader.notify(MESSAGE_ARRIVAL);
                    return Ok(());
                }
                Err(v) => {
                    if start.elapsed() >= timeout {
                        return Err(PushError::new(v, PushFailReason::Full));
                    }
                    value = v;
                    spins = spins.saturating_add(1);
                    if spins < 64 {
                        backoff.spin();
                    } else if spins < 256 {
                        backoff.snooze();
                    } else {
                        thread::sleep(Duration::from_micros(2));
                    }
                }
            }
        }
    }

    /// Remove the head message. Non-blocking: the reader serializes pops
    /// with `has_message` and the arrival notification, so an empty (or
    /// mistyped) queue simply yields `None`.
    pub fn pop<T: Send + 'static>(&self) -> Option<T> {
        self.cell::<T>()?.pop()
    }
}
