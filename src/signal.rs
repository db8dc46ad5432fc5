use crossbeam::sync::{Parker, Unparker};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Released by `start_process`; consumed once at context entry.
pub const PROCESS_START: u32 = 1 << 0;
/// Raised by `stop_process` together with clearing the run flag.
pub const PROCESS_SHUTDOWN: u32 = 1 << 1;
/// Raised by every successful push into a queue read by this context.
pub const MESSAGE_ARRIVAL: u32 = 1 << 2;

struct SignalState {
    bits: AtomicU32,
}

/// Waiting side of a component's notification channel.
///
/// Events are bits, not a queue: repeated notifications of the same kind
/// collapse into one set bit, and waiters must re-check the guarded state
/// after waking. Exactly one thread (the component's execution context)
/// ever waits; any number of producers may notify through [`WakeHandle`].
pub struct WakeSignal {
    state: Arc<SignalState>,
    parker: Parker,
}

/// Producer side of the notification channel. Cheap to clone; queues hold
/// one for the lifetime of the shared queue, so the wake target can never
/// dangle under a live producer.
#[derive(Clone)]
pub struct WakeHandle {
    state: Arc<SignalState>,
    unparker: Unparker,
}

impl WakeSignal {
    pub fn new() -> Self {
        Self {
            state: Arc::new(SignalState {
                bits: AtomicU32::new(0),
            }),
            parker: Parker::new(),
        }
    }

    pub fn handle(&self) -> WakeHandle {
        WakeHandle {
            state: self.state.clone(),
            unparker: self.parker.unparker().clone(),
        }
    }

    /// Block until at least one bit of `mask` is set, then atomically clear
    /// the `mask` bits and return the full value that was observed. Bits
    /// outside `mask` are left untouched.
    pub fn wait(&self, mask: u32) -> u32 {
        loop {
            let seen = self.state.bits.fetch_and(!mask, Ordering::AcqRel);
            if seen & mask != 0 {
                return seen;
            }
            self.parker.park();
        }
    }
}

impl Default for WakeSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl WakeHandle {
    /// Set the given bits and wake the waiting context. The bits are
    /// published before the unpark, so a waiter that loses the park/unpark
    /// race still observes them on its next check.
    pub fn notify(&self, bits: u32) {
        self.state.bits.fetch_or(bits, Ordering::Release);
        self.unparker.unpark();
    }
}

impl fmt::Debug for WakeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WakeHandle")
            .field("bits", &self.state.bits.load(Ordering::Relaxed))
            .finish()
    }
}
