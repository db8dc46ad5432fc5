use serde::{Deserialize, Serialize};

/// Producer retry window for one bounded push attempt, in milliseconds.
/// Senders re-check their termination flag between attempts, so this also
/// bounds how long a blocked sender can outlive a stop request.
pub const DEFAULT_PUSH_ATTEMPT_TIMEOUT_MS: u64 = 100;

/// Runtime configuration applied to the components a [`Runtime`] creates.
/// Keeps the knobs small and explicit.
///
/// [`Runtime`]: crate::runtime::Runtime
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuntimeConfig {
    /// Push attempt timeout in milliseconds (`None` = 100).
    pub push_attempt_timeout_ms: Option<u64>,

    /// Stack size for component threads in bytes (`None` = platform default).
    pub thread_stack_size: Option<usize>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            push_attempt_timeout_ms: None,
            thread_stack_size: None,
        }
    }
}
