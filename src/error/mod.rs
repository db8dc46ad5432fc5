use std::{error::Error, fmt};

const ERR_MSG_TYPE_MISMATCH: &str = "message type does not match the port type";
const ERR_MSG_TERMINATED: &str = "component terminated";
const ERR_MSG_QUEUE_FULL: &str = "message queue is full";
const ERR_MSG_QUEUE_CLOSED: &str = "message queue is closed";

/// Why a port-level send did not deliver.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SendFailReason {
    /// The message type differs from the port's declared element type.
    TypeMismatch,
    /// The sending component was asked to stop, or the receiving queue
    /// closed before the message could be delivered.
    Terminated,
}

impl fmt::Display for SendFailReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendFailReason::TypeMismatch => write!(f, "{ERR_MSG_TYPE_MISMATCH}"),
            SendFailReason::Terminated => write!(f, "{ERR_MSG_TERMINATED}"),
        }
    }
}

/// Failed send. Hands the undelivered message back to the caller.
#[derive(Debug)]
pub struct SendError<Msg> {
    pub value: Option<Msg>,
    pub reason: SendFailReason,
}

impl<Msg> SendError<Msg> {
    pub fn type_mismatch(value: Msg) -> Self {
        Self {
            value: Some(value),
            reason: SendFailReason::TypeMismatch,
        }
    }

    pub fn terminated(value: Msg) -> Self {
        Self {
            value: Some(value),
            reason: SendFailReason::Terminated,
        }
    }
}

impl<Msg> fmt::Display for SendError<Msg> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason)
    }
}

impl<Msg: fmt::Debug> Error for SendError<Msg> {}

/// Failed receive.
#[derive(Debug)]
pub enum RecvError {
    /// The requested type differs from the port's declared element type.
    TypeMismatch,
    /// The receiving component was asked to stop while waiting.
    Terminated,
    /// Reserved for internal transport failures.
    Internal(anyhow::Error),
}

impl Error for RecvError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RecvError::Internal(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl fmt::Display for RecvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecvError::TypeMismatch => write!(f, "{ERR_MSG_TYPE_MISMATCH}"),
            RecvError::Terminated => write!(f, "{ERR_MSG_TERMINATED}"),
            RecvError::Internal(err) => write!(f, "internal error: {err}"),
        }
    }
}

impl From<anyhow::Error> for RecvError {
    fn from(err: anyhow::Error) -> Self {
        RecvError::Internal(err)
    }
}

/// Why a queue-level push was rejected.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PushFailReason {
    /// No free slot appeared within the timeout.
    Full,
    /// The queue has been closed by its reader.
    Closed,
    /// The value's type is not the queue's element type.
    Type,
}

impl fmt::Display for PushFailReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushFailReason::Full => write!(f, "{ERR_MSG_QUEUE_FULL}"),
            PushFailReason::Closed => write!(f, "{ERR_MSG_QUEUE_CLOSED}"),
            PushFailReason::Type => write!(f, "{ERR_MSG_TYPE_MISMATCH}"),
        }
    }
}

/// Rejected push. The value is always handed back.
#[derive(Debug)]
pub struct PushError<Msg> {
    pub value: Msg,
    pub reason: PushFailReason,
}

impl<Msg> PushError<Msg> {
    pub fn new(value: Msg, reason: PushFailReason) -> Self {
        Self { value, reason }
    }
}

impl<Msg> fmt::Display for PushError<Msg> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason)
    }
}

impl<Msg: fmt::Debug> Error for PushError<Msg> {}
