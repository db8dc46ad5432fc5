pub use crate::component::{connect, Component, Node, NodeBuilder, NodeIo};
pub use crate::config::{RuntimeConfig, DEFAULT_PUSH_ATTEMPT_TIMEOUT_MS};
pub use crate::error::{RecvError, SendError, SendFailReason};
pub use crate::port::{InputPort, OutputPort};
pub use crate::runtime::Runtime;
pub use crate::utils::RunFlag;
