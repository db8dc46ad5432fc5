pub use run_flag::*;

pub mod logger;
mod run_flag;
