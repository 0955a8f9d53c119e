//! IO modules - external system interfaces
//!
//! - `engine_link` - Bounded channel carrying planning requests to the routing engine
//! - `replay` - JSONL feed of recorded engine callbacks and UI commands

pub mod engine_link;
pub mod replay;

// Re-export commonly used types
pub use engine_link::{create_engine_link, EngineLink, EngineRequestWorker};
pub use replay::{parse_feed_line, start_replay, ReplayStats};
