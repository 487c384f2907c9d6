//! Job orchestration: chunk planning, parallel rendering, hierarchical merge, compose.

pub(crate) mod chunk;
pub(crate) mod job;
pub(crate) mod merge;
pub(crate) mod preview;
pub(crate) mod progress;
pub(crate) mod scheduler;
