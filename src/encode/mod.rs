//! Frame sinks and the external ffmpeg steps: chunk assets, concatenation, final composite.

pub(crate) mod compose;
pub(crate) mod concat;
pub(crate) mod ffmpeg;
pub(crate) mod sink;
