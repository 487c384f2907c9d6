//! Source video inspection through ffprobe and single-frame extraction through ffmpeg.

pub(crate) mod frame;
pub(crate) mod probe;
