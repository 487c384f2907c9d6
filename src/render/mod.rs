pub(crate) mod backend;
pub(crate) mod cache;
pub(crate) mod canvas;
pub(crate) mod compositor;
pub(crate) mod elevation;
pub(crate) mod map;
pub(crate) mod text;
