pub(crate) mod fit;
pub(crate) mod resample;
pub(crate) mod sample;
pub(crate) mod track;
