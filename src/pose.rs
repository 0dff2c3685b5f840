pub(crate) mod landmark;
pub(crate) mod mapping;
pub(crate) mod recording;
