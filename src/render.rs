pub(crate) mod compositor;
pub(crate) mod skeleton;
pub(crate) mod surface;
