pub(crate) mod collaborators;
pub(crate) mod controller;
