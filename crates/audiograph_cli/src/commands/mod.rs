pub(crate) mod meta;
pub(crate) mod shared;
pub(crate) mod sweep;
pub(crate) mod sync;
