pub(crate) mod env;
pub(crate) mod logging;
pub(crate) mod time;
