mod activation_log;
mod license;

pub use activation_log::*;
pub use license::*;
