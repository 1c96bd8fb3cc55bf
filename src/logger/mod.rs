//! Process-wide tracing setup. Installed once from `main`.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
