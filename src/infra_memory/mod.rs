mod post_repo_memory;
mod repo_tx_memory;
mod session_store_memory;
mod user_repo_memory;

pub use post_repo_memory::*;
pub use repo_tx_memory::*;
pub use session_store_memory::*;
pub use user_repo_memory::*;
