// store

mod session_store;

pub use session_store::*;

// repo

mod post_repo;
mod user_repo;

mod repo_tx;

pub use post_repo::*;
pub use user_repo::*;

pub use repo_tx::*;
