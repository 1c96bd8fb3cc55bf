mod auth_service;
mod post_service;
mod session_manager;

pub use auth_service::*;
pub use post_service::*;
pub use session_manager::*;
