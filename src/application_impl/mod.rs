mod argon2_hasher;
mod auth_service_impl;
mod post_service_impl;
mod session_manager_impl;

pub use argon2_hasher::*;
pub use auth_service_impl::*;
pub use post_service_impl::*;
pub use session_manager_impl::*;
