// handlers/protected/mod.rs - Protected handlers (token required)
//
// Every route here sits behind `middleware::require_auth`, which places the
// caller's Identity in the request extensions.

pub mod auth;
pub mod posts;
pub mod profile;

pub use auth::*;
pub use posts::*;
pub use profile::*;
