// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition and read-only profile browsing. These routes never see
// an Identity.

pub mod auth;
pub mod profile;

pub use auth::*;
pub use profile::*;
