// handlers/protected/auth/mod.rs - authenticated session endpoints

pub mod session; // GET /api/auth

pub use session::whoami as session_whoami;
