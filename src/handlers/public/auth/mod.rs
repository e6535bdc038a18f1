// handlers/public/auth/mod.rs - token acquisition

pub mod login; // POST /api/auth
pub mod register; // POST /api/users

pub use login::login_post;
pub use register::register_post;
