// handlers/mod.rs - two-tier handler layout
//
// Public (no token) and Protected (token required). Route wiring lives in
// `crate::app`.

pub mod protected;
pub mod public;
