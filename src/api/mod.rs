pub mod extract;
pub mod requests;

pub use extract::{parse_id, ValidatedJson};
