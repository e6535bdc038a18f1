pub mod accounts;
pub mod error;
pub mod github;
pub mod posts;
pub mod profiles;

pub use accounts::AccountService;
pub use error::ServiceError;
pub use github::GithubClient;
pub use posts::PostService;
pub use profiles::{ProfileFields, ProfileService};
