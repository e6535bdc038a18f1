use thiserror::Error;

use crate::auth::password::PasswordError;
use crate::auth::policy::NotAuthorized;
use crate::auth::TokenError;
use crate::database::StoreError;

/// Failures of the account, profile and post services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("User already exists")]
    DuplicateAccount,

    /// Deliberately the same for unknown email and wrong password.
    #[error("Invalid Credentials")]
    InvalidCredentials,

    #[error("{0}")]
    NotFound(&'static str),

    /// A field required to create a new document was absent.
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("User not authorized")]
    NotAuthorized,

    #[error("Post already liked")]
    AlreadyLiked,

    #[error("Post has not yet been liked")]
    NotLiked,

    #[error("Upstream lookup failed: {0}")]
    Upstream(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl From<NotAuthorized> for ServiceError {
    fn from(_: NotAuthorized) -> Self {
        ServiceError::NotAuthorized
    }
}
