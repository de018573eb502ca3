pub mod auth_service;
pub mod auth_service_impl;
pub mod password;
pub mod token;
pub mod validation;

pub use auth_service::{AuthError, AuthService, AuthSession};
pub use auth_service_impl::SeaOrmAuthService;
pub use password::CredentialStore;
pub use token::{Claims, TokenCodec, TokenError};
