pub use super::password_reset_tokens::Entity as PasswordResetTokens;
pub use super::users::Entity as Users;
