pub mod mail;

pub use mail::{LogMailer, Mailer};
