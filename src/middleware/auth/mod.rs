pub mod access;

pub use access::{Authenticator, AuthnFailure};
