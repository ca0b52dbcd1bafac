pub mod user;

pub use user::{NewUser, OneTimeTokenKind, User};
