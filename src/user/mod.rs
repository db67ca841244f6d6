//! Users and their credentials

pub mod store;
pub mod types;

pub use store::{Holdings, UserStore};
pub use types::{NewUser, ProfileUpdate, User, UserId};
