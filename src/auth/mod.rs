pub mod authorizor;
pub mod identity;
mod user;

pub use user::User;
