//! User accounts domain module.
//!
//! Entity, role enum and attribute sets for user rows. Pure domain logic;
//! persistence and HTTP live elsewhere.

pub mod user;

pub use user::{NewUser, Role, User, UserChanges, USERS_SCHEMA};
