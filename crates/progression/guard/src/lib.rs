//! Progression Guard - who may do what, in which academy
//!
//! Platform administrators pass everywhere. Everyone else needs a membership
//! record in the academy with a role the policy table allows for the
//! operation, and may only reach players who are members of that academy.

#![deny(unsafe_code)]

mod directory;
pub mod error;
mod guard;
mod policy;

pub use directory::MembershipDirectory;
pub use error::GuardError;
pub use guard::{AccessGuard, Authorization, AuthorizedVia, DenialReason};
pub use policy::{Operation, PolicyTable, Role};
