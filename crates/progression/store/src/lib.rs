//! Progression profile storage.
//!
//! One profile per `(academy, player)`, created lazily and never deleted.
//! Writers serialize per profile through revision-checked `replace`; the
//! [`mutate_profile`] helper wraps that in an optimistic retry loop.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]
#![warn(rust_2018_idioms)]

mod error;
pub mod memory;
mod mutate;
mod traits;

pub use error::{StorageError, StorageResult};
pub use memory::InMemoryProfileStore;
pub use mutate::mutate_profile;
pub use traits::ProfileStore;
