//! API request handlers

mod health;
mod progression;

pub use health::*;
pub use progression::*;
