//! Request handlers.

pub mod health;
pub mod ml;

pub use health::*;
pub use ml::*;
