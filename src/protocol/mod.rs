//! Shared access to a graph store
//!
//! A [`Session`] lets several async tasks issue commands against the same
//! store through one lock.

pub mod session;

// Re-export main types
pub use session::Session;
