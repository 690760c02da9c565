//! A minimal application mounted behind the gate.
//!
//! The handlers stand in for real pages: the landing page, the login entry
//! point and the protected dashboard.

pub mod authenticated;
pub mod public;
pub mod router;

pub use router::create_router;

#[cfg(test)]
mod tests;
