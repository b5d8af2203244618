//! Mailroom robot delivery simulation.
//!
//! Robots shuttle between a mailroom and the floors of a single-shaft
//! building, carrying one item in hand and one in a tube. The driver in
//! [`sim`] steps every robot once per tick against a shared [`mail_pool`].

pub mod building;
pub mod config;
pub mod delivery;
pub mod error;
pub mod generator;
pub mod logging;
pub mod mail_pool;
pub mod robot;
pub mod sim;
pub mod types;

pub use error::{Result, SimError};
