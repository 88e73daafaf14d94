//! Domain data types.

pub mod account;
pub mod config;
pub mod intent;
pub mod message;
pub mod signal;
