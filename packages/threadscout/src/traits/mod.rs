//! Trait seams to external collaborators.

pub mod accounts;
pub mod language;
pub mod platform;
