//! The search and extraction pipeline, leaf modules first: date
//! resolution and query building feed retrieval, which feeds the
//! orchestrator and the signal scanner.

pub mod dates;
pub mod intent;
pub mod prompts;
pub mod query;
pub mod retrieve;
pub mod scanner;
pub mod search;
