//! Per-principal session tracking

mod registry;

#[cfg(test)]
mod tests;

pub use registry::{session_key, SessionRegistry};
