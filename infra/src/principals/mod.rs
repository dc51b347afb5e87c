//! Principal stores resolving sign-in credentials

pub mod memory;

#[cfg(test)]
mod tests;

pub use memory::{InMemoryPrincipalStore, DEFAULT_HASH_COST};
