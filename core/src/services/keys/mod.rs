//! Signing key lifecycle module
//!
//! This module handles everything about the RSA keys behind issued tokens:
//! - Key pair generation
//! - Loading and persisting the key set in the shared cache
//! - Publishing the JWKS document
//! - Rotation, multi-instance sync and pruning of retired keys
//! - The background task driving rotation and sync

pub(crate) mod config;
mod generator;
mod jwks;
mod manager;
mod rotation;


pub use config::KeyManagerConfig;
pub use generator::{KeyGenerator, RsaKeyGenerator};
pub use jwks::JwksPublisher;
pub use manager::{InitOutcome, KeyLifecycleManager};
pub use rotation::{KeyRotationConfig, KeyRotationService, RotationReport};
