//! Business services containing domain logic and use cases.

pub mod keys;
pub mod session;
pub mod token;

// Re-export commonly used types
pub use keys::{
    InitOutcome, JwksPublisher, KeyGenerator, KeyLifecycleManager, KeyManagerConfig,
    KeyRotationConfig, KeyRotationService, RotationReport, RsaKeyGenerator,
};
pub use session::SessionRegistry;
pub use token::{
    BearerValidator, TokenIssuer, TokenService, TokenServiceConfig, TokenValidator,
};
