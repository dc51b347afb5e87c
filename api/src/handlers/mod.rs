//! Request handler helpers shared by the route modules

pub mod error;

pub use error::ApiError;
